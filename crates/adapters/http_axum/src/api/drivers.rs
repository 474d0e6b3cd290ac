//! Driver type introspection.

use axum::Json;
use axum::extract::State;

use synthetix_app::ports::RecordStore;

use crate::state::AppState;

/// `GET /api/drivers` — registered driver type names, sorted.
pub async fn list<S>(State(state): State<AppState<S>>) -> Json<Vec<String>>
where
    S: RecordStore + 'static,
{
    let names = state
        .service
        .manager()
        .registry()
        .type_names()
        .into_iter()
        .map(str::to_string)
        .collect();
    Json(names)
}
