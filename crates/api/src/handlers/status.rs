use crate::{dto::StatusResponse, state::AppState};
use axum::{extract::State, Json};
use tracing::{debug, instrument};

#[instrument(skip(state), name = "api_get_status")]
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let status = state.get_status.execute();
    debug!(
        generation = ?status.generation.as_ref().map(|g| g.generation),
        sources = status.sources.len(),
        "Status retrieved"
    );
    Json(StatusResponse::from(status))
}
