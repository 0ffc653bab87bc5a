use axum::{extract::State, Json};
use tracing::instrument;

use crate::{state::AppState, upstream::Estado};

/// Proxied geography lookup; degraded-mode fallback happens inside the
/// upstream client, so this handler cannot fail.
#[instrument(skip(state))]
pub async fn estados(State(state): State<AppState>) -> Json<Vec<Estado>> {
    Json(state.upstream.estados().await)
}
