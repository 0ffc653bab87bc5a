use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod repo;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::patient_routes())
        .merge(handlers::reception_routes())
        .merge(handlers::admin_routes())
}
