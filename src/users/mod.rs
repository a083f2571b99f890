use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod forms;
pub mod handlers;
pub mod model;
pub mod repo;
mod uploads;

#[cfg(test)]
pub(crate) mod memory;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::account_routes())
        .merge(handlers::media_routes())
}
