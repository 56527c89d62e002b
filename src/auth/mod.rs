use crate::state::AppState;
use axum::Router;

pub mod dto;
pub(crate) mod extractors;
pub mod handlers;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod service;
pub mod token;
pub mod validate;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
