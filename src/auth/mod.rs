mod dto;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod service;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
