use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub mod dto;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod repo;

pub use jwt::AuthUser;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/create", post(handlers::create_user))
        .route("/users/token", post(handlers::obtain_token))
        .route(
            "/users/me",
            get(handlers::get_me).patch(handlers::update_me),
        )
}
