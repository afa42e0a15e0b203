use axum::{routing::get, Router};

use crate::state::AppState;

pub mod dto;
pub mod handlers;
pub mod repo;

pub use dto::CatalogItemOut;
pub use repo::CatalogKind;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/tags",
            get(handlers::list_tags).post(handlers::create_tag),
        )
        .route(
            "/ingredients",
            get(handlers::list_ingredients).post(handlers::create_ingredient),
        )
}
