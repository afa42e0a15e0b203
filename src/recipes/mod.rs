use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub mod dto;
pub mod handlers;
pub mod repo;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/recipes",
            get(handlers::list_recipes).post(handlers::create_recipe),
        )
        .route(
            "/recipes/:id",
            get(handlers::get_recipe)
                .put(handlers::put_recipe)
                .patch(handlers::patch_recipe)
                .delete(handlers::delete_recipe),
        )
        .route(
            "/recipes/:id/upload-image",
            post(handlers::upload_image).layer(DefaultBodyLimit::max(10 * 1024 * 1024)),
        )
}
