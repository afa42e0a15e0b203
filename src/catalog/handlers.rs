use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument};

use crate::{
    auth::AuthUser,
    catalog::{
        dto::{CatalogItemOut, CatalogListParams, CreateCatalogItem},
        repo::{self, CatalogKind},
    },
    error::ApiError,
    state::AppState,
};

async fn list_items(
    state: AppState,
    user_id: i64,
    params: CatalogListParams,
    kind: CatalogKind,
) -> Result<Json<Vec<CatalogItemOut>>, ApiError> {
    let items = repo::list(&state.db, kind, user_id, params.assigned_only()).await?;
    Ok(Json(items.into_iter().map(CatalogItemOut::from).collect()))
}

async fn create_item(
    state: AppState,
    user_id: i64,
    payload: CreateCatalogItem,
    kind: CatalogKind,
) -> Result<(StatusCode, Json<CatalogItemOut>), ApiError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::field("name", "this field may not be blank"));
    }
    let item = repo::create(&state.db, kind, user_id, name).await?;
    info!(user_id = %user_id, item_id = %item.id, kind = kind.field(), "catalog item created");
    Ok((StatusCode::CREATED, Json(item.into())))
}

#[instrument(skip(state))]
pub async fn list_tags(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(params): Query<CatalogListParams>,
) -> Result<Json<Vec<CatalogItemOut>>, ApiError> {
    list_items(state, user_id, params, CatalogKind::Tag).await
}

#[instrument(skip(state, payload))]
pub async fn create_tag(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateCatalogItem>,
) -> Result<(StatusCode, Json<CatalogItemOut>), ApiError> {
    create_item(state, user_id, payload, CatalogKind::Tag).await
}

#[instrument(skip(state))]
pub async fn list_ingredients(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(params): Query<CatalogListParams>,
) -> Result<Json<Vec<CatalogItemOut>>, ApiError> {
    list_items(state, user_id, params, CatalogKind::Ingredient).await
}

#[instrument(skip(state, payload))]
pub async fn create_ingredient(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateCatalogItem>,
) -> Result<(StatusCode, Json<CatalogItemOut>), ApiError> {
    create_item(state, user_id, payload, CatalogKind::Ingredient).await
}
