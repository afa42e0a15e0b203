use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use tracing::{info, instrument, warn};

use crate::{
    auth::AuthUser,
    catalog::{repo as catalog_repo, CatalogItemOut, CatalogKind},
    error::ApiError,
    recipes::{
        dto::{
            parse_id_list, validate_price, validate_time_minute, validate_title,
            CreateRecipeRequest, RecipeDetail, RecipeListParams, RecipeSummary,
            UpdateRecipeRequest,
        },
        repo::{self, RecipeChanges, RecipeFields, RecipeWithRefs},
    },
    state::AppState,
    storage,
};

impl From<RecipeWithRefs> for RecipeSummary {
    fn from(row: RecipeWithRefs) -> Self {
        Self {
            id: row.id,
            title: row.title,
            time_minute: row.time_minute,
            price: row.price,
            link: row.link,
            tags: row.tag_ids,
            ingredients: row.ingredient_ids,
            image: row.image,
        }
    }
}

/// Deduplicate an association list (sets are membership-unique) and check
/// every ID resolves to a catalog row owned by the caller. Cross-owner
/// references are rejected outright.
async fn resolve_refs(
    state: &AppState,
    user_id: i64,
    kind: CatalogKind,
    ids: &[i64],
) -> Result<Vec<i64>, ApiError> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    if !catalog_repo::all_owned(&state.db, kind, user_id, &ids).await? {
        return Err(ApiError::field(
            kind.field(),
            "invalid id - object does not exist",
        ));
    }
    Ok(ids)
}

async fn load_summary(state: &AppState, user_id: i64, id: i64) -> Result<RecipeSummary, ApiError> {
    let row = repo::summary(&state.db, user_id, id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(row.into())
}

#[instrument(skip(state))]
pub async fn list_recipes(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(params): Query<RecipeListParams>,
) -> Result<Json<Vec<RecipeSummary>>, ApiError> {
    let tag_filter = params
        .tags
        .as_deref()
        .map(|raw| parse_id_list(raw, "tags"))
        .transpose()?;
    let ingredient_filter = params
        .ingredients
        .as_deref()
        .map(|raw| parse_id_list(raw, "ingredients"))
        .transpose()?;

    let rows = repo::list(&state.db, user_id, tag_filter, ingredient_filter).await?;
    Ok(Json(rows.into_iter().map(RecipeSummary::from).collect()))
}

#[instrument(skip(state, payload))]
pub async fn create_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateRecipeRequest>,
) -> Result<(StatusCode, Json<RecipeSummary>), ApiError> {
    validate_title(&payload.title)?;
    validate_time_minute(payload.time_minute)?;
    validate_price(payload.price)?;

    let tags = resolve_refs(&state, user_id, CatalogKind::Tag, &payload.tags).await?;
    let ingredients =
        resolve_refs(&state, user_id, CatalogKind::Ingredient, &payload.ingredients).await?;

    let recipe = repo::create(
        &state.db,
        user_id,
        RecipeFields {
            title: payload.title.trim(),
            time_minute: payload.time_minute,
            price: payload.price,
            link: payload.link.as_deref().unwrap_or(""),
        },
        &tags,
        &ingredients,
    )
    .await?;

    info!(user_id = %user_id, recipe_id = %recipe.id, "recipe created");
    let summary = load_summary(&state, user_id, recipe.id).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

#[instrument(skip(state))]
pub async fn get_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<RecipeDetail>, ApiError> {
    let recipe = repo::get(&state.db, user_id, id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let tags = repo::linked_items(&state.db, CatalogKind::Tag, recipe.id).await?;
    let ingredients = repo::linked_items(&state.db, CatalogKind::Ingredient, recipe.id).await?;

    Ok(Json(RecipeDetail {
        id: recipe.id,
        title: recipe.title,
        time_minute: recipe.time_minute,
        price: recipe.price,
        link: recipe.link,
        tags: tags.into_iter().map(CatalogItemOut::from).collect(),
        ingredients: ingredients.into_iter().map(CatalogItemOut::from).collect(),
        image: recipe.image,
    }))
}

async fn apply_update(
    state: AppState,
    user_id: i64,
    id: i64,
    payload: UpdateRecipeRequest,
) -> Result<Json<RecipeSummary>, ApiError> {
    if let Some(title) = payload.title.as_deref() {
        validate_title(title)?;
    }
    if let Some(time_minute) = payload.time_minute {
        validate_time_minute(time_minute)?;
    }
    if let Some(price) = payload.price {
        validate_price(price)?;
    }

    let tags = match payload.tags.as_deref() {
        Some(ids) => Some(resolve_refs(&state, user_id, CatalogKind::Tag, ids).await?),
        None => None,
    };
    let ingredients = match payload.ingredients.as_deref() {
        Some(ids) => Some(resolve_refs(&state, user_id, CatalogKind::Ingredient, ids).await?),
        None => None,
    };

    let recipe = repo::update(
        &state.db,
        user_id,
        id,
        RecipeChanges {
            title: payload.title.as_deref().map(str::trim),
            time_minute: payload.time_minute,
            price: payload.price,
            link: payload.link.as_deref(),
        },
        tags.as_deref(),
        ingredients.as_deref(),
    )
    .await?
    .ok_or(ApiError::NotFound)?;

    info!(user_id = %user_id, recipe_id = %recipe.id, "recipe updated");
    let summary = load_summary(&state, user_id, recipe.id).await?;
    Ok(Json(summary))
}

#[instrument(skip(state, payload))]
pub async fn put_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateRecipeRequest>,
) -> Result<Json<RecipeSummary>, ApiError> {
    // Full update: the required fields must all be present.
    if payload.title.is_none() {
        return Err(ApiError::field("title", "this field is required"));
    }
    if payload.time_minute.is_none() {
        return Err(ApiError::field("time_minute", "this field is required"));
    }
    if payload.price.is_none() {
        return Err(ApiError::field("price", "this field is required"));
    }
    apply_update(state, user_id, id, payload).await
}

#[instrument(skip(state, payload))]
pub async fn patch_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateRecipeRequest>,
) -> Result<Json<RecipeSummary>, ApiError> {
    apply_update(state, user_id, id, payload).await
}

#[instrument(skip(state))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let image = repo::delete(&state.db, user_id, id)
        .await?
        .ok_or(ApiError::NotFound)?;

    if let Some(key) = image {
        if let Err(e) = state.media.delete(&key).await {
            warn!(error = %e, key = %key, "failed to remove image file");
        }
    }

    info!(user_id = %user_id, recipe_id = %id, "recipe deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, multipart))]
pub async fn upload_image(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Result<Json<RecipeSummary>, ApiError> {
    let recipe = repo::get(&state.db, user_id, id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let mut upload: Option<(Bytes, Option<String>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::field("image", "invalid multipart payload"))?
    {
        if field.name() == Some("image") {
            let file_name = field.file_name().map(str::to_string);
            let data = field
                .bytes()
                .await
                .map_err(|_| ApiError::field("image", "could not read uploaded file"))?;
            upload = Some((data, file_name));
        }
    }
    let Some((data, file_name)) = upload else {
        return Err(ApiError::field("image", "no file was submitted"));
    };

    // Reject anything that does not decode as an actual image.
    let format = image::guess_format(&data).ok();
    if format.is_none() || image::load_from_memory(&data).is_err() {
        warn!(user_id = %user_id, recipe_id = %id, "rejected non-image upload");
        return Err(ApiError::field(
            "image",
            "upload a valid image - the submitted file is not an image",
        ));
    }
    let fallback_ext = format
        .and_then(|f| f.extensions_str().first().copied())
        .unwrap_or("jpg");

    let key = storage::recipe_image_key(file_name.as_deref(), fallback_ext);
    state.media.put(&key, data).await?;

    let updated = repo::set_image(&state.db, user_id, id, &key)
        .await?
        .ok_or(ApiError::NotFound)?;

    // Replaced images are orphaned files otherwise.
    if let Some(old) = recipe.image {
        if old != key {
            if let Err(e) = state.media.delete(&old).await {
                warn!(error = %e, key = %old, "failed to remove replaced image file");
            }
        }
    }

    info!(user_id = %user_id, recipe_id = %updated.id, key = %key, "image uploaded");
    let summary = load_summary(&state, user_id, updated.id).await?;
    Ok(Json(summary))
}
