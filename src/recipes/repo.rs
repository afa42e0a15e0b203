use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;

use crate::catalog::repo::CatalogItem;
use crate::catalog::CatalogKind;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Recipe {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub time_minute: i32,
    pub price: Decimal,
    pub link: String,
    pub image: Option<String>,
    pub created_at: OffsetDateTime,
}

/// Recipe row with its association IDs aggregated in, for the compact
/// representation.
#[derive(Debug, Clone, FromRow)]
pub struct RecipeWithRefs {
    pub id: i64,
    pub title: String,
    pub time_minute: i32,
    pub price: Decimal,
    pub link: String,
    pub image: Option<String>,
    pub tag_ids: Vec<i64>,
    pub ingredient_ids: Vec<i64>,
}

pub struct RecipeFields<'a> {
    pub title: &'a str,
    pub time_minute: i32,
    pub price: Decimal,
    pub link: &'a str,
}

pub struct RecipeChanges<'a> {
    pub title: Option<&'a str>,
    pub time_minute: Option<i32>,
    pub price: Option<Decimal>,
    pub link: Option<&'a str>,
}

const RECIPE_COLUMNS: &str = "id, user_id, title, time_minute, price, link, image, created_at";

const SUMMARY_SELECT: &str = "
    SELECT r.id, r.title, r.time_minute, r.price, r.link, r.image,
           COALESCE(array_agg(DISTINCT rt.tag_id)
                    FILTER (WHERE rt.tag_id IS NOT NULL), '{}') AS tag_ids,
           COALESCE(array_agg(DISTINCT ri.ingredient_id)
                    FILTER (WHERE ri.ingredient_id IS NOT NULL), '{}') AS ingredient_ids
    FROM recipes r
    LEFT JOIN recipe_tags rt ON rt.recipe_id = r.id
    LEFT JOIN recipe_ingredients ri ON ri.recipe_id = r.id";

/// List the caller's recipes, newest first. The optional filters are each
/// an OR over their ID list; supplying both narrows sequentially.
pub async fn list(
    db: &PgPool,
    user_id: i64,
    tag_filter: Option<Vec<i64>>,
    ingredient_filter: Option<Vec<i64>>,
) -> anyhow::Result<Vec<RecipeWithRefs>> {
    let sql = format!(
        "{SUMMARY_SELECT}
         WHERE r.user_id = $1
           AND ($2::bigint[] IS NULL OR EXISTS (
                SELECT 1 FROM recipe_tags f
                WHERE f.recipe_id = r.id AND f.tag_id = ANY($2)))
           AND ($3::bigint[] IS NULL OR EXISTS (
                SELECT 1 FROM recipe_ingredients f
                WHERE f.recipe_id = r.id AND f.ingredient_id = ANY($3)))
         GROUP BY r.id
         ORDER BY r.id DESC"
    );
    let rows = sqlx::query_as::<_, RecipeWithRefs>(&sql)
        .bind(user_id)
        .bind(tag_filter)
        .bind(ingredient_filter)
        .fetch_all(db)
        .await?;
    Ok(rows)
}

pub async fn get(db: &PgPool, user_id: i64, id: i64) -> anyhow::Result<Option<Recipe>> {
    let recipe = sqlx::query_as::<_, Recipe>(&format!(
        "SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = $1 AND user_id = $2"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(recipe)
}

/// One recipe in the compact shape, association IDs included.
pub async fn summary(db: &PgPool, user_id: i64, id: i64) -> anyhow::Result<Option<RecipeWithRefs>> {
    let sql = format!(
        "{SUMMARY_SELECT}
         WHERE r.user_id = $1 AND r.id = $2
         GROUP BY r.id"
    );
    let row = sqlx::query_as::<_, RecipeWithRefs>(&sql)
        .bind(user_id)
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

/// Associated catalog items for the expanded detail shape, alphabetical.
pub async fn linked_items(
    db: &PgPool,
    kind: CatalogKind,
    recipe_id: i64,
) -> anyhow::Result<Vec<CatalogItem>> {
    let sql = format!(
        "SELECT c.id, c.user_id, c.name
         FROM {table} c
         JOIN {link} l ON l.{col} = c.id
         WHERE l.recipe_id = $1
         ORDER BY c.name",
        table = kind.table(),
        link = kind.link_table(),
        col = kind.link_column(),
    );
    let rows = sqlx::query_as::<_, CatalogItem>(&sql)
        .bind(recipe_id)
        .fetch_all(db)
        .await?;
    Ok(rows)
}

async fn replace_links(
    tx: &mut Transaction<'_, Postgres>,
    kind: CatalogKind,
    recipe_id: i64,
    ids: &[i64],
) -> anyhow::Result<()> {
    sqlx::query(&format!(
        "DELETE FROM {link} WHERE recipe_id = $1",
        link = kind.link_table(),
    ))
    .bind(recipe_id)
    .execute(&mut **tx)
    .await?;

    if !ids.is_empty() {
        sqlx::query(&format!(
            "INSERT INTO {link} (recipe_id, {col})
             SELECT $1, unnest($2::bigint[])",
            link = kind.link_table(),
            col = kind.link_column(),
        ))
        .bind(recipe_id)
        .bind(ids)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

/// Insert a recipe with its association links in one transaction. The owner
/// is the authenticated caller; referenced IDs are validated upstream.
pub async fn create(
    db: &PgPool,
    user_id: i64,
    fields: RecipeFields<'_>,
    tags: &[i64],
    ingredients: &[i64],
) -> anyhow::Result<Recipe> {
    let mut tx = db.begin().await?;

    let recipe = sqlx::query_as::<_, Recipe>(&format!(
        "INSERT INTO recipes (user_id, title, time_minute, price, link)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {RECIPE_COLUMNS}"
    ))
    .bind(user_id)
    .bind(fields.title)
    .bind(fields.time_minute)
    .bind(fields.price)
    .bind(fields.link)
    .fetch_one(&mut *tx)
    .await?;

    replace_links(&mut tx, CatalogKind::Tag, recipe.id, tags).await?;
    replace_links(&mut tx, CatalogKind::Ingredient, recipe.id, ingredients).await?;

    tx.commit().await?;
    Ok(recipe)
}

/// Partial update; `None` fields keep their value, `Some` association lists
/// are replaced wholesale. Returns `None` when the recipe is not visible to
/// the caller.
pub async fn update(
    db: &PgPool,
    user_id: i64,
    id: i64,
    changes: RecipeChanges<'_>,
    tags: Option<&[i64]>,
    ingredients: Option<&[i64]>,
) -> anyhow::Result<Option<Recipe>> {
    let mut tx = db.begin().await?;

    let recipe = sqlx::query_as::<_, Recipe>(&format!(
        "UPDATE recipes
         SET title = COALESCE($3, title),
             time_minute = COALESCE($4, time_minute),
             price = COALESCE($5, price),
             link = COALESCE($6, link)
         WHERE id = $1 AND user_id = $2
         RETURNING {RECIPE_COLUMNS}"
    ))
    .bind(id)
    .bind(user_id)
    .bind(changes.title)
    .bind(changes.time_minute)
    .bind(changes.price)
    .bind(changes.link)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(recipe) = recipe else {
        return Ok(None);
    };

    if let Some(tags) = tags {
        replace_links(&mut tx, CatalogKind::Tag, recipe.id, tags).await?;
    }
    if let Some(ingredients) = ingredients {
        replace_links(&mut tx, CatalogKind::Ingredient, recipe.id, ingredients).await?;
    }

    tx.commit().await?;
    Ok(Some(recipe))
}

/// Point the recipe at a stored image key.
pub async fn set_image(
    db: &PgPool,
    user_id: i64,
    id: i64,
    image: &str,
) -> anyhow::Result<Option<Recipe>> {
    let recipe = sqlx::query_as::<_, Recipe>(&format!(
        "UPDATE recipes SET image = $3 WHERE id = $1 AND user_id = $2 RETURNING {RECIPE_COLUMNS}"
    ))
    .bind(id)
    .bind(user_id)
    .bind(image)
    .fetch_optional(db)
    .await?;
    Ok(recipe)
}

/// Delete a recipe (links cascade). Returns the stored image key, if any,
/// so the caller can remove the file; `None` when nothing was deleted.
pub async fn delete(db: &PgPool, user_id: i64, id: i64) -> anyhow::Result<Option<Option<String>>> {
    let row: Option<(Option<String>,)> =
        sqlx::query_as("DELETE FROM recipes WHERE id = $1 AND user_id = $2 RETURNING image")
            .bind(id)
            .bind(user_id)
            .fetch_optional(db)
            .await?;
    Ok(row.map(|(image,)| image))
}
