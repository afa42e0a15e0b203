use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

/// Tags and ingredients share one shape and one set of scoped queries; the
/// kind picks the tables. This replaces per-entity copies of the same
/// repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    Tag,
    Ingredient,
}

impl CatalogKind {
    pub fn table(self) -> &'static str {
        match self {
            CatalogKind::Tag => "tags",
            CatalogKind::Ingredient => "ingredients",
        }
    }

    pub fn link_table(self) -> &'static str {
        match self {
            CatalogKind::Tag => "recipe_tags",
            CatalogKind::Ingredient => "recipe_ingredients",
        }
    }

    pub fn link_column(self) -> &'static str {
        match self {
            CatalogKind::Tag => "tag_id",
            CatalogKind::Ingredient => "ingredient_id",
        }
    }

    /// Field name used in request payloads and error bodies.
    pub fn field(self) -> &'static str {
        match self {
            CatalogKind::Tag => "tags",
            CatalogKind::Ingredient => "ingredients",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CatalogItem {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
}

/// List the caller's items, reverse-alphabetical. With `assigned_only` the
/// result is restricted to items linked to at least one recipe and
/// deduplicated by the DISTINCT.
pub async fn list(
    db: &PgPool,
    kind: CatalogKind,
    user_id: i64,
    assigned_only: bool,
) -> anyhow::Result<Vec<CatalogItem>> {
    let sql = if assigned_only {
        format!(
            "SELECT DISTINCT c.id, c.user_id, c.name
             FROM {table} c
             JOIN {link} l ON l.{col} = c.id
             WHERE c.user_id = $1
             ORDER BY c.name DESC",
            table = kind.table(),
            link = kind.link_table(),
            col = kind.link_column(),
        )
    } else {
        format!(
            "SELECT id, user_id, name FROM {table} WHERE user_id = $1 ORDER BY name DESC",
            table = kind.table(),
        )
    };
    let rows = sqlx::query_as::<_, CatalogItem>(&sql)
        .bind(user_id)
        .fetch_all(db)
        .await?;
    Ok(rows)
}

/// Insert an item owned by the caller; ownership comes from the
/// authenticated identity, never from the payload.
pub async fn create(
    db: &PgPool,
    kind: CatalogKind,
    user_id: i64,
    name: &str,
) -> anyhow::Result<CatalogItem> {
    let sql = format!(
        "INSERT INTO {table} (user_id, name) VALUES ($1, $2) RETURNING id, user_id, name",
        table = kind.table(),
    );
    let item = sqlx::query_as::<_, CatalogItem>(&sql)
        .bind(user_id)
        .bind(name)
        .fetch_one(db)
        .await?;
    Ok(item)
}

/// True when every ID resolves to a row owned by `user_id`. IDs must be
/// deduplicated by the caller.
pub async fn all_owned(
    db: &PgPool,
    kind: CatalogKind,
    user_id: i64,
    ids: &[i64],
) -> anyhow::Result<bool> {
    if ids.is_empty() {
        return Ok(true);
    }
    let sql = format!(
        "SELECT COUNT(*) FROM {table} WHERE id = ANY($1) AND user_id = $2",
        table = kind.table(),
    );
    let count: i64 = sqlx::query_scalar(&sql)
        .bind(ids)
        .bind(user_id)
        .fetch_one(db)
        .await?;
    Ok(count == ids.len() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo::User;
    use crate::recipes::repo::{self as recipes_repo, RecipeFields};
    use rust_decimal::Decimal;

    #[test]
    fn kind_table_names() {
        assert_eq!(CatalogKind::Tag.table(), "tags");
        assert_eq!(CatalogKind::Tag.link_table(), "recipe_tags");
        assert_eq!(CatalogKind::Tag.link_column(), "tag_id");
        assert_eq!(CatalogKind::Ingredient.table(), "ingredients");
        assert_eq!(CatalogKind::Ingredient.link_table(), "recipe_ingredients");
        assert_eq!(CatalogKind::Ingredient.link_column(), "ingredient_id");
    }

    async fn user(db: &PgPool, email: &str) -> i64 {
        User::create(db, email, "hash", "")
            .await
            .expect("create user")
            .id
    }

    async fn recipe_with_tags(db: &PgPool, user_id: i64, title: &str, tags: &[i64]) -> i64 {
        recipes_repo::create(
            db,
            user_id,
            RecipeFields {
                title,
                time_minute: 5,
                price: Decimal::new(250, 2),
                link: "",
            },
            tags,
            &[],
        )
        .await
        .expect("create recipe")
        .id
    }

    #[sqlx::test]
    async fn list_returns_only_callers_rows(pool: PgPool) {
        let alice = user(&pool, "alice@example.com").await;
        let bob = user(&pool, "bob@example.com").await;
        create(&pool, CatalogKind::Tag, alice, "Vegan").await.unwrap();
        create(&pool, CatalogKind::Tag, bob, "Dessert").await.unwrap();

        let items = list(&pool, CatalogKind::Tag, alice, false).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Vegan");
        assert!(items.iter().all(|i| i.user_id == alice));
    }

    #[sqlx::test]
    async fn list_orders_reverse_alphabetical(pool: PgPool) {
        let alice = user(&pool, "alice@example.com").await;
        for name in ["Apple", "Zucchini", "Main course"] {
            create(&pool, CatalogKind::Ingredient, alice, name)
                .await
                .unwrap();
        }

        let items = list(&pool, CatalogKind::Ingredient, alice, false)
            .await
            .unwrap();
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Zucchini", "Main course", "Apple"]);
    }

    #[sqlx::test]
    async fn assigned_only_returns_linked_items_exactly_once(pool: PgPool) {
        let alice = user(&pool, "alice@example.com").await;
        let linked = create(&pool, CatalogKind::Tag, alice, "Breakfast")
            .await
            .unwrap();
        create(&pool, CatalogKind::Tag, alice, "Unused").await.unwrap();

        // two recipes share the tag; it must still appear once
        recipe_with_tags(&pool, alice, "Tea", &[linked.id]).await;
        recipe_with_tags(&pool, alice, "Coffee", &[linked.id]).await;

        let items = list(&pool, CatalogKind::Tag, alice, true).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, linked.id);
    }

    #[sqlx::test]
    async fn all_owned_rejects_foreign_and_missing_ids(pool: PgPool) {
        let alice = user(&pool, "alice@example.com").await;
        let bob = user(&pool, "bob@example.com").await;
        let mine = create(&pool, CatalogKind::Tag, alice, "Mine").await.unwrap();
        let theirs = create(&pool, CatalogKind::Tag, bob, "Theirs").await.unwrap();

        assert!(all_owned(&pool, CatalogKind::Tag, alice, &[mine.id])
            .await
            .unwrap());
        assert!(!all_owned(&pool, CatalogKind::Tag, alice, &[theirs.id])
            .await
            .unwrap());
        assert!(
            !all_owned(&pool, CatalogKind::Tag, alice, &[mine.id, theirs.id])
                .await
                .unwrap()
        );
        assert!(!all_owned(&pool, CatalogKind::Tag, alice, &[999_999])
            .await
            .unwrap());
        assert!(all_owned(&pool, CatalogKind::Tag, alice, &[]).await.unwrap());
    }
}
