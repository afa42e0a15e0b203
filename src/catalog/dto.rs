use serde::{Deserialize, Serialize};

use crate::catalog::repo::CatalogItem;

/// Wire shape for a tag or ingredient; also embedded in recipe detail.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogItemOut {
    pub id: i64,
    pub name: String,
}

impl From<CatalogItem> for CatalogItemOut {
    fn from(item: CatalogItem) -> Self {
        Self {
            id: item.id,
            name: item.name,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateCatalogItem {
    pub name: String,
}

/// Query parameters for catalog listing; `assigned_only=1` restricts the
/// result to items attached to at least one recipe.
#[derive(Debug, Deserialize)]
pub struct CatalogListParams {
    pub assigned_only: Option<i64>,
}

impl CatalogListParams {
    pub fn assigned_only(&self) -> bool {
        self.assigned_only.is_some_and(|v| v != 0)
    }
}
