use std::path::{Path, PathBuf};

use anyhow::Context;
use axum::async_trait;
use bytes::Bytes;
use uuid::Uuid;

/// Stores media bytes under string keys and hands back nothing more than
/// success; the key itself is the reference persisted on the recipe row.
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn put(&self, key: &str, body: Bytes) -> anyhow::Result<()>;
    async fn delete(&self, key: &str) -> anyhow::Result<()>;
}

/// Filesystem-backed store rooted at `MEDIA_ROOT`.
#[derive(Clone)]
pub struct LocalMediaStore {
    root: PathBuf,
}

impl LocalMediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn put(&self, key: &str, body: Bytes) -> anyhow::Result<()> {
        let path = self.resolve(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create media dir {}", parent.display()))?;
        }
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("write media file {}", path.display()))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        let path = self.resolve(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("remove media file {}", path.display())),
        }
    }
}

/// Build a storage key for a recipe image: the basename is a fresh UUID so
/// user-supplied names can neither collide nor escape the uploads directory.
/// The original extension is kept when it looks sane, otherwise
/// `fallback_ext` (derived from the decoded format) is used.
pub fn recipe_image_key(original_name: Option<&str>, fallback_ext: &str) -> String {
    let ext = original_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 8 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| fallback_ext.to_string());
    format!("uploads/recipe/{}.{}", Uuid::new_v4(), ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> LocalMediaStore {
        let root = std::env::temp_dir().join(format!("recipebox-test-{}", Uuid::new_v4()));
        LocalMediaStore::new(root)
    }

    #[test]
    fn image_key_keeps_extension_and_replaces_basename() {
        let key = recipe_image_key(Some("holiday photo.JPG"), "png");
        assert!(key.starts_with("uploads/recipe/"), "key: {key}");
        assert!(key.ends_with(".jpg"), "key: {key}");
        assert!(!key.contains("holiday"));
    }

    #[test]
    fn image_key_rejects_traversal_heavy_names() {
        let key = recipe_image_key(Some("../../etc/passwd"), "png");
        assert!(key.starts_with("uploads/recipe/"), "key: {key}");
        assert!(!key.contains(".."));
        // "passwd" has no extension part, so the fallback wins
        assert!(key.ends_with(".png"), "key: {key}");
    }

    #[test]
    fn image_key_falls_back_when_no_name() {
        let key = recipe_image_key(None, "webp");
        assert!(key.ends_with(".webp"), "key: {key}");
    }

    #[test]
    fn image_keys_are_unique() {
        let a = recipe_image_key(Some("a.png"), "png");
        let b = recipe_image_key(Some("a.png"), "png");
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn put_then_delete_roundtrip() {
        let store = temp_store();
        let key = recipe_image_key(Some("cake.png"), "png");
        store
            .put(&key, Bytes::from_static(b"not really a png"))
            .await
            .expect("put should succeed");
        let on_disk = store.resolve(&key);
        assert!(on_disk.exists());
        store.delete(&key).await.expect("delete should succeed");
        assert!(!on_disk.exists());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = temp_store();
        store
            .delete("uploads/recipe/never-existed.jpg")
            .await
            .expect("deleting a missing file is fine");
    }
}
