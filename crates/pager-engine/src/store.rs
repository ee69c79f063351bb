//! `FileStore` implementation on top of the `object_store` crate.

use std::sync::Arc;

use anyhow::Context;
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::{local::LocalFileSystem, memory::InMemory, path::Path, ObjectStore};
use pager_sdk::{FileStore, StoreEntry};

/// Object store backed file store
///
/// Works with any `ObjectStore`; `local` roots the store at a directory so
/// object names are relative paths below it.
#[derive(Debug, Clone)]
pub struct ObjectFileStore {
    store: Arc<dyn ObjectStore>,
}

impl ObjectFileStore {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Store rooted at a local directory
    pub fn local(root: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let root = root.as_ref();
        let store = LocalFileSystem::new_with_prefix(root)
            .with_context(|| format!("Failed to open local store at {}", root.display()))?;
        Ok(Self::new(Arc::new(store)))
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemory::new()))
    }

    pub fn object_store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }
}

/// Store location of an object name
///
/// Names are the encoded form `list` hands out, so they are parsed as is
/// rather than encoded again.
fn location(name: &str) -> anyhow::Result<Path> {
    Path::parse(name).with_context(|| format!("Invalid object name '{}'", name))
}

#[async_trait::async_trait]
impl FileStore for ObjectFileStore {
    async fn list(&self, prefix: &str) -> anyhow::Result<Vec<StoreEntry>> {
        let prefix = location(prefix)?;
        let mut entries: Vec<StoreEntry> = self
            .store
            .list(Some(&prefix))
            .map_ok(|meta| StoreEntry {
                name: meta.location.to_string(),
                size: meta.size as u64,
            })
            .try_collect()
            .await
            .with_context(|| format!("Failed to list objects under '{}'", prefix))?;

        // Listing order is unspecified across stores
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn open(&self, name: &str) -> anyhow::Result<Bytes> {
        let location = location(name)?;
        let object = self
            .store
            .get(&location)
            .await
            .with_context(|| format!("Failed to get object '{}'", name))?;
        object
            .bytes()
            .await
            .with_context(|| format!("Failed to read object '{}'", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::PutPayload;

    async fn seeded() -> ObjectFileStore {
        let store = ObjectFileStore::in_memory();
        for (name, body) in [
            ("tables/user/user2.csv", "id\n2\n"),
            ("tables/article/article1.csv", "id\n1\n"),
            ("tables/user/user1.csv", "id\n1\n"),
        ] {
            store
                .object_store()
                .put(&Path::from(name), PutPayload::from(body.as_bytes().to_vec()))
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn lists_sorted_under_prefix() {
        let store = seeded().await;
        let entries = store.list("tables/user/").await.unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["tables/user/user1.csv", "tables/user/user2.csv"]);
        assert_eq!(entries[0].size, 5);
    }

    #[tokio::test]
    async fn opens_objects_and_reports_missing_ones() {
        let store = seeded().await;
        let data = store.open("tables/article/article1.csv").await.unwrap();
        assert_eq!(&data[..], b"id\n1\n");

        let err = store.open("tables/article/missing.csv").await.unwrap_err();
        assert!(err.to_string().contains("missing.csv"));
    }

    #[tokio::test]
    async fn listed_names_open_with_reserved_characters() {
        let store = ObjectFileStore::in_memory();
        store
            .object_store()
            .put(&Path::from("tables/t/a#1.csv"), PutPayload::from_static(b"id\n1\n"))
            .await
            .unwrap();

        let entries = store.list("tables/t/").await.unwrap();
        assert_eq!(entries.len(), 1);
        let data = store.open(&entries[0].name).await.unwrap();
        assert_eq!(&data[..], b"id\n1\n");
    }
}
