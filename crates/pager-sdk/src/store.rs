use crate::Result;
use bytes::Bytes;

/// One object returned by a store listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEntry {
    pub name: String,
    pub size: u64,
}

/// Read side of the object store the table files live in
///
/// Names are `/`-separated object paths relative to the store root.
#[async_trait::async_trait]
pub trait FileStore: Send + Sync {
    /// List every object whose name starts with `prefix`
    async fn list(&self, prefix: &str) -> Result<Vec<StoreEntry>>;

    /// Open an object and return its contents
    async fn open(&self, name: &str) -> Result<Bytes>;
}
