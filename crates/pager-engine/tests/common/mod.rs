#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use pager_engine::{FileSource, FormatHandler, SourceSpec};
use pager_sdk::{FileStore, StoreEntry};

/// In-memory store that records which files get opened, and when
#[derive(Default)]
pub struct MockStore {
    files: Vec<(String, Bytes)>,
    failing: HashSet<String>,
    delay: Option<Duration>,
    opens: AtomicUsize,
    opened: Mutex<Vec<String>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, name: &str, body: &str) -> Self {
        self.files
            .push((name.to_string(), Bytes::from(body.to_string())));
        self
    }

    /// Opening `name` fails
    pub fn failing(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    /// Every open takes `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl FileStore for MockStore {
    async fn list(&self, prefix: &str) -> anyhow::Result<Vec<StoreEntry>> {
        let mut entries: Vec<StoreEntry> = self
            .files
            .iter()
            .filter(|(name, _)| name.starts_with(prefix))
            .map(|(name, body)| StoreEntry {
                name: name.clone(),
                size: body.len() as u64,
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn open(&self, name: &str) -> anyhow::Result<Bytes> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.opened.lock().unwrap().push(name.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.contains(name) {
            anyhow::bail!("permission denied: {name}");
        }
        self.files
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, body)| body.clone())
            .ok_or_else(|| anyhow::anyhow!("no such object: {name}"))
    }
}

pub fn source_with(store: Arc<MockStore>, spec: SourceSpec) -> Arc<FileSource> {
    Arc::new(FileSource::new(store, Arc::new(FormatHandler::auto()), spec).unwrap())
}

pub fn source(store: Arc<MockStore>) -> Arc<FileSource> {
    source_with(store, SourceSpec::default())
}

/// Spec spreading files round-robin over `count` partitions
pub fn partitioned(count: u32, buffer_size: usize) -> SourceSpec {
    SourceSpec {
        partition_count: Some(count),
        buffer_size,
        ..SourceSpec::default()
    }
}

/// Give the fetch worker time to run ahead
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}

/// Drain a pager, returning the `name` column of every record
pub async fn names(pager: &mut pager_engine::Pager) -> Vec<String> {
    let mut out = Vec::new();
    while let Some(record) = pager.next_record().await {
        out.push(record.get_str("name").unwrap_or_default().to_string());
    }
    out
}
