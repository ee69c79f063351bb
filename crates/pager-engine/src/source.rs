use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};

use arrow::datatypes::SchemaRef;
use pager_sdk::{FileHandler, FileInfo, FileReader, FileStore};
use regex::Regex;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::error::SourceError;
use crate::format::FormatHandler;
use crate::pager::Pager;
use crate::spec::SourceSpec;

/// A table resolved from its files
#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    pub schema: SchemaRef,
    pub files: usize,
}

/// One row of the files listing, as shown by `fpager files`
#[derive(Debug, Clone, Serialize)]
pub struct FileRow {
    pub file: String,
    pub table: String,
    pub size: u64,
    pub partition: u32,
}

impl From<&FileInfo> for FileRow {
    fn from(info: &FileInfo) -> Self {
        Self {
            file: info.name.clone(),
            table: info.table.clone(),
            size: info.size,
            partition: info.partition,
        }
    }
}

/// Catalog of tables stored as files in an object store
///
/// Every directory below the configured prefix is a table; its files, ordered
/// by name, are the table's catalog.
pub struct FileSource {
    store: Arc<dyn FileStore>,
    handler: Arc<dyn FileHandler>,
    spec: SourceSpec,
    pattern: Option<glob::Pattern>,
}

impl FileSource {
    pub fn new(
        store: Arc<dyn FileStore>,
        handler: Arc<dyn FileHandler>,
        spec: SourceSpec,
    ) -> Result<Self, SourceError> {
        let pattern = spec
            .file_pattern
            .as_deref()
            .map(|pattern| {
                glob::Pattern::new(pattern).map_err(|source| SourceError::Pattern {
                    pattern: pattern.to_string(),
                    source,
                })
            })
            .transpose()?;

        Ok(Self {
            store,
            handler,
            spec,
            pattern,
        })
    }

    /// Source decoding files with the formats configured in `spec`
    pub fn from_spec(store: Arc<dyn FileStore>, spec: SourceSpec) -> Result<Self, SourceError> {
        let handler = FormatHandler::from_spec(&spec)?;
        Self::new(store, Arc::new(handler), spec)
    }

    pub fn store(&self) -> &Arc<dyn FileStore> {
        &self.store
    }

    pub fn handler(&self) -> &Arc<dyn FileHandler> {
        &self.handler
    }

    pub fn spec(&self) -> &SourceSpec {
        &self.spec
    }

    /// Create a pager over one table of this source
    pub fn pager(self: &Arc<Self>, table: impl Into<String>) -> Pager {
        Pager::new(table, Arc::clone(self))
    }

    /// Names of all tables, sorted
    pub async fn tables(&self) -> Result<Vec<String>, SourceError> {
        let prefix = self.spec.root_prefix();
        let entries = self
            .store
            .list(&prefix)
            .await
            .map_err(|source| SourceError::List {
                prefix: prefix.clone(),
                source,
            })?;

        let tables: BTreeSet<String> = entries
            .iter()
            .filter_map(|entry| {
                let rest = entry.name.strip_prefix(&prefix)?;
                let (table, _) = rest.split_once('/')?;
                (!table.is_empty()).then(|| table.to_string())
            })
            .collect();
        Ok(tables.into_iter().collect())
    }

    /// The catalog of `table`: its files in name order, with partitions assigned
    #[instrument(skip(self))]
    pub async fn list_files(&self, table: &str) -> Result<Vec<FileInfo>, SourceError> {
        let prefix = self.spec.table_prefix(table);
        let entries = self
            .store
            .list(&prefix)
            .await
            .map_err(|source| SourceError::List {
                prefix: prefix.clone(),
                source,
            })?;

        let files: Vec<FileInfo> = entries
            .into_iter()
            .filter(|entry| self.accepts(&entry.name))
            .enumerate()
            .map(|(index, entry)| {
                let partition = partition_for(&entry.name, index, self.spec.partition_count);
                FileInfo::new(entry.name, table, partition, entry.size)
            })
            .collect();

        debug!(files = files.len(), "listed table files");
        Ok(files)
    }

    /// Resolve a table's columns from the schema of its first file
    #[instrument(skip(self))]
    pub async fn resolve_table(&self, table: &str) -> Result<Table, SourceError> {
        let files = self.list_files(table).await?;
        let first = files
            .first()
            .ok_or_else(|| SourceError::TableNotFound(table.to_string()))?;

        let data = self
            .store
            .open(&first.name)
            .await
            .map_err(|source| SourceError::Schema {
                name: first.name.clone(),
                source,
            })?;
        let reader = FileReader::new(first.clone(), data, CancellationToken::new());
        let scanner = self
            .handler
            .scanner(reader)
            .map_err(|source| SourceError::Schema {
                name: first.name.clone(),
                source,
            })?;

        let schema = scanner.schema().clone();
        let columns = schema.fields().iter().map(|f| f.name().clone()).collect();
        Ok(Table {
            name: table.to_string(),
            columns,
            schema,
            files: files.len(),
        })
    }

    fn accepts(&self, name: &str) -> bool {
        let file_name = name.rsplit('/').next().unwrap_or(name);
        if file_name.is_empty() {
            return false;
        }
        self.pattern
            .as_ref()
            .map_or(true, |pattern| pattern.matches(file_name))
    }
}

/// Partition of the `index`-th file of a table
///
/// An explicit `partition=N` path segment wins; otherwise files are spread
/// round-robin over `partition_count` partitions, or all land in partition 0.
fn partition_for(name: &str, index: usize, partition_count: Option<u32>) -> u32 {
    static PARTITION_SEGMENT: OnceLock<Regex> = OnceLock::new();
    let re = PARTITION_SEGMENT
        .get_or_init(|| Regex::new(r"(?:^|/)partition=(\d+)/").expect("valid partition regex"));

    if let Some(partition) = re
        .captures(name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
    {
        return partition;
    }

    match partition_count {
        Some(count) if count > 0 => (index % count as usize) as u32,
        _ => 0,
    }
}
