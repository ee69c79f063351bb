use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio_util::sync::CancellationToken;

/// Describes one file of a table's catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Full object name inside the store, e.g. `tables/article/article1.csv`
    pub name: String,
    pub table: String,
    pub partition: u32,
    pub size: u64,
}

impl FileInfo {
    pub fn new(name: impl Into<String>, table: impl Into<String>, partition: u32, size: u64) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            partition,
            size,
        }
    }

    /// Lower-cased file extension, if the name has one
    pub fn extension(&self) -> Option<String> {
        let file_name = self.name.rsplit('/').next()?;
        let (_, ext) = file_name.rsplit_once('.')?;
        Some(ext.to_ascii_lowercase())
    }

    /// `None` accepts every partition
    pub fn in_partition(&self, filter: Option<u32>) -> bool {
        filter.map_or(true, |partition| self.partition == partition)
    }
}

/// An opened file, ready to be handed to a record scanner
///
/// The object body is fetched when the reader is created, so holding a
/// `FileReader` holds the file's bytes; dropping it releases them.
pub struct FileReader {
    info: FileInfo,
    data: Bytes,
    cancel: CancellationToken,
}

impl FileReader {
    pub fn new(info: FileInfo, data: Bytes, cancel: CancellationToken) -> Self {
        Self { info, data, cancel }
    }

    pub fn info(&self) -> &FileInfo {
        &self.info
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Signal shared with the pager that opened this file
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn into_parts(self) -> (FileInfo, Bytes, CancellationToken) {
        (self.info, self.data, self.cancel)
    }
}

impl fmt::Debug for FileReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileReader")
            .field("info", &self.info)
            .field("len", &self.data.len())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}
