use serde::{Deserialize, Serialize};
use std::path::Path;

/// Summary of one `fpager scan`, written as JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanManifest {
    pub table: String,
    pub partition: Option<u32>,
    pub output_path: Option<String>,
    pub rows: u64,
    pub files_scanned: u64,
    pub limited: bool,
    pub cancelled: bool,
    /// Why the scan ended early, if it did
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

impl ScanManifest {
    pub fn new(table: String, partition: Option<u32>) -> Self {
        Self {
            table,
            partition,
            output_path: None,
            rows: 0,
            files_scanned: 0,
            limited: false,
            cancelled: false,
            error: None,
            elapsed_ms: 0,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.error.is_none() && !self.cancelled
    }

    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");

        let mut manifest = ScanManifest::new("article".to_string(), Some(1));
        manifest.rows = 42;
        manifest.files_scanned = 3;
        manifest.write_to_file(&path).unwrap();

        let back: ScanManifest =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back.table, "article");
        assert_eq!(back.partition, Some(1));
        assert_eq!(back.rows, 42);
        assert!(back.is_complete());
    }
}
