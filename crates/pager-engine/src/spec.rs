use serde::{Deserialize, Serialize};

/// Default number of opened files a pager buffers ahead of its consumer
pub const DEFAULT_BUFFER_SIZE: usize = 5;

/// How a table's files are discovered, partitioned and decoded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSpec {
    /// `auto` picks the decoder from each file's extension
    #[serde(default = "default_format")]
    pub format: String,
    /// Tables live in `{prefix}/{table}/`
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Glob matched against file names (last path segment), e.g. "*.csv"
    #[serde(default)]
    pub file_pattern: Option<String>,
    /// Files without a `partition=N` path segment are spread round-robin over this many partitions
    #[serde(default)]
    pub partition_count: Option<u32>,
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    #[serde(default = "default_csv_delimiter")]
    pub csv_delimiter: char,
    /// Number of records read to infer a csv schema
    #[serde(default = "default_infer_records")]
    pub infer_records: usize,
}

impl Default for SourceSpec {
    fn default() -> Self {
        Self {
            format: default_format(),
            prefix: default_prefix(),
            file_pattern: None,
            partition_count: None,
            buffer_size: default_buffer_size(),
            csv_delimiter: default_csv_delimiter(),
            infer_records: default_infer_records(),
        }
    }
}

impl SourceSpec {
    /// Object prefix holding the files of `table`
    pub fn table_prefix(&self, table: &str) -> String {
        let prefix = self.prefix.trim_matches('/');
        if prefix.is_empty() {
            format!("{table}/")
        } else {
            format!("{prefix}/{table}/")
        }
    }

    /// Object prefix holding all tables
    pub fn root_prefix(&self) -> String {
        let prefix = self.prefix.trim_matches('/');
        if prefix.is_empty() {
            String::new()
        } else {
            format!("{prefix}/")
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.buffer_size == 0 {
            anyhow::bail!("buffer_size must be at least 1");
        }
        if self.partition_count == Some(0) {
            anyhow::bail!("partition_count must be at least 1 when set");
        }
        if self.infer_records == 0 {
            anyhow::bail!("infer_records must be at least 1");
        }
        crate::format::Format::parse(&self.format)?;
        if !self.csv_delimiter.is_ascii() {
            return Err(crate::error::FormatError::Delimiter(self.csv_delimiter).into());
        }
        if let Some(pattern) = &self.file_pattern {
            glob::Pattern::new(pattern)
                .map_err(|e| anyhow::anyhow!("invalid file_pattern '{}': {}", pattern, e))?;
        }
        Ok(())
    }
}

fn default_format() -> String {
    "auto".to_string()
}

fn default_prefix() -> String {
    "tables".to_string()
}

fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}

fn default_csv_delimiter() -> char {
    ','
}

fn default_infer_records() -> usize {
    100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let spec: SourceSpec = serde_yaml::from_str("format: csv\npartition_count: 4\n").unwrap();
        assert_eq!(spec.format, "csv");
        assert_eq!(spec.partition_count, Some(4));
        assert_eq!(spec.buffer_size, DEFAULT_BUFFER_SIZE);
        assert_eq!(spec.prefix, "tables");
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn table_prefix_handles_slashes() {
        let mut spec = SourceSpec::default();
        assert_eq!(spec.table_prefix("article"), "tables/article/");

        spec.prefix = "/data/tables/".to_string();
        assert_eq!(spec.table_prefix("article"), "data/tables/article/");

        spec.prefix = String::new();
        assert_eq!(spec.table_prefix("article"), "article/");
        assert_eq!(spec.root_prefix(), "");
    }

    #[test]
    fn rejects_bad_values() {
        let spec = SourceSpec {
            buffer_size: 0,
            ..Default::default()
        };
        assert!(spec.validate().is_err());

        let spec = SourceSpec {
            format: "xml".to_string(),
            ..Default::default()
        };
        assert!(spec.validate().is_err());

        let spec = SourceSpec {
            file_pattern: Some("[".to_string()),
            ..Default::default()
        };
        assert!(spec.validate().is_err());
    }
}
