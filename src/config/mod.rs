use anyhow::{Context, Result};
use pager_engine::SourceSpec;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration of an `fpager` run, usually loaded from YAML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PagerConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub source: SourceSpec,
    #[serde(default)]
    pub scan: ScanConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Local directory the object store is rooted at
    #[serde(default = "default_root")]
    pub root: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanConfig {
    pub table: Option<String>,
    /// Partition to scan, all partitions when unset
    pub partition: Option<u32>,
    /// Stop after this many records
    pub limit: Option<u64>,
    /// JSONL output file, stdout when unset
    pub output: Option<PathBuf>,
    /// Where to write the scan manifest
    pub manifest: Option<PathBuf>,
}

impl PagerConfig {
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: PagerConfig =
            serde_yaml::from_str(content).context("Failed to parse YAML configuration")?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.source
            .validate()
            .context("Invalid source configuration")?;

        if let Some(table) = &self.scan.table {
            if table.trim().is_empty() || table.contains('/') {
                anyhow::bail!("Invalid scan table name: '{}'", table);
            }
        }
        if self.scan.limit == Some(0) {
            anyhow::bail!("Scan limit must be greater than zero");
        }

        Ok(())
    }

    /// Table to scan, from the command line or the configuration
    pub fn scan_table(&self, table: Option<String>) -> Result<String> {
        table
            .or_else(|| self.scan.table.clone())
            .context("No table to scan: pass --table or set scan.table")
    }
}
