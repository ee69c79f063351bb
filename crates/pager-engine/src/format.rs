use pager_sdk::{FileHandler, FileInfo, FileReader, RecordScanner};

use crate::error::FormatError;
use crate::spec::SourceSpec;

// Record scanners for the supported file formats
pub mod batch;
pub mod csv;
pub mod jsonl;
pub mod parquet;

pub use self::batch::BatchScanner;
pub use self::csv::{CsvOptions, CsvScanner};
pub use self::jsonl::JsonlScanner;
pub use self::parquet::ParquetScanner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Csv,
    Jsonl,
    Parquet,
}

impl Format {
    /// Parse a configured format name; `auto` yields `None`
    pub fn parse(kind: &str) -> Result<Option<Self>, FormatError> {
        match kind.to_ascii_lowercase().as_str() {
            "auto" | "" => Ok(None),
            "csv" => Ok(Some(Format::Csv)),
            "jsonl" | "json" | "ndjson" => Ok(Some(Format::Jsonl)),
            "parquet" => Ok(Some(Format::Parquet)),
            other => Err(FormatError::Unknown(other.to_string())),
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "csv" => Some(Format::Csv),
            "jsonl" | "json" | "ndjson" => Some(Format::Jsonl),
            "parquet" => Some(Format::Parquet),
            _ => None,
        }
    }
}

/// File handler that decodes csv, jsonl and parquet files
///
/// With a fixed format every file is decoded the same way, otherwise the
/// format is picked per file from its extension.
#[derive(Debug, Clone)]
pub struct FormatHandler {
    format: Option<Format>,
    csv: CsvOptions,
}

impl FormatHandler {
    pub fn new(format: Option<Format>, csv: CsvOptions) -> Self {
        Self { format, csv }
    }

    /// Pick the decoder from each file's extension
    pub fn auto() -> Self {
        Self::new(None, CsvOptions::default())
    }

    pub fn from_spec(spec: &SourceSpec) -> Result<Self, FormatError> {
        let format = Format::parse(&spec.format)?;
        if !spec.csv_delimiter.is_ascii() {
            return Err(FormatError::Delimiter(spec.csv_delimiter));
        }
        let csv = CsvOptions {
            delimiter: spec.csv_delimiter as u8,
            infer_records: spec.infer_records,
            ..Default::default()
        };
        Ok(Self::new(format, csv))
    }

    pub fn format_for(&self, info: &FileInfo) -> Result<Format, FormatError> {
        if let Some(format) = self.format {
            return Ok(format);
        }
        info.extension()
            .and_then(|ext| Format::from_extension(&ext))
            .ok_or_else(|| FormatError::Undetermined(info.name.clone()))
    }
}

impl FileHandler for FormatHandler {
    fn scanner(&self, reader: FileReader) -> anyhow::Result<Box<dyn RecordScanner>> {
        let scanner: Box<dyn RecordScanner> = match self.format_for(reader.info())? {
            Format::Csv => Box::new(self::csv::scanner(reader, &self.csv)?),
            Format::Jsonl => Box::new(JsonlScanner::new(reader)?),
            Format::Parquet => Box::new(self::parquet::scanner(reader, self.csv.batch_size)?),
        };
        Ok(scanner)
    }
}
