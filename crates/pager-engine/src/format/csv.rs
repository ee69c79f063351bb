use anyhow::Context;
use arrow::csv::reader::{Format, Reader, ReaderBuilder};
use bytes::Bytes;
use pager_sdk::FileReader;
use std::io::Cursor;
use std::sync::Arc;

use super::BatchScanner;

/// Delimited-text scanner over an opened file
pub type CsvScanner = BatchScanner<Reader<Cursor<Bytes>>>;

#[derive(Debug, Clone)]
pub struct CsvOptions {
    pub delimiter: u8,
    pub infer_records: usize,
    pub batch_size: Option<usize>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            infer_records: 100,
            batch_size: None,
        }
    }
}

impl CsvOptions {
    fn to_format(&self) -> Format {
        Format::default()
            .with_header(true)
            .with_delimiter(self.delimiter)
    }
}

/// Create a csv scanner; the schema is inferred from the header and the first records
pub fn scanner(reader: FileReader, options: &CsvOptions) -> anyhow::Result<CsvScanner> {
    let (info, data, cancel) = reader.into_parts();
    let format = options.to_format();

    let (schema, _) = format
        .infer_schema(Cursor::new(data.clone()), Some(options.infer_records))
        .with_context(|| format!("Failed to infer csv schema of '{}'", info.name))?;
    let schema = Arc::new(schema);

    let mut builder = ReaderBuilder::new(Arc::clone(&schema)).with_format(format);
    if let Some(batch_size) = options.batch_size {
        builder = builder.with_batch_size(batch_size);
    }
    let batches = builder
        .build(Cursor::new(data))
        .with_context(|| format!("Failed to open csv reader for '{}'", info.name))?;

    Ok(BatchScanner::new(batches, schema, cancel))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::DataType;
    use pager_sdk::{FileInfo, RecordScanner};
    use tokio_util::sync::CancellationToken;

    fn open(name: &str, body: &str, options: &CsvOptions) -> CsvScanner {
        let data = Bytes::from(body.to_string());
        let info = FileInfo::new(name, "article", 0, data.len() as u64);
        scanner(FileReader::new(info, data, CancellationToken::new()), options).unwrap()
    }

    #[test]
    fn infers_types_from_rows() {
        let scanner = open(
            "tables/article/article1.csv",
            "title,count,deleted\narticle1,22,false\narticle2,3,true\n",
            &CsvOptions::default(),
        );
        let schema = scanner.schema().clone();
        assert_eq!(schema.field(0).data_type(), &DataType::Utf8);
        assert_eq!(schema.field(1).data_type(), &DataType::Int64);
        assert_eq!(schema.field(2).data_type(), &DataType::Boolean);

        let records: Vec<_> = scanner.map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get_str("title"), Some("article1"));
        assert_eq!(records[0].get_i64("count"), Some(22));
        assert_eq!(records[1].get_bool("deleted"), Some(true));
    }

    #[test]
    fn honours_delimiter() {
        let options = CsvOptions {
            delimiter: b'|',
            ..Default::default()
        };
        let mut scanner = open("tables/user/user1.csv", "id|name\n7|aaron\n", &options);
        let record = scanner.next().unwrap().unwrap();
        assert_eq!(record.get_i64("id"), Some(7));
        assert_eq!(record.get_str("name"), Some("aaron"));
        assert!(scanner.next().is_none());
    }

    #[test]
    fn header_only_file_has_columns_but_no_records() {
        let mut scanner = open("tables/user/empty.csv", "id,name\n", &CsvOptions::default());
        let columns: Vec<_> = scanner
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect();
        assert_eq!(columns, vec!["id", "name"]);
        assert!(scanner.next().is_none());
    }
}
