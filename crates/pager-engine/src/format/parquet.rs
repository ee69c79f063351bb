use ::parquet::arrow::arrow_reader::{ParquetRecordBatchReader, ParquetRecordBatchReaderBuilder};
use anyhow::Context;
use pager_sdk::FileReader;

use super::BatchScanner;

/// Parquet scanner over an opened file
pub type ParquetScanner = BatchScanner<ParquetRecordBatchReader>;

/// Create a parquet scanner
///
/// # Arguments
/// * `reader` - The opened file
/// * `batch_size` - Optional batch size for reading. If None, uses default batch size.
pub fn scanner(reader: FileReader, batch_size: Option<usize>) -> anyhow::Result<ParquetScanner> {
    let (info, data, cancel) = reader.into_parts();
    let mut builder = ParquetRecordBatchReaderBuilder::try_new(data)
        .with_context(|| format!("Failed to read parquet metadata of '{}'", info.name))?;

    // Set batch size if provided
    if let Some(size) = batch_size {
        builder = builder.with_batch_size(size);
    }

    let schema = builder.schema().clone();
    let batches = builder
        .build()
        .with_context(|| format!("Failed to open parquet reader for '{}'", info.name))?;

    Ok(BatchScanner::new(batches, schema, cancel))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::parquet::arrow::ArrowWriter;
    use arrow::array::{Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::record_batch::RecordBatch;
    use bytes::Bytes;
    use pager_sdk::{FileInfo, RecordScanner};
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    fn parquet_bytes() -> Bytes {
        let schema = Arc::new(Schema::new(vec![
            Field::new("playerID", DataType::Utf8, false),
            Field::new("yearID", DataType::Int64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["barnero01", "barrofr01", "birdsda01"])),
                Arc::new(Int64Array::from(vec![1871, 1871, 1872])),
            ],
        )
        .unwrap();

        let mut writer = ArrowWriter::try_new(Vec::new(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        Bytes::from(writer.into_inner().unwrap())
    }

    #[test]
    fn reads_rows_across_batches() {
        let data = parquet_bytes();
        let info = FileInfo::new("tables/appearances/part-0.parquet", "appearances", 0, data.len() as u64);
        let reader = FileReader::new(info, data, CancellationToken::new());
        let scanner = scanner(reader, Some(2)).unwrap();
        assert_eq!(scanner.schema().fields().len(), 2);

        let records: Vec<_> = scanner.map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].get_str("playerID"), Some("barnero01"));
        assert_eq!(records[2].get_i64("yearID"), Some(1872));
    }

    #[test]
    fn rejects_non_parquet_data() {
        let info = FileInfo::new("tables/appearances/bad.parquet", "appearances", 0, 4);
        let reader = FileReader::new(info, Bytes::from_static(b"nope"), CancellationToken::new());
        let err = scanner(reader, None).err().unwrap();
        assert!(err.to_string().contains("bad.parquet"));
    }
}
