use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use bytes::Bytes;
use pager_sdk::{FileReader, Record, RecordScanner};
use serde_json::Value;
use std::io::{BufRead, Cursor};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Newline-delimited JSON scanner over an opened file
pub struct JsonlScanner {
    name: String,
    reader: Cursor<Bytes>,
    schema: SchemaRef,
    current_line: Option<String>,
    line_no: usize,
    cancel: CancellationToken,
}

impl JsonlScanner {
    /// Create a new JsonlScanner from an opened file
    /// The schema is inferred from the first non-blank line
    pub fn new(reader: FileReader) -> anyhow::Result<Self> {
        let (info, data, cancel) = reader.into_parts();
        let mut scanner = Self {
            name: info.name,
            reader: Cursor::new(data),
            schema: Arc::new(Schema::empty()),
            current_line: None,
            line_no: 0,
            cancel,
        };

        if let Some(first_line) = scanner.read_line()? {
            let first_json: Value = serde_json::from_str(&first_line).map_err(|e| {
                anyhow::anyhow!("Failed to parse JSON in '{}' line {}: {}", scanner.name, scanner.line_no, e)
            })?;
            scanner.schema = Self::infer_schema(&first_json);
            scanner.current_line = Some(first_line);
        }

        Ok(scanner)
    }

    /// Infer schema from a JSON value
    fn infer_schema(value: &Value) -> SchemaRef {
        if let Value::Object(map) = value {
            let fields: Vec<Field> = map
                .iter()
                .map(|(name, val)| {
                    let data_type = match val {
                        Value::String(_) => DataType::Utf8,
                        Value::Number(n) if n.is_i64() => DataType::Int64,
                        Value::Number(_) => DataType::Float64,
                        Value::Bool(_) => DataType::Boolean,
                        _ => DataType::Utf8, // Default to string for arrays/objects/null
                    };
                    Field::new(name, data_type, true)
                })
                .collect();
            Arc::new(Schema::new(fields))
        } else {
            Arc::new(Schema::empty())
        }
    }

    /// Next non-blank line, `None` at end of file
    fn read_line(&mut self) -> anyhow::Result<Option<String>> {
        loop {
            let mut line = String::new();
            let read = self
                .reader
                .read_line(&mut line)
                .map_err(|e| anyhow::anyhow!("Failed to read line: {}", e))?;
            if read == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            if !line.trim().is_empty() {
                return Ok(Some(line));
            }
        }
    }

    fn parse(&self, line: &str) -> anyhow::Result<Record> {
        let value: Value = serde_json::from_str(line).map_err(|e| {
            anyhow::anyhow!("Failed to parse JSON in '{}' line {}: {}", self.name, self.line_no, e)
        })?;
        Record::from_value(value).ok_or_else(|| {
            anyhow::anyhow!("Line {} of '{}' is not a JSON object", self.line_no, self.name)
        })
    }
}

impl Iterator for JsonlScanner {
    type Item = anyhow::Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cancel.is_cancelled() {
            return None;
        }

        // Return the line read during schema inference first
        let line = match self.current_line.take() {
            Some(line) => line,
            None => match self.read_line() {
                Ok(Some(line)) => line,
                Ok(None) => return None,
                Err(e) => return Some(Err(e)),
            },
        };
        Some(self.parse(&line))
    }
}

impl RecordScanner for JsonlScanner {
    fn schema(&self) -> &SchemaRef {
        &self.schema
    }
}
