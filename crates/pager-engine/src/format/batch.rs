use arrow::array::*;
use arrow::datatypes::{DataType, SchemaRef};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;
use pager_sdk::{Record, RecordScanner};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

/// Record scanner over any source of arrow record batches
///
/// Used by the csv and parquet decoders: batches are pulled lazily and each
/// row is turned into a `Record`.
pub struct BatchScanner<I> {
    batches: I,
    schema: SchemaRef,
    current_batch: Option<RecordBatch>,
    current_row: usize,
    cancel: CancellationToken,
}

impl<I> BatchScanner<I>
where
    I: Iterator<Item = Result<RecordBatch, ArrowError>>,
{
    pub fn new(batches: I, schema: SchemaRef, cancel: CancellationToken) -> Self {
        Self {
            batches,
            schema,
            current_batch: None,
            current_row: 0,
            cancel,
        }
    }

    /// Load the next non-empty batch if the current one is used up
    fn ensure_batch(&mut self) -> anyhow::Result<bool> {
        loop {
            if let Some(ref batch) = self.current_batch {
                if self.current_row < batch.num_rows() {
                    return Ok(true);
                }
            }

            match self.batches.next() {
                Some(Ok(batch)) => {
                    self.current_batch = Some(batch);
                    self.current_row = 0;
                }
                Some(Err(e)) => return Err(anyhow::anyhow!("Error reading batch: {}", e)),
                None => {
                    self.current_batch = None;
                    return Ok(false);
                }
            }
        }
    }
}

/// Convert one row of a batch to a record keyed by column name
pub fn row_to_record(batch: &RecordBatch, row_idx: usize) -> Record {
    let schema = batch.schema();
    let mut map = Map::with_capacity(schema.fields().len());

    for (col_idx, field) in schema.fields().iter().enumerate() {
        let value = cell_value(batch.column(col_idx).as_ref(), row_idx);
        map.insert(field.name().clone(), value);
    }

    Record(Value::Object(map))
}

fn cell_value(array: &dyn Array, row_idx: usize) -> Value {
    if array.is_null(row_idx) {
        return Value::Null;
    }

    let value = match array.data_type() {
        DataType::Utf8 => array
            .as_any()
            .downcast_ref::<StringArray>()
            .map(|arr| Value::String(arr.value(row_idx).to_string())),
        DataType::LargeUtf8 => array
            .as_any()
            .downcast_ref::<LargeStringArray>()
            .map(|arr| Value::String(arr.value(row_idx).to_string())),
        DataType::Int64 => array
            .as_any()
            .downcast_ref::<Int64Array>()
            .map(|arr| Value::Number(arr.value(row_idx).into())),
        DataType::Int32 => array
            .as_any()
            .downcast_ref::<Int32Array>()
            .map(|arr| Value::Number(arr.value(row_idx).into())),
        // NaN and infinities have no JSON representation
        DataType::Float64 => array
            .as_any()
            .downcast_ref::<Float64Array>()
            .map(|arr| {
                serde_json::Number::from_f64(arr.value(row_idx))
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }),
        DataType::Boolean => array
            .as_any()
            .downcast_ref::<BooleanArray>()
            .map(|arr| Value::Bool(arr.value(row_idx))),
        _ => None,
    };

    // Dates, timestamps and nested types fall back to their display form
    value.unwrap_or_else(|| {
        array_value_to_string(array, row_idx)
            .map(Value::String)
            .unwrap_or(Value::Null)
    })
}

impl<I> Iterator for BatchScanner<I>
where
    I: Iterator<Item = Result<RecordBatch, ArrowError>>,
{
    type Item = anyhow::Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cancel.is_cancelled() {
            return None;
        }

        match self.ensure_batch() {
            Ok(true) => {
                let batch = self.current_batch.as_ref()?;
                let record = row_to_record(batch, self.current_row);
                self.current_row += 1;
                Some(Ok(record))
            }
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

impl<I> RecordScanner for BatchScanner<I>
where
    I: Iterator<Item = Result<RecordBatch, ArrowError>> + Send,
{
    fn schema(&self) -> &SchemaRef {
        &self.schema
    }
}
