use crate::{FileReader, Record, Result};
use arrow_schema::SchemaRef;

/// Record scanner over a single opened file
/// Returns records one by one (generator-like API); `None` means the file is exhausted
pub trait RecordScanner: Iterator<Item = Result<Record>> + Send {
    /// Schema of the records this scanner produces
    fn schema(&self) -> &SchemaRef;
}

/// Turns an opened file into a record scanner for its format
pub trait FileHandler: Send + Sync {
    fn scanner(&self, reader: FileReader) -> Result<Box<dyn RecordScanner>>;
}
