pub mod file;
pub mod record;
pub mod scanner;
pub mod store;

pub use file::{FileInfo, FileReader};
pub use record::Record;
pub use scanner::{FileHandler, RecordScanner};
pub use store::{FileStore, StoreEntry};

// Re-export anyhow for convenience
pub use anyhow::{Error, Result};
