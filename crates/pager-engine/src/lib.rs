pub mod chain;
pub mod error;
pub mod fetch;
pub mod format;
pub mod pager;
pub mod source;
pub mod spec;
pub mod store;

pub use chain::ScannerChain;
pub use error::{FetchError, FormatError, PagerError, SourceError};
pub use fetch::{FetchQueue, Fetched};
pub use format::{Format, FormatHandler};
pub use pager::{Pager, SourcePlan};
pub use source::{FileRow, FileSource, Table};
pub use spec::{SourceSpec, DEFAULT_BUFFER_SIZE};
pub use store::ObjectFileStore;
