/// Errors raised by the background fetch worker
///
/// These travel through the fetch queue as a terminal value so the consumer
/// sees them instead of waiting on a worker that is gone.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The store refused to open a catalog file
    #[error("could not read '{name}' of table '{table}'")]
    Open {
        table: String,
        name: String,
        #[source]
        source: anyhow::Error,
    },

    /// The worker stopped without reporting end of catalog
    #[error("fetch worker stopped before the catalog was exhausted")]
    WorkerGone,
}

/// Errors that terminate a pager's record stream
///
/// The stream itself only ever reports end-of-stream; the error that caused it
/// is kept and exposed through `Pager::last_error`.
#[derive(Debug, thiserror::Error)]
pub enum PagerError {
    #[error("failed to list files of table '{table}'")]
    ListFiles {
        table: String,
        #[source]
        source: SourceError,
    },

    #[error("could not open file scanner for '{name}'")]
    Scanner {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("unexpected end of scan in '{name}'")]
    Scan {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Errors raised by the file source (catalog) operations
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to list objects under '{prefix}'")]
    List {
        prefix: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("table '{0}' not found")]
    TableNotFound(String),

    #[error("failed to read schema of '{name}'")]
    Schema {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("invalid file pattern '{pattern}'")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error(transparent)]
    Format(#[from] FormatError),
}

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("unknown file format '{0}', expected one of: auto, csv, jsonl, parquet")]
    Unknown(String),

    #[error("cannot determine the file format of '{0}'")]
    Undetermined(String),

    #[error("csv delimiter must be a single ascii character, got {0:?}")]
    Delimiter(char),
}
