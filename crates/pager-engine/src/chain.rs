use std::sync::Arc;

use pager_sdk::{FileHandler, FileInfo, Record, RecordScanner};
use tracing::{debug, error, info};

use crate::error::PagerError;
use crate::fetch::{FetchQueue, Fetched};

/// Stitches the scanners of the queued files into one record stream
///
/// Each file's records are exhausted before the next file is dequeued. The
/// stream ends for good on end of catalog, cancellation or the first error.
pub struct ScannerChain {
    queue: FetchQueue,
    handler: Arc<dyn FileHandler>,
    current: Option<Box<dyn RecordScanner>>,
    current_file: Option<FileInfo>,
    started: bool,
    finished: bool,
    rows: u64,
    files_scanned: u64,
    error: Option<PagerError>,
}

impl ScannerChain {
    pub fn new(queue: FetchQueue, handler: Arc<dyn FileHandler>) -> Self {
        Self {
            queue,
            handler,
            current: None,
            current_file: None,
            started: false,
            finished: false,
            rows: 0,
            files_scanned: 0,
            error: None,
        }
    }

    /// Next record of the stream, `None` once the stream has ended
    pub async fn next_record(&mut self) -> Option<Record> {
        if self.finished {
            return None;
        }
        if !self.started {
            self.started = true;
            if !self.step().await {
                return None;
            }
        }

        loop {
            let next = match self.current.as_mut() {
                Some(scanner) => scanner.next(),
                None => return None,
            };

            match next {
                Some(Ok(record)) => {
                    self.rows += 1;
                    return Some(record);
                }
                Some(Err(source)) => {
                    let name = self
                        .current_file
                        .as_ref()
                        .map(|info| info.name.clone())
                        .unwrap_or_default();
                    self.finish(Some(PagerError::Scan { name, source }));
                    return None;
                }
                // File exhausted, possibly without a single record; move on
                None => {
                    if !self.step().await {
                        return None;
                    }
                }
            }
        }
    }

    /// Dequeue the next file and open its scanner
    ///
    /// `Ok(false)` means the stream is over.
    async fn advance(&mut self) -> Result<bool, PagerError> {
        // release the exhausted file before waiting on the next one
        self.current = None;
        self.current_file = None;

        match self.queue.pop().await {
            Fetched::File(reader) => {
                let info = reader.info().clone();
                let scanner = self
                    .handler
                    .scanner(reader)
                    .map_err(|source| PagerError::Scanner {
                        name: info.name.clone(),
                        source,
                    })?;
                debug!(file = %info.name, partition = info.partition, "scanning next file");
                self.files_scanned += 1;
                self.current = Some(scanner);
                self.current_file = Some(info);
                Ok(true)
            }
            Fetched::EndOfCatalog => Ok(false),
            Fetched::Cancelled => {
                debug!(rows = self.rows, "scan cancelled");
                Ok(false)
            }
            Fetched::Failed(err) => Err(err.into()),
        }
    }

    /// Advance, ending the chain on end of stream or error
    async fn step(&mut self) -> bool {
        match self.advance().await {
            Ok(true) => true,
            Ok(false) => {
                self.finish(None);
                false
            }
            Err(err) => {
                self.finish(Some(err));
                false
            }
        }
    }

    fn finish(&mut self, error: Option<PagerError>) {
        self.finished = true;
        self.current = None;
        self.current_file = None;
        self.queue.close();

        match error {
            Some(err) => {
                error!(error = %err, cause = ?std::error::Error::source(&err), rows = self.rows, "unexpected end of scan");
                self.error = Some(err);
            }
            None => info!(rows = self.rows, files = self.files_scanned, "end of stream"),
        }
    }

    /// End the stream now, dropping the current scanner and any queued files
    pub fn close(&mut self) {
        if !self.finished {
            self.finish(None);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn files_scanned(&self) -> u64 {
        self.files_scanned
    }

    /// File whose records are currently being returned
    pub fn current_file(&self) -> Option<&FileInfo> {
        self.current_file.as_ref()
    }

    /// Error that ended the stream, if any
    pub fn error(&self) -> Option<&PagerError> {
        self.error.as_ref()
    }

    pub fn take_error(&mut self) -> Option<PagerError> {
        self.error.take()
    }
}
