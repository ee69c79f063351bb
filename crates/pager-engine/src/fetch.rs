//! Bounded fetch queue and the background worker that fills it.
//!
//! The worker walks a table's catalog in order, opens the files that belong to
//! the pager's partition and hands them to the consumer through a bounded
//! channel. A queue slot is reserved before a file is opened, so at most
//! `capacity` files are ever opened ahead of the consumer.

use std::sync::Arc;
use std::time::Instant;

use pager_sdk::{FileInfo, FileReader, FileStore};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::AbortOnDropHandle;
use tracing::{debug, error, instrument, trace};

use crate::error::FetchError;

/// Values travelling through the fetch queue
#[derive(Debug)]
pub enum Fetched {
    /// An opened file, ready to scan
    File(FileReader),
    /// The catalog is exhausted, nothing else will arrive
    EndOfCatalog,
    /// The worker failed and stopped
    Failed(FetchError),
    /// The cancellation signal fired; produced by the consumer side only
    Cancelled,
}

/// Consumer end of the fetch queue
pub struct FetchQueue {
    rx: mpsc::Receiver<Fetched>,
    cancel: CancellationToken,
}

impl FetchQueue {
    /// Wait for the next value, or for cancellation, whichever comes first
    ///
    /// A worker that went away without a terminal value is reported as
    /// `Failed(WorkerGone)`.
    pub async fn pop(&mut self) -> Fetched {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Fetched::Cancelled,
            next = self.rx.recv() => next.unwrap_or(Fetched::Failed(FetchError::WorkerGone)),
        }
    }

    /// Stop accepting values and release the files already queued
    ///
    /// A worker waiting for a slot gives up.
    pub fn close(&mut self) {
        self.rx.close();
        while self.rx.try_recv().is_ok() {}
    }
}

/// Spawn the fetch worker for `files` on the current tokio runtime
///
/// Dropping the returned handle aborts the worker.
pub fn spawn(
    table: impl Into<String>,
    files: Vec<FileInfo>,
    partition: Option<u32>,
    store: Arc<dyn FileStore>,
    capacity: usize,
    cancel: CancellationToken,
) -> (FetchQueue, AbortOnDropHandle<()>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let fetcher = Fetcher {
        table: table.into(),
        files,
        cursor: 0,
        partition,
        store,
        tx,
        cancel: cancel.clone(),
    };
    let handle = AbortOnDropHandle::new(tokio::spawn(fetcher.run()));
    (FetchQueue { rx, cancel }, handle)
}

struct Fetcher {
    table: String,
    files: Vec<FileInfo>,
    /// Next catalog index to examine, only moves forward
    cursor: usize,
    partition: Option<u32>,
    store: Arc<dyn FileStore>,
    tx: mpsc::Sender<Fetched>,
    cancel: CancellationToken,
}

impl Fetcher {
    /// Next file of our partition, skipping the others without opening them
    fn next_matching(&mut self) -> Option<FileInfo> {
        while let Some(info) = self.files.get(self.cursor) {
            self.cursor += 1;
            if info.in_partition(self.partition) {
                return Some(info.clone());
            }
            trace!(file = %info.name, partition = info.partition, "skipping file of other partition");
        }
        None
    }

    #[instrument(skip(self), fields(table = %self.table, partition = ?self.partition))]
    async fn run(mut self) {
        loop {
            if self.cancel.is_cancelled() {
                debug!(cursor = self.cursor, "fetcher cancelled");
                return;
            }

            let next = self.next_matching();

            // Backpressure: wait for a free slot before opening anything
            let permit = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!(cursor = self.cursor, "fetcher cancelled");
                    return;
                }
                permit = self.tx.reserve() => match permit {
                    Ok(permit) => permit,
                    Err(_) => {
                        debug!("fetch queue closed");
                        return;
                    }
                },
            };

            let Some(info) = next else {
                debug!(files = self.files.len(), "catalog exhausted");
                permit.send(Fetched::EndOfCatalog);
                return;
            };

            let start = Instant::now();
            let opened = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!(file = %info.name, "fetcher cancelled while opening");
                    return;
                }
                opened = self.store.open(&info.name) => opened,
            };

            match opened {
                Ok(data) => {
                    debug!(
                        file = %info.name,
                        bytes = data.len(),
                        took_ms = start.elapsed().as_millis() as u64,
                        "found file"
                    );
                    let reader = FileReader::new(info, data, self.cancel.child_token());
                    permit.send(Fetched::File(reader));
                }
                Err(err) => {
                    error!(file = %info.name, error = %format!("{err:#}"), "could not read file");
                    permit.send(Fetched::Failed(FetchError::Open {
                        table: self.table.clone(),
                        name: info.name,
                        source: err,
                    }));
                    return;
                }
            }
        }
    }
}
