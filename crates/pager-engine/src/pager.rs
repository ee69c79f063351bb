use std::sync::Arc;

use futures::Stream;
use pager_sdk::{FileInfo, Record};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tokio_util::task::AbortOnDropHandle;
use tracing::{debug, error, info, warn};

use crate::chain::ScannerChain;
use crate::error::PagerError;
use crate::fetch;
use crate::source::{FileSource, Table};

/// Source plan handed over by the execution framework
///
/// Carries free-form planner context; the pager reads the `partition` entry
/// (an integer, negative meaning all partitions).
#[derive(Debug, Clone, Default)]
pub struct SourcePlan {
    pub custom: Map<String, Value>,
}

impl SourcePlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_partition(partition: i64) -> Self {
        let mut plan = Self::new();
        plan.custom
            .insert("partition".to_string(), Value::from(partition));
        plan
    }

    pub fn partition(&self) -> Option<i64> {
        self.custom.get("partition")?.as_i64()
    }
}

/// Partitioned pager over one table of a `FileSource`
///
/// Pages through the table's files, scanning only those of its partition,
/// and exposes their records as one flat stream. Files are opened by a
/// background worker up to `buffer_size` files ahead of the consumer.
///
/// A pager has a single consumer: `next_record` takes `&mut self`. It must be
/// driven from within a tokio runtime.
pub struct Pager {
    table: String,
    source: Arc<FileSource>,
    partition: Option<u32>,
    plan: Option<SourcePlan>,
    table_info: Option<Table>,
    cancel: CancellationToken,
    chain: Option<ScannerChain>,
    worker: Option<AbortOnDropHandle<()>>,
    started: bool,
    closed: bool,
    error: Option<PagerError>,
}

impl Pager {
    /// New pager over `table`, with no partition filter
    pub fn new(table: impl Into<String>, source: Arc<FileSource>) -> Self {
        Self {
            table: table.into(),
            source,
            partition: None,
            plan: None,
            table_info: None,
            cancel: CancellationToken::new(),
            chain: None,
            worker: None,
            started: false,
            closed: false,
            error: None,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Assigned partition, `None` when scanning all partitions
    pub fn partition(&self) -> Option<u32> {
        self.partition
    }

    /// Restrict the pager to one partition
    ///
    /// The first assignment wins; later ones, and any made after the scan
    /// started, are logged and ignored.
    pub fn assign_partition(&mut self, partition: u32) {
        if self.started {
            warn!(table = %self.table, partition, "pager already started, partition ignored");
            return;
        }
        match self.partition {
            Some(current) if current == partition => {}
            Some(current) => {
                warn!(table = %self.table, current, partition, "partition already assigned, ignoring");
            }
            None => self.partition = Some(partition),
        }
    }

    /// Accept the execution plan for this source, only the first one counts
    pub fn accept_plan(&mut self, plan: &SourcePlan) {
        if self.plan.is_some() {
            warn!(table = %self.table, custom = ?plan.custom, "source plan already accepted, ignoring");
            return;
        }
        self.plan = Some(plan.clone());

        match plan.partition() {
            Some(partition) if partition >= 0 => match u32::try_from(partition) {
                Ok(partition) => self.assign_partition(partition),
                Err(_) => warn!(table = %self.table, partition, "partition out of range, ignoring"),
            },
            // negative or missing: scan every partition
            _ => {}
        }
    }

    /// Column names of the table, resolved once from the source
    ///
    /// Returns an empty list when the table cannot be resolved.
    pub async fn columns(&mut self) -> Vec<String> {
        self.resolve_table()
            .await
            .map(|table| table.columns.clone())
            .unwrap_or_default()
    }

    /// The resolved table, cached after the first successful lookup
    pub async fn resolve_table(&mut self) -> Option<&Table> {
        if self.table_info.is_none() {
            match self.source.resolve_table(&self.table).await {
                Ok(table) => self.table_info = Some(table),
                Err(err) => {
                    warn!(table = %self.table, error = %err, cause = ?std::error::Error::source(&err), "error getting table");
                    return None;
                }
            }
        }
        self.table_info.as_ref()
    }

    /// List the table's files and start the fetch worker
    ///
    /// Called by the first `next_record`; starting twice is a no-op.
    pub async fn start(&mut self) -> Result<(), PagerError> {
        if self.started {
            return Ok(());
        }
        self.started = true;

        let files = self
            .source
            .list_files(&self.table)
            .await
            .map_err(|source| PagerError::ListFiles {
                table: self.table.clone(),
                source,
            })?;

        let capacity = self.source.spec().buffer_size;
        info!(
            table = %self.table,
            partition = ?self.partition,
            files = files.len(),
            capacity,
            "starting pager"
        );

        let (queue, worker) = fetch::spawn(
            self.table.clone(),
            files,
            self.partition,
            Arc::clone(self.source.store()),
            capacity,
            self.cancel.clone(),
        );
        self.worker = Some(worker);
        self.chain = Some(ScannerChain::new(queue, Arc::clone(self.source.handler())));
        Ok(())
    }

    /// Next record of the table, `None` at end of stream
    ///
    /// End of stream is permanent. It is also how failures surface: see
    /// `last_error` to tell a complete scan from a truncated one.
    pub async fn next_record(&mut self) -> Option<Record> {
        if self.closed {
            return None;
        }
        if !self.started {
            if let Err(err) = self.start().await {
                error!(table = %self.table, error = %err, cause = ?std::error::Error::source(&err), "could not start pager");
                self.error = Some(err);
                return None;
            }
        }
        self.chain.as_mut()?.next_record().await
    }

    /// Stop the pager
    ///
    /// Signals the fetch worker and drops buffered files, without waiting for
    /// the worker to stop. Calling it again does nothing.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.cancel.cancel();
        if let Some(chain) = self.chain.as_mut() {
            chain.close();
        }
        debug!(table = %self.table, rows = self.row_count(), "pager closed");
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Whether the fetch worker is still running
    pub fn is_fetching(&self) -> bool {
        self.worker
            .as_ref()
            .map_or(false, |worker| !worker.is_finished())
    }

    /// Token that stops this pager when cancelled, for use from other tasks
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Records returned so far
    pub fn row_count(&self) -> u64 {
        self.chain.as_ref().map_or(0, |chain| chain.rows())
    }

    pub fn files_scanned(&self) -> u64 {
        self.chain.as_ref().map_or(0, |chain| chain.files_scanned())
    }

    pub fn current_file(&self) -> Option<&FileInfo> {
        self.chain.as_ref()?.current_file()
    }

    /// Error that ended the stream early, if any
    pub fn last_error(&self) -> Option<&PagerError> {
        self.error
            .as_ref()
            .or_else(|| self.chain.as_ref()?.error())
    }

    /// Take the error that ended the stream, leaving `last_error` empty
    pub fn take_error(&mut self) -> Option<PagerError> {
        self.error
            .take()
            .or_else(|| self.chain.as_mut()?.take_error())
    }

    /// Turn the pager into a stream of records
    pub fn into_stream(self) -> impl Stream<Item = Record> + Send {
        futures::stream::unfold(self, |mut pager| async move {
            let record = pager.next_record().await?;
            Some((record, pager))
        })
    }
}
