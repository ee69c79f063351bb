use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use pager_engine::{FileRow, FileSource, ObjectFileStore, Pager, SourcePlan};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::config::PagerConfig;

mod manifest;
pub use manifest::ScanManifest;

/// File source over the configured local store
pub fn open_source(config: &PagerConfig) -> Result<Arc<FileSource>> {
    let store = ObjectFileStore::local(&config.store.root)?;
    let source = FileSource::from_spec(Arc::new(store), config.source.clone())
        .context("Failed to create file source")?;
    Ok(Arc::new(source))
}

pub async fn list_tables(config: &PagerConfig) -> Result<()> {
    let source = open_source(config)?;
    let tables = source.tables().await?;
    if tables.is_empty() {
        println!("No tables under {:?}", config.store.root.join(&config.source.prefix));
    }
    for table in tables {
        println!("{}", table);
    }
    Ok(())
}

pub async fn list_files(config: &PagerConfig, table: &str) -> Result<()> {
    let source = open_source(config)?;
    let files = source
        .list_files(table)
        .await
        .with_context(|| format!("Failed to list files of table '{}'", table))?;
    for info in &files {
        println!("{}", serde_json::to_string(&FileRow::from(info))?);
    }
    Ok(())
}

pub async fn show_columns(config: &PagerConfig, table: &str) -> Result<()> {
    let source = open_source(config)?;
    let mut pager = source.pager(table);
    let columns = pager.columns().await;
    if columns.is_empty() {
        anyhow::bail!("Table '{}' not found or has no columns", table);
    }
    for column in columns {
        println!("{}", column);
    }
    Ok(())
}

/// Stream one partition of a table to JSONL
///
/// Ctrl-C stops the scan; the records written so far are kept and the
/// manifest marks the scan as cancelled.
pub async fn run_scan(config: &PagerConfig, table: &str) -> Result<ScanManifest> {
    let source = open_source(config)?;
    let scan = &config.scan;

    let mut pager = source.pager(table);
    let plan = SourcePlan::with_partition(scan.partition.map_or(-1, i64::from));
    pager.accept_plan(&plan);

    let mut manifest = ScanManifest::new(table.to_string(), pager.partition());
    manifest.output_path = scan.output.as_ref().map(|p| p.display().to_string());

    let token = pager.cancellation();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, stopping scan");
            token.cancel();
        }
    });

    let (mut out, pb): (Box<dyn Write + Send>, Option<ProgressBar>) = match &scan.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {:?}", path))?;
            let pb = ProgressBar::new_spinner();
            pb.set_style(ProgressStyle::default_spinner().template(
                "{spinner:.green} [{elapsed_precise}] {pos} records {msg}",
            )?);
            pb.enable_steady_tick(Duration::from_millis(120));
            (Box::new(BufWriter::new(file)), Some(pb))
        }
        None => (Box::new(BufWriter::new(std::io::stdout())), None),
    };

    let start = Instant::now();
    let result = copy_records(&mut pager, &mut out, scan.limit, pb.as_ref()).await;
    manifest.cancelled = pager.cancellation().is_cancelled();
    pager.close();
    ctrl_c.abort();
    if let Some(pb) = &pb {
        pb.finish_and_clear();
    }

    let copied = result?;
    out.flush().context("Failed to flush output")?;

    let rows = copied.rows;
    manifest.rows = rows;
    manifest.files_scanned = pager.files_scanned();
    manifest.limited = copied.limited;
    manifest.error = pager
        .take_error()
        .map(|err| format!("{:#}", anyhow::Error::from(err)));
    manifest.elapsed_ms = start.elapsed().as_millis() as u64;

    info!(
        table,
        partition = ?manifest.partition,
        rows,
        files = manifest.files_scanned,
        elapsed_ms = manifest.elapsed_ms,
        "scan finished"
    );
    if let Some(path) = &scan.output {
        println!("✓ Wrote {} records from {} files to {:?}", rows, manifest.files_scanned, path);
    }

    if let Some(path) = &scan.manifest {
        manifest
            .write_to_file(path)
            .with_context(|| format!("Failed to write manifest: {:?}", path))?;
    }

    Ok(manifest)
}

struct Copied {
    rows: u64,
    /// Stopped at the limit with records left over
    limited: bool,
}

async fn copy_records(
    pager: &mut Pager,
    out: &mut Box<dyn Write + Send>,
    limit: Option<u64>,
    pb: Option<&ProgressBar>,
) -> Result<Copied> {
    let mut rows = 0u64;
    loop {
        let Some(record) = pager.next_record().await else {
            return Ok(Copied {
                rows,
                limited: false,
            });
        };
        if limit.is_some_and(|limit| rows >= limit) {
            return Ok(Copied {
                rows,
                limited: true,
            });
        }

        serde_json::to_writer(&mut *out, record.as_value())?;
        out.write_all(b"\n")?;
        rows += 1;

        if let Some(pb) = pb {
            pb.inc(1);
            if let Some(info) = pager.current_file() {
                pb.set_message(info.name.clone());
            }
        }
    }
}
