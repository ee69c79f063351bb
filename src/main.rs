use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod config;
mod logging;
mod runtime;

use config::PagerConfig;

#[derive(Parser)]
#[command(name = "fpager")]
#[command(about = "Partitioned file pager - stream the records of object-store backed tables", long_about = None)]
struct Cli {
    /// Path to pager YAML file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory the tables live in, overrides store.root
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the tables of the store
    Tables,
    /// List the files of a table with their partitions
    Files {
        #[arg(short, long)]
        table: String,
    },
    /// Show the columns of a table
    Columns {
        #[arg(short, long)]
        table: String,
    },
    /// Stream the records of a table as JSONL
    Scan {
        #[arg(short, long)]
        table: Option<String>,
        /// Only scan this partition
        #[arg(short, long)]
        partition: Option<u32>,
        /// Stop after this many records
        #[arg(short, long)]
        limit: Option<u64>,
        /// Output file, stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Write a JSON scan manifest here
        #[arg(long)]
        manifest: Option<PathBuf>,
    },
    /// Validate a pager configuration
    Validate,
    /// Show version information
    Version,
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<PagerConfig> {
        let mut config = match &self.config {
            Some(path) => PagerConfig::from_yaml_file(path)?,
            None => PagerConfig::default(),
        };
        if let Some(root) = &self.root {
            config.store.root = root.clone();
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Tables => {
            runtime::list_tables(&cli.load_config()?).await?;
        }
        Commands::Files { table } => {
            runtime::list_files(&cli.load_config()?, table).await?;
        }
        Commands::Columns { table } => {
            runtime::show_columns(&cli.load_config()?, table).await?;
        }
        Commands::Scan {
            table,
            partition,
            limit,
            output,
            manifest,
        } => {
            let mut config = cli.load_config()?;
            let scan = &mut config.scan;
            scan.partition = partition.or(scan.partition);
            scan.limit = limit.or(scan.limit);
            scan.output = output.clone().or(scan.output.take());
            scan.manifest = manifest.clone().or(scan.manifest.take());
            config.validate()?;

            let table = config.scan_table(table.clone())?;
            let manifest = runtime::run_scan(&config, &table).await?;
            if !manifest.is_complete() {
                anyhow::bail!(
                    "Scan of '{}' did not complete: {}",
                    table,
                    manifest.error.as_deref().unwrap_or("interrupted")
                );
            }
        }
        Commands::Validate => {
            let config = cli.load_config()?;
            runtime::open_source(&config)?;
            println!("✓ Pager configuration is valid");
        }
        Commands::Version => {
            println!("fpager version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
