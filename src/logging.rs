//! Logging setup for the `fpager` binary, on top of tracing_subscriber.

use std::{io::IsTerminal, sync::Once};

use tracing_subscriber::{filter::LevelFilter, EnvFilter};

static FPAGER_LOG_ENV_VAR: &str = "FPAGER_LOG";

/// Crates of this workspace whose level `FPAGER_LOG` controls
const FPAGER_CRATES: &[&str] = &["file_pager", "fpager", "pager_engine", "pager_sdk"];

/// Initializes a tracing subscriber writing to stderr
///
/// Records go to stdout, so logs must stay off it.
pub fn init() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let (env_filter, log_level) = env_filter_and_log_level();

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_ansi(std::io::stderr().is_terminal())
            .init();

        tracing::debug!("log level: {}", log_level);
    });
}

fn env_filter_and_log_level() -> (EnvFilter, String) {
    // RUST_LOG directives take precedence over FPAGER_LOG for the crates they name
    let directive_string = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();
    let mut env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::ERROR.into())
        .parse_lossy(&directive_string);

    let log_level = std::env::var(FPAGER_LOG_ENV_VAR).unwrap_or_else(|_| "info".to_string());

    for crate_name in FPAGER_CRATES {
        if directive_string.contains(&format!("{crate_name}=")) {
            continue;
        }
        match format!("{crate_name}={log_level}").parse() {
            Ok(directive) => env_filter = env_filter.add_directive(directive),
            Err(err) => {
                eprintln!("ignoring invalid {FPAGER_LOG_ENV_VAR} level '{log_level}': {err}");
                break;
            }
        }
    }

    (env_filter, log_level)
}
