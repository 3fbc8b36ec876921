use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Send all `tracing` output to `log_file`, appending.
///
/// `RUST_LOG` wins over `level` when it is set and valid. Fails if the log
/// file cannot be opened or a global subscriber is already installed.
pub fn init(log_file: &Path, level: &str) -> std::io::Result<()> {
    let file = open(log_file)?;
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(filter(directives.as_deref(), level))
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(std::io::Error::other)
}

fn open(log_file: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(log_file)
}

/// The environment's directives if they parse, otherwise `level`.
fn filter(directives: Option<&str>, level: &str) -> EnvFilter {
    directives
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(level))
}
