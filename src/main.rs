use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tag::cli::Cli;
use tag::{App, logging};
use tag_config::Config;
use tag_store::{Registry, SqliteStore, StoreHandle};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err:?}");
            return ExitCode::FAILURE;
        },
    };
    let log_file = config.log_file();
    if let Err(err) = logging::init(&log_file, &config.log_level) {
        eprintln!("Could not log to {}: {err}", log_file.display());
    }
    tracing::debug!(config_file = ?tag_config::config_file(), "Loaded configuration");
    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(err) => {
            tracing::error!(error = %err, "Could not read the working directory");
            eprintln!("Error encountered. Info dumped to {}.", log_file.display());
            return ExitCode::FAILURE;
        },
    };

    let registry = Arc::new(Registry::new(config.layout()));
    let store: StoreHandle = Arc::new(SqliteStore::from(Arc::clone(&registry)));
    let app = App::new(store, config.layout(), cwd, &log_file);
    let output = app.run(cli.command).await;
    registry.close().await;
    output.print();
    output.exit_code()
}
