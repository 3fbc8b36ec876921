use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tag files on disk and find them again by tag.
#[derive(Debug, Parser)]
#[command(name = "tag", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a tag data folder in PATH; everything below it can then be tagged.
    Init {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
    /// Attach TAG to FILE, creating either as needed.
    File {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(value_name = "TAG")]
        tag: String,
    },
    /// List the tags attached to FILE.
    List {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// List the files carrying TAG.
    Files {
        #[arg(value_name = "TAG")]
        tag: String,
    },
    /// Detach TAG from FILE.
    Remove {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(value_name = "TAG")]
        tag: String,
    },
}

/// Help text, as shown when no command is given.
pub fn help() -> String {
    use clap::CommandFactory;
    Cli::command().render_help().to_string()
}
