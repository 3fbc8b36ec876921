//! The `tag` command line: parse arguments, run one command against the
//! tree containing the working directory, and render the result.

pub mod cli;
pub mod logging;

mod app;

pub use crate::app::{App, Output};
