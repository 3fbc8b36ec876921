//! Persistence for tag data folders.
//!
//! A data folder holds one SQLite database with three tables: file records,
//! tag records, and the links between them. [`Layout`] finds and creates data
//! folders, [`Registry`] keeps one open [`Database`] per folder, and
//! [`RecordStore`] is the CRUD surface everything above this crate uses.

mod backend;
mod db;
pub mod error;
mod layout;
mod models;
mod registry;

#[cfg(feature = "mock")]
pub use crate::backend::{Call, MockStore};
pub use crate::backend::{RecordStore, SqliteStore};
pub use crate::db::Database;
pub use crate::layout::{DEFAULT_DATA_FOLDER, DEFAULT_DATABASE, Layout};
pub use crate::models::{FileRow, LinkRow, TagRow};
pub use crate::registry::Registry;
use std::sync::Arc;

pub type StoreHandle = Arc<dyn RecordStore + Send + Sync>;
