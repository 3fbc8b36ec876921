//! In-memory files and tags, and the unit of work that keeps them in sync
//! with a [`tag_store::RecordStore`].
//!
//! Everything here is single-threaded: entities are shared through
//! `Rc<RefCell<_>>` handles and a [`Transaction`] is owned by one command.
//! Errors are the store's own, so a caller can still tell a missing record
//! from a database fault after a commit.

pub mod identity;
pub mod mapper;

mod file;
mod state;
mod tag;
mod transaction;

pub use crate::file::{File, FileHandle};
pub use crate::state::EntityState;
pub use crate::tag::{Tag, TagHandle, same_tag};
pub use crate::transaction::{Transaction, resolve_path};
pub use tag_store::error::{Error, ErrorKind, Result};
