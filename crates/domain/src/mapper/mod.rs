//! Translation between entities and store records.
//!
//! Mappers hold no cache of their own. Loading goes through the identity
//! maps, saving is driven by each entity's [`EntityState`](crate::EntityState).

mod file;
mod tag;

pub use self::file::FileMapper;
pub use self::tag::TagMapper;
