use crate::EntityState;
use std::cell::RefCell;
use std::rc::Rc;
use tag_store::TagRow;

/// Shared handle to the one instance of a tag within a unit of work.
pub type TagHandle = Rc<RefCell<Tag>>;

/// A label that can be attached to any number of files.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Tag {
    id: i64,
    name: String,
    state: EntityState,
}

impl Tag {
    /// A tag that has not been stored yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self { id: 0, name: name.into(), state: EntityState::New }
    }

    pub fn into_handle(self) -> TagHandle {
        Rc::new(RefCell::new(self))
    }

    /// Store identity, or `0` before the first save.
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> EntityState {
        self.state
    }

    /// Rename the tag. Setting the current name again changes nothing.
    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        if name != self.name {
            self.name = name;
            self.state = self.state.mutated();
        }
    }

    /// An independent copy, in the state it would have if freshly loaded.
    pub fn snapshot(&self) -> Self {
        Self { id: self.id, name: self.name.clone(), state: EntityState::for_id(self.id) }
    }

    /// Record a successful save under `id`.
    ///
    /// Identity is only ever assigned once; an entity that already has one
    /// keeps it.
    pub(crate) fn mark_saved(&mut self, id: i64) {
        if self.id == 0 {
            self.id = id;
        }
        self.state = EntityState::Clean;
    }
}

impl From<TagRow> for Tag {
    fn from(row: TagRow) -> Self {
        Self { id: row.id, name: row.name, state: EntityState::for_id(row.id) }
    }
}

/// Whether two handles refer to the same tag: the same instance, or two
/// stored tags with the same identity.
pub fn same_tag(a: &TagHandle, b: &TagHandle) -> bool {
    if Rc::ptr_eq(a, b) {
        return true;
    }
    let (a, b) = (a.borrow().id, b.borrow().id);
    a != 0 && a == b
}
