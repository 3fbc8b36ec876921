use crate::EntityState;
use crate::tag::{TagHandle, same_tag};
use std::cell::RefCell;
use std::rc::Rc;

/// Shared handle to the one instance of a file within a unit of work.
pub type FileHandle = Rc<RefCell<File>>;

/// A path on disk and the tags attached to it.
///
/// Besides the current tags, a file remembers the tags it had when it was
/// loaded (or last saved). Saving compares the two lists and only touches
/// the links that changed.
#[derive(Debug)]
pub struct File {
    id: i64,
    name: String,
    tags: Vec<TagHandle>,
    original: Vec<TagHandle>,
    state: EntityState,
}

impl File {
    /// A file that has not been stored yet, with no tags.
    pub fn new(name: impl Into<String>) -> Self {
        Self { id: 0, name: name.into(), tags: Vec::new(), original: Vec::new(), state: EntityState::New }
    }

    /// A file as read back from the store. Repeated tags are dropped.
    pub fn loaded(id: i64, name: impl Into<String>, tags: impl IntoIterator<Item = TagHandle>) -> Self {
        let mut unique: Vec<TagHandle> = Vec::new();
        for tag in tags {
            if !unique.iter().any(|t| same_tag(t, &tag)) {
                unique.push(tag);
            }
        }
        Self {
            id,
            name: name.into(),
            original: unique.clone(),
            tags: unique,
            state: EntityState::for_id(id),
        }
    }

    pub fn into_handle(self) -> FileHandle {
        Rc::new(RefCell::new(self))
    }

    /// Store identity, or `0` before the first save.
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Absolute path of the file; also its key in the store.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> EntityState {
        self.state
    }

    /// Current tags, in the order they were attached.
    pub fn tags(&self) -> &[TagHandle] {
        &self.tags
    }

    pub fn tag_names(&self) -> Vec<String> {
        self.tags.iter().map(|t| t.borrow().name().to_string()).collect()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        if name != self.name {
            self.name = name;
            self.state = self.state.mutated();
        }
    }

    pub fn has_tag(&self, tag: &TagHandle) -> bool {
        self.tags.iter().any(|t| same_tag(t, tag))
    }

    /// Attach a tag. Returns `false`, changing nothing, if it is already attached.
    pub fn add_tag(&mut self, tag: TagHandle) -> bool {
        if self.has_tag(&tag) {
            return false;
        }
        self.tags.push(tag);
        self.state = self.state.mutated();
        true
    }

    /// Detach a tag. Returns `false`, changing nothing, if it was not attached.
    pub fn remove_tag(&mut self, tag: &TagHandle) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| !same_tag(t, tag));
        if self.tags.len() == before {
            return false;
        }
        self.state = self.state.mutated();
        true
    }

    /// Tags attached since the baseline, in attachment order.
    pub fn added_tags(&self) -> Vec<TagHandle> {
        self.tags.iter().filter(|t| !self.original.iter().any(|o| same_tag(o, t))).cloned().collect()
    }

    /// Tags detached since the baseline, in baseline order.
    pub fn removed_tags(&self) -> Vec<TagHandle> {
        self.original.iter().filter(|o| !self.tags.iter().any(|t| same_tag(t, o))).cloned().collect()
    }

    /// A deep copy: new tag instances, in the state a fresh load would give.
    pub fn snapshot(&self) -> Self {
        let tags: Vec<TagHandle> = self.tags.iter().map(|t| t.borrow().snapshot().into_handle()).collect();
        Self {
            id: self.id,
            name: self.name.clone(),
            original: tags.clone(),
            tags,
            state: EntityState::for_id(self.id),
        }
    }

    /// Take the identity handed out by the insert. Only the first one sticks.
    pub(crate) fn assign_id(&mut self, id: i64) {
        if self.id == 0 {
            self.id = id;
        }
    }

    /// Record a successful save under `id` and make the current tags the new baseline.
    pub(crate) fn mark_saved(&mut self, id: i64) {
        self.assign_id(id);
        self.original = self.tags.clone();
        self.state = EntityState::Clean;
    }
}
