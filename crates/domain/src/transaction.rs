use crate::identity::{FileIdentityMap, TagIdentityMap};
use crate::mapper::{FileMapper, TagMapper};
use crate::{File, FileHandle, Tag, TagHandle};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::rc::Rc;
use exn::OptionExt;
use tag_store::StoreHandle;
use tag_store::error::{ErrorKind, Result};
use tracing::instrument;

/// One command's worth of reads and writes against a tree.
///
/// Files and tags handed out by a transaction are the live instances from
/// its identity maps: change them in place, then [`commit`](Self::commit)
/// once at the end. The first time each record is loaded, a deep copy is
/// kept as its original so later changes can be compared against it.
///
/// Commit is not atomic. Entities are saved one after the other and the
/// first failure stops the rest; whatever was already written stays written.
pub struct Transaction {
    root: PathBuf,
    tags: TagIdentityMap,
    files: FileIdentityMap,
    original_files: HashMap<i64, File>,
    original_tags: HashMap<i64, Tag>,
    registered: Vec<FileHandle>,
}

impl Transaction {
    /// Start a transaction for the tree containing `root`.
    ///
    /// `root` is the working directory: relative names are resolved against
    /// it, and it selects the data folder every store call goes to.
    pub fn new(store: StoreHandle, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            tags: TagIdentityMap::new(TagMapper::new(store.clone(), root.clone())),
            files: FileIdentityMap::new(FileMapper::new(store, root.clone())),
            root,
            original_files: HashMap::new(),
            original_tags: HashMap::new(),
            registered: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tag_identity_map(&self) -> &TagIdentityMap {
        &self.tags
    }

    pub fn file_identity_map(&self) -> &FileIdentityMap {
        &self.files
    }

    /// Turn a user-supplied path into the key files are stored under.
    ///
    /// See [`resolve_path`]; the key must also be valid UTF-8.
    pub fn resolve(&self, name: impl AsRef<Path>) -> Result<String> {
        let path = resolve_path(&self.root, name);
        Ok(path.to_str().ok_or_raise(|| ErrorKind::InvalidData("path"))?.to_string())
    }

    pub async fn get_file_by_id(&mut self, id: i64) -> Result<FileHandle> {
        let file = self.files.get_by_id(id, &mut self.tags).await?;
        self.remember_file(&file);
        Ok(file)
    }

    pub async fn get_file_by_name(&mut self, name: &str) -> Result<FileHandle> {
        let file = self.files.get_by_name(name, &mut self.tags).await?;
        self.remember_file(&file);
        Ok(file)
    }

    /// Every stored file in id order.
    pub async fn get_all_files(&mut self) -> Result<Vec<FileHandle>> {
        let files = self.files.get_all(&mut self.tags).await?;
        for file in &files {
            self.remember_file(file);
        }
        Ok(files)
    }

    pub async fn get_tag_by_id(&mut self, id: i64) -> Result<TagHandle> {
        let tag = self.tags.get_by_id(id).await?;
        self.remember_tag(&tag);
        Ok(tag)
    }

    pub async fn get_tag_by_name(&mut self, name: &str) -> Result<TagHandle> {
        let tag = self.tags.get_by_name(name).await?;
        self.remember_tag(&tag);
        Ok(tag)
    }

    /// Track a file that is not in the store yet so that commit inserts it.
    pub fn register_file(&mut self, file: FileHandle) {
        self.registered.push(file);
    }

    /// A new, registered file stored under `name`.
    pub fn create_file(&mut self, name: impl Into<String>) -> FileHandle {
        let file = File::new(name).into_handle();
        self.register_file(Rc::clone(&file));
        file
    }

    pub fn registered_files(&self) -> &[FileHandle] {
        &self.registered
    }

    /// The file as it was when this transaction first loaded it.
    pub fn original_file(&self, id: i64) -> Option<&File> {
        self.original_files.get(&id)
    }

    /// The tag as it was when this transaction first loaded it.
    pub fn original_tag(&self, id: i64) -> Option<&Tag> {
        self.original_tags.get(&id)
    }

    fn remember_file(&mut self, file: &FileHandle) {
        let file = file.borrow();
        self.original_files.entry(file.id()).or_insert_with(|| file.snapshot());
    }

    fn remember_tag(&mut self, tag: &TagHandle) {
        let tag = tag.borrow();
        self.original_tags.entry(tag.id()).or_insert_with(|| tag.snapshot());
    }

    /// Save everything this transaction touched.
    ///
    /// Registered files go first, then every loaded file in id order, then
    /// every loaded tag (which catches tags renamed without any file
    /// changing). Stops at the first error and returns it as is.
    ///
    /// Files and tags inserted along the way join the identity maps, so
    /// later lookups in this transaction return the same instances.
    #[instrument(level = "debug", skip(self), fields(root = %self.root.display()))]
    pub async fn commit(&mut self) -> Result<()> {
        let files = self.files.mapper().clone();
        let registered = self.registered.clone();
        for file in &registered {
            files.save(file).await?;
            if self.files.adopt(file) {
                self.remember_file(file);
            }
            self.adopt_tags(file);
        }
        let loaded: Vec<FileHandle> = self.files.cached().cloned().collect();
        for file in &loaded {
            files.save(file).await?;
            self.adopt_tags(file);
        }
        let tags = self.tags.mapper();
        for tag in self.tags.cached() {
            tags.save(tag).await?;
        }
        tracing::debug!(registered = registered.len(), "Committed transaction");
        self.registered.clear();
        Ok(())
    }

    fn adopt_tags(&mut self, file: &FileHandle) {
        let tags = file.borrow().tags().to_vec();
        for tag in &tags {
            if self.tags.adopt(tag) {
                self.remember_tag(tag);
            }
        }
    }
}

/// Join `name` onto `base` and fold away `.` and `..` components, without
/// touching the filesystem. Absolute names ignore `base`.
pub fn resolve_path(base: impl AsRef<Path>, name: impl AsRef<Path>) -> PathBuf {
    let mut path = PathBuf::new();
    for component in base.as_ref().join(name).components() {
        match component {
            Component::CurDir => {},
            Component::ParentDir => {
                path.pop();
            },
            other => path.push(other),
        }
    }
    path
}
