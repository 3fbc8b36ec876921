//! In-memory record store for testing.

use crate::RecordStore;
use crate::error::{ErrorKind, Key, Result};
use crate::models::{FileRow, LinkRow, TagRow};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// A write that reached the store, in the order it arrived.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Call {
    AddFile(String),
    RemoveFile(i64),
    SaveFile(i64, String),
    AddTag(String),
    RemoveTag(i64),
    SaveTag(i64, String),
    AddLink(i64, i64),
    RemoveLink(i64, i64),
}

/// One root's worth of tables. Ids are never reused, like `AUTOINCREMENT`.
#[derive(Debug, Default)]
struct Tables {
    files: BTreeMap<i64, String>,
    tags: BTreeMap<i64, String>,
    links: BTreeMap<i64, (i64, i64)>,
    last_file: i64,
    last_tag: i64,
    last_link: i64,
}

#[derive(Debug, Default)]
struct State {
    roots: HashMap<PathBuf, Tables>,
    journal: Vec<Call>,
}

/// In-memory record store for testing.
///
/// Tables live in a `HashMap` keyed by the exact `root` passed in, behind a
/// [`RwLock`], so all trait methods can operate on `&self`. No data folder
/// discovery happens: every root is its own empty tree until written to.
///
/// Every write is appended to a journal, which tests use to check exactly
/// what a save sent to the store.
///
/// # Examples
///
/// ```
/// use tag_store::{Call, MockStore, RecordStore};
/// use std::path::Path;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MockStore::default();
/// let root = Path::new("/tree");
/// let id = store.add_tag(root, "work").await?;
/// assert_eq!(store.read_tag(root, id).await?.name, "work");
/// assert_eq!(store.journal().await, vec![Call::AddTag("work".to_string())]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MockStore {
    state: RwLock<State>,
    /// When set, only these paths count as existing on disk.
    disk: Option<HashSet<PathBuf>>,
}

impl MockStore {
    /// Create a mock store that only accepts file records for these paths.
    ///
    /// Without this, [`RecordStore::add_file`] accepts any path.
    pub fn with_disk_files(paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            state: RwLock::default(),
            disk: Some(paths.into_iter().map(Into::into).collect()),
        }
    }

    /// Writes received so far, oldest first.
    pub async fn journal(&self) -> Vec<Call> {
        self.state.read().await.journal.clone()
    }

    pub async fn clear_journal(&self) {
        self.state.write().await.journal.clear();
    }

    /// Number of writes received so far.
    pub async fn writes(&self) -> usize {
        self.state.read().await.journal.len()
    }

    fn on_disk(&self, name: &str) -> bool {
        self.disk.as_ref().is_none_or(|disk| disk.contains(Path::new(name)))
    }

    /// Run a write against the tables of `root`, journalling it first.
    async fn write<T>(&self, root: &Path, call: Call, op: impl FnOnce(&mut Tables) -> T) -> T {
        let mut state = self.state.write().await;
        state.journal.push(call);
        op(state.roots.entry(root.to_path_buf()).or_default())
    }

    async fn read<T>(&self, root: &Path, op: impl FnOnce(&Tables) -> T) -> T {
        let state = self.state.read().await;
        match state.roots.get(root) {
            Some(tables) => op(tables),
            None => op(&Tables::default()),
        }
    }
}

#[async_trait]
impl RecordStore for MockStore {
    async fn add_file(&self, root: &Path, name: &str) -> Result<i64> {
        if !self.on_disk(name) {
            exn::bail!(ErrorKind::NotOnDisk(name.into()));
        }
        let id = self
            .write(root, Call::AddFile(name.to_string()), |t| {
                t.last_file += 1;
                t.files.insert(t.last_file, name.to_string());
                t.last_file
            })
            .await;
        Ok(id)
    }

    async fn remove_file(&self, root: &Path, id: i64) -> Result<()> {
        self.write(root, Call::RemoveFile(id), |t| t.files.remove(&id)).await;
        Ok(())
    }

    async fn read_file(&self, root: &Path, id: i64) -> Result<FileRow> {
        let name = self.read(root, |t| t.files.get(&id).cloned()).await;
        match name {
            Some(file_name) => Ok(FileRow { id, file_name }),
            None => exn::bail!(ErrorKind::FileNotFound(Key::Id(id))),
        }
    }

    async fn save_file(&self, root: &Path, id: i64, name: &str) -> Result<()> {
        self.write(root, Call::SaveFile(id, name.to_string()), |t| {
            if let Some(existing) = t.files.get_mut(&id) {
                *existing = name.to_string();
            }
        })
        .await;
        Ok(())
    }

    async fn get_file_id_by_name(&self, root: &Path, name: &str) -> Result<i64> {
        let id = self.read(root, |t| t.files.iter().find(|(_, n)| *n == name).map(|(id, _)| *id)).await;
        id.ok_or_else(|| ErrorKind::FileNotFound(Key::Name(name.to_string())).into())
    }

    async fn get_all_file_ids(&self, root: &Path) -> Result<Vec<i64>> {
        Ok(self.read(root, |t| t.files.keys().copied().collect()).await)
    }

    async fn add_tag(&self, root: &Path, name: &str) -> Result<i64> {
        let id = self
            .write(root, Call::AddTag(name.to_string()), |t| {
                t.last_tag += 1;
                t.tags.insert(t.last_tag, name.to_string());
                t.last_tag
            })
            .await;
        Ok(id)
    }

    async fn remove_tag(&self, root: &Path, id: i64) -> Result<()> {
        self.write(root, Call::RemoveTag(id), |t| t.tags.remove(&id)).await;
        Ok(())
    }

    async fn read_tag(&self, root: &Path, id: i64) -> Result<TagRow> {
        let name = self.read(root, |t| t.tags.get(&id).cloned()).await;
        match name {
            Some(name) => Ok(TagRow { id, name }),
            None => exn::bail!(ErrorKind::TagNotFound(Key::Id(id))),
        }
    }

    async fn save_tag(&self, root: &Path, id: i64, name: &str) -> Result<()> {
        self.write(root, Call::SaveTag(id, name.to_string()), |t| {
            if let Some(existing) = t.tags.get_mut(&id) {
                *existing = name.to_string();
            }
        })
        .await;
        Ok(())
    }

    async fn get_tag_id_by_name(&self, root: &Path, name: &str) -> Result<i64> {
        let id = self.read(root, |t| t.tags.iter().find(|(_, n)| *n == name).map(|(id, _)| *id)).await;
        id.ok_or_else(|| ErrorKind::TagNotFound(Key::Name(name.to_string())).into())
    }

    async fn add_link(&self, root: &Path, file_id: i64, tag_id: i64) -> Result<i64> {
        let id = self
            .write(root, Call::AddLink(file_id, tag_id), |t| {
                t.last_link += 1;
                t.links.insert(t.last_link, (file_id, tag_id));
                t.last_link
            })
            .await;
        Ok(id)
    }

    async fn read_links_by_file(&self, root: &Path, file_id: i64) -> Result<Vec<LinkRow>> {
        let links = self
            .read(root, |t| {
                t.links
                    .iter()
                    .filter(|(_, (f, _))| *f == file_id)
                    .map(|(&id, &(file_id, tag_id))| LinkRow { id, file_id, tag_id })
                    .collect()
            })
            .await;
        Ok(links)
    }

    async fn read_links_by_tag(&self, root: &Path, tag_id: i64) -> Result<Vec<LinkRow>> {
        let links = self
            .read(root, |t| {
                t.links
                    .iter()
                    .filter(|(_, (_, tg))| *tg == tag_id)
                    .map(|(&id, &(file_id, tag_id))| LinkRow { id, file_id, tag_id })
                    .collect()
            })
            .await;
        Ok(links)
    }

    async fn remove_link(&self, root: &Path, file_id: i64, tag_id: i64) -> Result<()> {
        self.write(root, Call::RemoveLink(file_id, tag_id), |t| {
            t.links.retain(|_, link| *link != (file_id, tag_id));
        })
        .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: &str = "/tree";

    fn root() -> &'static Path {
        Path::new(ROOT)
    }

    #[tokio::test]
    async fn test_ids_are_never_reused() {
        let store = MockStore::default();
        let first = store.add_tag(root(), "a").await.unwrap();
        store.remove_tag(root(), first).await.unwrap();
        let second = store.add_tag(root(), "b").await.unwrap();
        assert_eq!((first, second), (1, 2));
    }

    #[tokio::test]
    async fn test_disk_files_are_checked() {
        let store = MockStore::with_disk_files(["/tree/a.txt"]);
        assert_eq!(store.add_file(root(), "/tree/a.txt").await.unwrap(), 1);
        let err = store.add_file(root(), "/tree/b.txt").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotOnDisk(_)));
        assert_eq!(store.writes().await, 1, "rejected writes are not journalled");
    }

    #[tokio::test]
    async fn test_roots_are_independent() {
        let store = MockStore::default();
        store.add_tag(Path::new("/one"), "work").await.unwrap();
        let err = store.get_tag_id_by_name(Path::new("/two"), "work").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::TagNotFound(_)));
    }

    #[tokio::test]
    async fn test_links_and_journal() {
        let store = MockStore::default();
        let file = store.add_file(root(), "/tree/a.txt").await.unwrap();
        let tag = store.add_tag(root(), "work").await.unwrap();
        store.add_link(root(), file, tag).await.unwrap();
        assert_eq!(store.read_links_by_tag(root(), tag).await.unwrap().len(), 1);
        store.remove_link(root(), file, tag).await.unwrap();
        assert!(store.read_links_by_file(root(), file).await.unwrap().is_empty());
        assert_eq!(
            store.journal().await,
            vec![
                Call::AddFile("/tree/a.txt".to_string()),
                Call::AddTag("work".to_string()),
                Call::AddLink(file, tag),
                Call::RemoveLink(file, tag),
            ]
        );
        store.clear_journal().await;
        assert_eq!(store.writes().await, 0);
    }
}
