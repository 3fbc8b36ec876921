use crate::cli::{self, Command};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tag_domain::{ErrorKind, Result, Tag, Transaction, resolve_path};
use tag_store::error::Key;
use tag_store::{Layout, StoreHandle};
use tracing::instrument;

/// What a command prints, and whether it worked.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Output {
    pub text: String,
    pub success: bool,
}

impl Output {
    fn ok(text: impl Into<String>) -> Self {
        Self { text: text.into(), success: true }
    }

    fn failed(text: impl Into<String>) -> Self {
        Self { text: text.into(), success: false }
    }

    /// Print to stdout on success, stderr on failure.
    pub fn print(&self) {
        if self.success {
            print!("{}", self.text);
        } else {
            eprintln!("{}", self.text);
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        if self.success { ExitCode::SUCCESS } else { ExitCode::FAILURE }
    }
}

/// Runs commands against the tree containing a working directory.
pub struct App {
    store: StoreHandle,
    layout: Layout,
    cwd: PathBuf,
    log_file: PathBuf,
}

impl App {
    pub fn new(store: StoreHandle, layout: Layout, cwd: impl Into<PathBuf>, log_file: impl Into<PathBuf>) -> Self {
        Self { store, layout, cwd: cwd.into(), log_file: log_file.into() }
    }

    /// Run one command (or show help) and turn the result into output.
    ///
    /// Errors the user can act on become a short message; anything else is
    /// logged in full and the user is pointed at the log file.
    pub async fn run(&self, command: Option<Command>) -> Output {
        let Some(command) = command else {
            return Output::ok(cli::help());
        };
        match self.execute(command).await {
            Ok(text) => Output::ok(text),
            Err(err) => match describe(&err) {
                Some(message) => Output::failed(message),
                None => {
                    tracing::error!(error = ?err, retryable = err.is_retryable(), "Command failed");
                    Output::failed(format!("Error encountered. Info dumped to {}.", self.log_file.display()))
                },
            },
        }
    }

    async fn execute(&self, command: Command) -> Result<String> {
        match command {
            Command::Init { path } => self.init(&path).await,
            Command::File { file, tag } => self.tag_file(&file, &tag).await,
            Command::List { file } => self.list(&file).await,
            Command::Files { tag } => self.files(&tag).await,
            Command::Remove { file, tag } => self.remove(&file, &tag).await,
        }
    }

    fn transaction(&self) -> Transaction {
        Transaction::new(self.store.clone(), &self.cwd)
    }

    #[instrument(skip(self))]
    async fn init(&self, path: &Path) -> Result<String> {
        self.layout.initialize(resolve_path(&self.cwd, path)).await?;
        Ok(String::new())
    }

    #[instrument(skip(self))]
    async fn tag_file(&self, file: &Path, tag: &str) -> Result<String> {
        let mut tx = self.transaction();
        let path = tx.resolve(file)?;
        let file = match tx.get_file_by_name(&path).await {
            Ok(file) => file,
            Err(err) if matches!(&*err, ErrorKind::FileNotFound(_)) => tx.create_file(path),
            Err(err) => return Err(err),
        };
        let tag = match tx.get_tag_by_name(tag).await {
            Ok(tag) => tag,
            Err(err) if matches!(&*err, ErrorKind::TagNotFound(_)) => Tag::new(tag).into_handle(),
            Err(err) => return Err(err),
        };
        file.borrow_mut().add_tag(tag);
        tx.commit().await?;
        Ok(String::new())
    }

    #[instrument(skip(self))]
    async fn list(&self, file: &Path) -> Result<String> {
        let mut tx = self.transaction();
        let path = tx.resolve(file)?;
        let file_handle = tx.get_file_by_name(&path).await?;
        let names = file_handle.borrow().tag_names();
        tx.commit().await?;

        let mut out = format!("tags for {}\n", file.display());
        for name in names {
            out.push_str(&format!("  {name}\n"));
        }
        Ok(out)
    }

    #[instrument(skip(self))]
    async fn files(&self, tag: &str) -> Result<String> {
        let mut out = format!("Files with tag '{tag}'\n");
        let mut tx = self.transaction();
        let tag = match tx.get_tag_by_name(tag).await {
            Ok(tag) => tag,
            Err(err) if matches!(&*err, ErrorKind::TagNotFound(_)) => return Ok(out),
            Err(err) => return Err(err),
        };
        for file in tx.get_all_files().await? {
            let file = file.borrow();
            if file.has_tag(&tag) {
                let path = Path::new(file.name());
                let shown = path.strip_prefix(&self.cwd).unwrap_or(path);
                out.push_str(&format!("  {}\n", shown.display()));
            }
        }
        tx.commit().await?;
        Ok(out)
    }

    #[instrument(skip(self))]
    async fn remove(&self, file: &Path, tag: &str) -> Result<String> {
        let mut tx = self.transaction();
        let path = tx.resolve(file)?;
        let file = tx.get_file_by_name(&path).await?;
        let tag = tx.get_tag_by_name(tag).await?;
        file.borrow_mut().remove_tag(&tag);
        tx.commit().await?;
        Ok(String::new())
    }
}

/// The message shown for errors the user can do something about.
fn describe(err: &tag_domain::Error) -> Option<String> {
    let message = match &**err {
        ErrorKind::NotOnDisk(path) => format!("File {} doesn't exist.", path.display()),
        ErrorKind::FileNotFound(Key::Name(path)) => format!("File doesn't exist at: {path}."),
        ErrorKind::TagNotFound(Key::Name(tag)) => format!("Tag '{tag}' not found."),
        ErrorKind::AlreadyInitialized(path) => {
            format!("Cannot create data folder at {} because one already exists.", path.display())
        },
        ErrorKind::DataFolderNotFound(path) => {
            format!("No tag data folder found at or above {}. Run 'tag init <PATH>' first.", path.display())
        },
        _ => return None,
    };
    Some(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tag_store::{MockStore, Registry, SqliteStore};
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Option<Command> {
        use clap::Parser;
        crate::cli::Cli::try_parse_from(std::iter::once("tag").chain(args.iter().copied())).unwrap().command
    }

    // A data folder name nobody has lying around above the temp dir.
    fn layout() -> Layout {
        Layout::new(".tag-app-test", "tag.db")
    }

    fn sqlite_store() -> StoreHandle {
        Arc::new(SqliteStore::new(Registry::new(layout())))
    }

    struct Fixture {
        dir: TempDir,
        app: App,
    }
    impl Fixture {
        /// An app over a real database in a fresh temporary directory.
        fn sqlite() -> Self {
            let dir = TempDir::new().unwrap();
            let app = App::new(sqlite_store(), layout(), dir.path(), dir.path().join("errors.log"));
            Self { dir, app }
        }

        fn touch(&self, name: &str) {
            std::fs::write(self.dir.path().join(name), b"").unwrap();
        }

        async fn run(&self, args: &[&str]) -> Output {
            self.app.run(parse(args)).await
        }
    }

    #[tokio::test]
    async fn test_end_to_end() {
        let fx = Fixture::sqlite();
        assert_eq!(fx.run(&["init", "."]).await, Output::ok(""));
        fx.touch("a.txt");

        assert_eq!(fx.run(&["file", "a.txt", "work"]).await, Output::ok(""));
        assert_eq!(fx.run(&["file", "a.txt", "urgent"]).await, Output::ok(""));
        assert_eq!(fx.run(&["list", "a.txt"]).await, Output::ok("tags for a.txt\n  work\n  urgent\n"));
        assert_eq!(fx.run(&["files", "work"]).await, Output::ok("Files with tag 'work'\n  a.txt\n"));

        assert_eq!(fx.run(&["remove", "a.txt", "work"]).await, Output::ok(""));
        assert_eq!(fx.run(&["files", "work"]).await, Output::ok("Files with tag 'work'\n"));
        assert_eq!(fx.run(&["list", "a.txt"]).await, Output::ok("tags for a.txt\n  urgent\n"));
    }

    #[tokio::test]
    async fn test_tags_are_shared_between_files() {
        let fx = Fixture::sqlite();
        fx.run(&["init", "."]).await;
        fx.touch("a.txt");
        fx.touch("b.txt");
        fx.run(&["file", "a.txt", "work"]).await;
        fx.run(&["file", "b.txt", "work"]).await;
        fx.run(&["file", "a.txt", "work"]).await;
        assert_eq!(fx.run(&["files", "work"]).await, Output::ok("Files with tag 'work'\n  a.txt\n  b.txt\n"));
        assert_eq!(fx.run(&["list", "a.txt"]).await, Output::ok("tags for a.txt\n  work\n"));
    }

    #[tokio::test]
    async fn test_subdirectory_uses_root_data_folder() {
        let fx = Fixture::sqlite();
        fx.run(&["init", "."]).await;
        std::fs::create_dir(fx.dir.path().join("sub")).unwrap();
        fx.touch("sub/c.txt");
        fx.run(&["file", "sub/c.txt", "work"]).await;

        let nested = App::new(sqlite_store(), layout(), fx.dir.path().join("sub"), "unused.log");
        assert_eq!(nested.run(parse(&["files", "work"])).await, Output::ok("Files with tag 'work'\n  c.txt\n"));
    }

    #[tokio::test]
    async fn test_user_errors() {
        let fx = Fixture::sqlite();
        let root = fx.dir.path().display().to_string();
        assert_eq!(
            fx.run(&["list", "a.txt"]).await,
            Output::failed(format!("No tag data folder found at or above {root}. Run 'tag init <PATH>' first."))
        );

        fx.run(&["init", "."]).await;
        assert_eq!(
            fx.run(&["init", "."]).await,
            Output::failed(format!("Cannot create data folder at {root} because one already exists."))
        );
        std::fs::create_dir(fx.dir.path().join("sub")).unwrap();
        assert_eq!(
            fx.run(&["init", "sub/.."]).await,
            Output::failed(format!("Cannot create data folder at {root} because one already exists."))
        );
        assert_eq!(
            fx.run(&["file", "ghost.txt", "work"]).await,
            Output::failed(format!("File {root}/ghost.txt doesn't exist."))
        );
        assert_eq!(
            fx.run(&["list", "ghost.txt"]).await,
            Output::failed(format!("File doesn't exist at: {root}/ghost.txt."))
        );

        fx.touch("a.txt");
        fx.run(&["file", "a.txt", "work"]).await;
        assert_eq!(fx.run(&["remove", "a.txt", "nope"]).await, Output::failed("Tag 'nope' not found."));
        assert_eq!(fx.run(&["files", "nope"]).await, Output::ok("Files with tag 'nope'\n"));
    }

    #[tokio::test]
    async fn test_no_command_shows_help() {
        let store: StoreHandle = Arc::new(MockStore::default());
        let app = App::new(store, Layout::default(), "/tree", "/tmp/errors.log");
        let output = app.run(None).await;
        assert!(output.success);
        assert!(output.text.contains("Usage"));
    }

    #[tokio::test]
    async fn test_unexpected_error_points_at_log() {
        let fx = Fixture::sqlite();
        fx.run(&["init", "."]).await;
        // A directory where the database file should be makes the open fail.
        let db = fx.dir.path().join(".tag-app-test").join("tag.db");
        std::fs::remove_file(&db).unwrap();
        std::fs::create_dir(&db).unwrap();
        let log = fx.dir.path().join("errors.log").display().to_string();
        assert_eq!(fx.run(&["files", "work"]).await, Output::failed(format!("Error encountered. Info dumped to {log}.")));
    }

    #[test]
    fn test_describe() {
        let err: tag_domain::Error = ErrorKind::FileNotFound(Key::Id(3)).into();
        assert_eq!(describe(&err), None, "lookups by id are not user errors");
        let err: tag_domain::Error = ErrorKind::Database.into();
        assert_eq!(describe(&err), None);
    }
}
