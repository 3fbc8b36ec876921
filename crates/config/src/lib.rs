//! Layered configuration for the `tag` command.
//!
//! Values are merged from, lowest priority first:
//!
//! 1. built-in defaults,
//! 2. `config.toml` in the platform config directory (for example
//!    `~/.config/tag/config.toml` on Linux), if it exists,
//! 3. environment variables prefixed with `TAG_` (`TAG_DATA_FOLDER`,
//!    `TAG_DATABASE`, `TAG_LOG_FILE`, `TAG_LOG_LEVEL`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::{BaseDirs, ProjectDirs};
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use tag_store::Layout;

pub const CONFIG_FILE: &str = "config.toml";
pub const ENV_PREFIX: &str = "TAG_";
/// Error log written to the home directory when `log_file` is not set.
pub const DEFAULT_LOG_FILE: &str = ".tag_errors";
pub const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Config {
    /// Name of the data folder at the root of a tagged tree.
    pub data_folder: String,
    /// Name of the database file inside the data folder.
    pub database: String,
    pub log_file: Option<PathBuf>,
    /// `tracing` filter directive used when `RUST_LOG` is not set.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_folder: tag_store::DEFAULT_DATA_FOLDER.to_string(),
            database: tag_store::DEFAULT_DATABASE.to_string(),
            log_file: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Config {
    /// Load from every source.
    pub fn load() -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = config_file() {
            figment = figment.merge(Toml::file(path));
        }
        Self::from_figment(figment.merge(Env::prefixed(ENV_PREFIX)))
    }

    /// Extract and validate a configuration from an already-assembled figment.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !is_single_component(&self.data_folder) {
            exn::bail!(ErrorKind::Invalid("data_folder must be a single directory name"));
        }
        if !is_single_component(&self.database) {
            exn::bail!(ErrorKind::Invalid("database must be a single file name"));
        }
        if self.log_level.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid("log_level must not be empty"));
        }
        Ok(())
    }

    pub fn layout(&self) -> Layout {
        Layout::new(&self.data_folder, &self.database)
    }

    /// Where errors are logged: `log_file` if set, otherwise
    /// [`DEFAULT_LOG_FILE`] in the home directory (or the temporary directory
    /// when there is no home).
    pub fn log_file(&self) -> PathBuf {
        if let Some(path) = &self.log_file {
            return path.clone();
        }
        let dir = BaseDirs::new().map_or_else(std::env::temp_dir, |dirs| dirs.home_dir().to_path_buf());
        dir.join(DEFAULT_LOG_FILE)
    }
}

/// Path of the configuration file, if the platform has a config directory.
pub fn config_file() -> Option<PathBuf> {
    ProjectDirs::from("", "", "tag").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

fn is_single_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!((components.next(), components.next()), (Some(Component::Normal(_)), None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use rstest::rstest;

    fn from_toml(toml: &str) -> Result<Config> {
        Config::from_figment(Figment::from(Serialized::defaults(Config::default())).merge(Toml::string(toml)))
    }

    #[test]
    fn test_defaults() {
        let config = from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.layout(), Layout::default());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let config = from_toml(
            r#"
                data_folder = ".tags"
                log_file = "/var/log/tag.log"
            "#,
        )
        .unwrap();
        assert_eq!(config.layout(), Layout::new(".tags", "tag.db"));
        assert_eq!(config.log_file(), PathBuf::from("/var/log/tag.log"));
        assert_eq!(config.log_level, "warn");
    }

    #[rstest]
    #[case(r#"data_folder = """#)]
    #[case(r#"data_folder = "a/b""#)]
    #[case(r#"data_folder = "..""#)]
    #[case(r#"database = "/abs/tag.db""#)]
    #[case(r#"log_level = " ""#)]
    fn test_invalid_values(#[case] toml: &str) {
        let err = from_toml(toml).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid(_)));
    }

    #[test]
    fn test_wrong_type() {
        let err = from_toml("log_level = 3").unwrap_err();
        assert!(matches!(&*err, ErrorKind::Load));
    }

    #[test]
    fn test_default_log_file_name() {
        assert!(Config::default().log_file().ends_with(DEFAULT_LOG_FILE));
    }

    #[test]
    fn test_environment_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", r#"log_level = "info""#)?;
            jail.set_env("TAG_LOG_LEVEL", "debug");
            jail.set_env("TAG_DATABASE", "other.db");
            let figment = Figment::from(Serialized::defaults(Config::default()))
                .merge(Toml::file("config.toml"))
                .merge(Env::prefixed(ENV_PREFIX));
            let config = Config::from_figment(figment).unwrap();
            assert_eq!(config.log_level, "debug");
            assert_eq!(config.database, "other.db");
            Ok(())
        });
    }
}
