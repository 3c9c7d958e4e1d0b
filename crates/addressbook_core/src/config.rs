//! Process configuration for the address book.
//!
//! # Responsibility
//! - Load docbase connection settings and logging settings once at startup.
//! - Apply environment overrides on top of the TOML file.
//!
//! # Invariants
//! - A validated config always has non-empty docbase name, username and password.
//! - Passwords never appear in `Debug` output.

use crate::logging::default_log_level;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "addressbook.toml";
pub const DEFAULT_PAGE_SIZE: u32 = 100;

pub const ENV_REPOSITORY_NAME: &str = "ADDRESSBOOK_REPOSITORY_NAME";
pub const ENV_REPOSITORY_USERNAME: &str = "ADDRESSBOOK_REPOSITORY_USERNAME";
pub const ENV_REPOSITORY_PASSWORD: &str = "ADDRESSBOOK_REPOSITORY_PASSWORD";
pub const ENV_DATA_DIR: &str = "ADDRESSBOOK_DATA_DIR";
pub const ENV_LOG_LEVEL: &str = "ADDRESSBOOK_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "ADDRESSBOOK_LOG_DIR";

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
    Missing(&'static str),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config file: {err}"),
            Self::Missing(key) => write!(f, "missing required setting `{key}`"),
            Self::Invalid(message) => write!(f, "invalid setting: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Missing(_) | Self::Invalid(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

/// Username/password pair presented to the docbase.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Top-level configuration file shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub repository: RepositoryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Docbase connection settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Docbase name.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Directory holding docbase files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Create the docbase on first connect instead of failing.
    #[serde(default)]
    pub create_if_missing: bool,
    /// Objects fetched per store call when iterating query results.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            username: String::new(),
            password: String::new(),
            data_dir: default_data_dir(),
            create_if_missing: false,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Debug for RepositoryConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryConfig")
            .field("name", &self.name)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("data_dir", &self.data_dir)
            .field("create_if_missing", &self.create_if_missing)
            .field("page_size", &self.page_size)
            .finish()
    }
}

impl RepositoryConfig {
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.username.clone(), self.password.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// trace, debug, info, warn or error.
    #[serde(default = "default_level")]
    pub level: String,
    /// Log directory. Defaults to `<data_dir>/logs`.
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            directory: None,
        }
    }
}

impl LoggingConfig {
    /// Returns an absolute log directory, resolving relative paths against
    /// the current working directory.
    pub fn resolve_directory(&self, data_dir: &Path) -> PathBuf {
        let dir = self
            .directory
            .clone()
            .unwrap_or_else(|| data_dir.join("logs"));
        if dir.is_absolute() {
            return dir;
        }
        std::env::current_dir()
            .map(|cwd| cwd.join(&dir))
            .unwrap_or(dir)
    }
}

impl AppConfig {
    /// Loads config from `path` (or `addressbook.toml` when present), applies
    /// process environment overrides and validates the result.
    ///
    /// # Errors
    /// - An explicit `path` that cannot be read is an error; a missing default
    ///   file is not.
    /// - Returns `Missing` when required docbase settings are absent after
    ///   overrides.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Overwrites settings with values returned by `lookup`, keyed by the
    /// `ADDRESSBOOK_*` variable names. Empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(value) = get(ENV_REPOSITORY_NAME) {
            self.repository.name = value;
        }
        if let Some(value) = get(ENV_REPOSITORY_USERNAME) {
            self.repository.username = value;
        }
        if let Some(value) = get(ENV_REPOSITORY_PASSWORD) {
            self.repository.password = value;
        }
        if let Some(value) = get(ENV_DATA_DIR) {
            self.repository.data_dir = PathBuf::from(value);
        }
        if let Some(value) = get(ENV_LOG_LEVEL) {
            self.logging.level = value;
        }
        if let Some(value) = get(ENV_LOG_DIR) {
            self.logging.directory = Some(PathBuf::from(value));
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.repository.name.trim().is_empty() {
            return Err(ConfigError::Missing("repository.name"));
        }
        if self.repository.username.trim().is_empty() {
            return Err(ConfigError::Missing("repository.username"));
        }
        if self.repository.password.is_empty() {
            return Err(ConfigError::Missing("repository.password"));
        }
        if self.repository.page_size == 0 {
            return Err(ConfigError::Invalid(
                "repository.page_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_level() -> String {
    default_log_level().to_string()
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, ConfigError, Credentials, ENV_REPOSITORY_PASSWORD, ENV_LOG_DIR};
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    const SAMPLE: &str = r#"
[repository]
name = "contacts"
username = "dmadmin"
password = "s3cret"
data_dir = "/var/lib/addressbook"
page_size = 25

[logging]
level = "warn"
"#;

    #[test]
    fn parses_full_file() {
        let config = AppConfig::from_toml_str(SAMPLE).expect("sample should parse");
        assert_eq!(config.repository.name, "contacts");
        assert_eq!(config.repository.username, "dmadmin");
        assert_eq!(config.repository.page_size, 25);
        assert!(!config.repository.create_if_missing);
        assert_eq!(config.logging.level, "warn");
        config.validate().expect("sample should validate");
    }

    #[test]
    fn empty_file_uses_defaults_but_fails_validation() {
        let config = AppConfig::from_toml_str("").expect("empty file should parse");
        assert_eq!(config.repository.page_size, super::DEFAULT_PAGE_SIZE);
        let err = config.validate().expect_err("missing name must fail");
        assert!(matches!(err, ConfigError::Missing("repository.name")));
    }

    #[test]
    fn environment_overrides_win_and_blank_values_are_ignored() {
        let mut config = AppConfig::from_toml_str(SAMPLE).expect("sample should parse");
        let env = HashMap::from([
            (ENV_REPOSITORY_PASSWORD, "from-env".to_string()),
            (ENV_LOG_DIR, "  ".to_string()),
        ]);

        config.apply_overrides(|key| env.get(key).cloned());

        assert_eq!(config.repository.password, "from-env");
        assert_eq!(config.logging.directory, None);
    }

    #[test]
    fn zero_page_size_is_invalid() {
        let mut config = AppConfig::from_toml_str(SAMPLE).expect("sample should parse");
        config.repository.page_size = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn debug_output_redacts_passwords() {
        let config = AppConfig::from_toml_str(SAMPLE).expect("sample should parse");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("<redacted>"));

        let credentials = Credentials::new("user", "hunter2");
        assert!(!format!("{credentials:?}").contains("hunter2"));
    }

    #[test]
    fn log_directory_defaults_under_data_dir() {
        let config = AppConfig::from_toml_str(SAMPLE).expect("sample should parse");
        let dir = config
            .logging
            .resolve_directory(Path::new("/var/lib/addressbook"));
        assert_eq!(dir, PathBuf::from("/var/lib/addressbook/logs"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
