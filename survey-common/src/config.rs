//! Configuration loading and root folder resolution

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "SURVEY_ROOT_FOLDER";

/// Default listen address
pub const DEFAULT_BIND: &str = "127.0.0.1";

/// Default listen port
pub const DEFAULT_PORT: u16 = 5740;

/// Results store file name inside the root folder
pub const RESULTS_DB_FILE: &str = "survey_results.db";

/// Optional settings read from `config.toml`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub images_root: Option<PathBuf>,
    pub bind: Option<String>,
    pub port: Option<u16>,
}

impl TomlConfig {
    /// Parse TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load from the platform config file, if one exists and parses
    ///
    /// A missing or malformed file is not fatal: a warning is logged and
    /// defaults apply.
    pub fn load_default() -> Option<Self> {
        let path = config_file_path().ok()?;
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Could not read config file {}: {}", path.display(), e);
                return None;
            }
        };
        match Self::parse(&content) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!("Ignoring config file {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// Values supplied on the command line (highest priority)
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub root_folder: Option<PathBuf>,
    pub images_root: Option<PathBuf>,
    pub bind: Option<String>,
    pub port: Option<u16>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct SurveyConfig {
    /// Folder holding the results store
    pub root_folder: PathBuf,
    /// Folder containing `real_images/` and `fake_images/`
    pub images_root: PathBuf,
    pub bind: String,
    pub port: u16,
}

impl SurveyConfig {
    /// Resolve configuration from CLI, environment, config file and defaults
    pub fn resolve(overrides: ConfigOverrides) -> Self {
        Self::resolve_with(overrides, TomlConfig::load_default())
    }

    /// Resolve against an already-loaded config file
    pub fn resolve_with(overrides: ConfigOverrides, file: Option<TomlConfig>) -> Self {
        let file = file.unwrap_or_default();

        let root_folder = resolve_root_folder(
            overrides.root_folder.as_deref(),
            ROOT_FOLDER_ENV,
            file.root_folder.as_deref(),
        );

        Self {
            root_folder,
            images_root: overrides
                .images_root
                .or(file.images_root)
                .unwrap_or_else(|| PathBuf::from("images")),
            bind: overrides
                .bind
                .or(file.bind)
                .unwrap_or_else(|| DEFAULT_BIND.to_string()),
            port: overrides.port.or(file.port).unwrap_or(DEFAULT_PORT),
        }
    }

    /// Path of the SQLite results store
    pub fn results_db_path(&self) -> PathBuf {
        self.root_folder.join(RESULTS_DB_FILE)
    }

    /// `host:port` string for the listener
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

/// Root folder resolution in priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    config_file_value: Option<&Path>,
) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = config_file_value {
        return path.to_path_buf();
    }

    default_root_folder()
}

/// Platform config file location
fn config_file_path() -> Result<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("deepfake-survey").join("config.toml"));

    if let Some(path) = user_config {
        if path.exists() {
            return Ok(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/deepfake-survey/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
    }

    Err(Error::Config("No config file found".to_string()))
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("deepfake-survey"))
        .unwrap_or_else(|| PathBuf::from("./survey_data"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[test]
    #[serial]
    fn test_cli_argument_wins() {
        env::set_var(ROOT_FOLDER_ENV, "/tmp/from-env");
        let resolved = resolve_root_folder(
            Some(Path::new("/tmp/from-cli")),
            ROOT_FOLDER_ENV,
            Some(Path::new("/tmp/from-file")),
        );
        env::remove_var(ROOT_FOLDER_ENV);

        assert_eq!(resolved, PathBuf::from("/tmp/from-cli"));
    }

    #[test]
    #[serial]
    fn test_env_beats_config_file() {
        env::set_var(ROOT_FOLDER_ENV, "/tmp/from-env");
        let resolved =
            resolve_root_folder(None, ROOT_FOLDER_ENV, Some(Path::new("/tmp/from-file")));
        env::remove_var(ROOT_FOLDER_ENV);

        assert_eq!(resolved, PathBuf::from("/tmp/from-env"));
    }

    #[test]
    #[serial]
    fn test_config_file_then_default() {
        env::remove_var(ROOT_FOLDER_ENV);

        let resolved =
            resolve_root_folder(None, ROOT_FOLDER_ENV, Some(Path::new("/tmp/from-file")));
        assert_eq!(resolved, PathBuf::from("/tmp/from-file"));

        let resolved = resolve_root_folder(None, ROOT_FOLDER_ENV, None);
        assert_eq!(resolved, default_root_folder());
    }

    #[test]
    #[serial]
    fn test_resolve_with_file_values() {
        env::remove_var(ROOT_FOLDER_ENV);

        let file = TomlConfig::parse(
            r#"
            root_folder = "/srv/survey"
            images_root = "/srv/survey/images"
            port = 8080
            "#,
        )
        .unwrap();

        let config = SurveyConfig::resolve_with(
            ConfigOverrides {
                bind: Some("0.0.0.0".to_string()),
                ..Default::default()
            },
            Some(file),
        );

        assert_eq!(config.root_folder, PathBuf::from("/srv/survey"));
        assert_eq!(config.images_root, PathBuf::from("/srv/survey/images"));
        assert_eq!(config.listen_addr(), "0.0.0.0:8080");
        assert_eq!(
            config.results_db_path(),
            PathBuf::from("/srv/survey/survey_results.db")
        );
    }

    #[test]
    #[serial]
    fn test_defaults_without_any_source() {
        env::remove_var(ROOT_FOLDER_ENV);

        let config = SurveyConfig::resolve_with(ConfigOverrides::default(), None);
        assert_eq!(config.images_root, PathBuf::from("images"));
        assert_eq!(config.bind, DEFAULT_BIND);
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let err = TomlConfig::parse("port = \"not a number\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
