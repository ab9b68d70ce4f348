//! Configuration handling for ropify

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::RopifyError;

/// Directory holding ropify's own project settings.
pub const CONFIG_DIR: &str = ".ropify";

/// Config file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.toml";

/// Ropify configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Ropify-specific settings
    #[serde(default)]
    pub ropify: RopifyConfig,
}

/// Core ropify settings
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RopifyConfig {
    /// Python interpreter running the rope worker
    #[serde(default)]
    pub python: Option<PathBuf>,

    /// Rope metadata folder relative to the project root
    #[serde(default)]
    pub ropefolder: Option<String>,

    /// Module prefixes hidden from import suggestions
    #[serde(default = "default_vendor_prefixes")]
    pub vendor_prefixes: Vec<String>,
}

fn default_vendor_prefixes() -> Vec<String> {
    vec!["site-packages".to_string()]
}

impl Default for RopifyConfig {
    fn default() -> Self {
        Self {
            python: None,
            ropefolder: None,
            vendor_prefixes: default_vendor_prefixes(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, RopifyError> {
        let content = fs::read_to_string(path).map_err(|e| RopifyError::Config {
            message: format!("failed to read {}: {}", path.display(), e),
        })?;
        toml::from_str(&content).map_err(|e| RopifyError::Config {
            message: format!("failed to parse {}: {}", path.display(), e),
        })
    }

    /// Load configuration from `.ropify/config.toml` in the given project root
    pub fn load_from_project(project_root: &Path) -> Result<Self, RopifyError> {
        let config_path = project_root.join(CONFIG_DIR).join(CONFIG_FILE);
        if config_path.exists() {
            tracing::debug!(path = %config_path.display(), "loading project config");
            Self::load(&config_path)
        } else {
            Ok(Config::default())
        }
    }

    /// Effective rope folder: the CLI value wins over the config file.
    pub fn ropefolder(&self, cli: Option<&str>) -> Option<String> {
        cli.map(str::to_string)
            .or_else(|| self.ropify.ropefolder.clone())
    }

    /// Configured interpreter, with relative paths taken from the project root.
    pub fn python(&self, project_root: &Path) -> Option<PathBuf> {
        self.ropify.python.as_ref().map(|python| {
            if python.is_relative() {
                project_root.join(python)
            } else {
                python.clone()
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(root: &Path, content: &str) {
        let dir = root.join(CONFIG_DIR);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(CONFIG_FILE), content).unwrap();
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = Config::load_from_project(temp.path()).unwrap();
        assert!(config.ropify.python.is_none());
        assert!(config.ropify.ropefolder.is_none());
        assert_eq!(config.ropify.vendor_prefixes, vec!["site-packages"]);
    }

    #[test]
    fn test_full_config() {
        let temp = TempDir::new().unwrap();
        write_config(
            temp.path(),
            r#"
[ropify]
python = "/opt/py/bin/python3"
ropefolder = ".rope"
vendor_prefixes = ["_vendor", "site-packages"]
"#,
        );

        let config = Config::load_from_project(temp.path()).unwrap();
        assert_eq!(
            config.ropify.python.as_deref(),
            Some(Path::new("/opt/py/bin/python3"))
        );
        assert_eq!(config.ropify.ropefolder.as_deref(), Some(".rope"));
        assert_eq!(config.ropify.vendor_prefixes.len(), 2);
    }

    #[test]
    fn test_partial_config_keeps_vendor_default() {
        let temp = TempDir::new().unwrap();
        write_config(temp.path(), "[ropify]\nropefolder = \".rope\"\n");

        let config = Config::load_from_project(temp.path()).unwrap();
        assert_eq!(config.ropify.vendor_prefixes, vec!["site-packages"]);
    }

    #[test]
    fn test_unknown_key_is_config_error() {
        let temp = TempDir::new().unwrap();
        write_config(temp.path(), "[ropify]\nropfolder = \".rope\"\n");

        let err = Config::load_from_project(temp.path()).unwrap_err();
        assert!(matches!(err, RopifyError::Config { .. }));
    }

    #[test]
    fn test_cli_ropefolder_wins() {
        let mut config = Config::default();
        config.ropify.ropefolder = Some(".from-config".to_string());

        assert_eq!(config.ropefolder(Some(".cli")).as_deref(), Some(".cli"));
        assert_eq!(config.ropefolder(None).as_deref(), Some(".from-config"));
        assert_eq!(Config::default().ropefolder(None), None);
    }

    #[test]
    fn test_relative_python_is_project_relative() {
        let mut config = Config::default();
        config.ropify.python = Some(PathBuf::from(".venv/bin/python3"));
        assert_eq!(
            config.python(Path::new("/work/proj")),
            Some(PathBuf::from("/work/proj/.venv/bin/python3"))
        );

        config.ropify.python = Some(PathBuf::from("/usr/bin/python3"));
        assert_eq!(
            config.python(Path::new("/work/proj")),
            Some(PathBuf::from("/usr/bin/python3"))
        );
    }
}
