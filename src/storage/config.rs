//! Configuration handling for smake
//!
//! Configuration is read from up to three TOML files, each optional except
//! an explicitly requested one:
//! - `config.toml` in the global config directory
//! - `smake.config.toml` next to the project manifest
//! - the file given with `--config`
//!
//! Later files override toolchains of the same name and replace the
//! default toolchains when they set them.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::resolver::{ResolveError, ResolverLayer, RuleToolchain, ToolchainConfig, Toolchains};

/// Name of the project configuration file
pub const PROJECT_CONFIG_FILE: &str = "smake.config.toml";

/// Overrides the global config directory
pub const CONFIG_DIR_ENV: &str = "SMAKE_CONFIG_DIR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Contents of one configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Toolchains constructed into the root layer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_toolchains: Option<Vec<String>>,

    pub toolchains: BTreeMap<String, ToolchainConfig>,
}

impl ConfigFile {
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

/// Merged configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub default_toolchains: Vec<String>,
    pub toolchains: BTreeMap<String, ToolchainConfig>,
    /// Files the configuration was read from, in load order
    pub files: Vec<PathBuf>,
}

impl Config {
    /// Loads the configuration for a project manifest
    pub fn load(manifest: &Path, explicit: Option<&Path>) -> Result<Self> {
        Self::load_from(Self::global_config_dir().as_deref(), manifest, explicit)
    }

    /// Loads the configuration with `global` as the global config directory
    pub fn load_from(global: Option<&Path>, manifest: &Path, explicit: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(dir) = global {
            config.merge_optional(&dir.join("config.toml"))?;
        }
        config.merge_optional(&Self::project_config_path(manifest))?;

        if let Some(path) = explicit {
            let file = Self::load_file(path)?;
            config.merge(path, file);
        }

        config.validate()?;
        Ok(config)
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
            return Some(PathBuf::from(dir));
        }
        ProjectDirs::from("net", "staon", "smake").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns the project config file belonging to a manifest
    pub fn project_config_path(manifest: &Path) -> PathBuf {
        let dir = manifest.parent().unwrap_or_else(|| Path::new(""));
        dir.join(PROJECT_CONFIG_FILE)
    }

    fn merge_optional(&mut self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Ok(());
        }
        let file = Self::load_file(path)?;
        self.merge(path, file);
        Ok(())
    }

    fn load_file(path: &Path) -> Result<ConfigFile> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        ConfigFile::parse(&content).with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Merges a configuration file over this configuration
    pub fn merge(&mut self, path: &Path, file: ConfigFile) {
        debug!(path = %path.display(), toolchains = file.toolchains.len(), "loaded configuration");

        if let Some(defaults) = file.default_toolchains {
            self.default_toolchains = defaults;
        }
        self.toolchains.extend(file.toolchains);
        self.files.push(path.to_path_buf());
    }

    /// Checks that the default toolchains are configured
    pub fn validate(&self) -> Result<(), ConfigError> {
        for name in &self.default_toolchains {
            if !self.toolchains.contains_key(name) {
                return Err(ConfigError::Invalid(format!(
                    "default toolchain '{}' is not configured",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Builds the toolchain registry
    pub fn toolchains(&self) -> Toolchains {
        let mut toolchains = Toolchains::new();
        for (name, rules) in &self.toolchains {
            toolchains.register(Rc::new(RuleToolchain::new(name, rules.clone())));
        }
        toolchains
    }

    /// Creates the root layer holding the default toolchains
    pub fn root_layer(&self, toolchains: &Toolchains) -> Result<Rc<ResolverLayer>, ResolveError> {
        let root = ResolverLayer::create_config_layer(None);
        toolchains.construct("the configuration", &self.default_toolchains, &root)?;
        Ok(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Artefact;
    use tempfile::TempDir;

    const CXX: &str = r#"
default_toolchains = ["cxx"]

[[toolchains.cxx.artefacts]]
type = "bin"
product = "executable"

[[toolchains.cxx.resources]]
type = "smake::target"
action = "terminal"
"#;

    #[test]
    fn parse_config_file() {
        let file = ConfigFile::parse(CXX).unwrap();
        assert_eq!(file.default_toolchains, Some(vec!["cxx".to_string()]));
        assert_eq!(file.toolchains["cxx"].artefacts.len(), 1);
        assert_eq!(file.toolchains["cxx"].resources.len(), 1);
    }

    #[test]
    fn parse_error_is_reported() {
        let err = ConfigFile::parse("default_toolchains = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn later_files_override_earlier_ones() {
        let mut config = Config::default();
        config.merge(Path::new("first.toml"), ConfigFile::parse(CXX).unwrap());

        let second = ConfigFile::parse(
            r#"
[[toolchains.cxx.artefacts]]
type = "lib"
product = "archive"

[toolchains.extra]
"#,
        )
        .unwrap();
        config.merge(Path::new("second.toml"), second);

        // defaults untouched, cxx replaced as a whole
        assert_eq!(config.default_toolchains, vec!["cxx"]);
        assert_eq!(config.toolchains["cxx"].artefacts[0].artefact_type, "lib");
        assert!(config.toolchains["cxx"].resources.is_empty());
        assert!(config.toolchains.contains_key("extra"));
        assert_eq!(config.files.len(), 2);
    }

    #[test]
    fn unknown_default_toolchain_is_invalid() {
        let config = Config {
            default_toolchains: vec!["missing".to_string()],
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn root_layer_holds_default_toolchains() {
        let mut config = Config::default();
        config.merge(Path::new("config.toml"), ConfigFile::parse(CXX).unwrap());

        let toolchains = config.toolchains();
        let root = config.root_layer(&toolchains).unwrap();
        assert!(root.search_artefact_resolver(&Artefact::new("hello", "bin")).is_some());
    }

    #[test]
    fn project_config_next_to_manifest() {
        let dir = TempDir::new().unwrap();
        let manifest = dir.path().join("smake.toml");
        fs::write(dir.path().join(PROJECT_CONFIG_FILE), CXX).unwrap();

        let global = dir.path().join("global");
        let config = Config::load_from(Some(&global), &manifest, None).unwrap();
        assert!(config.toolchains.contains_key("cxx"));
        assert_eq!(config.files, vec![dir.path().join(PROJECT_CONFIG_FILE)]);
    }

    #[test]
    fn global_config_comes_first() {
        let dir = TempDir::new().unwrap();
        let global = dir.path().join("global");
        fs::create_dir_all(&global).unwrap();
        fs::write(global.join("config.toml"), CXX).unwrap();
        fs::write(dir.path().join(PROJECT_CONFIG_FILE), "[toolchains.extra]\n").unwrap();
        let manifest = dir.path().join("smake.toml");

        let config = Config::load_from(Some(&global), &manifest, None).unwrap();
        assert_eq!(
            config.files,
            vec![global.join("config.toml"), dir.path().join(PROJECT_CONFIG_FILE)]
        );
        assert!(config.toolchains.contains_key("cxx"));
        assert!(config.toolchains.contains_key("extra"));
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        let manifest = dir.path().join("smake.toml");
        let missing = dir.path().join("nope.toml");
        let global = dir.path().join("global");
        assert!(Config::load_from(Some(&global), &manifest, Some(&missing)).is_err());
    }
}
