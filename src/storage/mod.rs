//! # Storage Layer
//!
//! File formats read by smake. Both are TOML.
//!
//! | Data | Location |
//! |------|----------|
//! | Global config | `config.toml` in the user config directory |
//! | Project config | `smake.config.toml` next to the manifest |
//! | Manifest | any path, usually `smake.toml` |
//!
//! ## Key Types
//!
//! - [`Config`] - Merged toolchain configuration
//! - [`load_manifest`] - Reads a project description

mod config;
mod manifest;

pub use config::{Config, ConfigError, ConfigFile, CONFIG_DIR_ENV, PROJECT_CONFIG_FILE};
pub use manifest::{load_manifest, parse_manifest, ManifestError};
