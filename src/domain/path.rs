//! Relative slash-separated paths
//!
//! Path Format:
//! - segments separated by `/`, e.g. `src/main.cpp`
//! - every segment is non-empty (no leading, doubled or trailing slash)
//! - the empty string is the root path with no segments
//!
//! Paths are case-sensitive and never touch the file system.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Invalid path: '{0}'")]
    InvalidPath(String),
}

/// A relative path made of non-empty segments
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Path {
    segments: Vec<String>,
}

impl Path {
    /// Returns the root path (no segments)
    pub fn root() -> Self {
        Self::default()
    }

    /// Returns true for the root path
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the path segments
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns the last segment, or `None` for the root path
    pub fn basename(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Returns the text after the last `.` of the basename
    ///
    /// Empty when the basename has no dot or the path is the root.
    pub fn extension(&self) -> &str {
        self.basename()
            .and_then(|name| name.rfind('.').map(|dot| &name[dot + 1..]))
            .unwrap_or("")
    }

    /// Returns all segments but the last one, or `None` for the root path
    pub fn parent(&self) -> Option<Path> {
        if self.segments.is_empty() {
            return None;
        }
        Some(Path {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Concatenates two paths
    pub fn join(&self, other: &Path) -> Path {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Path { segments }
    }

    /// Replaces the extension of the basename
    ///
    /// The extension is the one [`Path::extension`] reports, so for a dot
    /// file like `.cpp` the whole name after the dot is replaced. A basename
    /// without an extension gets `.{extension}` appended. Returns `None`
    /// for the root path and when the new basename would be empty.
    pub fn with_extension(&self, extension: &str) -> Option<Path> {
        let name = self.basename()?;
        let stem = match name.rfind('.') {
            Some(dot) => &name[..dot],
            None => name,
        };
        let basename = if extension.is_empty() {
            stem.to_string()
        } else {
            format!("{}.{}", stem, extension)
        };
        if basename.is_empty() {
            return None;
        }

        let mut segments = self.segments.clone();
        let last = segments.len() - 1;
        segments[last] = basename;
        Some(Path { segments })
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }

        let segments: Vec<String> = s.split('/').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(PathError::InvalidPath(s.to_string()));
        }

        Ok(Self { segments })
    }
}

impl TryFrom<String> for Path {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Path> for String {
    fn from(path: Path) -> Self {
        path.to_string()
    }
}
