//! Resource domain model
//!
//! Resources are the nodes of the build graph. A resource is identified by
//! its type and path; the same path under two types names two resources.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::id::Identifier;
use super::path::Path;

/// Type of resources created from artefact sources
pub const SOURCE_TYPE: &str = "smake::source";

/// Type of resources produced by the build
pub const TARGET_TYPE: &str = "smake::target";

/// Content type of sources before any resolver classifies them
pub const UNKNOWN_CONTENT: &str = "smake::unknown_content";

/// Identity of a resource: (type, path)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub path: Path,
}

impl ResourceId {
    pub fn new(resource_type: impl Into<String>, path: Path) -> Self {
        Self {
            resource_type: resource_type.into(),
            path,
        }
    }

    /// Converts the resource identity into a graph node key (`type@path`)
    ///
    /// `%` and `@` in the type are percent-encoded, so the first `@` of the
    /// key always separates the type from the path.
    pub fn as_graph_id(&self) -> Identifier {
        Identifier::new(self.to_string())
    }
}

fn escape_type(resource_type: &str) -> String {
    resource_type.replace('%', "%25").replace('@', "%40")
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", escape_type(&self.resource_type), self.path)
    }
}

/// A build resource
///
/// File resources carry a content type (e.g. a language family) which
/// resource masks can match on. Plain resources have none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl Resource {
    /// Creates a plain (non-file) resource
    pub fn new(resource_type: impl Into<String>, path: Path) -> Self {
        Self {
            id: ResourceId::new(resource_type, path),
            content_type: None,
        }
    }

    /// Creates a file resource with a content type
    pub fn file(resource_type: impl Into<String>, path: Path, content_type: impl Into<String>) -> Self {
        Self {
            id: ResourceId::new(resource_type, path),
            content_type: Some(content_type.into()),
        }
    }

    /// Creates a source file resource with unknown content
    pub fn source(path: Path) -> Self {
        Self::file(SOURCE_TYPE, path, UNKNOWN_CONTENT)
    }

    /// Creates a target file resource
    pub fn target(path: Path, content_type: impl Into<String>) -> Self {
        Self::file(TARGET_TYPE, path, content_type)
    }

    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    pub fn path(&self) -> &Path {
        &self.id.path
    }

    pub fn resource_type(&self) -> &str {
        &self.id.resource_type
    }

    /// Returns true for file resources
    pub fn is_file(&self) -> bool {
        self.content_type.is_some()
    }
}

/// Back-reference from a resource to a product it contributes to
///
/// A resource may be attached to any number of products; the reference
/// does not own the resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductReference {
    /// Name of the artefact owning the product
    pub artefact: String,
    /// Product type tag (e.g. `executable`)
    pub product_type: String,
    /// The product resource
    pub resource: ResourceId,
}

impl ProductReference {
    pub fn new(artefact: impl Into<String>, product_type: impl Into<String>, resource: ResourceId) -> Self {
        Self {
            artefact: artefact.into(),
            product_type: product_type.into(),
            resource,
        }
    }
}

impl fmt::Display for ProductReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} ({})", self.artefact, self.product_type, self.resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> Path {
        s.parse().unwrap()
    }

    #[test]
    fn same_path_different_type_is_distinct() {
        let a = ResourceId::new(SOURCE_TYPE, path("x.cpp"));
        let b = ResourceId::new(TARGET_TYPE, path("x.cpp"));
        assert_ne!(a, b);
        assert_ne!(a.as_graph_id(), b.as_graph_id());
    }

    #[test]
    fn graph_id_format() {
        let id = ResourceId::new("object", path("dir/a.o"));
        assert_eq!(id.as_graph_id(), Identifier::from("object@dir/a.o"));
    }

    #[test]
    fn at_sign_in_type_does_not_collide_with_path() {
        let a = ResourceId::new("a", path("b@c"));
        let b = ResourceId::new("a@b", path("c"));
        assert_ne!(a.as_graph_id(), b.as_graph_id());
        assert_eq!(a.as_graph_id(), Identifier::from("a@b@c"));
        assert_eq!(b.as_graph_id(), Identifier::from("a%40b@c"));

        let escaped = ResourceId::new("a%40b", path("c"));
        assert_ne!(escaped.as_graph_id(), b.as_graph_id());
    }

    #[test]
    fn source_resources_are_files() {
        let r = Resource::source(path("main.c"));
        assert!(r.is_file());
        assert_eq!(r.resource_type(), SOURCE_TYPE);
        assert_eq!(r.content_type.as_deref(), Some(UNKNOWN_CONTENT));

        let plain = Resource::new("alias", path("all"));
        assert!(!plain.is_file());
    }
}
