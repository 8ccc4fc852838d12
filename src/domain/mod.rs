//! Domain models for smake
//!
//! Contains the value types, the project tree and the dependency graph
//! machinery, without any I/O concerns.

mod graph;
mod heap;
mod id;
mod order;
mod path;
mod project;
mod resource;
mod resource_map;

pub use graph::{DependencyGraph, FilteredGraph, Graph};
pub use heap::BinomialHeap;
pub use id::Identifier;
pub use order::{Color, OpenedLeaf, OrderError, TopologicalOrder};
pub use path::{Path, PathError};
pub use project::{Artefact, Block, ModelNode, Project, ProjectBuilder, ProjectError, ProjectPart, Source};
pub use resource::{ProductReference, Resource, ResourceId, SOURCE_TYPE, TARGET_TYPE, UNKNOWN_CONTENT};
pub use resource_map::{ResourceEntry, ResourceMap};
