//! smake - resolves build projects into resource dependency graphs
//!
//! A project describes artefacts (libraries, executables) and their
//! sources. Toolchains contribute resolvers which turn artefacts into
//! products and resources into further resources, until the project is a
//! complete dependency graph of resources. The graph is then walked in
//! topological order by cutting leaves.

pub mod cli;
pub mod domain;
pub mod resolver;
pub mod storage;

pub use domain::{Identifier, Path, Project, ProjectBuilder, Resource, ResourceId, ResourceMap};
pub use resolver::{resolve_project, ResolveError};
