//! Resolution engine
//!
//! Turns a project description into a resource map: layered resolver
//! registrations, resource masks, toolchains, and the context driving the
//! fixed-point resolution of one project.

mod context;
mod groups;
mod layer;
mod mask;
mod rules;
mod toolchain;

pub use context::{resolve_project, ProductSpec, ResolverContext};
pub use groups::ResourceResolverGroups;
pub use layer::{ArtefactResolver, LayerKind, ResolverLayer, ResourceResolver, ResourceResolverRecord};
pub use mask::{Pattern, ResourceMask};
pub use rules::{ArtefactRule, ResourceRule, RuleAction, RuleToolchain, ToolchainConfig};
pub use toolchain::{Toolchain, Toolchains};

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Resource {resource} is already registered in the project {project}")]
    DuplicateResource { project: String, resource: String },

    #[error("No resolver for the artefact '{artefact}' of type '{artefact_type}' in the project {project}")]
    UnresolvedArtefact {
        project: String,
        artefact: String,
        artefact_type: String,
    },

    #[error("No resolver for the resource {resource} in the project {project}")]
    UnresolvedResource { project: String, resource: String },

    #[error("Artefact type '{artefact_type}' already has a resolver in this layer")]
    DuplicateArtefactResolver { artefact_type: String },

    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Toolchain '{name}' failed: {message}")]
    Toolchain { name: String, message: String },

    #[error("Unknown toolchain '{name}' requested by {project}")]
    UnknownToolchain { project: String, name: String },
}
