//! Declarative rule toolchains
//!
//! A rule toolchain is described in configuration. Artefact rules turn an
//! artefact into one product file; resource rules either derive a new
//! target file from the matched resource or mark it as needing nothing
//! further.

use serde::{Deserialize, Serialize};
use std::rc::Rc;

use crate::domain::{Artefact, Path, PathError, Resource};

use super::context::{ProductSpec, ResolverContext};
use super::layer::{ArtefactResolver, ResolverLayer, ResourceResolver};
use super::mask::ResourceMask;
use super::toolchain::Toolchain;
use super::ResolveError;

fn any_pattern() -> String {
    "*".to_string()
}

fn name_template() -> String {
    "{name}".to_string()
}

fn binary_content() -> String {
    "binary".to_string()
}

/// Rules of one toolchain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    pub artefacts: Vec<ArtefactRule>,
    pub resources: Vec<ResourceRule>,
}

/// Produces one product file per artefact of a type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtefactRule {
    #[serde(rename = "type")]
    pub artefact_type: String,
    /// Product type tag
    pub product: String,
    /// Content type of the product file
    #[serde(default = "binary_content")]
    pub content: String,
    /// Product path; `{name}` expands to the artefact name
    #[serde(default = "name_template")]
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRule {
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(default = "any_pattern")]
    pub path: String,
    #[serde(default = "any_pattern")]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub action: RuleAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    /// The resource needs no further resolution
    Terminal,
    /// Derives a target file with the extension replaced
    Derive { extension: String, content: String },
}

/// Toolchain built from a [`ToolchainConfig`]
#[derive(Debug, Clone)]
pub struct RuleToolchain {
    name: String,
    config: ToolchainConfig,
}

impl RuleToolchain {
    pub fn new(name: impl Into<String>, config: ToolchainConfig) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }
}

impl Toolchain for RuleToolchain {
    fn name(&self) -> &str {
        &self.name
    }

    fn construct_resolvers(&self, layer: &ResolverLayer) -> Result<(), ResolveError> {
        for rule in &self.config.artefacts {
            layer.add_artefact_resolver(
                &rule.artefact_type,
                Rc::new(ProductRule {
                    toolchain: self.name.clone(),
                    rule: rule.clone(),
                }),
            )?;
        }

        for rule in &self.config.resources {
            let mask = ResourceMask::parse(&rule.resource_type, &rule.path, &rule.content)?;
            let resolver: Rc<dyn ResourceResolver> = match &rule.action {
                RuleAction::Terminal => Rc::new(TerminalRule),
                RuleAction::Derive { extension, content } => Rc::new(DeriveRule {
                    toolchain: self.name.clone(),
                    extension: extension.clone(),
                    content: content.clone(),
                }),
            };
            layer.add_resource_resolver(mask, rule.group.as_deref(), resolver);
        }
        Ok(())
    }
}

struct ProductRule {
    toolchain: String,
    rule: ArtefactRule,
}

impl ArtefactResolver for ProductRule {
    fn resolve_artefact(&self, ctx: &mut ResolverContext<'_>, artefact: &Artefact) -> Result<bool, ResolveError> {
        let expanded = self.rule.path.replace("{name}", artefact.name());
        let path: Path = expanded
            .parse()
            .map_err(|e: PathError| ResolveError::Toolchain {
                name: self.toolchain.clone(),
                message: e.to_string(),
            })?;

        let resource = ctx.create_target_resource(path, &self.rule.content);
        ctx.register_artefact_product(ProductSpec::new(&self.rule.product, resource))?;
        Ok(true)
    }
}

struct TerminalRule;

impl ResourceResolver for TerminalRule {
    fn resolve_resource(&self, _: &mut ResolverContext<'_>, _: &Resource) -> Result<(), ResolveError> {
        Ok(())
    }
}

struct DeriveRule {
    toolchain: String,
    extension: String,
    content: String,
}

impl ResourceResolver for DeriveRule {
    fn resolve_resource(&self, ctx: &mut ResolverContext<'_>, resource: &Resource) -> Result<(), ResolveError> {
        let Some(path) = resource.path().with_extension(&self.extension) else {
            return Err(ResolveError::Toolchain {
                name: self.toolchain.clone(),
                message: format!("cannot derive a file from {}", resource.id),
            });
        };

        let derived = ctx.create_target_resource(path, &self.content);
        let derived = ctx.register_result_resource(resource.id(), derived)?;
        ctx.add_dependency(&derived, resource.id());

        for product in ctx.products_of(&derived).to_vec() {
            ctx.add_dependency(&product.resource, &derived);
        }
        Ok(())
    }
}
