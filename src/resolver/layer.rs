//! Resolver layers
//!
//! Layers form a parent-linked chain following the nesting of the project:
//! the configuration layer at the root, then one layer per project, block
//! and artefact product. Registrations are append-only, and a layer is
//! only written to while its scope is open.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::domain::{Artefact, Resource};

use super::context::ResolverContext;
use super::groups::ResourceResolverGroups;
use super::mask::ResourceMask;
use super::ResolveError;

/// Resolves an artefact into its products
pub trait ArtefactResolver {
    /// Registers the products of the artefact through the context
    ///
    /// Returning `Ok(false)` means the resolver could not handle the
    /// artefact, which fails the resolution.
    fn resolve_artefact(&self, ctx: &mut ResolverContext<'_>, artefact: &Artefact) -> Result<bool, ResolveError>;
}

/// Resolves a resource into further resources and dependencies
pub trait ResourceResolver {
    fn resolve_resource(&self, ctx: &mut ResolverContext<'_>, resource: &Resource) -> Result<(), ResolveError>;
}

/// Which scope a layer belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Config,
    Project,
    Block,
    Product,
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LayerKind::Config => "config",
            LayerKind::Project => "project",
            LayerKind::Block => "block",
            LayerKind::Product => "product",
        };
        write!(f, "{}", name)
    }
}

/// A resource resolver together with the resources it applies to
#[derive(Clone)]
pub struct ResourceResolverRecord {
    pub mask: ResourceMask,
    pub group: Option<String>,
    pub resolver: Rc<dyn ResourceResolver>,
}

impl ResourceResolverRecord {
    pub fn new(mask: ResourceMask, group: Option<&str>, resolver: Rc<dyn ResourceResolver>) -> Self {
        Self {
            mask,
            group: group.map(str::to_string),
            resolver,
        }
    }
}

impl fmt::Debug for ResourceResolverRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceResolverRecord")
            .field("mask", &self.mask)
            .field("group", &self.group)
            .finish_non_exhaustive()
    }
}

pub struct ResolverLayer {
    kind: LayerKind,
    parent: Option<Rc<ResolverLayer>>,
    artefact_resolvers: RefCell<HashMap<String, Rc<dyn ArtefactResolver>>>,
    resource_resolvers: RefCell<Vec<ResourceResolverRecord>>,
}

impl ResolverLayer {
    fn with_parent(kind: LayerKind, parent: Option<Rc<ResolverLayer>>) -> Rc<Self> {
        Rc::new(Self {
            kind,
            parent,
            artefact_resolvers: RefCell::new(HashMap::new()),
            resource_resolvers: RefCell::new(Vec::new()),
        })
    }

    /// Creates a configuration layer, usually the root of the chain
    pub fn create_config_layer(parent: Option<Rc<ResolverLayer>>) -> Rc<Self> {
        Self::with_parent(LayerKind::Config, parent)
    }

    pub fn create_project_layer(parent: &Rc<ResolverLayer>) -> Rc<Self> {
        Self::with_parent(LayerKind::Project, Some(Rc::clone(parent)))
    }

    /// Creates a nested layer of the given kind
    pub fn nested(parent: &Rc<ResolverLayer>, kind: LayerKind) -> Rc<Self> {
        Self::with_parent(kind, Some(Rc::clone(parent)))
    }

    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    pub fn parent(&self) -> Option<&Rc<ResolverLayer>> {
        self.parent.as_ref()
    }

    /// Number of layers above this one
    pub fn depth(&self) -> usize {
        self.ancestors().count() - 1
    }

    /// Iterates from this layer outward to the root
    fn ancestors(&self) -> impl Iterator<Item = &ResolverLayer> {
        std::iter::successors(Some(self), |layer| layer.parent.as_deref())
    }

    /// Registers the resolver of an artefact type
    ///
    /// A layer holds at most one resolver per artefact type. Inner layers
    /// may still shadow resolvers of outer ones.
    pub fn add_artefact_resolver(&self, artefact_type: &str, resolver: Rc<dyn ArtefactResolver>) -> Result<(), ResolveError> {
        let mut resolvers = self.artefact_resolvers.borrow_mut();
        if resolvers.contains_key(artefact_type) {
            return Err(ResolveError::DuplicateArtefactResolver {
                artefact_type: artefact_type.to_string(),
            });
        }
        resolvers.insert(artefact_type.to_string(), resolver);
        Ok(())
    }

    /// Finds the innermost resolver of the artefact's type
    pub fn search_artefact_resolver(&self, artefact: &Artefact) -> Option<Rc<dyn ArtefactResolver>> {
        self.ancestors().find_map(|layer| {
            layer
                .artefact_resolvers
                .borrow()
                .get(artefact.artefact_type())
                .cloned()
        })
    }

    pub fn add_resource_resolver(&self, mask: ResourceMask, group: Option<&str>, resolver: Rc<dyn ResourceResolver>) {
        self.add_resource_record(ResourceResolverRecord::new(mask, group, resolver));
    }

    pub fn add_resource_record(&self, record: ResourceResolverRecord) {
        self.resource_resolvers.borrow_mut().push(record);
    }

    /// Collects the matching resource resolvers of the whole chain
    ///
    /// Layers are searched from this one outward, so within a group an
    /// inner resolver wins over an outer one.
    pub fn search_resource_resolvers(&self, out: &mut ResourceResolverGroups, resource: &Resource) {
        for layer in self.ancestors() {
            for record in layer.resource_resolvers.borrow().iter() {
                if !record.mask.matches(resource) {
                    continue;
                }
                let kept = out.append(record.group.as_deref(), Rc::clone(&record.resolver));
                trace!(
                    resource = %resource.id,
                    layer = %layer.kind,
                    mask = %record.mask,
                    kept,
                    "resource resolver matches"
                );
            }
        }
    }
}

impl fmt::Debug for ResolverLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut artefact_types: Vec<String> = self.artefact_resolvers.borrow().keys().cloned().collect();
        artefact_types.sort();
        f.debug_struct("ResolverLayer")
            .field("kind", &self.kind)
            .field("depth", &self.depth())
            .field("artefact_types", &artefact_types)
            .field("resource_resolvers", &self.resource_resolvers.borrow().len())
            .finish()
    }
}
