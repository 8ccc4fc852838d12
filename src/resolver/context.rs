//! Resolver context
//!
//! Drives the resolution of one project. The project tree is walked first:
//! every scope gets its own layer, artefacts are handed to their artefact
//! resolvers, and the sources of every registered product are replayed
//! into the resource map. Each new resource joins a FIFO queue together
//! with the layer and product active at that moment. A shared resource
//! found again in another scope is queued again with that scope. The queue
//! is then drained, applying the matching resource resolvers of the
//! remembered layer chain, until no resource is pending. A resolver is
//! applied to a resource at most once.

use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use tracing::{debug, info};

use crate::domain::{
    Artefact, Block, ModelNode, Path, ProductReference, Project, ProjectPart, Resource, ResourceId, ResourceMap,
    Source,
};

use super::groups::ResourceResolverGroups;
use super::layer::{LayerKind, ResolverLayer, ResourceResolver, ResourceResolverRecord};
use super::mask::ResourceMask;
use super::toolchain::Toolchains;
use super::ResolveError;

/// Description of one product of an artefact
///
/// The resolvers are active only while the artefact's sources are replayed
/// for this product, and for the resources discovered from them.
#[derive(Debug, Clone)]
pub struct ProductSpec {
    pub product_type: String,
    pub resource: Resource,
    pub resolvers: Vec<ResourceResolverRecord>,
}

impl ProductSpec {
    pub fn new(product_type: impl Into<String>, resource: Resource) -> Self {
        Self {
            product_type: product_type.into(),
            resource,
            resolvers: Vec::new(),
        }
    }

    pub fn with_resolver(mut self, mask: ResourceMask, group: Option<&str>, resolver: Rc<dyn ResourceResolver>) -> Self {
        self.resolvers.push(ResourceResolverRecord::new(mask, group, resolver));
        self
    }
}

#[derive(Debug)]
struct PendingResource {
    resource: ResourceId,
    layer: Rc<ResolverLayer>,
    product: Option<ProductReference>,
}

/// Resolves a project into its resource map
///
/// `root` is the configuration layer; `toolchains` supplies the toolchains
/// requested by the project and its blocks.
pub fn resolve_project(
    root: &Rc<ResolverLayer>,
    toolchains: &Toolchains,
    project: &Project,
) -> Result<ResourceMap, ResolveError> {
    let mut ctx = ResolverContext::new(root, toolchains, project);
    ctx.visit(ModelNode::Project(project))?;

    info!(
        project = %project.name(),
        resources = ctx.map.len(),
        dependencies = ctx.map.edge_count(),
        "project resolved"
    );
    Ok(ctx.map)
}

pub struct ResolverContext<'a> {
    toolchains: &'a Toolchains,
    project: &'a Project,
    layer: Rc<ResolverLayer>,
    artefact: Option<&'a Artefact>,
    product: Option<ProductReference>,
    queue: VecDeque<PendingResource>,
    /// Resolvers already applied to each resource
    applied: HashMap<ResourceId, Vec<Rc<dyn ResourceResolver>>>,
    map: ResourceMap,
}

impl<'a> ResolverContext<'a> {
    fn new(root: &Rc<ResolverLayer>, toolchains: &'a Toolchains, project: &'a Project) -> Self {
        Self {
            toolchains,
            project,
            layer: Rc::clone(root),
            artefact: None,
            product: None,
            queue: VecDeque::new(),
            applied: HashMap::new(),
            map: ResourceMap::new(),
        }
    }

    /// The layer currently in scope
    pub fn layer(&self) -> &Rc<ResolverLayer> {
        &self.layer
    }

    /// The product in scope
    ///
    /// While a resource is being resolved, this is the product under which
    /// the resource was discovered.
    pub fn current_product(&self) -> Option<&ProductReference> {
        self.product.as_ref()
    }

    /// Products a resource is attached to
    pub fn products_of(&self, id: &ResourceId) -> &[ProductReference] {
        self.map.products(id)
    }

    /// Creates a target file resource without registering it
    pub fn create_target_resource(&self, path: Path, content_type: &str) -> Resource {
        Resource::target(path, content_type)
    }

    /// Registers a resource which must not exist yet
    pub fn register_unique_resource(&mut self, resource: Resource) -> Result<ResourceId, ResolveError> {
        let id = resource.id.clone();
        if self.map.contains(&id) {
            return Err(ResolveError::DuplicateResource {
                project: self.project.name().to_string(),
                resource: id.to_string(),
            });
        }
        self.insert(resource);
        Ok(id)
    }

    /// Registers a resource, reusing the instance already in the map
    ///
    /// A reused resource is queued again, so the resolvers of the current
    /// scope see it too.
    pub fn register_shared_resource(&mut self, resource: Resource) -> ResourceId {
        let id = resource.id.clone();
        if self.map.contains(&id) {
            self.enqueue(id.clone());
        } else {
            self.insert(resource);
        }
        id
    }

    /// Registers a resource produced from `original`
    ///
    /// The derived resource is unique and inherits the product attachments
    /// of the original.
    pub fn register_result_resource(&mut self, original: &ResourceId, derived: Resource) -> Result<ResourceId, ResolveError> {
        let id = self.register_unique_resource(derived)?;
        for product in self.map.products(original).to_vec() {
            self.map.attach_product(&id, product);
        }
        Ok(id)
    }

    /// Adds the dependency `from -> to` between registered resources
    ///
    /// Returns false if the dependency already existed.
    pub fn add_dependency(&mut self, from: &ResourceId, to: &ResourceId) -> bool {
        self.map.add_dependency(from, to)
    }

    /// Registers a product of the artefact being resolved
    ///
    /// The product resource is unique. The artefact's sources are replayed
    /// under a new layer holding the product's resolvers.
    pub fn register_artefact_product(&mut self, spec: ProductSpec) -> Result<ProductReference, ResolveError> {
        let Some(artefact) = self.artefact else {
            panic!("products can only be registered while an artefact is resolved");
        };

        let reference = ProductReference::new(artefact.name(), &spec.product_type, spec.resource.id.clone());
        debug!(product = %reference, "registering artefact product");

        let layer = ResolverLayer::nested(&self.layer, LayerKind::Product);
        for record in spec.resolvers {
            layer.add_resource_record(record);
        }

        let previous = self.product.replace(reference.clone());
        let result = self.with_layer(layer, |ctx| {
            ctx.register_unique_resource(spec.resource)?;
            for source in artefact.sources() {
                ctx.visit(ModelNode::Source(source))?;
            }
            Ok(())
        });
        self.product = previous;

        result.map(|()| reference)
    }

    fn insert(&mut self, resource: Resource) {
        let id = resource.id.clone();
        self.map.add_resource(resource);
        self.enqueue(id);
    }

    fn enqueue(&mut self, id: ResourceId) {
        debug!(resource = %id, layer = %self.layer.kind(), "resource queued");
        self.queue.push_back(PendingResource {
            resource: id,
            layer: Rc::clone(&self.layer),
            product: self.product.clone(),
        });
    }

    /// Runs `f` with `layer` in scope, restoring the current layer after
    fn with_layer<R>(
        &mut self,
        layer: Rc<ResolverLayer>,
        f: impl FnOnce(&mut Self) -> Result<R, ResolveError>,
    ) -> Result<R, ResolveError> {
        let parent = std::mem::replace(&mut self.layer, layer);
        debug!(layer = %self.layer.kind(), depth = self.layer.depth(), "scope opened");
        let result = f(self);
        debug!(layer = %self.layer.kind(), "scope closed");
        self.layer = parent;
        result
    }

    fn visit(&mut self, node: ModelNode<'a>) -> Result<(), ResolveError> {
        match node {
            ModelNode::Project(project) => self.visit_project(project),
            ModelNode::Block(block) => self.visit_block(block),
            ModelNode::Artefact(artefact) => self.visit_artefact(artefact),
            ModelNode::Source(source) => self.visit_source(source),
        }
    }

    fn visit_children(&mut self, children: &'a [ProjectPart]) -> Result<(), ResolveError> {
        for child in children {
            match child {
                ProjectPart::Block(block) => self.visit(ModelNode::Block(block))?,
                ProjectPart::Artefact(artefact) => self.visit(ModelNode::Artefact(artefact))?,
            }
        }
        Ok(())
    }

    fn visit_project(&mut self, project: &'a Project) -> Result<(), ResolveError> {
        info!(project = %project.name(), "resolving project");
        let layer = ResolverLayer::create_project_layer(&self.layer);
        self.toolchains
            .construct(project.name(), &project.toolchains, &layer)?;

        let result = self.with_layer(layer, |ctx| {
            ctx.visit_children(&project.children)?;
            ctx.drain_queue()
        });
        self.queue.clear();
        result
    }

    fn visit_block(&mut self, block: &'a Block) -> Result<(), ResolveError> {
        let layer = ResolverLayer::nested(&self.layer, LayerKind::Block);
        self.toolchains
            .construct(self.project.name(), &block.toolchains, &layer)?;
        self.with_layer(layer, |ctx| ctx.visit_children(&block.children))
    }

    fn visit_artefact(&mut self, artefact: &'a Artefact) -> Result<(), ResolveError> {
        let project = self.project;
        let unresolved = || ResolveError::UnresolvedArtefact {
            project: project.name().to_string(),
            artefact: artefact.name().to_string(),
            artefact_type: artefact.artefact_type().to_string(),
        };

        let Some(resolver) = self.layer.search_artefact_resolver(artefact) else {
            return Err(unresolved());
        };
        debug!(artefact = %artefact.name(), artefact_type = %artefact.artefact_type(), "resolving artefact");

        let previous = self.artefact.replace(artefact);
        let result = resolver.resolve_artefact(self, artefact);
        self.artefact = previous;

        if result? {
            Ok(())
        } else {
            Err(unresolved())
        }
    }

    fn visit_source(&mut self, source: &'a Source) -> Result<(), ResolveError> {
        let id = self.register_shared_resource(Resource::source(source.path.clone()));
        if let Some(product) = self.product.clone() {
            self.map.attach_product(&id, product);
        }
        Ok(())
    }

    fn drain_queue(&mut self) -> Result<(), ResolveError> {
        while let Some(pending) = self.queue.pop_front() {
            let resource = match self.map.get(&pending.resource) {
                Some(resource) => resource.clone(),
                None => panic!("queued resource {} is not in the map", pending.resource),
            };

            let mut groups = ResourceResolverGroups::new();
            pending.layer.search_resource_resolvers(&mut groups, &resource);

            let applied = self.applied.entry(resource.id.clone()).or_default();
            if groups.is_empty() && applied.is_empty() {
                return Err(ResolveError::UnresolvedResource {
                    project: self.project.name().to_string(),
                    resource: resource.id.to_string(),
                });
            }
            let resolvers: Vec<_> = groups
                .into_vec()
                .into_iter()
                .filter(|resolver| !applied.iter().any(|done| Rc::ptr_eq(done, resolver)))
                .collect();
            if resolvers.is_empty() {
                continue;
            }
            applied.extend(resolvers.iter().cloned());

            debug!(
                resource = %resource.id,
                resolvers = resolvers.len(),
                pending = self.queue.len(),
                "resolving resource"
            );

            let previous = std::mem::replace(&mut self.product, pending.product);
            let result = self.with_layer(pending.layer, |ctx| {
                for resolver in resolvers.iter() {
                    resolver.resolve_resource(ctx, &resource)?;
                }
                Ok(())
            });
            self.product = previous;
            result?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for ResolverContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverContext")
            .field("project", &self.project.name())
            .field("layer", &self.layer)
            .field("product", &self.product)
            .field("pending", &self.queue.len())
            .field("resources", &self.map.len())
            .finish()
    }
}
