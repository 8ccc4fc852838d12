//! Resource map
//!
//! The single owner of every resource of a resolved project, of the
//! products each resource is attached to, and of the dependency graph
//! between resources. Graph nodes are keyed by [`ResourceId::as_graph_id`]
//! and carry the resource id as payload.

use std::collections::HashMap;

use super::graph::{DependencyGraph, FilteredGraph, Graph};
use super::id::Identifier;
use super::order::TopologicalOrder;
use super::resource::{ProductReference, Resource, ResourceId};

/// A resource together with its product attachments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceEntry {
    pub resource: Resource,
    pub products: Vec<ProductReference>,
}

#[derive(Debug, Clone, Default)]
pub struct ResourceMap {
    resources: HashMap<ResourceId, ResourceEntry>,
    /// Insertion order of the resources
    order: Vec<ResourceId>,
    dependencies: DependencyGraph<ResourceId>,
}

impl ResourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of resources
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn contains(&self, id: &ResourceId) -> bool {
        self.resources.contains_key(id)
    }

    pub fn get(&self, id: &ResourceId) -> Option<&Resource> {
        self.resources.get(id).map(|entry| &entry.resource)
    }

    pub fn entry(&self, id: &ResourceId) -> Option<&ResourceEntry> {
        self.resources.get(id)
    }

    /// Iterates over the resources in insertion order
    pub fn entries(&self) -> impl Iterator<Item = &ResourceEntry> {
        self.order.iter().filter_map(|id| self.resources.get(id))
    }

    /// Adds a new resource; the id must not be present yet
    pub fn add_resource(&mut self, resource: Resource) {
        let id = resource.id.clone();
        assert!(!self.resources.contains_key(&id), "resource {} is already in the map", id);

        self.dependencies.add_node(id.as_graph_id(), id.clone());
        self.order.push(id.clone());
        self.resources.insert(
            id,
            ResourceEntry {
                resource,
                products: Vec::new(),
            },
        );
    }

    /// Products a resource is attached to
    pub fn products(&self, id: &ResourceId) -> &[ProductReference] {
        self.resources
            .get(id)
            .map(|entry| entry.products.as_slice())
            .unwrap_or(&[])
    }

    /// Attaches a resource to a product
    ///
    /// Returns false if the attachment already existed.
    pub fn attach_product(&mut self, id: &ResourceId, product: ProductReference) -> bool {
        let Some(entry) = self.resources.get_mut(id) else {
            panic!("resource {} is not in the map", id);
        };
        if entry.products.contains(&product) {
            return false;
        }
        entry.products.push(product);
        true
    }

    /// Adds the dependency `from -> to`; both resources must exist
    ///
    /// Returns false if the dependency already existed.
    pub fn add_dependency(&mut self, from: &ResourceId, to: &ResourceId) -> bool {
        self.dependencies
            .add_dependency(&from.as_graph_id(), &to.as_graph_id())
    }

    /// Direct dependencies of a resource
    pub fn dependencies(&self, id: &ResourceId) -> Vec<ResourceId> {
        self.resolve_ids(self.dependencies.dependencies(&id.as_graph_id()))
    }

    /// Direct dependents of a resource
    pub fn dependents(&self, id: &ResourceId) -> Vec<ResourceId> {
        self.resolve_ids(self.dependencies.dependents(&id.as_graph_id()))
    }

    /// Returns every dependency edge as `(from, to)`
    pub fn edges(&self) -> Vec<(ResourceId, ResourceId)> {
        let graph = &self.dependencies;
        graph
            .edges()
            .into_iter()
            .map(|(from, to)| (graph.node(from).clone(), graph.node(to).clone()))
            .collect()
    }

    pub fn edge_count(&self) -> usize {
        self.dependencies.edge_count()
    }

    pub fn graph(&self) -> &DependencyGraph<ResourceId> {
        &self.dependencies
    }

    /// Starts a topological order over every resource
    pub fn topological_order(&mut self) -> TopologicalOrder<'_, ResourceId, DependencyGraph<ResourceId>> {
        TopologicalOrder::new(&mut self.dependencies)
    }

    /// Returns the part of the graph the given resources need
    ///
    /// Every root must be in the map.
    pub fn subgraph<'a>(&mut self, roots: impl IntoIterator<Item = &'a ResourceId>) -> FilteredGraph<'_, ResourceId> {
        let roots: Vec<Identifier> = roots.into_iter().map(ResourceId::as_graph_id).collect();
        FilteredGraph::new(&mut self.dependencies, roots.iter())
    }

    fn resolve_ids(&self, ids: Vec<Identifier>) -> Vec<ResourceId> {
        ids.iter()
            .map(|id| self.dependencies.node(id).clone())
            .collect()
    }
}
