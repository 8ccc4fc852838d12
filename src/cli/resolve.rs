//! Resolution commands (resolve, order)

use std::path::Path;

use anyhow::{Context, Result};

use super::output::Output;
use crate::domain::{
    Graph, Identifier, OrderError, Project, ProductReference, ResourceId, ResourceMap, TopologicalOrder, TARGET_TYPE,
};
use crate::resolver::resolve_project;
use crate::storage::{load_manifest, Config};

/// Loads configuration and manifest, then resolves the project
fn resolve_manifest(manifest: &Path, config: Option<&Path>) -> Result<(Project, ResourceMap)> {
    let config = Config::load(manifest, config)?;
    let project = load_manifest(manifest)?;

    let toolchains = config.toolchains();
    let root = config
        .root_layer(&toolchains)
        .context("Failed to construct the default toolchains")?;

    let map = resolve_project(&root, &toolchains, &project)
        .with_context(|| format!("Failed to resolve project {}", project.name()))?;
    Ok((project, map))
}

fn product_label(product: &ProductReference) -> String {
    format!("{}:{}", product.artefact, product.product_type)
}

/// Show every resource and dependency of a project
pub fn resolve(output: &Output, manifest: &Path, config: Option<&Path>) -> Result<()> {
    let (project, map) = resolve_manifest(manifest, config)?;
    let edges = map.edges();

    if output.is_json() {
        let resources: Vec<_> = map
            .entries()
            .map(|entry| {
                serde_json::json!({
                    "id": entry.resource.id.to_string(),
                    "type": entry.resource.resource_type(),
                    "path": entry.resource.path().to_string(),
                    "content": entry.resource.content_type,
                    "products": entry.products.iter().map(product_label).collect::<Vec<_>>(),
                })
            })
            .collect();
        let dependencies: Vec<_> = edges
            .iter()
            .map(|(from, to)| serde_json::json!({ "from": from.to_string(), "to": to.to_string() }))
            .collect();
        output.data(&serde_json::json!({
            "project": project.name(),
            "resources": resources,
            "dependencies": dependencies,
        }));
        return Ok(());
    }

    output.summary(&format!(
        "Project {}: {} resources, {} dependencies",
        project.name(),
        map.len(),
        edges.len()
    ));
    println!("{:<40} {:<16} PRODUCTS", "RESOURCE", "CONTENT");
    println!("{}", "-".repeat(72));
    for entry in map.entries() {
        let products: Vec<_> = entry.products.iter().map(product_label).collect();
        println!(
            "{:<40} {:<16} {}",
            entry.resource.id.to_string(),
            entry.resource.content_type.as_deref().unwrap_or("-"),
            products.join(", ")
        );
    }

    if !edges.is_empty() {
        println!();
        println!("Dependencies:");
        for (from, to) in &edges {
            println!("  {} -> {}", from, to);
        }
    }

    Ok(())
}

/// Find a resource by its `type@path` form, or a target by its path
fn find_resource(map: &ResourceMap, target: &str) -> Option<ResourceId> {
    map.entries()
        .map(|entry| &entry.resource.id)
        .find(|id| {
            id.to_string() == target || (id.resource_type == TARGET_TYPE && id.path.to_string() == target)
        })
        .cloned()
}

/// Groups the nodes into waves of leaves that can be processed together
///
/// Every leaf available at the start of a wave is opened before any of them
/// is closed.
fn build_waves<N, G: Graph<N>>(order: &mut TopologicalOrder<'_, N, G>) -> Result<Vec<Vec<Identifier>>, OrderError> {
    let mut waves = Vec::new();
    while !order.is_empty() {
        let mut opened = Vec::new();
        while let Some(leaf) = order.cut_leaf()? {
            opened.push(leaf);
        }

        let mut wave: Vec<Identifier> = opened.iter().map(|leaf| leaf.id().clone()).collect();
        wave.sort();
        for leaf in opened {
            order.close_leaf(leaf);
        }
        waves.push(wave);
    }
    Ok(waves)
}

/// Show the resources of a project in build order
pub fn order(output: &Output, manifest: &Path, config: Option<&Path>, targets: &[String]) -> Result<()> {
    let (project, mut map) = resolve_manifest(manifest, config)?;

    let roots = targets
        .iter()
        .map(|target| find_resource(&map, target).with_context(|| format!("Unknown resource: {}", target)))
        .collect::<Result<Vec<_>>>()?;

    let waves = if roots.is_empty() {
        build_waves(&mut map.topological_order())
    } else {
        let mut view = map.subgraph(roots.iter());
        let mut order = TopologicalOrder::new(&mut view);
        build_waves(&mut order)
    };
    let waves = waves.with_context(|| format!("Failed to order project {}", project.name()))?;

    if output.is_json() {
        let waves: Vec<Vec<&str>> = waves
            .iter()
            .map(|wave| wave.iter().map(Identifier::as_str).collect())
            .collect();
        output.data(&serde_json::json!({
            "project": project.name(),
            "waves": waves,
        }));
        return Ok(());
    }

    let total: usize = waves.iter().map(Vec::len).sum();
    output.summary(&format!(
        "Build order for {}: {} resources in {} steps",
        project.name(),
        total,
        waves.len()
    ));
    for (step, wave) in waves.iter().enumerate() {
        let step = (step + 1).to_string();
        for id in wave {
            output.row(&[step.as_str(), id.as_str()]);
        }
    }

    Ok(())
}
