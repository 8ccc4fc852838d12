//! Resolution integration tests
//!
//! These tests drive the public API end to end: ordering graphs by cutting
//! leaves, and resolving projects through layers and toolchains into
//! resource maps.

use std::rc::Rc;

use smake::domain::{
    Artefact, DependencyGraph, Graph, Identifier, OrderError, Project, ProjectBuilder, Resource, ResourceId,
    ResourceMap, TopologicalOrder, SOURCE_TYPE, TARGET_TYPE,
};
use smake::resolver::{
    resolve_project, ArtefactResolver, ProductSpec, ResolveError, ResolverContext, ResolverLayer, ResourceMask,
    ResourceResolver, RuleToolchain, ToolchainConfig, Toolchains,
};

fn id(n: u32) -> Identifier {
    Identifier::new(n.to_string())
}

fn graph(nodes: u32, edges: &[(u32, u32)]) -> DependencyGraph<u32> {
    let mut graph = DependencyGraph::new();
    for n in 1..=nodes {
        graph.add_node(id(n), n);
    }
    for (from, to) in edges {
        assert!(graph.add_dependency(&id(*from), &id(*to)));
    }
    graph
}

fn source(path: &str) -> ResourceId {
    ResourceId::new(SOURCE_TYPE, path.parse().unwrap())
}

fn target(path: &str) -> ResourceId {
    ResourceId::new(TARGET_TYPE, path.parse().unwrap())
}

const CXX_RULES: &str = r#"
[[artefacts]]
type = "bin"
product = "executable"

[[resources]]
type = "smake::source"
path = "*.cpp"
group = "compile"
action = { derive = { extension = "o", content = "object" } }

[[resources]]
type = "smake::target"
action = "terminal"
"#;

const C_RULES: &str = r#"
[[resources]]
type = "smake::source"
path = "*.c"
group = "compile"
action = { derive = { extension = "o", content = "object" } }
"#;

fn toolchains() -> Toolchains {
    let mut toolchains = Toolchains::new();
    for (name, rules) in [("cxx", CXX_RULES), ("c", C_RULES)] {
        let config: ToolchainConfig = toml::from_str(rules).unwrap();
        toolchains.register(Rc::new(RuleToolchain::new(name, config)));
    }
    toolchains
}

fn resolve(project: &Project) -> Result<ResourceMap, ResolveError> {
    let toolchains = toolchains();
    let root = ResolverLayer::create_config_layer(None);
    toolchains.construct("config", &["cxx".to_string()], &root)?;
    resolve_project(&root, &toolchains, project)
}

fn single_artefact(name: &str, sources: &[&str]) -> Project {
    let mut builder = ProjectBuilder::new("demo");
    builder.open_artefact(name, "bin").unwrap();
    for s in sources {
        builder.add_source_str(s).unwrap();
    }
    builder.close_artefact();
    builder.build()
}

// =============================================================================
// Topological order
// =============================================================================

#[test]
fn chain_is_cut_one_leaf_at_a_time() {
    let mut edges = Vec::new();
    for k in 1..=7 {
        for j in 1..k {
            edges.push((k, j));
        }
    }
    let mut graph = graph(7, &edges);
    let mut order = TopologicalOrder::new(&mut graph);

    for k in 1..=7 {
        let leaf = order.cut_leaf().unwrap().unwrap();
        assert_eq!(leaf.id(), &id(k));
        assert_eq!(order.cut_leaf().unwrap(), None);
        order.close_leaf(leaf);
    }
    assert!(order.is_empty());
    assert_eq!(order.cut_leaf().unwrap(), None);
}

#[test]
fn diamond_opens_independent_leaves_together() {
    let mut graph = graph(
        7,
        &[(3, 1), (3, 2), (4, 3), (5, 3), (6, 3), (7, 4), (7, 5), (7, 6)],
    );
    let mut order = TopologicalOrder::new(&mut graph);

    let first = order.cut_leaf().unwrap().unwrap();
    let second = order.cut_leaf().unwrap().unwrap();
    let mut opened = vec![first.id().clone(), second.id().clone()];
    opened.sort();
    assert_eq!(opened, vec![id(1), id(2)]);
    assert_eq!(order.cut_leaf().unwrap(), None);

    // closing in the reverse order of opening
    order.close_leaf(second);
    assert_eq!(order.cut_leaf().unwrap(), None);
    order.close_leaf(first);

    let three = order.cut_leaf().unwrap().unwrap();
    assert_eq!(three.id(), &id(3));
    order.close_leaf(three);

    let mut middle = Vec::new();
    while let Some(leaf) = order.cut_leaf().unwrap() {
        middle.push(leaf);
    }
    let mut ids: Vec<_> = middle.iter().map(|leaf| leaf.id().clone()).collect();
    ids.sort();
    assert_eq!(ids, vec![id(4), id(5), id(6)]);

    let last = middle.pop().unwrap();
    for leaf in middle {
        order.close_leaf(leaf);
    }
    assert_eq!(order.cut_leaf().unwrap(), None);
    order.close_leaf(last);

    let seven = order.cut_leaf().unwrap().unwrap();
    assert_eq!(seven.id(), &id(7));
    order.close_leaf(seven);
    assert!(order.is_empty());
}

#[test]
fn cycle_is_detected_after_the_free_leaves() {
    let mut graph = graph(4, &[(2, 1), (3, 2), (2, 3), (4, 3)]);
    let mut order = TopologicalOrder::new(&mut graph);

    let one = order.cut_leaf().unwrap().unwrap();
    assert_eq!(one.id(), &id(1));
    order.close_leaf(one);

    let err = order.cut_leaf().unwrap_err();
    assert_eq!(err, OrderError::CycleDetected { remaining: 3 });
    assert!(!order.is_empty());
}

#[test]
fn dependencies_discovered_during_the_order() {
    let mut graph = graph(2, &[(2, 1)]);
    let mut order = TopologicalOrder::new(&mut graph);

    let one = order.cut_leaf().unwrap().unwrap();
    order.add_node(id(3), 3);
    assert!(order.add_dependency(&id(2), &id(3)));
    order.close_leaf(one);

    // 2 now waits for the new node
    let three = order.cut_leaf().unwrap().unwrap();
    assert_eq!(three.id(), &id(3));
    assert_eq!(order.cut_leaf().unwrap(), None);
    order.close_leaf(three);

    assert!(order.contains(&id(3)));
    assert_eq!(order.drain().unwrap(), vec![id(2)]);
}

// =============================================================================
// Project resolution
// =============================================================================

#[test]
fn single_source_binary() {
    let project = single_artefact("hello", &["hello.cpp"]);
    let map = resolve(&project).unwrap();

    assert_eq!(map.len(), 3);
    assert_eq!(map.edge_count(), 2);
    assert_eq!(map.dependencies(&target("hello")), vec![target("hello.o")]);
    assert_eq!(map.dependencies(&target("hello.o")), vec![source("hello.cpp")]);
    assert_eq!(map.get(&target("hello.o")).unwrap().content_type.as_deref(), Some("object"));

    let products = map.products(&target("hello.o"));
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].artefact, "hello");
    assert_eq!(products[0].product_type, "executable");
}

#[test]
fn hand_written_resolvers() {
    struct Binary;

    impl ArtefactResolver for Binary {
        fn resolve_artefact(&self, ctx: &mut ResolverContext<'_>, artefact: &Artefact) -> Result<bool, ResolveError> {
            let resource = ctx.create_target_resource(artefact.name().parse().unwrap(), "binary");
            ctx.register_artefact_product(ProductSpec::new("executable", resource))?;
            Ok(true)
        }
    }

    struct Compile;

    impl ResourceResolver for Compile {
        fn resolve_resource(&self, ctx: &mut ResolverContext<'_>, resource: &Resource) -> Result<(), ResolveError> {
            let object = ctx.create_target_resource(resource.path().with_extension("o").unwrap(), "object");
            let object = ctx.register_result_resource(resource.id(), object)?;
            ctx.add_dependency(&object, resource.id());
            let product = ctx.current_product().unwrap().resource.clone();
            ctx.add_dependency(&product, &object);
            Ok(())
        }
    }

    struct Terminal;

    impl ResourceResolver for Terminal {
        fn resolve_resource(&self, _: &mut ResolverContext<'_>, _: &Resource) -> Result<(), ResolveError> {
            Ok(())
        }
    }

    let root = ResolverLayer::create_config_layer(None);
    root.add_artefact_resolver("bin", Rc::new(Binary)).unwrap();
    root.add_resource_resolver(ResourceMask::of(SOURCE_TYPE, "*.cpp").unwrap(), None, Rc::new(Compile));
    root.add_resource_resolver(ResourceMask::of(TARGET_TYPE, "*").unwrap(), None, Rc::new(Terminal));

    let project = single_artefact("hello", &["hello.cpp"]);
    let mut map = resolve_project(&root, &Toolchains::new(), &project).unwrap();
    assert_eq!(map.len(), 3);
    assert_eq!(map.edge_count(), 2);

    let order = map.topological_order().drain().unwrap();
    let expected: Vec<_> = [source("hello.cpp"), target("hello.o"), target("hello")]
        .iter()
        .map(ResourceId::as_graph_id)
        .collect();
    assert_eq!(order, expected);
}

#[test]
fn shared_source_across_artefacts() {
    let mut builder = ProjectBuilder::new("demo");
    for name in ["one", "two"] {
        builder.open_artefact(name, "bin").unwrap();
        builder.add_source_str("shared.cpp").unwrap();
        builder.close_artefact();
    }
    let project = builder.build();

    let map = resolve(&project).unwrap();
    // one, two, shared.cpp, shared.o
    assert_eq!(map.len(), 4);

    let artefacts: Vec<_> = map
        .products(&source("shared.cpp"))
        .iter()
        .map(|p| p.artefact.clone())
        .collect();
    assert_eq!(artefacts, vec!["one", "two"]);

    let mut dependents = map.dependents(&target("shared.o"));
    dependents.sort();
    assert_eq!(dependents, vec![target("one"), target("two")]);
}

#[test]
fn sources_of_one_artefact_share_the_product() {
    let project = single_artefact("hello", &["main.cpp", "util/strings.cpp"]);
    let map = resolve(&project).unwrap();

    assert_eq!(map.len(), 5);
    let mut objects = map.dependencies(&target("hello"));
    objects.sort();
    assert_eq!(objects, vec![target("main.o"), target("util/strings.o")]);
}

#[test]
fn duplicate_products_are_rejected() {
    let mut builder = ProjectBuilder::new("demo");
    builder.open_artefact("hello", "bin").unwrap();
    builder.close_artefact();
    builder.open_block();
    builder.open_artefact("other", "bin").unwrap();
    builder.close_artefact();
    builder.close_block();
    let project = builder.build();

    // both artefacts produce `bin/out`
    let config: ToolchainConfig = toml::from_str(
        r#"
[[artefacts]]
type = "bin"
product = "executable"
path = "bin/out"

[[resources]]
type = "*"
action = "terminal"
"#,
    )
    .unwrap();
    let mut toolchains = Toolchains::new();
    toolchains.register(Rc::new(RuleToolchain::new("fixed", config)));
    let root = ResolverLayer::create_config_layer(None);
    toolchains.construct("config", &["fixed".to_string()], &root).unwrap();

    let err = resolve_project(&root, &toolchains, &project).unwrap_err();
    assert_eq!(
        err,
        ResolveError::DuplicateResource {
            project: "demo".to_string(),
            resource: "smake::target@bin/out".to_string(),
        }
    );
}

#[test]
fn unknown_artefact_type_is_unresolved() {
    let mut builder = ProjectBuilder::new("demo");
    builder.open_artefact("util", "lib").unwrap();
    builder.close_artefact();
    let project = builder.build();

    let err = resolve(&project).unwrap_err();
    assert_eq!(
        err,
        ResolveError::UnresolvedArtefact {
            project: "demo".to_string(),
            artefact: "util".to_string(),
            artefact_type: "lib".to_string(),
        }
    );
}

#[test]
fn source_without_resolver_is_unresolved() {
    let project = single_artefact("hello", &["hello.rs"]);
    let err = resolve(&project).unwrap_err();
    assert_eq!(
        err,
        ResolveError::UnresolvedResource {
            project: "demo".to_string(),
            resource: "smake::source@hello.rs".to_string(),
        }
    );
}

#[test]
fn block_toolchains_apply_inside_the_block_only() {
    let mut builder = ProjectBuilder::new("demo");
    builder.open_block();
    builder.use_toolchain("c");
    builder.open_artefact("inner", "bin").unwrap();
    builder.add_source_str("inner.c").unwrap();
    builder.close_artefact();
    builder.close_block();
    let inside = builder.build();

    let map = resolve(&inside).unwrap();
    assert!(map.contains(&target("inner.o")));

    let mut builder = ProjectBuilder::new("demo");
    builder.open_block();
    builder.use_toolchain("c");
    builder.close_block();
    builder.open_artefact("outer", "bin").unwrap();
    builder.add_source_str("outer.c").unwrap();
    builder.close_artefact();
    let after = builder.build();

    let err = resolve(&after).unwrap_err();
    assert!(matches!(err, ResolveError::UnresolvedResource { ref resource, .. } if resource == "smake::source@outer.c"));
}

#[test]
fn unknown_toolchain_in_a_block() {
    let mut builder = ProjectBuilder::new("demo");
    builder.open_block();
    builder.use_toolchain("fortran");
    builder.close_block();
    let project = builder.build();

    let err = resolve(&project).unwrap_err();
    assert_eq!(
        err,
        ResolveError::UnknownToolchain {
            project: "demo".to_string(),
            name: "fortran".to_string(),
        }
    );
}

#[test]
fn order_of_one_target_only() {
    let mut builder = ProjectBuilder::new("demo");
    builder.open_artefact("one", "bin").unwrap();
    builder.add_source_str("one.cpp").unwrap();
    builder.close_artefact();
    builder.open_artefact("two", "bin").unwrap();
    builder.add_source_str("two.cpp").unwrap();
    builder.close_artefact();
    let project = builder.build();

    let mut map = resolve(&project).unwrap();
    let one = target("one");
    let mut view = map.subgraph([&one]);
    assert_eq!(view.len(), 3);

    let order = TopologicalOrder::new(&mut view).drain().unwrap();
    let expected: Vec<_> = [source("one.cpp"), target("one.o"), target("one")]
        .iter()
        .map(ResourceId::as_graph_id)
        .collect();
    assert_eq!(order, expected);
}
