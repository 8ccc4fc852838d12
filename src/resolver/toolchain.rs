//! Toolchains
//!
//! A toolchain is a named bundle of resolvers. Projects and blocks request
//! toolchains by name and the resolver context constructs them into the
//! layer of that scope.

use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::debug;

use super::layer::ResolverLayer;
use super::ResolveError;

pub trait Toolchain {
    fn name(&self) -> &str;

    /// Registers the toolchain's resolvers into a layer
    fn construct_resolvers(&self, layer: &ResolverLayer) -> Result<(), ResolveError>;
}

/// Registry of the available toolchains
#[derive(Default)]
pub struct Toolchains {
    toolchains: BTreeMap<String, Rc<dyn Toolchain>>,
}

impl Toolchains {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a toolchain, replacing one of the same name
    pub fn register(&mut self, toolchain: Rc<dyn Toolchain>) {
        self.toolchains.insert(toolchain.name().to_string(), toolchain);
    }

    /// Names of the registered toolchains, sorted
    pub fn names(&self) -> Vec<&str> {
        self.toolchains.keys().map(String::as_str).collect()
    }

    /// Constructs the named toolchains into a layer
    ///
    /// `scope` names the requester in the error of an unknown toolchain.
    pub fn construct(&self, scope: &str, names: &[String], layer: &ResolverLayer) -> Result<(), ResolveError> {
        for name in names {
            let Some(toolchain) = self.toolchains.get(name) else {
                return Err(ResolveError::UnknownToolchain {
                    project: scope.to_string(),
                    name: name.clone(),
                });
            };
            debug!(toolchain = %name, layer = %layer.kind(), "constructing toolchain");
            toolchain.construct_resolvers(layer)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Toolchains {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.toolchains.keys()).finish()
    }
}
