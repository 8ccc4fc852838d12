//! Collection of applicable resource resolvers

use std::collections::HashSet;
use std::rc::Rc;

use super::layer::ResourceResolver;

/// Resolvers collected for one resource
///
/// Grouped resolvers share a concern: only the first resolver found for a
/// group name is kept. Ungrouped resolvers are all kept.
#[derive(Default)]
pub struct ResourceResolverGroups {
    group_names: HashSet<String>,
    grouped: Vec<Rc<dyn ResourceResolver>>,
    singles: Vec<Rc<dyn ResourceResolver>>,
}

impl ResourceResolverGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a resolver; returns false if its group already has a resolver
    pub fn append(&mut self, group: Option<&str>, resolver: Rc<dyn ResourceResolver>) -> bool {
        match group {
            Some(name) if !name.is_empty() => {
                if !self.group_names.insert(name.to_string()) {
                    return false;
                }
                self.grouped.push(resolver);
            }
            _ => self.singles.push(resolver),
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        self.grouped.is_empty() && self.singles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.grouped.len() + self.singles.len()
    }

    /// Grouped resolvers first, then single ones; each part in the order
    /// they were found
    pub fn iter(&self) -> impl Iterator<Item = &Rc<dyn ResourceResolver>> {
        self.grouped.iter().chain(self.singles.iter())
    }

    pub fn into_vec(self) -> Vec<Rc<dyn ResourceResolver>> {
        let mut all = self.grouped;
        all.extend(self.singles);
        all
    }
}

impl std::fmt::Debug for ResourceResolverGroups {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceResolverGroups")
            .field("groups", &self.group_names)
            .field("grouped", &self.grouped.len())
            .field("singles", &self.singles.len())
            .finish()
    }
}
