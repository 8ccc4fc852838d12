//! Project description model
//!
//! A project is a tree: the project root holds blocks and artefacts, blocks
//! nest further blocks and artefacts, and artefacts list their sources.
//! Projects are produced by a front end through [`ProjectBuilder`], which
//! enforces unique artefact names and unique sources per artefact.

use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;

use super::path::{Path, PathError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProjectError {
    #[error("Artefact '{artefact}' is duplicated in the project {project}")]
    DuplicatedArtefact { project: String, artefact: String },

    #[error("Source '{path}' is duplicated in the artefact '{artefact}' of the project {project}")]
    DuplicatedSource {
        project: String,
        artefact: String,
        path: Path,
    },

    #[error(transparent)]
    InvalidPath(#[from] PathError),
}

/// A source file of an artefact
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Source {
    pub path: Path,
}

/// A named build output specification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artefact {
    name: String,
    #[serde(rename = "type")]
    artefact_type: String,
    sources: Vec<Source>,
}

impl Artefact {
    pub fn new(name: impl Into<String>, artefact_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            artefact_type: artefact_type.into(),
            sources: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn artefact_type(&self) -> &str {
        &self.artefact_type
    }

    /// Sources in declaration order
    pub fn sources(&self) -> &[Source] {
        &self.sources
    }
}

/// A nested scope of the project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Block {
    /// Toolchains constructed into this block's resolver layer
    pub toolchains: Vec<String>,
    pub children: Vec<ProjectPart>,
}

/// A child of a project or a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProjectPart {
    Block(Block),
    Artefact(Artefact),
}

/// Root of a project description
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
    name: String,
    /// Toolchains constructed into the project's resolver layer
    pub toolchains: Vec<String>,
    pub children: Vec<ProjectPart>,
}

impl Project {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Iterates over every artefact of the project, blocks included
    pub fn artefacts(&self) -> Vec<&Artefact> {
        fn collect<'a>(parts: &'a [ProjectPart], out: &mut Vec<&'a Artefact>) {
            for part in parts {
                match part {
                    ProjectPart::Artefact(artefact) => out.push(artefact),
                    ProjectPart::Block(block) => collect(&block.children, out),
                }
            }
        }

        let mut out = Vec::new();
        collect(&self.children, &mut out);
        out
    }
}

/// Borrowed view of any node of the project tree
#[derive(Debug, Clone, Copy)]
pub enum ModelNode<'a> {
    Project(&'a Project),
    Block(&'a Block),
    Artefact(&'a Artefact),
    Source(&'a Source),
}

/// Incremental builder of a [`Project`]
///
/// Mirrors the nesting of a project description: blocks are opened and
/// closed, and sources are added to the artefact currently open.
#[derive(Debug)]
pub struct ProjectBuilder {
    name: String,
    toolchains: Vec<String>,
    /// Open blocks; the bottom entry holds the project's own children
    blocks: Vec<Block>,
    artefact: Option<Artefact>,
    artefact_names: HashSet<String>,
    sources: HashSet<Path>,
}

impl ProjectBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            toolchains: Vec::new(),
            blocks: vec![Block::default()],
            artefact: None,
            artefact_names: HashSet::new(),
            sources: HashSet::new(),
        }
    }

    /// Requests a toolchain for the innermost open scope
    pub fn use_toolchain(&mut self, toolchain: impl Into<String>) {
        assert!(self.artefact.is_none(), "toolchains cannot be requested inside an artefact");
        let toolchain = toolchain.into();
        if self.blocks.len() == 1 {
            self.toolchains.push(toolchain);
        } else if let Some(block) = self.blocks.last_mut() {
            block.toolchains.push(toolchain);
        }
    }

    pub fn open_block(&mut self) {
        assert!(self.artefact.is_none(), "a block cannot be opened inside an artefact");
        self.blocks.push(Block::default());
    }

    pub fn close_block(&mut self) {
        assert!(self.artefact.is_none(), "the open artefact must be closed first");
        assert!(self.blocks.len() > 1, "no block is open");
        if let Some(block) = self.blocks.pop() {
            self.current_children().push(ProjectPart::Block(block));
        }
    }

    /// Opens a new artefact
    ///
    /// Artefact names are unique across the whole project namespace,
    /// blocks included.
    pub fn open_artefact(&mut self, name: &str, artefact_type: &str) -> Result<(), ProjectError> {
        assert!(self.artefact.is_none(), "the open artefact must be closed first");

        if !self.artefact_names.insert(name.to_string()) {
            return Err(ProjectError::DuplicatedArtefact {
                project: self.name.clone(),
                artefact: name.to_string(),
            });
        }

        self.artefact = Some(Artefact::new(name, artefact_type));
        self.sources.clear();
        Ok(())
    }

    /// Adds a source to the open artefact
    pub fn add_source(&mut self, path: Path) -> Result<(), ProjectError> {
        let Some(artefact) = self.artefact.as_mut() else {
            panic!("no artefact is open");
        };

        if !self.sources.insert(path.clone()) {
            return Err(ProjectError::DuplicatedSource {
                project: self.name.clone(),
                artefact: artefact.name.clone(),
                path,
            });
        }

        artefact.sources.push(Source { path });
        Ok(())
    }

    /// Parses and adds a source to the open artefact
    pub fn add_source_str(&mut self, path: &str) -> Result<(), ProjectError> {
        let path: Path = path.parse()?;
        self.add_source(path)
    }

    pub fn close_artefact(&mut self) {
        let Some(artefact) = self.artefact.take() else {
            panic!("no artefact is open");
        };
        self.current_children().push(ProjectPart::Artefact(artefact));
    }

    /// Finishes the project; every block and artefact must be closed
    pub fn build(mut self) -> Project {
        assert!(self.artefact.is_none(), "an artefact is still open");
        assert!(self.blocks.len() == 1, "a block is still open");
        let root = self.blocks.pop().unwrap_or_default();
        Project {
            name: self.name,
            toolchains: self.toolchains,
            children: root.children,
        }
    }

    fn current_children(&mut self) -> &mut Vec<ProjectPart> {
        let last = self.blocks.len() - 1;
        &mut self.blocks[last].children
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_nested_tree() {
        let mut builder = ProjectBuilder::new("demo");
        builder.use_toolchain("cxx");
        builder.open_artefact("hello", "bin").unwrap();
        builder.add_source_str("hello.cpp").unwrap();
        builder.close_artefact();
        builder.open_block();
        builder.use_toolchain("extra");
        builder.open_artefact("util", "lib").unwrap();
        builder.add_source_str("util/a.cpp").unwrap();
        builder.add_source_str("util/b.cpp").unwrap();
        builder.close_artefact();
        builder.close_block();

        let project = builder.build();
        assert_eq!(project.name(), "demo");
        assert_eq!(project.toolchains, vec!["cxx"]);
        assert_eq!(project.children.len(), 2);

        let ProjectPart::Block(block) = &project.children[1] else {
            panic!("expected a block");
        };
        assert_eq!(block.toolchains, vec!["extra"]);

        let names: Vec<_> = project.artefacts().iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["hello", "util"]);
        assert_eq!(project.artefacts()[1].sources().len(), 2);
    }

    #[test]
    fn duplicated_artefact_rejected_across_blocks() {
        let mut builder = ProjectBuilder::new("demo");
        builder.open_artefact("hello", "bin").unwrap();
        builder.close_artefact();
        builder.open_block();

        let err = builder.open_artefact("hello", "lib").unwrap_err();
        assert_eq!(
            err,
            ProjectError::DuplicatedArtefact {
                project: "demo".to_string(),
                artefact: "hello".to_string(),
            }
        );
    }

    #[test]
    fn duplicated_source_rejected() {
        let mut builder = ProjectBuilder::new("demo");
        builder.open_artefact("hello", "bin").unwrap();
        builder.add_source_str("a.cpp").unwrap();

        let err = builder.add_source_str("a.cpp").unwrap_err();
        assert!(matches!(err, ProjectError::DuplicatedSource { .. }));
    }

    #[test]
    fn same_source_in_two_artefacts_is_allowed() {
        let mut builder = ProjectBuilder::new("demo");
        builder.open_artefact("one", "bin").unwrap();
        builder.add_source_str("shared.cpp").unwrap();
        builder.close_artefact();
        builder.open_artefact("two", "bin").unwrap();
        builder.add_source_str("shared.cpp").unwrap();
        builder.close_artefact();

        assert_eq!(builder.build().artefacts().len(), 2);
    }

    #[test]
    fn invalid_source_path_is_reported() {
        let mut builder = ProjectBuilder::new("demo");
        builder.open_artefact("hello", "bin").unwrap();

        let err = builder.add_source_str("/etc/passwd").unwrap_err();
        assert!(matches!(err, ProjectError::InvalidPath(_)));
    }

    #[test]
    #[should_panic(expected = "no artefact is open")]
    fn source_without_artefact_panics() {
        let mut builder = ProjectBuilder::new("demo");
        let _ = builder.add_source_str("a.cpp");
    }
}
