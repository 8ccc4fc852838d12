//! Project manifests
//!
//! A manifest is a TOML description of a project:
//!
//! ```toml
//! [project]
//! name = "demo"
//! toolchains = ["cxx"]
//!
//! [[project.artefact]]
//! name = "hello"
//! type = "bin"
//! sources = ["hello.cpp"]
//!
//! [[project.block]]
//! toolchains = ["extra"]
//!
//! [[project.block.artefact]]
//! name = "util"
//! type = "lib"
//! sources = ["util/a.cpp"]
//! ```
//!
//! Within a scope, artefacts come before nested blocks. To interleave
//! them, list the scope's parts in declaration order with a `kind` tag:
//!
//! ```toml
//! [[project.part]]
//! kind = "block"
//! toolchains = ["extra"]
//!
//! [[project.part]]
//! kind = "artefact"
//! name = "hello"
//! type = "bin"
//! ```
//!
//! Tagged parts follow the untagged artefacts and blocks of their scope.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;

use crate::domain::{Project, ProjectBuilder, ProjectError};

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to parse manifest: {0}")]
    Parse(String),

    #[error(transparent)]
    Project(#[from] ProjectError),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestFile {
    project: ProjectSection,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProjectSection {
    name: String,
    #[serde(default)]
    toolchains: Vec<String>,
    #[serde(default, rename = "artefact")]
    artefacts: Vec<ArtefactSection>,
    #[serde(default, rename = "block")]
    blocks: Vec<BlockSection>,
    #[serde(default, rename = "part")]
    parts: Vec<PartSection>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BlockSection {
    #[serde(default)]
    toolchains: Vec<String>,
    #[serde(default, rename = "artefact")]
    artefacts: Vec<ArtefactSection>,
    #[serde(default, rename = "block")]
    blocks: Vec<BlockSection>,
    #[serde(default, rename = "part")]
    parts: Vec<PartSection>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum PartSection {
    Artefact(ArtefactSection),
    Block(BlockSection),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ArtefactSection {
    name: String,
    #[serde(rename = "type")]
    artefact_type: String,
    #[serde(default)]
    sources: Vec<String>,
}

/// Parses a manifest into a project
pub fn parse_manifest(content: &str) -> Result<Project, ManifestError> {
    let manifest: ManifestFile = toml::from_str(content).map_err(|e| ManifestError::Parse(e.to_string()))?;
    let section = manifest.project;

    let mut builder = ProjectBuilder::new(&section.name);
    for toolchain in section.toolchains {
        builder.use_toolchain(toolchain);
    }
    let parts = section
        .artefacts
        .into_iter()
        .map(PartSection::Artefact)
        .chain(section.blocks.into_iter().map(PartSection::Block))
        .chain(section.parts);
    add_parts(&mut builder, parts)?;
    Ok(builder.build())
}

fn add_parts(builder: &mut ProjectBuilder, parts: impl IntoIterator<Item = PartSection>) -> Result<(), ManifestError> {
    for part in parts {
        match part {
            PartSection::Artefact(artefact) => {
                builder.open_artefact(&artefact.name, &artefact.artefact_type)?;
                for source in &artefact.sources {
                    builder.add_source_str(source)?;
                }
                builder.close_artefact();
            }
            PartSection::Block(block) => {
                builder.open_block();
                for toolchain in block.toolchains {
                    builder.use_toolchain(toolchain);
                }
                let children = block
                    .artefacts
                    .into_iter()
                    .map(PartSection::Artefact)
                    .chain(block.blocks.into_iter().map(PartSection::Block))
                    .chain(block.parts);
                add_parts(builder, children)?;
                builder.close_block();
            }
        }
    }
    Ok(())
}

/// Reads and parses a manifest file
pub fn load_manifest(path: &Path) -> Result<Project> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {}", path.display()))?;

    parse_manifest(&content).with_context(|| format!("Invalid manifest: {}", path.display()))
}
