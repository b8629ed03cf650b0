// This file is dual licensed under the terms of the Apache License, Version
// 2.0, and the BSD License. See the LICENSE file in the root of this repository
// for complete details.

//! Loads a small YAML description of a dependency graph and builds a
//! `depresolve::Graph` from it. This exists to give the demo CLI something
//! to point at; it is not part of the resolver's public contract.

use std::collections::HashMap;
use std::io::Read;

use anyhow::{anyhow, Context, Result};
use depresolve::{
    DependencyKey, Disposition, Graph, LibraryKind, NodeId, ResolvedItem, TypeConstraint,
    Version, VersionRange,
};
use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct FixtureVersion {
    major: u64,
    #[serde(default)]
    minor: u64,
    #[serde(default)]
    patch: u64,
    #[serde(default)]
    revision: u64,
    #[serde(default)]
    prerelease: Option<String>,
}

impl FixtureVersion {
    fn build(&self) -> Version {
        let v = Version::new(self.major, self.minor, self.patch, self.revision);
        match &self.prerelease {
            Some(p) => v.with_prerelease(p),
            None => v,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct FixtureRange {
    min: Option<FixtureVersion>,
    #[serde(default = "default_true")]
    min_inclusive: bool,
    max: Option<FixtureVersion>,
    #[serde(default)]
    max_inclusive: bool,
}

fn default_true() -> bool {
    true
}

impl FixtureRange {
    fn build(&self) -> VersionRange {
        match (&self.min, &self.max) {
            (Some(min), None) => VersionRange::at_least(min.build()),
            (Some(min), Some(max)) => {
                VersionRange::between(min.build(), self.min_inclusive, max.build(), self.max_inclusive)
            }
            (None, _) => VersionRange::any(),
        }
    }
}

fn default_kind() -> String {
    "package".to_string()
}

#[derive(Deserialize, Debug)]
pub struct FixtureNode {
    id: String,
    name: String,
    #[serde(default = "default_kind")]
    kind: String,
    version: Option<FixtureVersion>,
    range: Option<FixtureRange>,
    #[serde(default)]
    type_constraint: Option<String>,
    #[serde(default)]
    central_transitive: bool,
}

impl FixtureNode {
    fn library_kind(&self) -> Result<LibraryKind> {
        Ok(match self.kind.as_str() {
            "project" => LibraryKind::Project,
            "package" => LibraryKind::Package,
            "external_project" => LibraryKind::ExternalProject,
            "reference" => LibraryKind::Reference,
            "assembly" => LibraryKind::Assembly,
            other => return Err(anyhow!("unknown node kind '{}'", other)),
        })
    }

    fn type_mask(&self) -> Result<TypeConstraint> {
        Ok(match self.type_constraint.as_deref() {
            None | Some("all") => TypeConstraint::ALL,
            Some("compile") => TypeConstraint::COMPILE,
            Some("runtime") => TypeConstraint::RUNTIME,
            Some("build") => TypeConstraint::BUILD,
            Some(other) => return Err(anyhow!("unknown type constraint '{}'", other)),
        })
    }
}

#[derive(Deserialize, Debug)]
pub struct Fixture {
    root: String,
    nodes: Vec<FixtureNode>,
    #[serde(default)]
    edges: Vec<(String, String)>,
}

/// Parses and builds the graph in one step, returning the live `Graph`
/// plus the `NodeId` of the root so callers don't need to re-derive it.
pub fn load<R: Read>(reader: R) -> Result<(Graph, NodeId)> {
    let fixture: Fixture = serde_yaml::from_reader(reader).context("invalid fixture YAML")?;

    let mut graph = Graph::new();
    let mut ids: HashMap<String, NodeId> = HashMap::new();

    for node in &fixture.nodes {
        let kind = node.library_kind()?;
        let range = match &node.range {
            Some(r) => Some(r.build()),
            None => None,
        };
        let key = DependencyKey::new(node.name.clone(), range, node.type_mask()?);
        let item = node.version.as_ref().map(|v| ResolvedItem {
            name: node.name.clone(),
            version: v.build(),
            kind,
        });
        let disposition = if node.id == fixture.root {
            Disposition::Accepted
        } else {
            Disposition::Acceptable
        };

        let id = graph.add_node(key, item, disposition);
        if node.central_transitive {
            graph.mark_central_transitive(id);
        }
        ids.insert(node.id.clone(), id);
    }

    let root = *ids
        .get(&fixture.root)
        .with_context(|| format!("root id '{}' does not name a node", fixture.root))?;

    for (parent, child) in &fixture.edges {
        let p = *ids
            .get(parent)
            .with_context(|| format!("edge references unknown node id '{}'", parent))?;
        let c = *ids
            .get(child)
            .with_context(|| format!("edge references unknown node id '{}'", child))?;
        graph.connect(p, c);
    }

    Ok((graph, root))
}
