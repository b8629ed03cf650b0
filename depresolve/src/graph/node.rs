// This file is dual licensed under the terms of the Apache License, Version
// 2.0, and the BSD License. See the LICENSE file in the root of this repository
// for complete details.

use std::fmt;

use crate::errors::AnalyzeError;
use crate::version::{Version, VersionRange};

/// Index into a `Graph`'s node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which side of a dependency affects whether range constraints even apply.
/// Projects and external projects bypass range checks: at most one
/// instance of a given project can ever appear, so there's nothing to
/// constrain against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryKind {
    Project,
    Package,
    ExternalProject,
    Reference,
    Assembly,
}

impl LibraryKind {
    pub fn bypasses_range_checks(self) -> bool {
        matches!(self, LibraryKind::Project | LibraryKind::ExternalProject)
    }
}

/// A dependency "type" mask (compile/build/runtime-ish axes). Two keys are
/// only equal when their masks intersect-equal; kept as a plain bitmask
/// rather than pulling in a flags crate the teacher doesn't depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TypeConstraint(pub u32);

impl TypeConstraint {
    pub const COMPILE: TypeConstraint = TypeConstraint(1 << 0);
    pub const RUNTIME: TypeConstraint = TypeConstraint(1 << 1);
    pub const BUILD: TypeConstraint = TypeConstraint(1 << 2);
    pub const ALL: TypeConstraint = TypeConstraint(0b111);

    pub fn intersects(self, other: TypeConstraint) -> bool {
        self.0 & other.0 != 0
    }
}

/// `(name, version_range, type_constraint)`. Name is keyed case-
/// insensitively but displayed as given.
#[derive(Debug, Clone)]
pub struct DependencyKey {
    pub name: String,
    pub range: Option<VersionRange>,
    pub type_constraint: TypeConstraint,
    pub(crate) name_key: String,
}

impl DependencyKey {
    pub fn new<S: Into<String>>(
        name: S,
        range: Option<VersionRange>,
        type_constraint: TypeConstraint,
    ) -> DependencyKey {
        let name = name.into();
        let name_key = name.to_lowercase();
        DependencyKey {
            name,
            range,
            type_constraint,
            name_key,
        }
    }

    /// Case-folded name used for keying (equality, tracker entries); the
    /// `name` field itself is preserved verbatim for display.
    pub fn name_key(&self) -> &str {
        &self.name_key
    }
}

impl PartialEq for DependencyKey {
    fn eq(&self, other: &Self) -> bool {
        self.name_key == other.name_key
            && self.range == other.range
            && self.type_constraint == other.type_constraint
    }
}
impl Eq for DependencyKey {}

/// A concrete resolved candidate, or absent if the dependency never found
/// a matching package (surfaced elsewhere as an upstream error; this
/// resolver just never lets such a node become `Accepted`).
#[derive(Debug, Clone)]
pub struct ResolvedItem {
    pub name: String,
    pub version: Version,
    pub kind: LibraryKind,
}

/// Final or in-progress classification of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Acceptable,
    PotentiallyDowngraded,
    Cycle,
    Accepted,
    Rejected,
}

impl Disposition {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Disposition::Accepted | Disposition::Rejected | Disposition::Cycle
        )
    }
}

#[derive(Debug, Clone)]
pub struct GraphNode {
    pub id: NodeId,
    pub key: DependencyKey,
    pub item: Option<ResolvedItem>,
    pub outer: Vec<NodeId>,
    pub inner: Vec<NodeId>,
    pub disposition: Disposition,
    pub is_central_transitive: bool,
}

/// Arena-backed dependency graph. Nodes are addressed by `NodeId`; edges
/// are plain index vectors on both sides (`outer` = parents, `inner` =
/// children), so there's no aliasing to reason about and edge removal is
/// a vector-erase by value.
#[derive(Debug, Default)]
pub struct Graph {
    nodes: Vec<GraphNode>,
}

impl Graph {
    pub fn new() -> Graph {
        Graph { nodes: Vec::new() }
    }

    pub fn add_node(
        &mut self,
        key: DependencyKey,
        item: Option<ResolvedItem>,
        disposition: Disposition,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(GraphNode {
            id,
            key,
            item,
            outer: Vec::new(),
            inner: Vec::new(),
            disposition,
            is_central_transitive: false,
        });
        id
    }

    pub fn mark_central_transitive(&mut self, id: NodeId) {
        self.nodes[id.0].is_central_transitive = true;
    }

    /// Adds the `parent -> child` edge on both sides, maintaining the
    /// invariant `p ∈ c.outer iff c ∈ p.inner`.
    pub fn connect(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.0].inner.push(child);
        self.nodes[child.0].outer.push(parent);
    }

    pub fn node(&self, id: NodeId) -> &GraphNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut GraphNode {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every node index in the arena, in insertion order. Unlike
    /// `enumerate_all`, this isn't filtered by reachability from any
    /// particular root; callers that need reachability should intersect
    /// with `enumerate_all` themselves.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Removes `node` from every remaining parent's `inner` list while
    /// leaving `node.outer` untouched, so a path can still be printed for
    /// diagnostics. Used when severing a Cycle node from the live graph.
    pub fn sever_incoming(&mut self, node: NodeId) {
        let parents = self.nodes[node.0].outer.clone();
        for parent in parents {
            self.nodes[parent.0].inner.retain(|&c| c != node);
        }
    }

    /// Structural validation: every edge must be mirrored on both sides,
    /// and the root must already be `Accepted` (it represents the
    /// restoring project itself and is never re-decided).
    pub fn validate(&self, root: NodeId) -> Result<(), AnalyzeError> {
        if self.nodes.is_empty() {
            return Err(AnalyzeError::InvalidGraph("graph has no nodes".into()));
        }
        if root.0 >= self.nodes.len() {
            return Err(AnalyzeError::InvalidGraph("root index out of bounds".into()));
        }
        for node in &self.nodes {
            for &child in &node.inner {
                if !self.nodes[child.0].outer.contains(&node.id) {
                    return Err(AnalyzeError::InvalidGraph(format!(
                        "{} lists {} as a child, but {} does not list it as a parent",
                        node.id, child, child
                    )));
                }
            }
            for &parent in &node.outer {
                if !self.nodes[parent.0].inner.contains(&node.id) {
                    return Err(AnalyzeError::InvalidGraph(format!(
                        "{} lists {} as a parent, but {} does not list it as a child",
                        node.id, parent, parent
                    )));
                }
            }
        }
        if self.nodes[root.0].disposition != Disposition::Accepted {
            return Err(AnalyzeError::InvalidGraph(
                "root node must start Accepted".into(),
            ));
        }
        Ok(())
    }
}
