// This file is dual licensed under the terms of the Apache License, Version
// 2.0, and the BSD License. See the LICENSE file in the root of this repository
// for complete details.

mod node;
mod traversal;

pub use node::{
    DependencyKey, Disposition, Graph, GraphNode, LibraryKind, NodeId, ResolvedItem,
    TypeConstraint,
};
pub use traversal::{enumerate_all, path_to, topological_order};
