// This file is dual licensed under the terms of the Apache License, Version
// 2.0, and the BSD License. See the LICENSE file in the root of this repository
// for complete details.

//! A deterministic, greedy "nearest-wins" dependency graph conflict
//! resolver, in the style of a restore-time dependency walker: given an
//! already-expanded in-memory graph of requested ranges and resolved
//! candidates, decide each node's final disposition and report the
//! resulting version conflicts, cycles, and downgrades.
//!
//! This is explicitly not a SAT/CDCL-style solver. Given a fixed walk
//! order, there is exactly one answer, and it favors reproducibility and
//! explainability (the winning node is always the nearest one to the
//! root) over finding some theoretically-more-satisfying assignment.

mod config;
mod errors;
mod graph;
mod resolver;
mod tracker;
mod version;

pub use config::{ConfigError, ResolverConfig};
pub use errors::AnalyzeError;
pub use graph::{
    enumerate_all, path_to, DependencyKey, Disposition, Graph, GraphNode, LibraryKind, NodeId,
    ResolvedItem, TypeConstraint,
};
pub use resolver::{analyze, AnalyzeResult, CycleReport, Downgrade, VersionConflict};
pub use version::{FloatingBehavior, Version, VersionRange};
