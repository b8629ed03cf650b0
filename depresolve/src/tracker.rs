// This file is dual licensed under the terms of the Apache License, Version
// 2.0, and the BSD License. See the LICENSE file in the root of this repository
// for complete details.

use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::IndexMap;

use crate::errors::AnalyzeError;
use crate::graph::{topological_order, Disposition, Graph, NodeId};
use crate::version::VersionRange;

/// Bookkeeping the walk consults to answer the three core predicates —
/// *is-best-version*, *is-eclipsed*, and *is-any-version-accepted* —
/// without re-walking the graph from scratch on every step.
///
/// `ascendants[n]` maps each node `a` lying on some root-to-`n` path to the
/// number of distinct such paths that pass through `a`. Because the graph
/// is a DAG rather than a tree, a node can be reached through its parents
/// along more than one path, so this is a multiset, not a set.
///
/// `depths[n]` is `n`'s distance from the root along the *shortest*
/// parent chain (BFS distance). Nearest-wins is defined directly in terms
/// of this: spec.md's glossary calls it "a dependency closer to the root
/// (fewer edges along the chosen parent chain)" — so depth, not the
/// ascendant multiset, is what `is_best_version` compares.
#[derive(Debug, Default)]
pub struct Tracker {
    entries: IndexMap<String, Vec<NodeId>>,
    ascendants: HashMap<NodeId, HashMap<NodeId, i64>>,
    depths: HashMap<NodeId, u32>,
}

/// Result of `Tracker::is_eclipsed`. `No` means some root-to-`node` path
/// survives every nearer same-name rival's choke; `Plain` and
/// `Downgrade` both mean every path is blocked, differing only in
/// whether every blocker is strictly lower-versioned than `node` (in
/// which case the eclipse is also a downgrade, carrying the nearest
/// blocker for the report).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eclipse {
    No,
    Plain,
    Downgrade(NodeId),
}

impl Tracker {
    pub fn new() -> Tracker {
        Tracker::default()
    }

    /// Clears prior state and walks every node reachable from `root` in
    /// topological order (parents before children), building each node's
    /// ascendant path-multiplicity map, its BFS depth, and inserting it
    /// into its name's candidate list. Must run on a graph that is
    /// already a DAG (cycles severed beforehand).
    pub fn track_root_node(&mut self, graph: &Graph, root: NodeId) -> Result<(), AnalyzeError> {
        self.entries.clear();
        self.ascendants.clear();
        self.depths.clear();

        for n in topological_order(graph, root)? {
            let node = graph.node(n);
            if n == root {
                self.ascendants.insert(root, HashMap::new());
                self.depths.insert(root, 0);
            } else {
                let mut acc: HashMap<NodeId, i64> = HashMap::new();
                let mut min_parent_depth = u32::MAX;
                for &p in &node.outer {
                    let p_total: i64 = self
                        .ascendants
                        .get(&p)
                        .map(|m| m.values().sum::<i64>() + 1)
                        .unwrap_or(1);
                    if let Some(p_asc) = self.ascendants.get(&p) {
                        for (&a, &cnt) in p_asc {
                            *acc.entry(a).or_insert(0) += cnt;
                        }
                    }
                    *acc.entry(p).or_insert(0) += p_total;
                    min_parent_depth = min_parent_depth.min(self.depths.get(&p).copied().unwrap_or(0));
                }
                self.ascendants.insert(n, acc);
                self.depths.insert(n, min_parent_depth.saturating_add(1));
            }
            self.entries
                .entry(node.key.name_key().to_string())
                .or_default()
                .push(n);
        }
        Ok(())
    }

    /// Undoes `node`'s proportional contribution to every descendant's
    /// ascendant multiset. For each descendant `d`, the number of paths
    /// root-to-`d` that ran through `node` is `ascendants[d][node]`; that
    /// many copies of every `(ancestor, count)` pair `node` itself carried
    /// are subtracted back out of `ascendants[d]`. Does not touch
    /// `entries`; see `remove`.
    pub fn untrack(&mut self, graph: &Graph, node: NodeId) -> Result<(), AnalyzeError> {
        let node_asc = self.ascendants.get(&node).cloned().unwrap_or_default();

        for descendant in descendants_of(graph, node) {
            let paths_through_node = self
                .ascendants
                .get(&descendant)
                .and_then(|m| m.get(&node))
                .copied()
                .unwrap_or(0);
            if paths_through_node == 0 {
                continue;
            }

            let Some(d_map) = self.ascendants.get_mut(&descendant) else {
                continue;
            };
            d_map.remove(&node);
            for (&ancestor, &cnt) in &node_asc {
                let delta = cnt
                    .checked_mul(paths_through_node)
                    .ok_or_else(|| AnalyzeError::PathCountOverflow(ancestor.to_string()))?;
                if let Some(slot) = d_map.get_mut(&ancestor) {
                    *slot -= delta;
                    if *slot <= 0 {
                        d_map.remove(&ancestor);
                    }
                }
            }
        }

        self.ascendants.remove(&node);
        Ok(())
    }

    /// `Untrack(node)` plus dropping it from its name's candidate list.
    /// Returns whether `node` was present (a no-op removal reports no
    /// progress to the caller's convergence check).
    pub fn remove(
        &mut self,
        graph: &Graph,
        node: NodeId,
        name_key: &str,
    ) -> Result<bool, AnalyzeError> {
        let present = self
            .entries
            .get(name_key)
            .map(|list| list.contains(&node))
            .unwrap_or(false);
        if !present {
            return Ok(false);
        }
        self.untrack(graph, node)?;
        if let Some(list) = self.entries.get_mut(name_key) {
            list.retain(|&n| n != node);
        }
        Ok(true)
    }

    pub fn depth(&self, node: NodeId) -> u32 {
        self.depths.get(&node).copied().unwrap_or(u32::MAX)
    }

    /// Tri-valued eclipse check (spec.md §4.2). `node` is eclipsed when
    /// every root-to-`node` path is blocked by a *choke*: the immediate
    /// parent of some other live, strictly-nearer same-name candidate.
    /// Such a candidate would already have intercepted that path in
    /// practice, so `node` is moot on it regardless of whether the
    /// candidate has actually been decided `Accepted` yet — this is what
    /// lets eclipse fire a pass earlier than waiting for
    /// `is_any_version_accepted` to observe a terminal rival.
    ///
    /// Only candidates strictly nearer than `node` (lower depth) ever
    /// contribute chokes: a same-depth or farther rival cannot block a
    /// path to `node` without also being reachable only through `node`'s
    /// own ancestors, which nearest-wins doesn't attribute to it.
    pub fn is_eclipsed(&self, graph: &Graph, root: NodeId, node: NodeId) -> Eclipse {
        let node_depth = self.depth(node);
        let name_key = graph.node(node).key.name_key().to_string();
        let Some(list) = self.entries.get(&name_key) else {
            return Eclipse::No;
        };

        let mut chokes: HashSet<NodeId> = HashSet::new();
        let mut blockers: Vec<NodeId> = Vec::new();
        for &k in list {
            if k == node {
                continue;
            }
            let other = graph.node(k);
            if matches!(other.disposition, Disposition::Rejected | Disposition::Cycle) {
                continue;
            }
            if self.depth(k) >= node_depth {
                continue;
            }
            blockers.push(k);
            chokes.extend(other.outer.iter().copied());
        }

        if blockers.is_empty() || reachable_avoiding(graph, root, node, &chokes) {
            return Eclipse::No;
        }

        let node_version = graph.node(node).item.as_ref().map(|i| &i.version);
        let all_lower = blockers.iter().all(|&b| {
            match (graph.node(b).item.as_ref().map(|i| &i.version), node_version) {
                (Some(bv), Some(nv)) => bv < nv,
                _ => false,
            }
        });

        if all_lower {
            let by = blockers
                .into_iter()
                .min_by_key(|&b| self.depth(b))
                .expect("blockers is non-empty");
            Eclipse::Downgrade(by)
        } else {
            Eclipse::Plain
        }
    }

    pub fn is_any_version_accepted(&self, graph: &Graph, name_key: &str) -> bool {
        self.entries
            .get(name_key)
            .map(|list| {
                list.iter()
                    .any(|&n| graph.node(n).disposition == Disposition::Accepted)
            })
            .unwrap_or(false)
    }

    /// True iff no other live (non-rejected, non-cycle) candidate sharing
    /// `node`'s name outranks it. A candidate strictly nearer the root
    /// (lower `depth`) always outranks `node`, regardless of version —
    /// nearest-wins. Among candidates at the *same* depth, the higher
    /// version outranks the lower one (spec.md §9's documented tie-break
    /// for same-depth cousins, exercised by scenario S2). A candidate
    /// strictly farther from the root never outranks `node`.
    pub fn is_best_version(&self, graph: &Graph, node: NodeId) -> bool {
        let node_depth = self.depth(node);
        let name_key = graph.node(node).key.name_key().to_string();
        let Some(list) = self.entries.get(&name_key) else {
            return true;
        };

        list.iter().all(|&k| {
            if k == node {
                return true;
            }
            let other = graph.node(k);
            if matches!(other.disposition, Disposition::Rejected | Disposition::Cycle) {
                return true;
            }
            let k_depth = self.depth(k);
            if k_depth < node_depth {
                return false;
            }
            if k_depth > node_depth {
                return true;
            }
            let node_node = graph.node(node);
            match (&node_node.item, &other.item) {
                (Some(node_item), Some(other_item)) => node_item.version >= other_item.version,
                // Neither side has a resolved candidate yet (both are
                // still bare range requirements): rank by range alone,
                // per spec.md §4.1's `is_greater_or_equal`.
                (None, None) => match (&node_node.key.range, &other.key.range) {
                    (Some(node_range), Some(other_range)) => {
                        VersionRange::is_greater_or_equal(node_range, other_range)
                    }
                    _ => true,
                },
                _ => true,
            }
        })
    }
}

/// True iff `target` is reachable from `root` via `inner` edges without
/// passing through any node in `avoid`. `root` itself counts as avoided
/// if it's in the set — a choke that sits on the root has no path to
/// route around it.
fn reachable_avoiding(graph: &Graph, root: NodeId, target: NodeId, avoid: &HashSet<NodeId>) -> bool {
    if avoid.contains(&root) {
        return false;
    }
    if root == target {
        return true;
    }

    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    visited.insert(root);
    queue.push_back(root);

    while let Some(n) = queue.pop_front() {
        for &child in &graph.node(n).inner {
            if avoid.contains(&child) {
                continue;
            }
            if child == target {
                return true;
            }
            if visited.insert(child) {
                queue.push_back(child);
            }
        }
    }
    false
}

/// Every node reachable from `node` itself, via `inner` edges, excluding
/// `node`.
fn descendants_of(graph: &Graph, node: NodeId) -> Vec<NodeId> {
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    visited.insert(node);
    queue.push_back(node);
    let mut out = Vec::new();

    while let Some(n) = queue.pop_front() {
        for &child in &graph.node(n).inner {
            if visited.insert(child) {
                out.push(child);
                queue.push_back(child);
            }
        }
    }
    out
}
