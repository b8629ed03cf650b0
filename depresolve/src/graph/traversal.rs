// This file is dual licensed under the terms of the Apache License, Version
// 2.0, and the BSD License. See the LICENSE file in the root of this repository
// for complete details.

use std::collections::{HashSet, VecDeque};
use std::fmt::Write as _;

use crate::errors::AnalyzeError;
use crate::graph::node::{Graph, NodeId};

/// Breadth-first enumeration of every node reachable from `root`, each
/// yielded exactly once.
pub fn enumerate_all(graph: &Graph, root: NodeId) -> Vec<NodeId> {
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    let mut order = Vec::new();

    visited.insert(root);
    queue.push_back(root);

    while let Some(n) = queue.pop_front() {
        order.push(n);
        for &child in &graph.node(n).inner {
            if visited.insert(child) {
                queue.push_back(child);
            }
        }
    }

    order
}

/// Kahn's algorithm: children are only yielded once every currently-
/// reachable parent has been yielded. `root` has indegree zero by
/// definition within the reachable subgraph.
pub fn topological_order(graph: &Graph, root: NodeId) -> Result<Vec<NodeId>, AnalyzeError> {
    let reachable: HashSet<NodeId> = enumerate_all(graph, root).into_iter().collect();

    let mut indegree = std::collections::HashMap::new();
    for &n in &reachable {
        let deg = graph
            .node(n)
            .outer
            .iter()
            .filter(|p| reachable.contains(p))
            .count();
        indegree.insert(n, deg);
    }

    let mut queue = VecDeque::new();
    queue.push_back(root);
    let mut order = Vec::with_capacity(reachable.len());
    let mut seen = HashSet::new();

    while let Some(n) = queue.pop_front() {
        if !seen.insert(n) {
            continue;
        }
        order.push(n);
        for &child in &graph.node(n).inner {
            if !reachable.contains(&child) {
                continue;
            }
            let deg = indegree.get_mut(&child).unwrap();
            *deg -= 1;
            if *deg == 0 {
                queue.push_back(child);
            }
        }
    }

    if order.len() != reachable.len() {
        return Err(AnalyzeError::InvalidGraph(
            "graph below root is not a DAG (topological sort did not cover every reachable node)"
                .into(),
        ));
    }

    Ok(order)
}

/// Walks up via each node's first `outer` parent to build
/// `"root -> ... -> N"`, printing `name version-or-range` per node
/// (projects show only the name, since range constraints don't apply to
/// them).
pub fn path_to(graph: &Graph, node: NodeId) -> String {
    let mut chain = vec![node];
    let mut current = node;
    let mut guard = graph.len() + 1;

    while let Some(&parent) = graph.node(current).outer.first() {
        chain.push(parent);
        current = parent;
        guard -= 1;
        if guard == 0 {
            break;
        }
    }

    chain.reverse();

    let mut out = String::new();
    for (i, &n) in chain.iter().enumerate() {
        if i > 0 {
            out.push_str(" -> ");
        }
        write_node_label(&mut out, graph, n);
    }
    out
}

fn write_node_label(out: &mut String, graph: &Graph, n: NodeId) {
    let node = graph.node(n);
    let is_project = node
        .item
        .as_ref()
        .map(|i| i.kind.bypasses_range_checks())
        .unwrap_or(false);

    if is_project {
        let _ = write!(out, "{}", node.key.name);
    } else if let Some(item) = &node.item {
        let _ = write!(out, "{} {}", node.key.name, item.version);
    } else if let Some(range) = &node.key.range {
        let _ = write!(out, "{} {}", node.key.name, range);
    } else {
        let _ = write!(out, "{}", node.key.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::{Disposition, DependencyKey, TypeConstraint};

    fn leaf(graph: &mut Graph, name: &str) -> NodeId {
        graph.add_node(
            DependencyKey::new(name, None, TypeConstraint::ALL),
            None,
            Disposition::Acceptable,
        )
    }

    #[test]
    fn bfs_visits_shared_node_once() {
        let mut g = Graph::new();
        let root = leaf(&mut g, "root");
        let a = leaf(&mut g, "a");
        let b = leaf(&mut g, "b");
        let shared = leaf(&mut g, "shared");
        g.connect(root, a);
        g.connect(root, b);
        g.connect(a, shared);
        g.connect(b, shared);

        let order = enumerate_all(&g, root);
        assert_eq!(order.iter().filter(|&&n| n == shared).count(), 1);
        assert_eq!(order.len(), 4);
    }

    #[test]
    fn topological_order_puts_parents_first() {
        let mut g = Graph::new();
        let root = leaf(&mut g, "root");
        let a = leaf(&mut g, "a");
        let b = leaf(&mut g, "b");
        g.connect(root, a);
        g.connect(a, b);

        let order = topological_order(&g, root).unwrap();
        let pos = |n: NodeId| order.iter().position(|&x| x == n).unwrap();
        assert!(pos(root) < pos(a));
        assert!(pos(a) < pos(b));
    }

    #[test]
    fn path_to_prints_chain() {
        let mut g = Graph::new();
        let root = leaf(&mut g, "root");
        let a = leaf(&mut g, "a");
        g.connect(root, a);

        assert_eq!(path_to(&g, a), "root -> a");
    }
}
