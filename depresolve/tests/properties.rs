// This file is dual licensed under the terms of the Apache License, Version
// 2.0, and the BSD License. See the LICENSE file in the root of this repository
// for complete details.

//! Tests for the invariants spec.md §8 states should hold for any graph
//! passed through `analyze`.

use depresolve::{
    analyze, enumerate_all, DependencyKey, Disposition, Graph, LibraryKind, NodeId,
    ResolverConfig, ResolvedItem, TypeConstraint, Version, VersionRange,
};

fn project(graph: &mut Graph, name: &str) -> NodeId {
    graph.add_node(
        DependencyKey::new(name, None, TypeConstraint::ALL),
        Some(ResolvedItem {
            name: name.to_string(),
            version: Version::new(1, 0, 0, 0),
            kind: LibraryKind::Project,
        }),
        Disposition::Accepted,
    )
}

fn pkg(graph: &mut Graph, name: &str, version: (u64, u64, u64), range: VersionRange) -> NodeId {
    let v = Version::new(version.0, version.1, version.2, 0);
    graph.add_node(
        DependencyKey::new(name, Some(range), TypeConstraint::ALL),
        Some(ResolvedItem {
            name: name.to_string(),
            version: v,
            kind: LibraryKind::Package,
        }),
        Disposition::Acceptable,
    )
}

fn diamond_with_cousin_conflict() -> (Graph, NodeId) {
    let mut g = Graph::new();
    let root = project(&mut g, "Root");
    let a = pkg(&mut g, "A", (1, 0, 0), VersionRange::any());
    let b = pkg(&mut g, "B", (1, 0, 0), VersionRange::any());
    let c_high = pkg(&mut g, "C", (2, 0, 0), VersionRange::any());
    let c_pinned = pkg(
        &mut g,
        "C",
        (1, 0, 0),
        VersionRange::exact(Version::new(1, 0, 0, 0)),
    );
    g.connect(root, a);
    g.connect(root, b);
    g.connect(a, c_high);
    g.connect(b, c_pinned);
    (g, root)
}

/// Invariant 1: every reachable node's disposition is terminal once
/// `analyze` returns.
#[test]
fn invariant_every_reachable_node_is_terminal() {
    let (mut g, root) = diamond_with_cousin_conflict();
    analyze(&mut g, root, &ResolverConfig::default()).unwrap();

    for n in enumerate_all(&g, root) {
        assert!(g.node(n).disposition.is_terminal());
    }
}

/// Invariant 2: at most one Accepted node per dependency name.
#[test]
fn invariant_at_most_one_accepted_per_name() {
    let (mut g, root) = diamond_with_cousin_conflict();
    analyze(&mut g, root, &ResolverConfig::default()).unwrap();

    let mut accepted_names = std::collections::HashMap::new();
    for n in enumerate_all(&g, root) {
        let node = g.node(n);
        if node.disposition == Disposition::Accepted {
            *accepted_names
                .entry(node.key.name_key().to_string())
                .or_insert(0) += 1;
        }
    }
    assert!(accepted_names.values().all(|&count| count == 1));
}

/// Invariant 3: every Accepted non-project node's resolved version
/// satisfies its own requested range.
#[test]
fn invariant_accepted_non_project_satisfies_own_range() {
    let (mut g, root) = diamond_with_cousin_conflict();
    analyze(&mut g, root, &ResolverConfig::default()).unwrap();

    for n in enumerate_all(&g, root) {
        let node = g.node(n);
        if node.disposition != Disposition::Accepted {
            continue;
        }
        let Some(item) = &node.item else { continue };
        if item.kind.bypasses_range_checks() {
            continue;
        }
        if let Some(range) = &node.key.range {
            assert!(range.satisfies(&item.version));
        }
    }
}

/// Invariant 5: every reported version conflict names a rejected range
/// that genuinely doesn't admit the accepted version, and both sides
/// share a name.
#[test]
fn invariant_version_conflicts_are_genuine() {
    let (mut g, root) = diamond_with_cousin_conflict();
    let result = analyze(&mut g, root, &ResolverConfig::default()).unwrap();

    assert!(!result.version_conflicts.is_empty());
    for conflict in &result.version_conflicts {
        let accepted = g.node(conflict.accepted);
        let rejected = g.node(conflict.rejected);
        assert_eq!(accepted.key.name_key(), rejected.key.name_key());
        let accepted_item = accepted.item.as_ref().unwrap();
        let rejected_range = rejected.key.range.as_ref().unwrap();
        assert!(!rejected_range.satisfies(&accepted_item.version));
    }
}

/// Invariant 4 (downgrade half): every reported downgrade's `to` node is
/// Accepted.
#[test]
fn invariant_downgrade_target_is_accepted() {
    let mut g = Graph::new();
    let root = project(&mut g, "Root");
    let d_shallow = pkg(&mut g, "D", (1, 0, 0), VersionRange::any());
    let x = pkg(&mut g, "X", (1, 0, 0), VersionRange::any());
    let d_deep = pkg(&mut g, "D", (2, 0, 0), VersionRange::any());
    g.connect(root, d_shallow);
    g.connect(root, x);
    g.connect(x, d_deep);

    let result = analyze(&mut g, root, &ResolverConfig::default()).unwrap();

    assert!(!result.downgrades.is_empty());
    for downgrade in &result.downgrades {
        assert_eq!(
            g.node(downgrade.downgraded_to).disposition,
            Disposition::Accepted
        );
    }
}

/// Invariant 6: nearest-wins. A shallower node of a given name is never
/// displaced by a deeper node of the same name, even when the deeper one
/// carries a strictly higher version.
#[test]
fn invariant_nearest_wins_regardless_of_version() {
    let mut g = Graph::new();
    let root = project(&mut g, "Root");
    let near = pkg(&mut g, "D", (1, 0, 0), VersionRange::any());
    let bridge = pkg(&mut g, "Bridge", (1, 0, 0), VersionRange::any());
    let far = pkg(&mut g, "D", (9, 9, 9), VersionRange::any());
    g.connect(root, near);
    g.connect(root, bridge);
    g.connect(bridge, far);

    analyze(&mut g, root, &ResolverConfig::default()).unwrap();

    assert_eq!(g.node(near).disposition, Disposition::Accepted);
    assert_eq!(g.node(far).disposition, Disposition::Rejected);
}

/// Invariant 7: idempotence. Re-running `analyze` on an already-resolved
/// graph changes nothing and yields an empty report.
#[test]
fn invariant_rerunning_analyze_is_idempotent() {
    let (mut g, root) = diamond_with_cousin_conflict();
    analyze(&mut g, root, &ResolverConfig::default()).unwrap();

    let before: Vec<(NodeId, Disposition)> = enumerate_all(&g, root)
        .into_iter()
        .map(|n| (n, g.node(n).disposition))
        .collect();

    let second = analyze(&mut g, root, &ResolverConfig::default()).unwrap();

    let after: Vec<(NodeId, Disposition)> = enumerate_all(&g, root)
        .into_iter()
        .map(|n| (n, g.node(n).disposition))
        .collect();

    assert_eq!(before, after);
    assert!(second.version_conflicts.is_empty());
    assert!(second.downgrades.is_empty());
    assert!(second.cycles.is_empty());
}
