// This file is dual licensed under the terms of the Apache License, Version
// 2.0, and the BSD License. See the LICENSE file in the root of this repository
// for complete details.

//! End-to-end scenarios straight out of the spec's testable-properties
//! section: one dependency graph each, asserting the final disposition
//! of every node plus the shape of the anomaly report.

use depresolve::{
    analyze, DependencyKey, Disposition, Graph, LibraryKind, NodeId, ResolverConfig, ResolvedItem,
    TypeConstraint, Version, VersionRange,
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

/// S1 — trivial accept: Root -> A 1.0 -> B 1.0.
#[test]
fn s1_trivial_accept() {
    let mut g = Graph::new();
    let root = project(&mut g, "Root");
    let a = pkg(&mut g, "A", (1, 0, 0), VersionRange::any());
    let b = pkg(&mut g, "B", (1, 0, 0), VersionRange::any());
    g.connect(root, a);
    g.connect(a, b);

    let result = analyze(&mut g, root, &ResolverConfig::default()).unwrap();

    assert_eq!(g.node(a).disposition, Disposition::Accepted);
    assert_eq!(g.node(b).disposition, Disposition::Accepted);
    assert!(result.version_conflicts.is_empty());
    assert!(result.downgrades.is_empty());
    assert!(result.cycles.is_empty());
}

/// S2 — cousin conflict: Root -> A -> C 2.0 (any); Root -> B -> C 1.0
/// pinned exactly. Equal depth, so the higher version wins; the pinned
/// sibling's range doesn't admit the winner and is reported.
#[test]
fn s2_cousin_conflict_higher_version_wins_at_equal_depth() {
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

    let result = analyze(&mut g, root, &ResolverConfig::default()).unwrap();

    assert_eq!(g.node(c_high).disposition, Disposition::Accepted);
    assert_eq!(g.node(c_pinned).disposition, Disposition::Rejected);
    assert_eq!(result.version_conflicts.len(), 1);
    assert_eq!(result.version_conflicts[0].accepted, c_high);
    assert_eq!(result.version_conflicts[0].rejected, c_pinned);
}

/// S3 — nearest-wins downgrade: Root -> D 1.0; Root -> X -> D 2.0. The
/// shallower, lower version wins even though a deeper path asked for more.
#[test]
fn s3_nearest_wins_downgrade() {
    let mut g = Graph::new();
    let root = project(&mut g, "Root");
    let d_shallow = pkg(&mut g, "D", (1, 0, 0), VersionRange::any());
    let x = pkg(&mut g, "X", (1, 0, 0), VersionRange::any());
    let d_deep = pkg(&mut g, "D", (2, 0, 0), VersionRange::any());
    g.connect(root, d_shallow);
    g.connect(root, x);
    g.connect(x, d_deep);

    let result = analyze(&mut g, root, &ResolverConfig::default()).unwrap();

    assert_eq!(g.node(d_shallow).disposition, Disposition::Accepted);
    assert_eq!(g.node(d_deep).disposition, Disposition::Rejected);
    assert_eq!(result.downgrades.len(), 1);
    assert_eq!(result.downgrades[0].downgraded_from, d_deep);
    assert_eq!(result.downgrades[0].downgraded_to, d_shallow);
}

/// S4 — no spurious downgrade: Root -> A -> D 2.0; Root -> B -> D 1.0; a
/// sibling Root -> C -> D 3.0 forces the D 3.0 resolution. All three D
/// candidates sit at the same depth, so the higher version wins on the
/// cousin tie-break, not nearest-wins — D 3.0 is Accepted, D 1.0 and
/// D 2.0 are Rejected, and the downgrade report stays empty because
/// nothing was actually downgraded-to: a cousin losing a same-depth tie
/// is a version conflict, never a downgrade.
#[test]
fn s4_no_downgrade_reported_without_a_rejected_sibling() {
    let mut g = Graph::new();
    let root = project(&mut g, "Root");
    let a = pkg(&mut g, "A", (1, 0, 0), VersionRange::any());
    let b = pkg(&mut g, "B", (1, 0, 0), VersionRange::any());
    let c = pkg(&mut g, "C", (1, 0, 0), VersionRange::any());
    let d2 = pkg(&mut g, "D", (2, 0, 0), VersionRange::any());
    let d1 = pkg(&mut g, "D", (1, 0, 0), VersionRange::any());
    let d3 = pkg(&mut g, "D", (3, 0, 0), VersionRange::any());
    g.connect(root, a);
    g.connect(root, b);
    g.connect(root, c);
    g.connect(a, d2);
    g.connect(b, d1);
    g.connect(c, d3);

    let result = analyze(&mut g, root, &ResolverConfig::default()).unwrap();

    assert_eq!(g.node(d3).disposition, Disposition::Accepted);
    assert_eq!(g.node(d2).disposition, Disposition::Rejected);
    assert_eq!(g.node(d1).disposition, Disposition::Rejected);
    assert!(result.downgrades.is_empty());
}

/// S5 — cycle: Root -> A -> B -> A (back-edge). The inner A is severed
/// and reported; the outer A and B remain accepted.
#[test]
fn s5_cycle_is_severed_and_reported() {
    let mut g = Graph::new();
    let root = project(&mut g, "Root");
    let a = pkg(&mut g, "A", (1, 0, 0), VersionRange::any());
    let b = pkg(&mut g, "B", (1, 0, 0), VersionRange::any());
    let a_again = pkg(&mut g, "A", (1, 0, 0), VersionRange::any());
    g.connect(root, a);
    g.connect(a, b);
    g.connect(b, a_again);

    let result = analyze(&mut g, root, &ResolverConfig::default()).unwrap();

    assert_eq!(result.cycles.len(), 1);
    assert_eq!(result.cycles[0].node, a_again);
    assert_eq!(g.node(a_again).disposition, Disposition::Cycle);
    assert_eq!(g.node(a).disposition, Disposition::Accepted);
    assert_eq!(g.node(b).disposition, Disposition::Accepted);
}

/// S6 — central-transitive rejection: a centrally-pinned node whose only
/// path runs through an otherwise-rejected branch is rejected along with
/// it, before the main decide pass ever considers it on its own merits.
#[test]
fn s6_central_transitive_rejected_with_its_parent_branch() {
    let mut g = Graph::new();
    let root = project(&mut g, "Root");
    let near = pkg(&mut g, "Common", (1, 0, 0), VersionRange::any());
    let mid = pkg(&mut g, "Mid", (1, 0, 0), VersionRange::any());
    let far = pkg(&mut g, "Common", (2, 0, 0), VersionRange::any());
    let central = pkg(&mut g, "Pinned", (1, 0, 0), VersionRange::any());
    g.mark_central_transitive(central);
    g.connect(root, near);
    g.connect(root, mid);
    g.connect(mid, far);
    g.connect(far, central);

    analyze(&mut g, root, &ResolverConfig::default()).unwrap();

    assert_eq!(g.node(far).disposition, Disposition::Rejected);
    assert_eq!(g.node(central).disposition, Disposition::Rejected);
}
