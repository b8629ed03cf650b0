// This file is dual licensed under the terms of the Apache License, Version
// 2.0, and the BSD License. See the LICENSE file in the root of this repository
// for complete details.

use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::IndexMap;
use log::{log_enabled, trace, Level};

use crate::config::ResolverConfig;
use crate::errors::AnalyzeError;
use crate::graph::{enumerate_all, path_to, topological_order, Disposition, Graph, NodeId};
use crate::tracker::{Eclipse, Tracker};

const LOGNAME: &str = "depresolve::resolver";

/// A rejected node whose requested range the accepted node of the same
/// name does not satisfy. These are "cousin conflicts": the rejected node
/// and its accepted cousin don't share an ancestor-descendant
/// relationship, so neither one's range could have vetoed the other
/// during the walk.
#[derive(Debug, Clone)]
pub struct VersionConflict {
    pub name: String,
    pub accepted: NodeId,
    pub rejected: NodeId,
}

/// A node that was rejected in favor of a nearer, lower-version pick of
/// the same package. Nearest-wins means this is expected behavior, not an
/// error, but it's worth surfacing since the effective version in the
/// restored graph is older than what this node asked for.
#[derive(Debug, Clone)]
pub struct Downgrade {
    pub name: String,
    pub downgraded_from: NodeId,
    pub downgraded_to: NodeId,
}

/// A node that would have closed a cycle back to one of its own ancestors.
/// It was severed from the graph before the main walk ran.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub node: NodeId,
    pub path: String,
}

#[derive(Debug, Clone, Default)]
pub struct AnalyzeResult {
    pub version_conflicts: Vec<VersionConflict>,
    pub cycles: Vec<CycleReport>,
    pub downgrades: Vec<Downgrade>,
}

/// Runs the full nearest-wins walk over `graph`, mutating every node's
/// `disposition` to a terminal value and returning the anomaly report.
///
/// `root` must already be `Disposition::Accepted`; `graph.validate` is
/// called first and will reject anything else.
pub fn analyze(
    graph: &mut Graph,
    root: NodeId,
    config: &ResolverConfig,
) -> Result<AnalyzeResult, AnalyzeError> {
    graph.validate(root)?;

    let cycles = sever_cycles(graph, root)?;

    let mut tracker = Tracker::new();
    tracker.track_root_node(graph, root)?;

    let (accepted_by_name, raw_downgrades) = walk(graph, root, &mut tracker, config)?;
    let version_conflicts = cousin_conflicts(graph, root, &accepted_by_name);
    // `walk` records a downgrade against the nearest live blocker at the
    // moment it eclipses a farther node, which isn't necessarily the
    // name's eventual winner — that blocker can itself still be waiting
    // on its own parents, or get eclipsed in turn by something nearer
    // still. This filter drops any recorded downgrade whose target never
    // actually reached `Accepted`.
    let downgrades = raw_downgrades
        .into_iter()
        .filter(|d| graph.node(d.downgraded_to).disposition == Disposition::Accepted)
        .collect();

    Ok(AnalyzeResult {
        version_conflicts,
        cycles,
        downgrades,
    })
}

/// Tags and severs every node with a terminal `Disposition::Cycle`,
/// reporting each in the order it's reached. A node may already carry
/// this disposition on entry — spec.md §6 documents the caller as having
/// pre-tagged it during its own pre-walk expansion, the last case in the
/// external disposition contract (Acceptable, PotentiallyDowngraded, or
/// Cycle). `detect_name_recurrence_cycles` only ever tags additional
/// nodes; it never reads or overwrites a disposition the caller already
/// set, so a pre-tagged node is reported and severed exactly the same as
/// one this pass finds on its own.
fn sever_cycles(graph: &mut Graph, root: NodeId) -> Result<Vec<CycleReport>, AnalyzeError> {
    detect_name_recurrence_cycles(graph, root)?;

    let mut reports = Vec::new();
    for n in topological_order(graph, root)? {
        if n == root {
            continue;
        }
        if graph.node(n).disposition == Disposition::Cycle {
            if log_enabled!(target: LOGNAME, Level::Trace) {
                trace!(target: LOGNAME, "cycle detected at {}: {}", n, path_to(graph, n));
            }
            reports.push(CycleReport {
                node: n,
                path: path_to(graph, n),
            });
        }
    }

    for report in &reports {
        graph.sever_incoming(report.node);
    }

    Ok(reports)
}

/// Finds nodes whose name reappears among their own ascendants and tags
/// them `Disposition::Cycle`. Walks breadth-first from the root, carrying
/// the set of names seen on the current path; a repeat means the node
/// would, if expanded, depend (transitively) on a package that already
/// depends on it. Nodes whose disposition is already terminal on entry
/// (including a caller-pre-tagged `Cycle`) are left exactly as the caller
/// set them and don't propagate a path through themselves, since they're
/// about to be severed from the live graph regardless.
fn detect_name_recurrence_cycles(graph: &mut Graph, root: NodeId) -> Result<(), AnalyzeError> {
    let order = topological_order(graph, root)?;
    let mut path_names: HashMap<NodeId, Vec<String>> = HashMap::new();
    path_names.insert(root, vec![graph.node(root).key.name_key().to_string()]);

    for &n in &order {
        if n == root {
            continue;
        }
        if graph.node(n).disposition.is_terminal() {
            continue;
        }
        let node = graph.node(n);
        let name_key = node.key.name_key().to_string();
        let parents = node.outer.clone();

        let mut inherited: Vec<String> = Vec::new();
        let mut is_cycle = false;
        for &parent in &parents {
            if let Some(names) = path_names.get(&parent) {
                if names.iter().any(|n| n == &name_key) {
                    is_cycle = true;
                }
                for n in names {
                    if !inherited.contains(n) {
                        inherited.push(n.clone());
                    }
                }
            }
        }

        if is_cycle {
            graph.node_mut(n).disposition = Disposition::Cycle;
            continue;
        }

        inherited.push(name_key);
        path_names.insert(n, inherited);
    }

    Ok(())
}

/// The nearest-wins fixpoint loop (spec.md §4.3). Each outer pass first
/// rejects any central-transitive subtree whose remaining parents are all
/// `Rejected`, then walks the non-terminal nodes in topological order and
/// applies Decide(N): nodes with at least one non-terminal parent wait;
/// nodes whose parents are all terminal are either rejected outright (all
/// parents `Rejected`) or evaluated against the tracker's depth/version
/// predicates (at least one parent `Accepted`).
fn walk(
    graph: &mut Graph,
    root: NodeId,
    tracker: &mut Tracker,
    config: &ResolverConfig,
) -> Result<(IndexMap<String, NodeId>, Vec<Downgrade>), AnalyzeError> {
    let mut accepted_by_name: IndexMap<String, NodeId> = IndexMap::new();
    let mut downgrades: Vec<Downgrade> = Vec::new();

    for pass in 0..config.patience() {
        let mut progressed = false;

        if config.reject_central_transitives() {
            progressed |= reject_central_transitive_subtrees(graph, tracker)?;
        }

        for n in topological_order(graph, root)? {
            if n == root {
                continue;
            }
            let node = graph.node(n);
            if node.disposition.is_terminal() {
                continue;
            }
            let parents = node.outer.clone();
            if !parents
                .iter()
                .all(|&p| graph.node(p).disposition.is_terminal())
            {
                continue;
            }

            let name_key = node.key.name_key().to_string();

            if parents
                .iter()
                .all(|&p| graph.node(p).disposition == Disposition::Rejected)
            {
                tracker.remove(graph, n, &name_key)?;
                graph.node_mut(n).disposition = Disposition::Rejected;
                progressed = true;
                continue;
            }

            // At least one parent is `Accepted`. `is_eclipsed` checks
            // whether every root-to-`n` path is blocked by a nearer
            // same-name rival's choke; a strictly-lower-version blocker
            // makes this a reportable downgrade, a higher-or-equal one a
            // plain rejection. Neither case needs to wait on
            // `is_any_version_accepted` — a choked node can never win
            // regardless of whether its blocker has reached `Accepted`
            // yet this pass.
            match tracker.is_eclipsed(graph, root, n) {
                Eclipse::Downgrade(by) => {
                    downgrades.push(Downgrade {
                        name: graph.node(n).key.name.clone(),
                        downgraded_from: n,
                        downgraded_to: by,
                    });
                    tracker.remove(graph, n, &name_key)?;
                    graph.node_mut(n).disposition = Disposition::Rejected;
                    progressed = true;
                }
                // spec.md §4.3 leaves a plain eclipse `Acceptable`-but-
                // untracked, expecting the all-outers-rejected branch to
                // reclassify it later. That branch only fires once every
                // parent is `Rejected`, which never happens for a node
                // whose parent is `Accepted` — rejecting it immediately
                // instead is what keeps every node reaching a terminal
                // disposition (see DESIGN.md).
                Eclipse::Plain => {
                    tracker.remove(graph, n, &name_key)?;
                    graph.node_mut(n).disposition = Disposition::Rejected;
                    progressed = true;
                }
                Eclipse::No => {
                    if tracker.is_best_version(graph, n) {
                        graph.node_mut(n).disposition = Disposition::Accepted;
                        accepted_by_name.entry(name_key).or_insert(n);
                        progressed = true;
                        if log_enabled!(target: LOGNAME, Level::Trace) {
                            trace!(target: LOGNAME, "accepted {}: {}", n, path_to(graph, n));
                        }
                    } else if tracker.is_any_version_accepted(graph, &name_key) {
                        // A same-depth cousin losing to an already-
                        // accepted winner; reported as a `VersionConflict`
                        // by the post-loop cousin scan instead, not a
                        // downgrade, since neither side is an ancestor of
                        // the other.
                        graph.node_mut(n).disposition = Disposition::Rejected;
                        tracker.untrack(graph, n)?;
                        progressed = true;
                    }
                }
            }
        }

        if enumerate_all_terminal(graph, root) {
            return Ok((accepted_by_name, downgrades));
        }
        if !progressed {
            return Err(AnalyzeError::ResolverDidNotConverge(pass + 1));
        }
    }

    Err(AnalyzeError::ResolverDidNotConverge(config.patience()))
}

fn enumerate_all_terminal(graph: &Graph, root: NodeId) -> bool {
    enumerate_all(graph, root)
        .into_iter()
        .all(|n| graph.node(n).disposition.is_terminal())
}

/// Rejects the entire subtree beneath every central-transitive node whose
/// remaining parents have all become `Rejected`, repeating until no
/// further progress is made this pass. A node with zero remaining parents
/// (already fully severed) is left alone: it's already unreachable, and
/// there's nothing to cascade from.
fn reject_central_transitive_subtrees(
    graph: &mut Graph,
    tracker: &mut Tracker,
) -> Result<bool, AnalyzeError> {
    let mut progressed = false;

    loop {
        let roots: Vec<NodeId> = graph
            .node_ids()
            .filter(|&n| {
                let node = graph.node(n);
                node.is_central_transitive
                    && !node.disposition.is_terminal()
                    && !node.outer.is_empty()
                    && node
                        .outer
                        .iter()
                        .all(|&p| graph.node(p).disposition == Disposition::Rejected)
            })
            .collect();

        if roots.is_empty() {
            break;
        }
        for r in roots {
            reject_subtree(graph, tracker, r)?;
            progressed = true;
        }
    }

    Ok(progressed)
}

fn reject_subtree(
    graph: &mut Graph,
    tracker: &mut Tracker,
    start: NodeId,
) -> Result<(), AnalyzeError> {
    let mut seen = HashSet::new();
    let mut queue = VecDeque::new();
    queue.push_back(start);

    while let Some(n) = queue.pop_front() {
        if !seen.insert(n) {
            continue;
        }
        if graph.node(n).disposition.is_terminal() {
            continue;
        }
        let name_key = graph.node(n).key.name_key().to_string();
        tracker.remove(graph, n, &name_key)?;
        graph.node_mut(n).disposition = Disposition::Rejected;
        for &child in graph.node(n).inner.clone().iter() {
            queue.push_back(child);
        }
    }
    Ok(())
}

/// Post-loop cousin-conflict scan (spec.md §4.3). For every `Rejected`
/// node with at least one `Accepted` parent, whose name has a winner that
/// isn't itself: if its range is non-null, the winner's item is non-null
/// and doesn't bypass range checks, and the type constraints intersect,
/// then a range the winner's version doesn't satisfy is a conflict.
fn cousin_conflicts(
    graph: &Graph,
    root: NodeId,
    accepted_by_name: &IndexMap<String, NodeId>,
) -> Vec<VersionConflict> {
    let mut conflicts = Vec::new();

    for n in enumerate_all(graph, root) {
        let node = graph.node(n);
        if node.disposition != Disposition::Rejected {
            continue;
        }
        if !node
            .outer
            .iter()
            .any(|&p| graph.node(p).disposition == Disposition::Accepted)
        {
            continue;
        }

        let name_key = node.key.name_key().to_string();
        let Some(&accepted_id) = accepted_by_name.get(&name_key) else {
            continue;
        };
        if accepted_id == n {
            continue;
        }
        let accepted_node = graph.node(accepted_id);
        let Some(accepted_item) = &accepted_node.item else {
            continue;
        };
        if accepted_item.kind.bypasses_range_checks() {
            continue;
        }
        if !node
            .key
            .type_constraint
            .intersects(accepted_node.key.type_constraint)
        {
            continue;
        }
        let Some(range) = &node.key.range else {
            continue;
        };

        if !range.satisfies(&accepted_item.version) {
            conflicts.push(VersionConflict {
                name: accepted_node.key.name.clone(),
                accepted: accepted_id,
                rejected: n,
            });
        }
    }

    conflicts
}
