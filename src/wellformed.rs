//! # Wellformedness Module
//!
//! Checks the structural invariants of a score tree after it has been
//! built or edited.
//!
//! ## Purpose
//! The mutation protocol keeps every invariant by construction. These
//! checks exist for callers that want to assert that, and for tests that
//! exercise the protocol end to end.
//!
//! ## Checks
//! - **Parent/child agreement**: every child names its container as parent
//! - **Duplicate children**: no container lists the same child twice
//! - **Cycles**: no component is its own ancestor
//! - **Parallel contents**: parallel containers hold only contexts
//! - **Aggregator agreement**: component and spanner membership agree
//! - **Live spanner members**: spanners reference only live components
//! - **Discontiguous spanners**: spanner members are thread-contiguous
//! - **Overlapping beams**: no leaf is under two beams
//! - **Empty containers**: containers have at least one child
//!
//! ## Entry Points
//! - `check(tree, root) -> WellformednessReport`
//! - `validate(tree, root) -> Result<(), ScoreError>`
//!
//! ## Example
//! ```rust
//! use scoretree::{wellformed, ScoreTree, SpannerKind};
//!
//! let mut tree = ScoreTree::new();
//! let voice = tree.voice(None);
//! let leaves = tree.leaves_from_str("c'8 d'8").unwrap();
//! tree.extend(voice, &leaves).unwrap();
//! tree.attach(SpannerKind::Beam, &leaves).unwrap();
//!
//! assert!(wellformed::is_well_formed(&tree, voice));
//! wellformed::validate(&tree, voice).unwrap();
//! ```

use crate::components::{ComponentId, ScoreTree, SpannerId};
use crate::error::ScoreError;
use crate::spanner::SpannerKind;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// One invariant checked by [`check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Check {
    ParentChildAgreement,
    DuplicateChildren,
    Cycles,
    ParallelContents,
    AggregatorAgreement,
    LiveSpannerMembers,
    DiscontiguousSpanners,
    OverlappingBeams,
    EmptyContainers,
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Check::ParentChildAgreement => "parent-child agreement",
            Check::DuplicateChildren => "duplicate children",
            Check::Cycles => "cycles",
            Check::ParallelContents => "parallel contents",
            Check::AggregatorAgreement => "aggregator agreement",
            Check::LiveSpannerMembers => "live spanner members",
            Check::DiscontiguousSpanners => "discontiguous spanners",
            Check::OverlappingBeams => "overlapping beams",
            Check::EmptyContainers => "empty containers",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub check: Check,
    pub message: String,
}

/// Every violation found under one root, in check order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WellformednessReport {
    pub violations: Vec<Violation>,
}

impl WellformednessReport {
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Number of violations of one check.
    pub fn count(&self, check: Check) -> usize {
        self.violations.iter().filter(|v| v.check == check).count()
    }

    fn push(&mut self, check: Check, message: String) {
        self.violations.push(Violation { check, message });
    }
}

/// Runs every check over the subtree rooted at `root`.
pub fn check(tree: &ScoreTree, root: ComponentId) -> WellformednessReport {
    let mut report = WellformednessReport::default();
    if !tree.is_live(root) {
        report.push(
            Check::ParentChildAgreement,
            format!("root {} is not a live component", root),
        );
        return report;
    }

    let mut walk = Walk {
        tree,
        on_path: HashSet::new(),
        seen: HashSet::new(),
        nodes: Vec::new(),
    };
    walk.visit(root, &mut report);
    let nodes = walk.nodes;

    check_empty_containers(tree, &nodes, &mut report);
    let spanners = check_aggregators(tree, &nodes, &mut report);
    check_spanners(tree, &spanners, &mut report);
    check_overlapping_beams(tree, &spanners, &mut report);
    report
}

/// Fails with the first violation under `root`.
///
/// Discontiguous spanners surface as `ContiguityError`, everything else
/// as `StructuralError`.
pub fn validate(tree: &ScoreTree, root: ComponentId) -> Result<(), ScoreError> {
    match check(tree, root).violations.into_iter().next() {
        None => Ok(()),
        Some(Violation {
            check: Check::DiscontiguousSpanners,
            message,
        }) => Err(ScoreError::ContiguityError(message)),
        Some(Violation { check, message }) => {
            Err(ScoreError::StructuralError(format!("{}: {}", check, message)))
        }
    }
}

pub fn is_well_formed(tree: &ScoreTree, root: ComponentId) -> bool {
    check(tree, root).is_empty()
}

/// Preorder walk that refuses to loop on cycles.
struct Walk<'a> {
    tree: &'a ScoreTree,
    on_path: HashSet<ComponentId>,
    seen: HashSet<ComponentId>,
    nodes: Vec<ComponentId>,
}

impl Walk<'_> {
    fn visit(&mut self, id: ComponentId, report: &mut WellformednessReport) {
        if !self.on_path.insert(id) {
            report.push(Check::Cycles, format!("{} is its own ancestor", id));
            return;
        }
        if self.seen.insert(id) {
            self.nodes.push(id);
            let children = self.tree.children(id).to_vec();
            let mut listed = HashSet::new();
            for child in children {
                if !listed.insert(child) {
                    report.push(
                        Check::DuplicateChildren,
                        format!("{} lists {} more than once", id, child),
                    );
                    continue;
                }
                self.check_child(id, child, report);
                if self.tree.is_live(child) {
                    self.visit(child, report);
                }
            }
        }
        self.on_path.remove(&id);
    }

    fn check_child(&self, parent: ComponentId, child: ComponentId, report: &mut WellformednessReport) {
        if !self.tree.is_live(child) {
            report.push(
                Check::ParentChildAgreement,
                format!("{} lists stale child {}", parent, child),
            );
            return;
        }
        if self.tree.parent(child) != Some(parent) {
            report.push(
                Check::ParentChildAgreement,
                format!(
                    "{} lists {} but its parent is {:?}",
                    parent,
                    child,
                    self.tree.parent(child)
                ),
            );
        }
        if self.tree.is_parallel(parent) && !self.tree.is_context(child) {
            report.push(
                Check::ParallelContents,
                format!("parallel {} holds non-context {}", parent, child),
            );
        }
    }
}

fn check_empty_containers(tree: &ScoreTree, nodes: &[ComponentId], report: &mut WellformednessReport) {
    for &node in nodes {
        if tree.is_container(node) && tree.len(node) == 0 {
            report.push(Check::EmptyContainers, format!("{} is empty", node));
        }
    }
}

/// Checks the aggregator side and returns every spanner reached from `nodes`.
fn check_aggregators(
    tree: &ScoreTree,
    nodes: &[ComponentId],
    report: &mut WellformednessReport,
) -> Vec<SpannerId> {
    let mut reached = HashSet::new();
    for &node in nodes {
        for spanner in tree.spanners_of(node) {
            if !tree.spanner_contains(spanner, node) {
                report.push(
                    Check::AggregatorAgreement,
                    format!("{} lists {} but is not among its members", node, spanner),
                );
            }
            if tree.is_spanner_live(spanner) {
                reached.insert(spanner);
            }
        }
    }
    let mut spanners: Vec<SpannerId> = reached.into_iter().collect();
    tree.sort_by_serial(&mut spanners);
    spanners
}

fn check_spanners(tree: &ScoreTree, spanners: &[SpannerId], report: &mut WellformednessReport) {
    for &spanner in spanners {
        let members = tree.spanner_members_unchecked(spanner);
        let stale: Vec<ComponentId> = members.iter().copied().filter(|&m| !tree.is_live(m)).collect();
        if !stale.is_empty() {
            report.push(
                Check::LiveSpannerMembers,
                format!("{} references stale {:?}", spanner, stale),
            );
            continue;
        }
        for &member in &members {
            if !tree.spanners_of(member).contains(&spanner) {
                report.push(
                    Check::AggregatorAgreement,
                    format!("{} holds {} but {} does not list it", spanner, member, member),
                );
            }
        }
        if !tree.are_thread_contiguous(&members) {
            report.push(
                Check::DiscontiguousSpanners,
                format!("{} spans discontiguous {:?}", spanner, members),
            );
        }
    }
}

fn check_overlapping_beams(tree: &ScoreTree, spanners: &[SpannerId], report: &mut WellformednessReport) {
    let mut beamed: HashMap<ComponentId, Vec<SpannerId>> = HashMap::new();
    let mut reported = HashSet::new();
    for &spanner in spanners {
        let is_beam = tree
            .spanner(spanner)
            .map_or(false, |s| s.kind() == SpannerKind::Beam);
        if !is_beam {
            continue;
        }
        for leaf in tree.spanner_leaves(spanner).unwrap_or_default() {
            let earlier = beamed.entry(leaf).or_default();
            for &other in earlier.iter() {
                if reported.insert((other, spanner)) {
                    report.push(
                        Check::OverlappingBeams,
                        format!("{} and {} both beam {}", other, spanner, leaf),
                    );
                }
            }
            earlier.push(spanner);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn beamed_voice(tree: &mut ScoreTree) -> (ComponentId, Vec<ComponentId>, SpannerId) {
        let voice = tree.voice(None);
        let leaves = tree.leaves_from_str("c'8 d'8 e'8").unwrap();
        tree.extend(voice, &leaves).unwrap();
        let beam = tree.attach(SpannerKind::Beam, &leaves).unwrap();
        (voice, leaves, beam)
    }

    #[test]
    fn test_built_tree_is_well_formed() {
        let mut tree = ScoreTree::new();
        let (voice, leaves, _) = beamed_voice(&mut tree);
        tree.attach(SpannerKind::Slur, &leaves[1..]).unwrap();
        let report = check(&tree, voice);
        assert!(report.is_empty(), "{:?}", report);
        assert!(validate(&tree, voice).is_ok());
    }

    #[test]
    fn test_empty_container_is_reported() {
        let mut tree = ScoreTree::new();
        let staff = tree.staff(None);
        let voice = tree.voice(None);
        tree.append(staff, voice).unwrap();
        let report = check(&tree, staff);
        assert_eq!(report.count(Check::EmptyContainers), 1);
        assert!(matches!(
            validate(&tree, staff),
            Err(ScoreError::StructuralError(_))
        ));
    }

    #[test]
    fn test_discontiguous_spanner_is_reported() {
        let mut tree = ScoreTree::new();
        let (voice, leaves, beam) = beamed_voice(&mut tree);
        tree.set_members(beam, vec![leaves[0], leaves[2]]);

        let report = check(&tree, voice);
        assert_eq!(report.count(Check::DiscontiguousSpanners), 1);
        assert!(matches!(
            validate(&tree, voice),
            Err(ScoreError::ContiguityError(_))
        ));
        let yaml = serde_yaml::to_string(&report).unwrap();
        assert!(yaml.contains("check: discontiguous-spanners"));
    }

    #[test]
    fn test_overlapping_beams_are_reported_once() {
        let mut tree = ScoreTree::new();
        let (voice, leaves, _) = beamed_voice(&mut tree);
        tree.attach(SpannerKind::Beam, &leaves[1..]).unwrap();
        tree.attach(SpannerKind::Beam, &[voice]).unwrap();
        let report = check(&tree, voice);
        // the voice beam overlaps both leaf beams
        assert_eq!(report.count(Check::OverlappingBeams), 3);
    }

    #[test]
    fn test_broken_parent_link_is_reported() {
        let mut tree = ScoreTree::new();
        let (voice, leaves, _) = beamed_voice(&mut tree);
        if let Some(component) = tree.components.get_mut(leaves[1]) {
            component.parent = None;
        }
        assert_eq!(check(&tree, voice).count(Check::ParentChildAgreement), 1);
    }

    #[test]
    fn test_cycle_does_not_loop() {
        let mut tree = ScoreTree::new();
        let outer = tree.container();
        let inner = tree.container();
        tree.link(outer, 0, &[inner]);
        tree.link(inner, 0, &[outer]);
        let report = check(&tree, outer);
        assert_eq!(report.count(Check::Cycles), 1);
    }

    #[test]
    fn test_parallel_contents_must_be_contexts() {
        let mut tree = ScoreTree::new();
        let score = tree.score(None);
        let note = tree.leaves_from_str("c'4").unwrap()[0];
        tree.link(score, 0, &[note]);
        assert_eq!(check(&tree, score).count(Check::ParallelContents), 1);
    }

    #[test]
    fn test_stale_root() {
        let mut tree = ScoreTree::new();
        let voice = tree.voice(None);
        tree.discard(voice).unwrap();
        assert!(!is_well_formed(&tree, voice));
    }
}
