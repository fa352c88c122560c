//! The synchronized template matcher.
//!
//! Matching proceeds in two phases. *Discovery* visits every main-file
//! node of a candidate unit and, wherever a node's kind matches the
//! template's first subtree, seeds one partial match per
//! prefix-terminated slice of the surrounding sibling list — a trailing
//! variadic metavariable may consume any number of trailing siblings, so
//! every arity has to survive to the structural filter.
//!
//! The *walk* then drives a single template cursor and all candidate
//! cursors in lockstep. Plain template nodes filter candidates through
//! the comparator; a name-only metavariable binds the current candidate
//! node and still descends into structure; a variadic metavariable forks
//! every candidate into one partial match per sibling prefix (the empty
//! prefix included) and skips the template past the run. Candidates that
//! stop matching are dropped silently; whatever survives the full walk
//! is a match.
//!
//! Completed matches are sorted by source range (wider first on equal
//! starts) and overlapping ones are discarded with a diagnostic, keeping
//! the earlier match.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use itertools::Itertools;
use remold_core::patch::Span;
use remold_cst::{FileId, Unit};
use tracing::{debug, warn};

use crate::compare::compare;
use crate::cursor::TraversalState;
use crate::lhs::{LhsTemplate, Metavariable};
use crate::view::NodeView;

/// An in-progress match attempt over one candidate region.
#[derive(Clone)]
struct PartialMatch {
    /// The candidate root group; kept separately because the cursor's
    /// stack is empty once the walk has popped past it.
    root: NodeView,
    cursor: TraversalState,
    bindings: BTreeMap<Metavariable, Vec<NodeView>>,
}

impl PartialMatch {
    fn new(root: NodeView) -> Self {
        PartialMatch {
            cursor: TraversalState::new(root.clone()),
            root,
            bindings: BTreeMap::new(),
        }
    }
}

/// A completed match: the consumed subtrees, the bindings, and the byte
/// span the match covers in the unit's main file.
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub roots: Vec<NodeView>,
    pub bindings: BTreeMap<Metavariable, Vec<NodeView>>,
    pub span: Span,
}

/// Matcher for one extracted template.
pub struct Matcher<'t> {
    template_unit: &'t Unit,
    template: &'t LhsTemplate,
}

impl<'t> Matcher<'t> {
    pub fn new(template_unit: &'t Unit, template: &'t LhsTemplate) -> Self {
        Matcher {
            template_unit,
            template,
        }
    }

    /// Match one candidate unit, returning non-overlapping results in
    /// source order.
    pub fn match_unit(&self, unit: &Unit) -> Vec<MatchResult> {
        let seeds = self.discover(unit);
        debug!(candidates = seeds.len(), "seeded candidate roots");
        let survivors = self.walk(unit, seeds);
        self.resolve_overlaps(unit, survivors)
    }

    // ------------------------------------------------------------------
    // Discovery
    // ------------------------------------------------------------------

    fn discover(&self, unit: &Unit) -> Vec<PartialMatch> {
        let Some(&first) = self.template.subtrees().first() else {
            return Vec::new();
        };
        let first_kind = self.template_unit.kind(first);

        let mut seeds = Vec::new();
        for id in unit.preorder() {
            if !unit.is_in_main_file(id) || !unit.kind(id).is_same(first_kind) {
                continue;
            }
            let Some(parent) = unit.parent(id) else {
                continue;
            };
            let parent_view = NodeView::real(parent);
            let children = parent_view.children(unit);
            // The node must appear directly in its parent's normalized
            // child list; nodes tucked inside pseudo-children (parameter
            // groups) cannot anchor a candidate root.
            let Some(index) = children.iter().position(|child| child.node() == Some(id)) else {
                continue;
            };
            for root in NodeView::prefixes(&parent_view, unit, index) {
                seeds.push(PartialMatch::new(root));
            }
        }
        seeds
    }

    // ------------------------------------------------------------------
    // The lockstep walk
    // ------------------------------------------------------------------

    fn walk(&self, unit: &Unit, seeds: Vec<PartialMatch>) -> Vec<PartialMatch> {
        let template_root = NodeView::group(
            self.template
                .subtrees()
                .iter()
                .map(|id| NodeView::real(*id))
                .collect(),
        );
        let mut template = TraversalState::new(template_root);
        let mut live = seeds;

        while !template.done() && !live.is_empty() {
            // Returning from children: move sideways or up, in lockstep.
            if template.children_accessed() {
                if template.is_last_child(self.template_unit) {
                    live.retain(|partial| partial.cursor.is_last_child(unit));
                    for partial in &mut live {
                        partial.cursor.backtrack();
                    }
                    template.backtrack();
                } else {
                    live.retain(|partial| !partial.cursor.is_last_child(unit));
                    for partial in &mut live {
                        partial.cursor.next_sibling();
                    }
                    template.next_sibling();
                }
                continue;
            }

            let current = template
                .current(self.template_unit)
                .expect("template cursor in lockstep");

            let metavariable = current
                .node()
                .and_then(|node| self.template.metavariable(node))
                .cloned();

            if let Some(meta) = metavariable {
                if meta.name_only {
                    self.filter_name_only(unit, &mut live, &current, &meta);
                    // Name-only parameterises the name alone; structure
                    // still matches, so fall through to child descent.
                } else {
                    live = self.fork_variadic(unit, live, &meta);
                    self.advance_template_past_run(unit, &mut template, &mut live, &meta);
                    continue;
                }
            } else {
                live.retain(|partial| {
                    partial.cursor.current(unit).is_some_and(|candidate| {
                        compare(self.template_unit, &current, unit, &candidate, false)
                    })
                });
            }

            // Shared descent step.
            if template.has_children(self.template_unit) {
                live.retain(|partial| partial.cursor.has_children(unit));
                for partial in &mut live {
                    partial.cursor.descend(unit);
                }
                template.descend(self.template_unit);
            } else if template.is_last_child(self.template_unit) {
                live.retain(|partial| {
                    !partial.cursor.has_children(unit) && partial.cursor.is_last_child(unit)
                });
                for partial in &mut live {
                    partial.cursor.backtrack();
                }
                template.backtrack();
            } else {
                live.retain(|partial| {
                    !partial.cursor.has_children(unit) && !partial.cursor.is_last_child(unit)
                });
                for partial in &mut live {
                    partial.cursor.next_sibling();
                }
                template.next_sibling();
            }
        }

        if !template.done() {
            return Vec::new();
        }
        live
    }

    /// Filter candidates against a name-only template node and record
    /// the binding. A repeated binding must refer to a structurally
    /// identical declaration, compared with names significant.
    fn filter_name_only(
        &self,
        unit: &Unit,
        live: &mut Vec<PartialMatch>,
        current: &NodeView,
        meta: &Metavariable,
    ) {
        live.retain_mut(|partial| {
            let Some(candidate) = partial.cursor.current(unit) else {
                return false;
            };
            if !compare(self.template_unit, current, unit, &candidate, true) {
                return false;
            }
            match partial.bindings.get(meta) {
                None => {
                    partial.bindings.insert(meta.clone(), vec![candidate]);
                    true
                }
                Some(existing) => existing
                    .first()
                    .is_some_and(|bound| compare(unit, bound, unit, &candidate, false)),
            }
        });
    }

    /// Fork every candidate for a variadic metavariable. First
    /// occurrence: one fork per sibling prefix starting at the cursor,
    /// the empty prefix included. Later occurrences are repetition: the
    /// candidate must carry the already-bound arity at this position,
    /// with per-index structural equality.
    fn fork_variadic(
        &self,
        unit: &Unit,
        live: Vec<PartialMatch>,
        meta: &Metavariable,
    ) -> Vec<PartialMatch> {
        let mut forked = Vec::new();
        for partial in live {
            let siblings = partial.cursor.siblings(unit);
            let start = partial.cursor.index();

            if let Some(bound) = partial.bindings.get(meta).cloned() {
                if start + bound.len() > siblings.len() {
                    continue;
                }
                let repeats = bound.iter().enumerate().all(|(offset, earlier)| {
                    compare(unit, earlier, unit, &siblings[start + offset], false)
                });
                if !repeats {
                    continue;
                }
                let mut repeat = partial.clone();
                repeat.cursor.set_index(start + bound.len());
                forked.push(repeat);
                continue;
            }

            for arity in 0..=(siblings.len() - start) {
                let mut fork = partial.clone();
                fork.bindings
                    .insert(meta.clone(), siblings[start..start + arity].to_vec());
                fork.cursor.set_index(start + arity);
                forked.push(fork);
            }
        }
        forked
    }

    /// Skip the template cursor past the contiguous run of sibling nodes
    /// sharing the metavariable's identifier, popping both the template
    /// and the candidates when the run ends the parent's children.
    fn advance_template_past_run(
        &self,
        unit: &Unit,
        template: &mut TraversalState,
        live: &mut Vec<PartialMatch>,
        meta: &Metavariable,
    ) {
        loop {
            if template.is_last_child(self.template_unit) {
                // The run ends this level: candidates must have consumed
                // their whole sibling list too.
                live.retain(|partial| partial.cursor.at_end(unit));
                for partial in live.iter_mut() {
                    partial.cursor.backtrack();
                }
                template.backtrack();
                return;
            }
            template.next_sibling();
            let next = template
                .current(self.template_unit)
                .expect("sibling within bounds");
            let same_run = next
                .node()
                .and_then(|node| self.template.metavariable(node))
                .is_some_and(|next_meta| next_meta.identifier == meta.identifier);
            if !same_run {
                // The template expects another sibling here; candidates
                // sitting past their sibling list cannot supply one.
                live.retain(|partial| !partial.cursor.at_end(unit));
                return;
            }
        }
    }

    // ------------------------------------------------------------------
    // Results
    // ------------------------------------------------------------------

    fn resolve_overlaps(&self, unit: &Unit, survivors: Vec<PartialMatch>) -> Vec<MatchResult> {
        let results = survivors.into_iter().filter_map(|partial| {
            let roots = partial.root.children(unit).to_vec();
            let (_, span) = partial.root.span(unit)?;
            Some(MatchResult {
                roots,
                bindings: partial.bindings,
                span,
            })
        });

        let file = unit.main_file();
        let mut kept: Vec<MatchResult> = Vec::new();
        // Earlier matches win; on equal starts the wider range sorts
        // first. The sort is stable, so equal spans keep fork order.
        for result in results.sorted_by_key(|result| (result.span.start, Reverse(result.span.end)))
        {
            match kept.last() {
                Some(previous) if previous.span.overlaps(&result.span) => {
                    self.report_overlap(unit, file, previous.span, result.span);
                }
                _ => kept.push(result),
            }
        }
        kept
    }

    fn report_overlap(&self, unit: &Unit, file: FileId, kept: Span, discarded: Span) {
        warn!(
            file = %unit.sources().path(file).display(),
            kept = %unit.sources().describe_span(file, kept),
            discarded = %unit.sources().describe_span(file, discarded),
            "discarding a match that overlaps an earlier one"
        );
    }
}
