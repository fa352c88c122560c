//! The extracted LHS template.
//!
//! Host AST nodes cannot carry extra annotations, so the template keeps
//! a side map from node identity to metavariable. A metavariable that
//! spans several consecutive subtrees appears in the map once per
//! subtree; the matcher treats such a run as a single binding.

use std::collections::BTreeMap;

use remold_cst::{NodeData, NodeId, Unit};

use super::config::Metavariable;

/// Identifier prefix for the implicit name-only bindings of the
/// constructor, destructor, conversion, and injected-class-name members
/// of a name-only-parameterised class. Each member gets its own
/// anonymous metavariable, suffixed with the member's node id, so the
/// bindings of distinct members never collide under the consistency
/// check.
pub const IMPLICIT_METAVARIABLE: &str = "__implicit_metavariable";

/// An extracted LHS template: the ordered top-level subtrees plus the
/// metavariable annotations.
#[derive(Debug, Default)]
pub struct LhsTemplate {
    subtrees: Vec<NodeId>,
    metavariables: BTreeMap<NodeId, Metavariable>,
}

impl LhsTemplate {
    pub(crate) fn new() -> Self {
        LhsTemplate::default()
    }

    /// Append a subtree to the end of the template.
    pub(crate) fn add_subtree(&mut self, subtree: NodeId) {
        self.subtrees.push(subtree);
    }

    /// Annotate a subtree as a metavariable occurrence.
    ///
    /// A name-only binding of a class-like declaration implicitly
    /// parameterises the members that carry the class's name, so the
    /// matcher can ignore the name where it recurs inside class scope.
    pub(crate) fn add_metavariable(
        &mut self,
        unit: &Unit,
        subtree: NodeId,
        metavariable: Metavariable,
    ) {
        if metavariable.name_only {
            if let NodeData::Record { members, .. } = &unit.node(subtree).data {
                for member in members {
                    let member_data = &unit.node(*member).data;
                    let carries_name = match member_data {
                        NodeData::Function { fn_kind, .. } => fn_kind.carries_class_name(),
                        _ => member_data.is_injected_class_name(),
                    };
                    if carries_name {
                        self.metavariables.insert(
                            *member,
                            Metavariable::name_only(format!(
                                "{IMPLICIT_METAVARIABLE}_{}",
                                member.0
                            )),
                        );
                    }
                }
            }
        }
        self.metavariables.insert(subtree, metavariable);
    }

    /// The ordered top-level subtrees.
    pub fn subtrees(&self) -> &[NodeId] {
        &self.subtrees
    }

    pub fn is_metavariable(&self, subtree: NodeId) -> bool {
        self.metavariables.contains_key(&subtree)
    }

    pub fn metavariable(&self, subtree: NodeId) -> Option<&Metavariable> {
        self.metavariables.get(&subtree)
    }

    /// The distinct metavariables annotated in this template.
    pub fn declared(&self) -> Vec<&Metavariable> {
        let mut seen: Vec<&Metavariable> = Vec::new();
        for metavariable in self.metavariables.values() {
            if !seen.contains(&metavariable) {
                seen.push(metavariable);
            }
        }
        seen.sort();
        seen
    }

    pub fn is_empty(&self) -> bool {
        self.subtrees.is_empty()
    }
}
