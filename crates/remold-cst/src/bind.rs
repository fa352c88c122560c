//! Lexical reference binding.
//!
//! After parsing, declaration references and member accesses are
//! resolved to the [`NodeId`] of the declaration they name, walking a
//! stack of lexical scopes. Resolution is purely lexical: no overload
//! selection, no type-directed member lookup. A member access resolves
//! against the nearest enclosing record's members, which covers implicit
//! `this` accesses inside method bodies; accesses through unrelated
//! objects stay unresolved and compare by name downstream.

use std::collections::HashMap;

use crate::nodes::{Node, NodeData, NodeId};

/// Resolve `DeclRef` and `Member` targets in place.
pub(crate) fn resolve_references(nodes: &mut [Node]) {
    let mut binder = Binder {
        scopes: vec![HashMap::new()],
        record_scopes: Vec::new(),
    };
    let root = NodeId(0);
    binder.walk(nodes, root);
}

struct Binder {
    /// Lexical scopes, innermost last. Names declared sequentially.
    scopes: Vec<HashMap<String, NodeId>>,
    /// Member scopes of the records currently being walked.
    record_scopes: Vec<HashMap<String, NodeId>>,
}

impl Binder {
    fn declare(&mut self, name: &str, id: NodeId) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), id);
        }
    }

    fn lookup(&self, name: &str) -> Option<NodeId> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
    }

    fn lookup_member(&self, name: &str) -> Option<NodeId> {
        self.record_scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
    }

    fn walk(&mut self, nodes: &mut [Node], id: NodeId) {
        // Declarations become visible at their own node, before their
        // children, so initializers and bodies can refer back to them.
        if let Some(name) = nodes[id.index()].data.name() {
            let name = name.to_string();
            self.declare(&name, id);
        }

        match &nodes[id.index()].data {
            NodeData::Record { members, .. } => {
                // Members are mutually visible regardless of order.
                let members = members.clone();
                let mut scope = HashMap::new();
                for member in &members {
                    if let Some(name) = nodes[member.index()].data.name() {
                        scope.insert(name.to_string(), *member);
                    }
                }
                self.record_scopes.push(scope);
                self.scopes.push(HashMap::new());
                for member in members {
                    self.walk(nodes, member);
                }
                self.scopes.pop();
                self.record_scopes.pop();
            }
            NodeData::Function { params, body, .. } => {
                let params = params.clone();
                let body = *body;
                self.scopes.push(HashMap::new());
                for param in params {
                    self.walk(nodes, param);
                }
                if let Some(body) = body {
                    self.walk(nodes, body);
                }
                self.scopes.pop();
            }
            NodeData::Compound { .. } | NodeData::Namespace { .. } | NodeData::For { .. } => {
                let children = nodes[id.index()].data.children();
                self.scopes.push(HashMap::new());
                for child in children {
                    self.walk(nodes, child);
                }
                self.scopes.pop();
            }
            NodeData::DeclRef { name, .. } => {
                // Record members are order-independent, so fall back to
                // the enclosing record scope after lexical lookup.
                let target = self.lookup(name).or_else(|| self.lookup_member(name));
                if let NodeData::DeclRef { target: slot, .. } = &mut nodes[id.index()].data {
                    *slot = target;
                }
            }
            NodeData::Member { name, .. } => {
                let target = self.lookup_member(name);
                let base = match &mut nodes[id.index()].data {
                    NodeData::Member {
                        target: slot, base, ..
                    } => {
                        *slot = target;
                        *base
                    }
                    _ => unreachable!(),
                };
                self.walk(nodes, base);
            }
            _ => {
                for child in nodes[id.index()].data.children() {
                    self.walk(nodes, child);
                }
            }
        }
    }
}
