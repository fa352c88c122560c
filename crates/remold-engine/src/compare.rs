//! Pair-wise node comparison.
//!
//! [`compare`] is a structural predicate over a template node and a
//! candidate node; it never recurses into children — the matcher drives
//! that — with one exception: a declaration reference compares the
//! declarations the two references resolve to.
//!
//! The `name_only` flag relaxes identifier-name equality for named
//! declarations (and for named tag types inside declared types); all
//! other checks still apply.

use remold_cst::{NodeData, NodeId, Unit};

use crate::view::NodeView;

/// Compare a template view against a candidate view.
///
/// The rules apply in order; the first applicable rule decides:
/// 1. empty views are equal only to each other;
/// 2. virtual groups compare equal to anything (their structure is
///    checked through child recursion);
/// 3. differing node kinds are unequal;
/// 4. kind-specific payload checks;
/// 5. anything else is equal, deferring to child recursion.
pub fn compare(
    template_unit: &Unit,
    template: &NodeView,
    candidate_unit: &Unit,
    candidate: &NodeView,
    name_only: bool,
) -> bool {
    if template.is_empty_view() || candidate.is_empty_view() {
        return template.is_empty_view() && candidate.is_empty_view();
    }
    let (Some(template_node), Some(candidate_node)) = (template.node(), candidate.node()) else {
        // A virtual group on either side; the walk compares members.
        return true;
    };
    compare_nodes(
        template_unit,
        template_node,
        candidate_unit,
        candidate_node,
        name_only,
    )
}

fn compare_nodes(
    template_unit: &Unit,
    template: NodeId,
    candidate_unit: &Unit,
    candidate: NodeId,
    name_only: bool,
) -> bool {
    let t = &template_unit.node(template).data;
    let c = &candidate_unit.node(candidate).data;
    if t.kind() != c.kind() {
        return false;
    }

    if t.kind().is_declaration() {
        return compare_decls(template_unit, template, candidate_unit, candidate, name_only);
    }

    match (t, c) {
        (NodeData::Binary { op: top, .. }, NodeData::Binary { op: cop, .. }) => top == cop,
        (NodeData::Unary { op: top, .. }, NodeData::Unary { op: cop, .. }) => top == cop,
        (NodeData::IntLit { value: tv }, NodeData::IntLit { value: cv }) => tv == cv,
        (
            NodeData::FloatLit {
                bits: tb,
                exact: te,
            },
            NodeData::FloatLit {
                bits: cb,
                exact: ce,
            },
        ) => te == ce && tb == cb,
        (
            NodeData::CharLit {
                wide: tw,
                value: tv,
            },
            NodeData::CharLit {
                wide: cw,
                value: cv,
            },
        ) => tw == cw && tv == cv,
        (NodeData::BoolLit { value: tv }, NodeData::BoolLit { value: cv }) => tv == cv,
        (
            NodeData::StrLit {
                wide: tw,
                value: tv,
            },
            NodeData::StrLit {
                wide: cw,
                value: cv,
            },
        ) => tw == cw && tv == cv,
        (
            NodeData::DeclRef {
                name: tn,
                target: tt,
            },
            NodeData::DeclRef {
                name: cn,
                target: ct,
            },
        ) => compare_referenced(
            template_unit,
            tn,
            *tt,
            candidate_unit,
            cn,
            *ct,
            name_only,
        ),
        (
            NodeData::Member {
                name: tn,
                arrow: ta,
                target: tt,
                ..
            },
            NodeData::Member {
                name: cn,
                arrow: ca,
                target: ct,
                ..
            },
        ) => {
            ta == ca
                && compare_referenced(
                    template_unit,
                    tn,
                    *tt,
                    candidate_unit,
                    cn,
                    *ct,
                    name_only,
                )
        }
        // Structure-only kinds defer to child recursion.
        _ => true,
    }
}

/// A reference compares through the declaration it resolves to. When
/// either side is unresolved, the referenced names stand in for the
/// declarations.
fn compare_referenced(
    template_unit: &Unit,
    template_name: &str,
    template_target: Option<NodeId>,
    candidate_unit: &Unit,
    candidate_name: &str,
    candidate_target: Option<NodeId>,
    name_only: bool,
) -> bool {
    match (template_target, candidate_target) {
        (Some(t), Some(c)) => compare_nodes(template_unit, t, candidate_unit, c, name_only),
        _ => name_only || template_name == candidate_name,
    }
}

fn compare_decls(
    template_unit: &Unit,
    template: NodeId,
    candidate_unit: &Unit,
    candidate: NodeId,
    name_only: bool,
) -> bool {
    let t = &template_unit.node(template).data;
    let c = &candidate_unit.node(candidate).data;
    if t.access() != c.access() {
        return false;
    }
    if !name_only && t.name() != c.name() {
        return false;
    }

    // Declared types that name the declaration's own class compare as
    // self-references: a member of one class and a member of another
    // referring to their respective classes agree, whatever the two
    // classes are called.
    let self_names = || {
        (
            enclosing_record_name(template_unit, template),
            enclosing_record_name(candidate_unit, candidate),
        )
    };

    match (t, c) {
        // Tag declarations: matching tag kinds. The declared type is the
        // tag itself, whose name the named-declaration rule covered.
        (NodeData::Record { tag: tt, .. }, NodeData::Record { tag: ct, .. }) => tt == ct,
        (NodeData::Enum { .. }, NodeData::Enum { .. }) => true,
        // Typedefs relax their underlying tag-type names under name_only.
        (NodeData::Typedef { ty: tt, .. }, NodeData::Typedef { ty: ct, .. }) => {
            let (t_self, c_self) = self_names();
            tt.structural_eq_modulo(ct, name_only, t_self, c_self)
        }
        (
            NodeData::UsingDirective { namespace: tn },
            NodeData::UsingDirective { namespace: cn },
        ) => tn == cn,
        // Value declarations: qualified declared types compare without
        // name relaxation; method-like flags must agree.
        (
            NodeData::Function {
                ty: tt,
                is_virtual: tv,
                is_const: tc,
                is_static: ts,
                fn_kind: tk,
                ..
            },
            NodeData::Function {
                ty: ct,
                is_virtual: cv,
                is_const: cc,
                is_static: cs,
                fn_kind: ck,
                ..
            },
        ) => {
            if tk != ck || tv != cv || tc != cc || ts != cs {
                return false;
            }
            let (t_self, c_self) = self_names();
            tt.structural_eq_modulo(ct, false, t_self, c_self)
        }
        (NodeData::Var { ty: tt, .. }, NodeData::Var { ty: ct, .. })
        | (NodeData::Field { ty: tt, .. }, NodeData::Field { ty: ct, .. })
        | (NodeData::Param { ty: tt, .. }, NodeData::Param { ty: ct, .. }) => {
            let (t_self, c_self) = self_names();
            tt.structural_eq_modulo(ct, false, t_self, c_self)
        }
        _ => true,
    }
}

/// The name of the nearest record enclosing `id`, if any.
fn enclosing_record_name(unit: &Unit, id: NodeId) -> Option<&str> {
    let mut current = unit.parent(id);
    while let Some(parent) = current {
        if let NodeData::Record { name, .. } = &unit.node(parent).data {
            return Some(name);
        }
        current = unit.parent(parent);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use remold_cst::NodeKind;

    fn parse(text: &str) -> Unit {
        Unit::parse_str(text, "cmp.cc").expect("parse error")
    }

    fn find(unit: &Unit, kind: NodeKind) -> NodeView {
        let id = unit
            .preorder()
            .find(|id| unit.kind(*id) == kind)
            .expect("node kind not found");
        NodeView::real(id)
    }

    fn nth(unit: &Unit, kind: NodeKind, n: usize) -> NodeView {
        let id = unit
            .preorder()
            .filter(|id| unit.kind(*id) == kind)
            .nth(n)
            .expect("node kind not found");
        NodeView::real(id)
    }

    mod structure {
        use super::*;

        #[test]
        fn kind_mismatch_is_unequal() {
            let a = parse("void f() { return; }");
            let b = parse("void f() { break; }");
            let ret = find(&a, NodeKind::Return);
            let brk = find(&b, NodeKind::Break);
            assert!(!compare(&a, &ret, &b, &brk, false));
        }

        #[test]
        fn empty_views_match_only_each_other() {
            let unit = parse("int x;");
            let var = find(&unit, NodeKind::Var);
            let empty = NodeView::empty();
            assert!(compare(&unit, &empty, &unit, &NodeView::empty(), false));
            assert!(!compare(&unit, &empty, &unit, &var, false));
            assert!(!compare(&unit, &var, &unit, &empty, false));
        }

        #[test]
        fn groups_defer_to_children() {
            let unit = parse("int x;");
            let var = find(&unit, NodeKind::Var);
            let group = NodeView::group(vec![var.clone()]);
            assert!(compare(&unit, &group, &unit, &var, false));
        }
    }

    mod operators_and_literals {
        use super::*;

        #[test]
        fn binary_opcode_must_match() {
            let add = parse("int x = a + b;");
            let sub = parse("int x = a - b;");
            let add2 = parse("int y = c + d;");
            let lhs = find(&add, NodeKind::Binary);
            assert!(!compare(
                &add,
                &lhs,
                &sub,
                &find(&sub, NodeKind::Binary),
                false
            ));
            assert!(compare(
                &add,
                &lhs,
                &add2,
                &find(&add2, NodeKind::Binary),
                false
            ));
        }

        #[test]
        fn integer_literals_compare_by_value() {
            let a = parse("int x = 42;");
            let b = parse("int x = 0x2A;");
            let c = parse("int x = 43;");
            let lit = find(&a, NodeKind::IntLit);
            assert!(compare(&a, &lit, &b, &find(&b, NodeKind::IntLit), false));
            assert!(!compare(&a, &lit, &c, &find(&c, NodeKind::IntLit), false));
        }

        #[test]
        fn float_literals_compare_exactness_and_bits() {
            let half = parse("double x = 0.5;");
            let tenth = parse("double x = 0.1;");
            let lit = find(&half, NodeKind::FloatLit);
            assert!(!compare(
                &half,
                &lit,
                &tenth,
                &find(&tenth, NodeKind::FloatLit),
                false
            ));
        }

        #[test]
        fn string_literals_compare_kind_and_content() {
            let plain = parse("void f() { g(\"hi\"); }");
            let wide = parse("void f() { g(L\"hi\"); }");
            let lit = find(&plain, NodeKind::StrLit);
            assert!(!compare(
                &plain,
                &lit,
                &wide,
                &find(&wide, NodeKind::StrLit),
                false
            ));
        }
    }

    mod references {
        use super::*;

        #[test]
        fn resolved_references_compare_their_declarations() {
            let a = parse("void f() { int v; v = 1; }");
            let b = parse("void f() { int v; v = 2; }");
            let c = parse("void f() { float v; v = 3; }");
            let ref_a = nth(&a, NodeKind::DeclRef, 0);
            assert!(compare(&a, &ref_a, &b, &nth(&b, NodeKind::DeclRef, 0), false));
            // Same name, different declared type.
            assert!(!compare(&a, &ref_a, &c, &nth(&c, NodeKind::DeclRef, 0), false));
        }

        #[test]
        fn unresolved_references_fall_back_to_names() {
            let a = parse("void f() { go(); }");
            let b = parse("void f() { go(); }");
            let c = parse("void f() { stop(); }");
            let ref_a = nth(&a, NodeKind::DeclRef, 0);
            assert!(compare(&a, &ref_a, &b, &nth(&b, NodeKind::DeclRef, 0), false));
            assert!(!compare(&a, &ref_a, &c, &nth(&c, NodeKind::DeclRef, 0), false));
            assert!(compare(&a, &ref_a, &c, &nth(&c, NodeKind::DeclRef, 0), true));
        }
    }

    mod declarations {
        use super::*;

        #[test]
        fn named_declarations_relax_under_name_only() {
            let a = parse("int count;");
            let b = parse("int total;");
            let var = find(&a, NodeKind::Var);
            let other = find(&b, NodeKind::Var);
            assert!(!compare(&a, &var, &b, &other, false));
            assert!(compare(&a, &var, &b, &other, true));
        }

        #[test]
        fn declared_types_do_not_relax() {
            let a = parse("int count;");
            let b = parse("long count;");
            let var = find(&a, NodeKind::Var);
            assert!(!compare(&a, &var, &b, &find(&b, NodeKind::Var), true));
        }

        #[test]
        fn access_specifiers_must_match() {
            let pub_field = parse("class C { public: int v; };");
            let priv_field = parse("class C { private: int v; };");
            let field = find(&pub_field, NodeKind::Field);
            assert!(!compare(
                &pub_field,
                &field,
                &priv_field,
                &find(&priv_field, NodeKind::Field),
                false
            ));
        }

        #[test]
        fn method_flags_must_match() {
            let plain = parse("class C { public: int get(); };");
            let konst = parse("class C { public: int get() const; };");
            let method = find(&plain, NodeKind::Function);
            assert!(!compare(
                &plain,
                &method,
                &konst,
                &find(&konst, NodeKind::Function),
                false
            ));
        }

        #[test]
        fn tag_kinds_must_match() {
            let class_decl = parse("class C { };");
            let struct_decl = parse("struct C { };");
            let record = find(&class_decl, NodeKind::Record);
            assert!(!compare(
                &class_decl,
                &record,
                &struct_decl,
                &find(&struct_decl, NodeKind::Record),
                false
            ));
        }

        #[test]
        fn self_referential_member_types_compare_across_classes() {
            let a = parse("class A { public: static A make(); };");
            let b = parse("class B { public: static B make(); };");
            let make_a = find(&a, NodeKind::Function);
            let make_b = find(&b, NodeKind::Function);
            assert!(compare(&a, &make_a, &b, &make_b, false));

            // A member returning some other record is not a self-reference.
            let c = parse("class Other { };\nclass B { public: static Other make(); };");
            let make_c = find(&c, NodeKind::Function);
            assert!(!compare(&a, &make_a, &c, &make_c, false));
        }

        #[test]
        fn using_directives_compare_target_namespaces() {
            let a = parse("namespace lib { }\nusing namespace lib;");
            let b = parse("namespace other { }\nusing namespace other;");
            let using_a = find(&a, NodeKind::UsingDirective);
            assert!(!compare(
                &a,
                &using_a,
                &b,
                &find(&b, NodeKind::UsingDirective),
                false
            ));
        }
    }
}
