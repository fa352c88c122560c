//! End-to-end matcher scenarios: template extraction from a parsed
//! template unit, the lockstep walk over candidate units, overlap
//! resolution, and RHS instantiation.

use remold_core::patch::Span;
use remold_cst::Unit;
use remold_engine::lhs::{extract, LhsTemplate, MetavarLocation, Metavariable, TemplateSpans};
use remold_engine::matcher::{MatchResult, Matcher};
use remold_engine::rhs::RhsTemplate;

fn parse(text: &str, path: &str) -> Unit {
    Unit::parse_str(text, path).expect("parse error")
}

/// Byte span of the first occurrence of `needle` in the unit's text.
fn find(unit: &Unit, needle: &str) -> Span {
    find_nth(unit, needle, 0)
}

/// Byte span of the n-th occurrence of `needle` in the unit's text.
fn find_nth(unit: &Unit, needle: &str, n: usize) -> Span {
    let text = &unit.sources().file(unit.main_file()).text;
    let mut start = 0;
    for _ in 0..n {
        start += text[start..].find(needle).expect("needle not found") + needle.len();
    }
    let start = start + text[start..].find(needle).expect("needle not found");
    Span::new(start, start + needle.len())
}

/// Extract a template whose range covers `template_text`, with
/// metavariables covering the given needles (listed in source order).
fn template_for(
    unit: &Unit,
    template_text: &str,
    metas: &[(&str, &str, bool)],
) -> LhsTemplate {
    let spans = TemplateSpans {
        template: find(unit, template_text),
        metavariables: metas
            .iter()
            .map(|(identifier, needle, name_only)| MetavarLocation {
                metavariable: if *name_only {
                    Metavariable::name_only(*identifier)
                } else {
                    Metavariable::new(*identifier)
                },
                span: find(unit, needle),
            })
            .collect(),
    };
    extract(unit, &spans).expect("extraction error")
}

/// The captured source text for one metavariable of a match.
fn binding_texts(unit: &Unit, result: &MatchResult, identifier: &str) -> Vec<String> {
    let (_, views) = result
        .bindings
        .iter()
        .find(|(meta, _)| meta.identifier == identifier)
        .expect("metavariable not bound");
    views
        .iter()
        .map(|view| {
            let (file, span) = view.span(unit).expect("bound view has a span");
            unit.sources().text(file, span).to_string()
        })
        .collect()
}

#[test]
fn matches_if_else_structure() {
    let template_unit = parse(
        "void tpl() {\n  if (x == true) { f(); } else { g(); }\n}\n",
        "tpl.cc",
    );
    let template = template_for(
        &template_unit,
        "if (x == true) { f(); } else { g(); }",
        &[("x", "x", false), ("body", "f();", false), ("alt", "g();", false)],
    );

    let input = parse(
        "void use() {\n  before();\n  if (a == true) { run(); } else { stop(); }\n}\n",
        "input.cc",
    );
    let results = Matcher::new(&template_unit, &template).match_unit(&input);

    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert_eq!(
        input.sources().text(input.main_file(), result.span),
        "if (a == true) { run(); } else { stop(); }"
    );
    assert_eq!(binding_texts(&input, result, "x"), vec!["a"]);
    assert_eq!(binding_texts(&input, result, "body"), vec!["run()"]);
    assert_eq!(binding_texts(&input, result, "alt"), vec!["stop()"]);
}

#[test]
fn condition_shape_must_match() {
    let template_unit = parse(
        "void tpl() {\n  if (x == true) { f(); } else { g(); }\n}\n",
        "tpl.cc",
    );
    let template = template_for(
        &template_unit,
        "if (x == true) { f(); } else { g(); }",
        &[("x", "x", false), ("body", "f();", false), ("alt", "g();", false)],
    );

    // Comparison against false, and a missing else branch: neither matches.
    let input = parse(
        "void use() {\n  if (a == false) { run(); } else { stop(); }\n  if (b == true) { run(); }\n}\n",
        "input.cc",
    );
    let results = Matcher::new(&template_unit, &template).match_unit(&input);
    assert!(results.is_empty());
}

#[test]
fn variadic_binds_statement_sequence() {
    let template_unit = parse("void f() { s; }\n", "tpl.cc");
    let template = template_for(&template_unit, "void f() { s; }", &[("stmts", "s;", false)]);

    let input = parse("void f() { a(); b(); c(); }\n", "input.cc");
    let results = Matcher::new(&template_unit, &template).match_unit(&input);

    assert_eq!(results.len(), 1);
    assert_eq!(
        binding_texts(&input, &results[0], "stmts"),
        vec!["a()", "b()", "c()"]
    );
}

#[test]
fn variadic_may_bind_zero_subtrees() {
    let template_unit = parse("void f() { s; tick(); }\n", "tpl.cc");
    let template = template_for(
        &template_unit,
        "void f() { s; tick(); }",
        &[("pre", "s;", false)],
    );

    let input = parse("void f() { tick(); }\n", "input.cc");
    let results = Matcher::new(&template_unit, &template).match_unit(&input);

    assert_eq!(results.len(), 1);
    assert_eq!(binding_texts(&input, &results[0], "pre"), Vec::<String>::new());
}

#[test]
fn overlapping_sum_matches_keep_the_wider() {
    let template_unit = parse("int r = a + b;\n", "tpl.cc");
    let template = template_for(
        &template_unit,
        "a + b",
        &[("x", "a", false), ("y", "b", false)],
    );

    let input = parse("int r = p + q + w;\n", "input.cc");
    let results = Matcher::new(&template_unit, &template).match_unit(&input);

    assert_eq!(results.len(), 1);
    assert_eq!(
        input.sources().text(input.main_file(), results[0].span),
        "p + q + w"
    );
}

#[test]
fn name_only_class_matches_with_implicit_members() {
    let template_unit = parse("class C { public: C(); ~C(); };\n", "tpl.cc");
    let template = template_for(
        &template_unit,
        "class C { public: C(); ~C(); };",
        &[("C", "class C { public: C(); ~C(); };", true)],
    );

    let input = parse("class Foo { public: Foo(); ~Foo(); };\n", "input.cc");
    let results = Matcher::new(&template_unit, &template).match_unit(&input);

    assert_eq!(results.len(), 1);
    assert_eq!(binding_texts(&input, &results[0], "C").len(), 1);

    // The rewriter splices the declaration's name for a name-only binding.
    let rhs = RhsTemplate::parse("struct ?C;");
    assert_eq!(rhs.instantiate(&results[0], &input), "struct Foo;");
}

#[test]
fn name_only_class_relaxes_self_referential_member_types() {
    // `make` reuses the class's own name in its return type; renaming
    // the class must not break the match.
    let template_unit = parse("class C { public: C(); static C make(); };\n", "tpl.cc");
    let template = template_for(
        &template_unit,
        "class C { public: C(); static C make(); };",
        &[("C", "class C { public: C(); static C make(); };", true)],
    );
    let matcher = Matcher::new(&template_unit, &template);

    let renamed = parse(
        "class Foo { public: Foo(); static Foo make(); };\n",
        "input.cc",
    );
    let results = matcher.match_unit(&renamed);
    assert_eq!(results.len(), 1);

    let rhs = RhsTemplate::parse("?C* clone_of_?C;");
    assert_eq!(rhs.instantiate(&results[0], &renamed), "Foo* clone_of_Foo;");

    // A member returning an unrelated type is not a self-reference.
    let unrelated = parse(
        "class Helper { };\nclass Foo { public: Foo(); static Helper make(); };\n",
        "input.cc",
    );
    assert!(matcher.match_unit(&unrelated).is_empty());
}

#[test]
fn name_only_relaxes_names_but_not_types() {
    let template_unit = parse("void tpl() { int n = 0; int n2 = 0; }\n", "tpl.cc");
    let template = template_for(
        &template_unit,
        "int n = 0; int n2 = 0;",
        &[("a", "int n = 0", true), ("b", "int n2 = 0", true)],
    );

    let input = parse("void use() { int first = 0; long second = 0; }\n", "input.cc");
    // Declared types still participate under name_only, so the second
    // declaration's `long` breaks the match.
    let results = Matcher::new(&template_unit, &template).match_unit(&input);
    assert!(results.is_empty());

    let matching = parse("void use() { int first = 0; int second = 0; }\n", "input.cc");
    let results = Matcher::new(&template_unit, &template).match_unit(&matching);
    assert_eq!(results.len(), 1);
}

#[test]
fn rebound_name_only_metavariable_requires_structural_equality() {
    // One identifier covering two template positions: every candidate
    // occurrence must bind a structurally identical declaration (names
    // significant), though not the same declaration.
    let template_unit = parse("void tpl() { int n = 0; int n = 0; }\n", "tpl.cc");
    let first = find_nth(&template_unit, "int n = 0", 0);
    let second = find_nth(&template_unit, "int n = 0", 1);
    let spans = TemplateSpans {
        template: find(&template_unit, "int n = 0; int n = 0;"),
        metavariables: vec![
            MetavarLocation {
                metavariable: Metavariable::name_only("v"),
                span: first,
            },
            MetavarLocation {
                metavariable: Metavariable::name_only("v"),
                span: second,
            },
        ],
    };
    let template = extract(&template_unit, &spans).expect("extraction error");
    let matcher = Matcher::new(&template_unit, &template);

    let consistent = parse("void use() { int same = 0; int same = 0; }\n", "input.cc");
    assert_eq!(matcher.match_unit(&consistent).len(), 1);

    let inconsistent = parse("void use() { int one = 0; int two = 0; }\n", "input.cc");
    assert!(matcher.match_unit(&inconsistent).is_empty());
}

#[test]
fn swapping_a_name_only_identifier_never_changes_matching() {
    let template_unit = parse("int counter = 7;\n", "tpl.cc");
    let template = template_for(
        &template_unit,
        "int counter = 7;",
        &[("n", "int counter = 7;", true)],
    );
    let matcher = Matcher::new(&template_unit, &template);

    let original = parse("int total = 7;\n", "input.cc");
    let renamed = parse("int renamed_total = 7;\n", "input.cc");
    assert_eq!(matcher.match_unit(&original).len(), 1);
    assert_eq!(matcher.match_unit(&renamed).len(), 1);

    // Without the metavariable the same swap breaks the match.
    let strict = template_for(&template_unit, "int counter = 7;", &[]);
    let strict_matcher = Matcher::new(&template_unit, &strict);
    assert_eq!(strict_matcher.match_unit(&original).len(), 0);
}

#[test]
fn results_are_deterministic_and_complete() {
    let template_unit = parse("void f() { s; }\n", "tpl.cc");
    let template = template_for(&template_unit, "void f() { s; }", &[("stmts", "s;", false)]);
    let matcher = Matcher::new(&template_unit, &template);

    let input = parse("void f() { a(); b(); }\n", "input.cc");
    let first = matcher.match_unit(&input);
    let second = matcher.match_unit(&input);

    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.span, b.span);
        assert_eq!(
            binding_texts(&input, a, "stmts"),
            binding_texts(&input, b, "stmts")
        );
    }
    // Every declared metavariable is bound in every result.
    for result in &first {
        for declared in template.declared() {
            assert!(result.bindings.contains_key(declared));
        }
    }
}

#[test]
fn header_nodes_never_anchor_matches() {
    use std::fs;

    let template_unit = parse("void probe() { ping(); }\n", "tpl.cc");
    let template = template_for(&template_unit, "void probe() { ping(); }", &[]);
    let matcher = Matcher::new(&template_unit, &template);

    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("lib.h"), "void probe() { ping(); }\n").unwrap();

    let silent = dir.path().join("silent.cc");
    fs::write(&silent, "#include \"lib.h\"\nint keep;\n").unwrap();
    let unit = Unit::parse_file(&silent).unwrap();
    assert!(matcher.match_unit(&unit).is_empty());

    let loud = dir.path().join("loud.cc");
    fs::write(&loud, "#include \"lib.h\"\nvoid probe() { ping(); }\n").unwrap();
    let unit = Unit::parse_file(&loud).unwrap();
    assert_eq!(matcher.match_unit(&unit).len(), 1);
}

#[test]
fn rewriter_instantiates_captured_ranges() {
    let template_unit = parse(
        "void tpl() {\n  if (x == true) { f(); } else { g(); }\n}\n",
        "tpl.cc",
    );
    let template = template_for(
        &template_unit,
        "if (x == true) { f(); } else { g(); }",
        &[("x", "x", false), ("body", "f();", false), ("alt", "g();", false)],
    );

    let input = parse(
        "void use() {\n  if (a == true) { run(); } else { stop(); }\n}\n",
        "input.cc",
    );
    let results = Matcher::new(&template_unit, &template).match_unit(&input);
    assert_eq!(results.len(), 1);

    let rhs = RhsTemplate::parse("if (!?x) { ?alt } else { ?body }");
    assert_eq!(
        rhs.instantiate(&results[0], &input),
        "if (!a) { stop(); } else { run(); }"
    );
}

#[test]
fn missing_rhs_binding_contributes_nothing() {
    let template_unit = parse("int counter = 7;\n", "tpl.cc");
    let template = template_for(&template_unit, "int counter = 7;", &[]);
    let input = parse("int counter = 7;\n", "input.cc");
    let results = Matcher::new(&template_unit, &template).match_unit(&input);
    assert_eq!(results.len(), 1);

    let rhs = RhsTemplate::parse("int renamed = ?ghost;");
    assert_eq!(rhs.instantiate(&results[0], &input), "int renamed = ;");
}
