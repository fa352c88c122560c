//! Template extraction.
//!
//! The extractor walks the template source AST in document order and
//! maps the configured byte ranges onto whole subtrees. A range may
//! cover several consecutive subtrees, and it may end at a subtree's own
//! end or at the terminator-extended end (so a range written to include
//! a trailing `;` still lines up). A range that cuts a subtree in half
//! is an error, never a partial match:
//!
//! ```text
//! allowed:    range [..............]      range    [.....]
//!             trees [.....][.......]      tree  [............]
//!
//! rejected:   range     [.......]
//!             trees [.......][.......]
//! ```
//!
//! The same containment rules apply to each metavariable range inside
//! the template, recursively.

use remold_core::patch::Span;
use remold_cst::{NodeId, Unit};
use thiserror::Error;

use super::config::{MetavarLocation, TemplateSpans};
use super::template::LhsTemplate;

/// Template extraction failures. All abort the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("template overshot: no series of subtrees matches the template range {range}")]
    Overshoot { range: String },
    #[error("template range {range} partially spans a subtree at {subtree}")]
    PartialSpan { range: String, subtree: String },
    #[error("metavariable {identifier} partially spans a subtree at {subtree}")]
    MetavarPartialSpan {
        identifier: String,
        subtree: String,
    },
    #[error("metavariable {identifier} was not found in the template")]
    MissingMetavariable { identifier: String },
}

/// Extract the LHS template from the template source unit.
pub fn extract(unit: &Unit, spans: &TemplateSpans) -> Result<LhsTemplate, ExtractError> {
    let mut extractor = Extractor {
        unit,
        template: spans.template,
        building: false,
        done: false,
        out: LhsTemplate::new(),
    };
    for decl in unit.children(unit.root()) {
        if extractor.walk(decl)? {
            break;
        }
    }
    if !extractor.done {
        return Err(ExtractError::Overshoot {
            range: extractor.describe(spans.template),
        });
    }

    let mut meta = MetaExtractor {
        unit,
        remaining: spans.metavariables.clone(),
        active: None,
        out: extractor.out,
    };
    for subtree in meta.out.subtrees().to_vec() {
        meta.walk(subtree)?;
    }
    if let Some(missing) = meta.remaining.first() {
        return Err(ExtractError::MissingMetavariable {
            identifier: missing.metavariable.identifier.clone(),
        });
    }
    Ok(meta.out)
}

struct Extractor<'a> {
    unit: &'a Unit,
    template: Span,
    building: bool,
    done: bool,
    out: LhsTemplate,
}

impl<'a> Extractor<'a> {
    fn describe(&self, span: Span) -> String {
        self.unit.sources().describe_span(self.unit.main_file(), span)
    }

    /// Walk one subtree; returns true once the template is complete.
    fn walk(&mut self, id: NodeId) -> Result<bool, ExtractError> {
        // Subtrees spliced from included files cannot carry the template.
        if !self.unit.is_in_main_file(id) {
            return Ok(false);
        }
        let span = self.unit.span(id);
        let extended = self
            .unit
            .extend_through_terminator(self.unit.file_of(id), span);

        // Entirely before the template: skip to the next subtree.
        if span.end <= self.template.start {
            return Ok(false);
        }
        // Entirely past the template: pre-order means the start can no
        // longer be found.
        if span.start >= self.template.end {
            return Err(ExtractError::Overshoot {
                range: self.describe(self.template),
            });
        }

        if span.start == self.template.start {
            self.building = true;
        }

        if self.building {
            if span.end > self.template.end {
                return Err(ExtractError::PartialSpan {
                    range: self.describe(self.template),
                    subtree: self.describe(span),
                });
            }
            self.out.add_subtree(id);
            if span.end == self.template.end || extended.end == self.template.end {
                self.done = true;
                return Ok(true);
            }
            return Ok(false);
        }

        // The template begins strictly inside this subtree: the range
        // must not stick out past its end, and the walk descends.
        if span.start < self.template.start && self.template.start < span.end {
            if self.template.end > extended.end {
                return Err(ExtractError::PartialSpan {
                    range: self.describe(self.template),
                    subtree: self.describe(span),
                });
            }
            for child in self.unit.children(id) {
                if self.walk(child)? {
                    return Ok(true);
                }
            }
            return Ok(false);
        }

        // Partial overlap without containment.
        Err(ExtractError::PartialSpan {
            range: self.describe(self.template),
            subtree: self.describe(span),
        })
    }
}

struct MetaExtractor<'a> {
    unit: &'a Unit,
    /// Still-unmatched metavariable ranges, sorted by start.
    remaining: Vec<MetavarLocation>,
    /// Index into `remaining` of the metavariable currently collecting
    /// consecutive subtrees.
    active: Option<usize>,
    out: LhsTemplate,
}

impl<'a> MetaExtractor<'a> {
    fn describe(&self, span: Span) -> String {
        self.unit.sources().describe_span(self.unit.main_file(), span)
    }

    fn walk(&mut self, id: NodeId) -> Result<(), ExtractError> {
        let span = self.unit.span(id);
        let extended = self
            .unit
            .extend_through_terminator(self.unit.file_of(id), span);

        if self.active.is_none() {
            let mut descend = false;
            for (index, location) in self.remaining.iter().enumerate() {
                if !location.span.overlaps(&span) {
                    continue;
                }
                // This subtree starts a metavariable run.
                if location.span.start == span.start && span.end <= location.span.end {
                    self.active = Some(index);
                    break;
                }
                // A metavariable lies deeper inside this subtree.
                if span.contains(&location.span) {
                    descend = true;
                    break;
                }
            }
            if self.active.is_none() {
                if descend {
                    for child in self.unit.children(id) {
                        self.walk(child)?;
                    }
                }
                return Ok(());
            }
        }

        let index = self.active.expect("active metavariable");
        let location = self.remaining[index].clone();
        if span.end > location.span.end {
            return Err(ExtractError::MetavarPartialSpan {
                identifier: location.metavariable.identifier.clone(),
                subtree: self.describe(span),
            });
        }
        self.out
            .add_metavariable(self.unit, id, location.metavariable.clone());
        if span.end == location.span.end || extended.end == location.span.end {
            self.remaining.remove(index);
            self.active = None;
        }
        // Subtrees inside a metavariable stay opaque.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lhs::config::{LhsConfig, Metavariable};

    // Line 3 columns: `if` at 3, condition `x == 1` at 7..=12, `}` at 24.
    // Line 4: `tick()` at 3..=8, `;` at 9.
    const TEMPLATE: &str = "\
void demo() {
  int before;
  if (x == 1) { run(); }
  tick();
}
";

    fn unit(text: &str) -> Unit {
        Unit::parse_str(text, "tpl.cc").expect("parse error")
    }

    fn config(template_range: [[u32; 2]; 2], meta: &str) -> LhsConfig {
        let text = format!(
            r#"{{
                "template_source": "tpl.cc",
                "template_range": {},
                "meta_variables": [{meta}],
                "rhs_template": "rhs.txt"
            }}"#,
            serde_json::to_string(&template_range).unwrap()
        );
        serde_json::from_str(&text).expect("config parse error")
    }

    fn resolve_and_extract(
        unit: &Unit,
        template_range: [[u32; 2]; 2],
        meta: &str,
    ) -> Result<LhsTemplate, ExtractError> {
        let spans = config(template_range, meta)
            .resolve(unit.sources(), unit.main_file())
            .expect("config resolution error");
        extract(unit, &spans)
    }

    #[test]
    fn single_statement_template() {
        let unit = unit(TEMPLATE);
        let template = resolve_and_extract(&unit, [[3, 3], [3, 24]], "").unwrap();
        assert_eq!(template.subtrees().len(), 1);
        assert_eq!(
            unit.text_of(template.subtrees()[0]),
            "if (x == 1) { run(); }"
        );
    }

    #[test]
    fn template_may_span_consecutive_subtrees() {
        let unit = unit(TEMPLATE);
        // The if statement plus the `tick();` call on the next line.
        let template = resolve_and_extract(&unit, [[3, 3], [4, 9]], "").unwrap();
        assert_eq!(template.subtrees().len(), 2);
        assert_eq!(unit.text_of(template.subtrees()[1]), "tick()");
    }

    #[test]
    fn template_end_accepts_the_trailing_terminator() {
        let unit = unit(TEMPLATE);
        // `tick();` — the call expression's span excludes the `;`, the
        // configured range includes it.
        let template = resolve_and_extract(&unit, [[4, 3], [4, 9]], "").unwrap();
        assert_eq!(template.subtrees().len(), 1);
        assert_eq!(unit.text_of(template.subtrees()[0]), "tick()");
    }

    #[test]
    fn partial_span_is_rejected() {
        let unit = unit(TEMPLATE);
        // Starts in the whitespace inside the if condition.
        let err = resolve_and_extract(&unit, [[3, 8], [3, 24]], "").unwrap_err();
        assert!(matches!(err, ExtractError::PartialSpan { .. }));
    }

    #[test]
    fn overshoot_is_rejected() {
        let unit = unit("int a;\n");
        // A range in the whitespace after the last subtree.
        let err = resolve_and_extract(&unit, [[1, 7], [1, 7]], "").unwrap_err();
        assert!(matches!(err, ExtractError::Overshoot { .. }));
    }

    #[test]
    fn metavariable_binds_a_nested_subtree() {
        let unit = unit(TEMPLATE);
        let template = resolve_and_extract(
            &unit,
            [[3, 3], [3, 24]],
            r#"{"identifier": "cond", "range": [[3, 7], [3, 12]]}"#,
        )
        .unwrap();
        let bound: Vec<NodeId> = unit
            .preorder()
            .filter(|id| template.is_metavariable(*id))
            .collect();
        assert_eq!(bound.len(), 1);
        assert_eq!(unit.text_of(bound[0]), "x == 1");
        assert_eq!(
            template.metavariable(bound[0]),
            Some(&Metavariable::new("cond"))
        );
    }

    #[test]
    fn metavariable_may_span_consecutive_statements() {
        let unit = unit("void f() { a(); b(); c(); }\n");
        // `a(); b();` at columns 12..=20.
        let template = resolve_and_extract(
            &unit,
            [[1, 1], [1, 27]],
            r#"{"identifier": "stmts", "range": [[1, 12], [1, 20]]}"#,
        )
        .unwrap();
        let bound: Vec<NodeId> = unit
            .preorder()
            .filter(|id| template.is_metavariable(*id))
            .collect();
        assert_eq!(bound.len(), 2);
        assert_eq!(unit.text_of(bound[0]), "a()");
        assert_eq!(unit.text_of(bound[1]), "b()");
    }

    #[test]
    fn metavariable_cutting_a_subtree_is_rejected() {
        let unit = unit(TEMPLATE);
        // Covers `x ==` only: cuts the binary expression.
        let err = resolve_and_extract(
            &unit,
            [[3, 3], [3, 24]],
            r#"{"identifier": "bad", "range": [[3, 7], [3, 10]]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ExtractError::MetavarPartialSpan { .. }));
    }

    #[test]
    fn unfound_metavariable_is_reported() {
        let unit = unit(TEMPLATE);
        // A range over whitespace that matches no subtree start.
        let err = resolve_and_extract(
            &unit,
            [[3, 3], [3, 24]],
            r#"{"identifier": "ghost", "range": [[3, 14], [3, 14]]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ExtractError::MissingMetavariable { .. }));
    }
}
