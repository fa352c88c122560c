//! The right-hand side template.
//!
//! An RHS template is plain text interleaved with metaparameter
//! references. A reference is a `?` immediately followed by an
//! identifier — no whitespace in between; a `?` anywhere else (or
//! inside a string, character literal, or comment) is literal text.
//! Instantiation splices the source text captured for each referenced
//! metavariable into the literal parts.

use std::fs;
use std::path::{Path, PathBuf};

use remold_cst::Unit;
use thiserror::Error;
use tracing::warn;

use crate::matcher::MatchResult;

/// One part of a parsed RHS template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplatePart {
    Literal(String),
    Metaparam(String),
}

#[derive(Debug, Error)]
pub enum RhsError {
    #[error("cannot read RHS template {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A parsed RHS template.
#[derive(Debug, Clone)]
pub struct RhsTemplate {
    parts: Vec<TemplatePart>,
}

impl RhsTemplate {
    pub fn load(path: &Path) -> Result<RhsTemplate, RhsError> {
        let text = fs::read_to_string(path).map_err(|source| RhsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(RhsTemplate::parse(&text))
    }

    /// Split template text into literal and metaparameter parts. A
    /// template ending in a metaparameter produces no trailing empty
    /// literal.
    pub fn parse(text: &str) -> RhsTemplate {
        let bytes = text.as_bytes();
        let mut parts = Vec::new();
        let mut literal_start = 0;
        let mut pos = 0;
        let mut state = ScanState::Code;

        while pos < bytes.len() {
            let byte = bytes[pos];
            match state {
                ScanState::Code => match byte {
                    b'"' => {
                        state = ScanState::Str;
                        pos += 1;
                    }
                    b'\'' => {
                        state = ScanState::Char;
                        pos += 1;
                    }
                    b'/' if bytes.get(pos + 1) == Some(&b'/') => {
                        state = ScanState::LineComment;
                        pos += 2;
                    }
                    b'/' if bytes.get(pos + 1) == Some(&b'*') => {
                        state = ScanState::BlockComment;
                        pos += 2;
                    }
                    b'?' if is_ident_start(bytes.get(pos + 1).copied()) => {
                        let name_start = pos + 1;
                        let mut name_end = name_start;
                        while name_end < bytes.len() && is_ident_byte(bytes[name_end]) {
                            name_end += 1;
                        }
                        if pos > literal_start {
                            parts.push(TemplatePart::Literal(
                                text[literal_start..pos].to_string(),
                            ));
                        }
                        parts.push(TemplatePart::Metaparam(
                            text[name_start..name_end].to_string(),
                        ));
                        pos = name_end;
                        literal_start = name_end;
                    }
                    _ => pos += 1,
                },
                ScanState::Str => match byte {
                    b'\\' => pos += 2,
                    b'"' => {
                        state = ScanState::Code;
                        pos += 1;
                    }
                    _ => pos += 1,
                },
                ScanState::Char => match byte {
                    b'\\' => pos += 2,
                    b'\'' => {
                        state = ScanState::Code;
                        pos += 1;
                    }
                    _ => pos += 1,
                },
                ScanState::LineComment => {
                    if byte == b'\n' {
                        state = ScanState::Code;
                    }
                    pos += 1;
                }
                ScanState::BlockComment => {
                    if byte == b'*' && bytes.get(pos + 1) == Some(&b'/') {
                        state = ScanState::Code;
                        pos += 2;
                    } else {
                        pos += 1;
                    }
                }
            }
        }
        if literal_start < text.len() {
            parts.push(TemplatePart::Literal(text[literal_start..].to_string()));
        }
        RhsTemplate { parts }
    }

    pub fn parts(&self) -> &[TemplatePart] {
        &self.parts
    }

    /// Instantiate the template for one match.
    ///
    /// A name-only binding contributes the bound declaration's name. A
    /// variadic binding contributes the contiguous source text from its
    /// first to its last captured subtree, extended through one trailing
    /// statement terminator; an empty binding contributes nothing.
    /// Missing bindings are diagnosed and contribute nothing.
    pub fn instantiate(&self, result: &MatchResult, unit: &Unit) -> String {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                TemplatePart::Literal(text) => out.push_str(text),
                TemplatePart::Metaparam(name) => {
                    let Some((metavariable, captured)) = result
                        .bindings
                        .iter()
                        .find(|(metavariable, _)| metavariable.identifier == *name)
                    else {
                        warn!(metaparameter = %name, "no binding for metaparameter");
                        continue;
                    };
                    if metavariable.name_only {
                        if let Some(name) =
                            captured.first().and_then(|view| view.node()).and_then(|node| {
                                unit.name_of(node)
                            })
                        {
                            out.push_str(name);
                        }
                        continue;
                    }
                    let (Some(first), Some(last)) = (captured.first(), captured.last()) else {
                        continue;
                    };
                    let (Some((file, first_span)), Some((_, last_span))) =
                        (first.span(unit), last.span(unit))
                    else {
                        continue;
                    };
                    let extended = unit.extend_through_terminator(file, last_span);
                    let span = remold_core::patch::Span::new(
                        first_span.start,
                        extended.end.max(first_span.end),
                    );
                    out.push_str(unit.sources().text(file, span));
                }
            }
        }
        out
    }
}

enum ScanState {
    Code,
    Str,
    Char,
    LineComment,
    BlockComment,
}

fn is_ident_start(byte: Option<u8>) -> bool {
    matches!(byte, Some(b) if b.is_ascii_alphabetic() || b == b'_')
}

fn is_ident_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}
