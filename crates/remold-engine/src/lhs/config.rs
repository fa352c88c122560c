//! Transformation configuration.
//!
//! A configuration names the template source file, the template's
//! `[line, column]` range (inclusive of the last character), the
//! metavariable ranges inside it, and the RHS template path. Range
//! constraints are validated here, before extraction: every range must
//! be well-formed, metavariable ranges must fall inside the template
//! range, and metavariable ranges must not overlap — checked with one
//! linear sweep over the sorted list.

use std::cmp::Reverse;
use std::fs;
use std::path::{Path, PathBuf};

use remold_core::patch::Span;
use remold_core::text::{LineCol, PositionError};
use remold_cst::{FileId, SourceMap};
use serde::Deserialize;
use thiserror::Error;

/// A named placeholder in the LHS template.
///
/// Ordering is by identifier; for equal identifiers the name-only
/// variant sorts first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metavariable {
    pub identifier: String,
    pub name_only: bool,
}

impl Metavariable {
    pub fn new(identifier: impl Into<String>) -> Self {
        Metavariable {
            identifier: identifier.into(),
            name_only: false,
        }
    }

    pub fn name_only(identifier: impl Into<String>) -> Self {
        Metavariable {
            identifier: identifier.into(),
            name_only: true,
        }
    }
}

impl Ord for Metavariable {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (&self.identifier, Reverse(self.name_only))
            .cmp(&(&other.identifier, Reverse(other.name_only)))
    }
}

impl PartialOrd for Metavariable {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Raw configuration file contents.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LhsConfig {
    /// Source file the template is extracted from.
    pub template_source: PathBuf,
    /// Start and end positions, `[line, column]` each, end inclusive.
    pub template_range: [[u32; 2]; 2],
    /// Metavariables and their ranges inside the template.
    #[serde(default)]
    pub meta_variables: Vec<MetavarSpec>,
    /// Path to the RHS template text.
    pub rhs_template: PathBuf,
    /// Whether the template's own source file is rewritten too.
    #[serde(default = "default_true")]
    pub transform_template_source: bool,
    /// Overwrite inputs instead of writing `<stem>.transformed.<ext>`.
    #[serde(default)]
    pub overwrite_source_files: bool,
}

/// One metavariable entry in the configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetavarSpec {
    pub identifier: String,
    pub range: [[u32; 2]; 2],
    #[serde(default)]
    pub name_only: bool,
}

fn default_true() -> bool {
    true
}

/// Configuration loading and validation failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot parse {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid template range {begin} -> {end}")]
    InvalidTemplateRange { begin: LineCol, end: LineCol },
    #[error("invalid source range for metavariable {identifier}: {begin} -> {end}")]
    InvalidMetavarRange {
        identifier: String,
        begin: LineCol,
        end: LineCol,
    },
    #[error("source range for metavariable {identifier} falls outside the template range")]
    MetavarOutsideTemplate { identifier: String },
    #[error("source ranges for metavariables {first} and {second} overlap")]
    MetavarOverlap { first: String, second: String },
    #[error("range position {position} not in {}: {source}", path.display())]
    Position {
        position: LineCol,
        path: PathBuf,
        source: PositionError,
    },
}

impl LhsConfig {
    /// Load and parse a configuration file.
    pub fn load(path: &Path) -> Result<LhsConfig, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve the configured positions to byte spans in the template
    /// source and check every range constraint.
    pub fn resolve(&self, sources: &SourceMap, file: FileId) -> Result<TemplateSpans, ConfigError> {
        let (template_begin, template_end) = range_positions(&self.template_range);
        if !template_begin.is_valid() || !template_end.is_valid() || template_end < template_begin {
            return Err(ConfigError::InvalidTemplateRange {
                begin: template_begin,
                end: template_end,
            });
        }
        let template = resolve_span(sources, file, &self.template_source, self.template_range)?;

        let mut metavariables = Vec::with_capacity(self.meta_variables.len());
        for spec in &self.meta_variables {
            let (begin, end) = range_positions(&spec.range);
            if !begin.is_valid() || !end.is_valid() || end < begin {
                return Err(ConfigError::InvalidMetavarRange {
                    identifier: spec.identifier.clone(),
                    begin,
                    end,
                });
            }
            let span = resolve_span(sources, file, &self.template_source, spec.range)?;
            if !template.contains(&span) {
                return Err(ConfigError::MetavarOutsideTemplate {
                    identifier: spec.identifier.clone(),
                });
            }
            let metavariable = if spec.name_only {
                Metavariable::name_only(&spec.identifier)
            } else {
                Metavariable::new(&spec.identifier)
            };
            metavariables.push(MetavarLocation {
                metavariable,
                span,
            });
        }

        // Sorting by ascending start (wider first on ties) lets one
        // linear sweep detect every overlap.
        metavariables.sort_by(|a, b| {
            (a.span.start, Reverse(a.span.end), &a.metavariable)
                .cmp(&(b.span.start, Reverse(b.span.end), &b.metavariable))
        });
        for pair in metavariables.windows(2) {
            if pair[0].span.overlaps(&pair[1].span) {
                return Err(ConfigError::MetavarOverlap {
                    first: pair[0].metavariable.identifier.clone(),
                    second: pair[1].metavariable.identifier.clone(),
                });
            }
        }

        Ok(TemplateSpans {
            template,
            metavariables,
        })
    }
}

/// A metavariable with its resolved byte span.
#[derive(Debug, Clone)]
pub struct MetavarLocation {
    pub metavariable: Metavariable,
    pub span: Span,
}

/// Configuration resolved against the template source text.
#[derive(Debug, Clone)]
pub struct TemplateSpans {
    pub template: Span,
    /// Sorted by ascending start, wider ranges first on ties.
    pub metavariables: Vec<MetavarLocation>,
}

fn range_positions(range: &[[u32; 2]; 2]) -> (LineCol, LineCol) {
    (
        LineCol::new(range[0][0], range[0][1]),
        LineCol::new(range[1][0], range[1][1]),
    )
}

fn resolve_span(
    sources: &SourceMap,
    file: FileId,
    path: &Path,
    range: [[u32; 2]; 2],
) -> Result<Span, ConfigError> {
    let (begin, end) = range_positions(&range);
    let start = sources
        .offset(file, begin)
        .map_err(|source| ConfigError::Position {
            position: begin,
            path: path.to_path_buf(),
            source,
        })?;
    // The configured end addresses the last character; spans are
    // half-open, so the end offset is one past it.
    let end_inclusive = sources
        .offset(file, end)
        .map_err(|source| ConfigError::Position {
            position: end,
            path: path.to_path_buf(),
            source,
        })?;
    Ok(Span::new(start, end_inclusive + 1))
}
