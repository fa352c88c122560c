//! The transform coordinator.
//!
//! Sequences the components for one run: parse the template source,
//! resolve and extract the LHS template, load the RHS template, then
//! match and rewrite every input unit. Per-file parse failures skip the
//! unit; everything else aborts the run.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use remold_core::error::RemoldError;
use remold_core::patch::{Edit, EditError, EditSet};
use remold_cst::{Unit, UnitError};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::lhs::{extract, ConfigError, ExtractError, LhsConfig};
use crate::matcher::Matcher;
use crate::rhs::{RhsError, RhsTemplate};

/// Fatal failures of a transform run.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error("cannot parse template source {}: {source}", path.display())]
    TemplateParse {
        path: PathBuf,
        source: UnitError,
    },
    #[error(transparent)]
    Rhs(#[from] RhsError),
    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("inconsistent edits: {0}")]
    Edits(#[from] EditError),
}

impl From<EngineError> for RemoldError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Config(ConfigError::Io { path, source }) => RemoldError::file_not_found(
                format!("{} ({source})", path.display()),
            ),
            EngineError::Config(inner) => RemoldError::config(inner.to_string()),
            EngineError::Extract(inner) => RemoldError::config(inner.to_string()),
            EngineError::TemplateParse { path, source } => {
                RemoldError::config(format!("{}: {source}", path.display()))
            }
            EngineError::Rhs(RhsError::Io { path, source }) => {
                RemoldError::file_not_found(format!("{} ({source})", path.display()))
            }
            EngineError::Write { path, source } => {
                RemoldError::write_failed(path.display().to_string(), source.to_string())
            }
            EngineError::Edits(inner) => RemoldError::internal(inner.to_string()),
        }
    }
}

/// Counters reported after a run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TransformSummary {
    pub files_processed: usize,
    pub files_skipped: usize,
    pub matches_applied: usize,
    pub outputs: Vec<PathBuf>,
}

/// Run one configured transformation over the given input files.
///
/// `overwrite` overrides the configuration's `overwrite_source_files`
/// when set (the CLI flag). The template's own source file joins the
/// input set unless the configuration opts out.
pub fn transform(
    config: &LhsConfig,
    inputs: &[PathBuf],
    overwrite: Option<bool>,
) -> Result<TransformSummary, EngineError> {
    debug!(?config, "starting transformation");

    let template_unit =
        Unit::parse_file(&config.template_source).map_err(|source| EngineError::TemplateParse {
            path: config.template_source.clone(),
            source,
        })?;
    let spans = config.resolve(template_unit.sources(), template_unit.main_file())?;
    let template = extract(&template_unit, &spans)?;
    debug!(
        subtrees = template.subtrees().len(),
        metavariables = template.declared().len(),
        "extracted template"
    );
    let rhs = RhsTemplate::load(&config.rhs_template)?;

    let mut paths: Vec<PathBuf> = inputs.to_vec();
    if config.transform_template_source {
        paths.push(config.template_source.clone());
    }
    let paths: Vec<PathBuf> = paths
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let overwrite = overwrite.unwrap_or(config.overwrite_source_files);
    let matcher = Matcher::new(&template_unit, &template);

    let mut summary = TransformSummary::default();
    for path in &paths {
        let unit = match Unit::parse_file(path) {
            Ok(unit) => unit,
            Err(err) => {
                warn!(file = %path.display(), error = %err, "skipping unparseable input");
                summary.files_skipped += 1;
                continue;
            }
        };

        let results = matcher.match_unit(&unit);
        summary.files_processed += 1;
        if results.is_empty() {
            info!(file = %path.display(), "no matches");
            continue;
        }

        let mut edits = EditSet::new();
        for result in &results {
            edits.push(Edit::new(result.span, rhs.instantiate(result, &unit)));
        }
        summary.matches_applied += results.len();

        let source = &unit.sources().file(unit.main_file()).text;
        let transformed = edits.apply(source)?;
        let output = if overwrite {
            path.clone()
        } else {
            transformed_path(path)
        };
        fs::write(&output, transformed).map_err(|source| EngineError::Write {
            path: output.clone(),
            source,
        })?;
        info!(
            file = %path.display(),
            output = %output.display(),
            matches = results.len(),
            "rewrote file"
        );
        summary.outputs.push(output);
    }
    Ok(summary)
}

/// `demo/input.cc` becomes `demo/input.transformed.cc`.
fn transformed_path(path: &Path) -> PathBuf {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => path.with_extension(format!("transformed.{ext}")),
        None => path.with_extension("transformed"),
    }
}
