//! The left-hand side of a transformation: configuration, the extracted
//! template, and the extractor that maps configured source ranges onto
//! AST subtrees.

mod config;
mod extract;
mod template;

pub use config::{
    ConfigError, LhsConfig, MetavarLocation, MetavarSpec, Metavariable, TemplateSpans,
};
pub use extract::{extract, ExtractError};
pub use template::{LhsTemplate, IMPLICIT_METAVARIABLE};
