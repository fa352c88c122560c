//! Structural template matching and rewriting for remold.
//!
//! The engine takes an LHS template — a real source fragment with
//! metavariable ranges — and finds every structural occurrence of it in
//! parsed input units, binding each metavariable to the subtrees it
//! covers. Each match site is then rewritten by instantiating a textual
//! RHS template with the captured source ranges.
//!
//! Pipeline: [`lhs::LhsConfig`] + template AST → [`lhs::extract`] →
//! [`lhs::LhsTemplate`]; template × candidate units →
//! [`matcher::Matcher`] → [`matcher::MatchResult`]s; results ×
//! [`rhs::RhsTemplate`] → replacement text, applied by
//! [`transform::transform`].
//!
//! The engine is single-threaded and deterministic: candidate discovery
//! visits nodes in document order, the lockstep walk is deterministic,
//! and results are delivered in source-ascending order after overlap
//! resolution. Hosts running units in parallel must give each its own
//! [`matcher::Matcher`].

pub mod compare;
pub mod cursor;
pub mod lhs;
pub mod matcher;
pub mod rhs;
pub mod transform;
pub mod view;

pub use lhs::{ConfigError, ExtractError, LhsConfig, LhsTemplate, Metavariable};
pub use matcher::{MatchResult, Matcher};
pub use rhs::RhsTemplate;
pub use transform::{transform, EngineError, TransformSummary};
pub use view::NodeView;
