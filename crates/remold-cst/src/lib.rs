//! A C-family parser and typed AST for remold.
//!
//! This crate is the host front-end of the transformer: it turns source
//! text into a [`Unit`] — a flat, id-addressed AST with byte spans and
//! per-file attribution — and resolves declaration references lexically.
//! The matching engine consumes units exclusively through the [`Unit`]
//! API; it never re-tokenizes input files.
//!
//! # Quick start
//!
//! ```
//! use remold_cst::{NodeKind, Unit};
//!
//! let unit = Unit::parse_str("int answer = 42;", "demo.cc").expect("parse error");
//! let decl = unit.children(unit.root())[0];
//! assert_eq!(unit.kind(decl), NodeKind::Var);
//! assert_eq!(unit.name_of(decl), Some("answer"));
//! ```

mod bind;
pub mod nodes;
mod parser;
pub mod tokenizer;
pub mod types;
pub mod unit;

pub use nodes::{Access, BinaryOp, FunctionKind, Node, NodeData, NodeId, NodeKind, UnaryOp};
pub use parser::ParseError;
pub use tokenizer::{tokenize, FileId, Punct, TokKind, Token, TokenError};
pub use types::{Builtin, QualType, Qualifiers, TagKind, Type};
pub use unit::{SourceFile, SourceMap, Unit, UnitError};
