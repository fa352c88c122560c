//! Parsed translation units and their source files.
//!
//! A [`Unit`] owns the node arena for one translation unit together with
//! a [`SourceMap`] of every file that contributed tokens: the main file
//! plus any quoted includes spliced in by the driver. This is the
//! surface the engine consumes — spans, kinds, parents, main-file
//! membership, and raw source text for arbitrary ranges.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use remold_core::patch::Span;
use remold_core::text::{LineCol, LineIndex, PositionError};
use thiserror::Error;
use tracing::debug;

use crate::bind::resolve_references;
use crate::nodes::{Node, NodeId, NodeKind};
use crate::parser::{parse_tokens, ParseError};
use crate::tokenizer::{tokenize, FileId, TokKind, Token};

/// Nested quoted includes deeper than this abort the lex.
const MAX_INCLUDE_DEPTH: usize = 16;

/// Failure loading or parsing a unit.
#[derive(Debug, Error)]
pub enum UnitError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("includes nested deeper than {} levels at {}", MAX_INCLUDE_DEPTH, path.display())]
    IncludeDepth { path: PathBuf },
}

/// One lexed file.
#[derive(Debug)]
pub struct SourceFile {
    pub path: PathBuf,
    pub text: String,
    index: LineIndex,
}

/// All files contributing to one unit, indexed by [`FileId`].
#[derive(Debug, Default)]
pub struct SourceMap {
    files: Vec<SourceFile>,
}

impl SourceMap {
    fn add(&mut self, path: PathBuf, text: String) -> FileId {
        let id = FileId(self.files.len() as u32);
        let index = LineIndex::new(&text);
        self.files.push(SourceFile { path, text, index });
        id
    }

    pub fn file(&self, id: FileId) -> &SourceFile {
        &self.files[id.0 as usize]
    }

    pub fn path(&self, id: FileId) -> &Path {
        &self.file(id).path
    }

    /// The raw source text at `span` in the given file.
    pub fn text(&self, id: FileId, span: Span) -> &str {
        &self.file(id).text[span.start..span.end]
    }

    /// Convert a 1-indexed position to a byte offset in the given file.
    pub fn offset(&self, id: FileId, pos: LineCol) -> Result<usize, PositionError> {
        self.file(id).index.offset(pos)
    }

    /// Convert a byte offset back to a position in the given file.
    pub fn line_col(&self, id: FileId, offset: usize) -> Result<LineCol, PositionError> {
        self.file(id).index.line_col(offset)
    }

    /// Render a span as `[line, col] -> [line, col]` for diagnostics.
    pub fn describe_span(&self, id: FileId, span: Span) -> String {
        self.file(id).index.describe_span(span)
    }
}

/// A parsed translation unit: node arena plus sources.
#[derive(Debug)]
pub struct Unit {
    nodes: Vec<Node>,
    root: NodeId,
    map: SourceMap,
    main_file: FileId,
}

impl Unit {
    /// Parse a file from disk, following quoted includes relative to the
    /// including file's directory.
    pub fn parse_file(path: &Path) -> Result<Unit, UnitError> {
        let mut map = SourceMap::default();
        let mut loaded = HashSet::new();
        let tokens = lex_into(&mut map, path.to_path_buf(), &mut loaded, 0)?;
        Self::from_tokens(map, tokens)
    }

    /// Parse from an in-memory string. Quoted includes are resolved
    /// relative to the given path's directory when it exists on disk.
    pub fn parse_str(text: &str, path: impl Into<PathBuf>) -> Result<Unit, UnitError> {
        let path = path.into();
        let mut map = SourceMap::default();
        let mut loaded = HashSet::new();
        loaded.insert(path.clone());
        let main = map.add(path, text.to_string());
        let tokens = splice_includes(&mut map, main, &mut loaded, 0)?;
        Self::from_tokens(map, tokens)
    }

    fn from_tokens(map: SourceMap, tokens: Vec<Token>) -> Result<Unit, UnitError> {
        let main_file = FileId(0);
        let mut nodes = parse_tokens(&tokens, main_file)?;
        resolve_references(&mut nodes);
        Ok(Unit {
            root: nodes[0].id,
            nodes,
            map,
            main_file,
        })
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.node(id).data.kind()
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.node(id).span
    }

    pub fn file_of(&self, id: NodeId) -> FileId {
        self.node(id).file
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.node(id).data.children()
    }

    /// Whether the node's first token was written in the unit's own file
    /// rather than an included one.
    pub fn is_in_main_file(&self, id: NodeId) -> bool {
        self.node(id).file == self.main_file
    }

    pub fn main_file(&self) -> FileId {
        self.main_file
    }

    pub fn sources(&self) -> &SourceMap {
        &self.map
    }

    /// The declared name of a declaration node.
    pub fn name_of(&self, id: NodeId) -> Option<&str> {
        self.node(id).data.name()
    }

    /// The source text of the node itself.
    pub fn text_of(&self, id: NodeId) -> &str {
        let node = self.node(id);
        self.map.text(node.file, node.span)
    }

    /// Extend a span rightwards over whitespace to swallow one trailing
    /// statement terminator, when present. Node spans already cover
    /// whole tokens, so no further tail extension is needed.
    pub fn extend_through_terminator(&self, file: FileId, span: Span) -> Span {
        let text = self.map.file(file).text.as_bytes();
        let mut pos = span.end;
        while pos < text.len() && (text[pos] as char).is_ascii_whitespace() {
            pos += 1;
        }
        if pos < text.len() && text[pos] == b';' {
            Span::new(span.start, pos + 1)
        } else {
            span
        }
    }

    /// All node ids in pre-order (document order).
    pub fn preorder(&self) -> impl Iterator<Item = NodeId> + '_ {
        // Ids are assigned in pre-order during parsing.
        (0..self.nodes.len() as u32).map(NodeId)
    }
}

/// Read and lex one file, splicing quoted includes.
fn lex_into(
    map: &mut SourceMap,
    path: PathBuf,
    loaded: &mut HashSet<PathBuf>,
    depth: usize,
) -> Result<Vec<Token>, UnitError> {
    if depth > MAX_INCLUDE_DEPTH {
        return Err(UnitError::IncludeDepth { path });
    }
    let text = fs::read_to_string(&path).map_err(|source| UnitError::Io {
        path: path.clone(),
        source,
    })?;
    loaded.insert(path.clone());
    let id = map.add(path, text);
    splice_includes(map, id, loaded, depth)
}

/// Tokenize an already-registered file and interleave the token streams
/// of its quoted includes at their directive positions.
fn splice_includes(
    map: &mut SourceMap,
    file: FileId,
    loaded: &mut HashSet<PathBuf>,
    depth: usize,
) -> Result<Vec<Token>, UnitError> {
    let text = map.file(file).text.clone();
    let raw = tokenize(&text, file).map_err(ParseError::from)?;

    let mut out = Vec::with_capacity(raw.len());
    for token in raw {
        let TokKind::Directive(line) = &token.kind else {
            out.push(token);
            continue;
        };
        let Some(rest) = line.strip_prefix("include") else {
            debug!(directive = %line, "skipping preprocessor directive");
            continue;
        };
        let rest = rest.trim();
        let Some(name) = rest.strip_prefix('"').and_then(|r| r.strip_suffix('"')) else {
            debug!(directive = %line, "skipping non-quoted include");
            continue;
        };
        let base = map
            .path(file)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let target = base.join(name);
        if loaded.contains(&target) {
            debug!(path = %target.display(), "skipping already-included file");
            continue;
        }
        out.extend(lex_into(map, target, loaded, depth + 1)?);
    }
    Ok(out)
}
