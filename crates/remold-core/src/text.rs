//! Text position utilities for byte offset and line:column conversions.
//!
//! Template ranges in configuration files are written as `[line, column]`
//! pairs, while the matcher and the edit engine work in byte offsets.
//! This module converts between the two against a concrete source text.
//!
//! ## Coordinate Conventions
//!
//! - Lines and columns are **1-indexed** (matching editor conventions)
//! - Byte offsets are **0-indexed**
//! - Columns count bytes; the parsed subset restricts source files to
//!   UTF-8 where multi-byte characters only occur inside literals and
//!   comments, so byte columns match what editors display for code

use std::fmt;

use crate::patch::Span;

/// A position in source code specified as line and column, both 1-indexed.
///
/// `LineCol` is totally ordered: first by line, then by column. A
/// distinguished invalid value is available as [`LineCol::INVALID`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineCol {
    /// 1-indexed line number.
    pub line: u32,
    /// 1-indexed column number.
    pub col: u32,
}

impl LineCol {
    /// The invalid position. Orders before every valid position.
    pub const INVALID: LineCol = LineCol { line: 0, col: 0 };

    /// Create a new position.
    pub fn new(line: u32, col: u32) -> Self {
        LineCol { line, col }
    }

    /// A position is valid when both line and column are at least 1.
    pub fn is_valid(&self) -> bool {
        self.line >= 1 && self.col >= 1
    }
}

impl fmt::Display for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.line, self.col)
    }
}

/// Error when a position cannot be resolved against a source text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PositionError {
    #[error("line {line} out of range (file has {max_line} lines)")]
    LineOutOfRange { line: u32, max_line: u32 },
    #[error("column {col} out of range on line {line} (line is {line_len} bytes)")]
    ColumnOutOfRange { line: u32, col: u32, line_len: u32 },
    #[error("byte offset {offset} out of range (file is {file_len} bytes)")]
    OffsetOutOfRange { offset: usize, file_len: usize },
}

/// An index of line start offsets for one source text.
///
/// Built once per file and reused for every conversion; both directions
/// are a binary search or a single slice scan instead of a full pass
/// over the text.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset of the first character of each line.
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    /// Index the given text.
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        for (idx, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(idx + 1);
            }
        }
        LineIndex {
            line_starts,
            len: text.len(),
        }
    }

    /// Number of lines in the indexed text. An empty text has one line.
    pub fn line_count(&self) -> u32 {
        self.line_starts.len() as u32
    }

    /// Convert a 1-indexed line:column position to a byte offset.
    ///
    /// The position one past the last character of a line is accepted, so
    /// an inclusive column range can address its end by `last_col + 1`.
    pub fn offset(&self, pos: LineCol) -> Result<usize, PositionError> {
        if !pos.is_valid() || pos.line > self.line_count() {
            return Err(PositionError::LineOutOfRange {
                line: pos.line,
                max_line: self.line_count(),
            });
        }
        let line_start = self.line_starts[(pos.line - 1) as usize];
        let line_end = self
            .line_starts
            .get(pos.line as usize)
            .copied()
            .unwrap_or(self.len);
        let offset = line_start + (pos.col - 1) as usize;
        if offset > line_end {
            return Err(PositionError::ColumnOutOfRange {
                line: pos.line,
                col: pos.col,
                line_len: (line_end - line_start) as u32,
            });
        }
        Ok(offset)
    }

    /// Convert a byte offset back to a 1-indexed line:column position.
    ///
    /// Offsets equal to the text length resolve to one past the final
    /// character.
    pub fn line_col(&self, offset: usize) -> Result<LineCol, PositionError> {
        if offset > self.len {
            return Err(PositionError::OffsetOutOfRange {
                offset,
                file_len: self.len,
            });
        }
        let line = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        let col = offset - self.line_starts[line] + 1;
        Ok(LineCol::new(line as u32 + 1, col as u32))
    }

    /// Render a byte span as `[line, col] -> [line, col]` for diagnostics.
    ///
    /// The right-hand position addresses the last byte of the span, so the
    /// rendering matches the inclusive ranges users write in configuration.
    pub fn describe_span(&self, span: Span) -> String {
        let begin = self.line_col(span.start).unwrap_or(LineCol::INVALID);
        let end = self
            .line_col(span.end.saturating_sub(1).max(span.start))
            .unwrap_or(LineCol::INVALID);
        format!("{} -> {}", begin, end)
    }
}
