//! Text fixture notation for boards.
//!
//! Rows are written top to bottom, one line per row, tokens separated by
//! whitespace. The last line is row 0.
//!
//! ```text
//! x x x 0
//! 0 4 0 0
//! 1 1 0 1
//! ```
//!
//! `0` is empty, `1`..`98` a color id, `x` garbage and `-` an irrelevant cell.
//! Consecutive `x` tokens on one row describe a single linked garbage group.

use std::str::FromStr;

use thiserror::Error;

use crate::{EMPTY_CODE, GARBAGE_CODE, IRRELEVANT_CODE};

/// One parsed fixture token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellToken {
    Empty,
    Color(u8),
    Garbage,
    Irrelevant,
}

impl CellToken {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "0" => Some(CellToken::Empty),
            "x" | "X" => Some(CellToken::Garbage),
            "-" => Some(CellToken::Irrelevant),
            _ => match token.parse::<u8>() {
                Ok(id) if id > 0 && (id as i32) < GARBAGE_CODE => Some(CellToken::Color(id)),
                _ => None,
            },
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            CellToken::Empty => EMPTY_CODE,
            CellToken::Color(id) => *id as i32,
            CellToken::Garbage => GARBAGE_CODE,
            CellToken::Irrelevant => IRRELEVANT_CODE,
        }
    }

    /// Inverse of [`CellToken::code`]; out-of-range codes read as irrelevant.
    pub fn from_code(code: i32) -> Self {
        match code {
            EMPTY_CODE => CellToken::Empty,
            GARBAGE_CODE => CellToken::Garbage,
            c if c > 0 && c < GARBAGE_CODE => CellToken::Color(c as u8),
            _ => CellToken::Irrelevant,
        }
    }

    fn write_to(&self, out: &mut String) {
        match self {
            CellToken::Empty => out.push('0'),
            CellToken::Color(id) => out.push_str(&id.to_string()),
            CellToken::Garbage => out.push('x'),
            CellToken::Irrelevant => out.push('-'),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseBoardError {
    #[error("board text contains no rows")]
    Empty,
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("invalid token {token:?} at row {row}, column {col}")]
    InvalidToken {
        row: usize,
        col: usize,
        token: String,
    },
    #[error("token {token:?} at row {row}, column {col} is not allowed here")]
    Unsupported {
        row: usize,
        col: usize,
        token: String,
    },
}

/// A parsed board, rows stored top to bottom as written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardText {
    width: usize,
    rows: Vec<Vec<CellToken>>,
}

impl BoardText {
    pub fn parse(text: &str) -> Result<Self, ParseBoardError> {
        let mut rows: Vec<Vec<CellToken>> = Vec::new();
        let mut width = 0usize;

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let row_index = rows.len();
            let mut row = Vec::new();
            for (col, token) in line.split_whitespace().enumerate() {
                let cell = CellToken::parse(token).ok_or_else(|| ParseBoardError::InvalidToken {
                    row: row_index,
                    col,
                    token: token.to_string(),
                })?;
                row.push(cell);
            }
            if rows.is_empty() {
                width = row.len();
            } else if row.len() != width {
                return Err(ParseBoardError::RaggedRow {
                    row: row_index,
                    expected: width,
                    found: row.len(),
                });
            }
            rows.push(row);
        }

        if rows.is_empty() {
            return Err(ParseBoardError::Empty);
        }
        Ok(Self { width, rows })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Cell at column `x`, row `y` counted from the bottom line.
    pub fn cell(&self, x: usize, y: usize) -> Option<CellToken> {
        let h = self.rows.len();
        if y >= h {
            return None;
        }
        self.rows[h - 1 - y].get(x).copied()
    }

    /// Row index as written (top line is 0) for a bottom-based `y`.
    pub fn written_row(&self, y: usize) -> usize {
        self.rows.len() - 1 - y
    }
}

impl FromStr for BoardText {
    type Err = ParseBoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Render a board in fixture notation; `cell(x, y)` is queried with `y` from the bottom.
pub fn format_board(width: usize, height: usize, cell: impl Fn(usize, usize) -> CellToken) -> String {
    let mut out = String::with_capacity(width * height * 2);
    for y in (0..height).rev() {
        for x in 0..width {
            if x > 0 {
                out.push(' ');
            }
            cell(x, y).write_to(&mut out);
        }
        if y > 0 {
            out.push('\n');
        }
    }
    out
}
