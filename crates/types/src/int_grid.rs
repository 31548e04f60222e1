//! Simplified integer grid used by the AI solver.
//!
//! Row-major, `y` from the bottom, one `i32` code per cell (see the crate
//! docs for the code table). Cloning is cheap enough to snapshot one grid per
//! search node.

use serde::{Deserialize, Serialize};

use crate::board_text::{format_board, BoardText, CellToken, ParseBoardError};
use crate::{EMPTY_CODE, GARBAGE_CODE};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntGrid {
    width: usize,
    height: usize,
    cells: Vec<i32>,
}

impl IntGrid {
    /// Create an empty grid
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![EMPTY_CODE; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline(always)]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(y as usize * self.width + x as usize)
    }

    /// Get cell code at (x, y); None if out of bounds
    pub fn get(&self, x: i32, y: i32) -> Option<i32> {
        self.index(x, y).map(|idx| self.cells[idx])
    }

    /// Set cell code at (x, y); returns false if out of bounds
    pub fn set(&mut self, x: i32, y: i32, code: i32) -> bool {
        match self.index(x, y) {
            Some(idx) => {
                self.cells[idx] = code;
                true
            }
            None => false,
        }
    }

    pub fn is_empty_at(&self, x: i32, y: i32) -> bool {
        self.get(x, y) == Some(EMPTY_CODE)
    }

    /// A colored (comboable) code: neither empty, garbage nor irrelevant
    pub fn is_color(code: i32) -> bool {
        code > EMPTY_CODE && code != GARBAGE_CODE
    }

    pub fn cells(&self) -> &[i32] {
        &self.cells
    }

    /// Highest row holding anything other than an empty cell
    pub fn highest_occupied_row(&self) -> Option<usize> {
        (0..self.height)
            .rev()
            .find(|&y| (0..self.width).any(|x| self.cells[y * self.width + x] != EMPTY_CODE))
    }

    /// Count of non-empty cells
    pub fn occupied(&self) -> usize {
        self.cells.iter().filter(|&&c| c != EMPTY_CODE).count()
    }

    pub fn from_text(text: &str) -> Result<Self, ParseBoardError> {
        let board = BoardText::parse(text)?;
        let mut grid = Self::new(board.width(), board.height());
        for y in 0..board.height() {
            for x in 0..board.width() {
                let code = board.cell(x, y).map(|c| c.code()).unwrap_or(EMPTY_CODE);
                grid.set(x as i32, y as i32, code);
            }
        }
        Ok(grid)
    }

    pub fn to_text(&self) -> String {
        format_board(self.width, self.height, |x, y| {
            CellToken::from_code(self.cells[y * self.width + x])
        })
    }
}
