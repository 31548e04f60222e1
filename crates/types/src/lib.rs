//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the workspace.
//! Everything here is plain data: the simulation (`panel-clash-core`), the AI
//! solver (`panel-clash-engine`) and the autoplay driver all speak these types.
//!
//! # Coordinates
//!
//! - `x` grows to the right, starting at column 0
//! - `y` grows upward: row 0 is the bottom visible row, `height - 1` the top
//! - Negative rows are preview rows staged below the board; the scroll pushes
//!   them into play one row at a time
//!
//! # Cell codes
//!
//! Simplified grids and the text fixture notation use small integers:
//!
//! | Code | Token | Meaning |
//! |------|-------|---------|
//! | `0` | `0` | Empty cell |
//! | `1..=98` | `1`.. | Block color id |
//! | `99` | `x` | Garbage |
//! | `-1` | `-` | Irrelevant (busy cell the solver must not touch) |
//!
//! # Timing Constants
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `MIN_COMBO_AGE_FRAMES` | 2 | Ticks a block must rest before it can combo |
//! | `FALL_ACCELERATION` | 0.09 | Fall speed gain per tick of falling |
//! | `COMBO_FREEZE_SECONDS` | 1.0 | Base scroll freeze after a combo |
//!
//! # Examples
//!
//! ```
//! use panel_clash_types::{BlockDefinition, Direction, GARBAGE_CODE};
//!
//! let red = BlockDefinition::color(1);
//! assert_eq!(red.code(), 1);
//! assert_eq!(BlockDefinition::garbage().code(), GARBAGE_CODE);
//! assert_eq!(Direction::Left.dx(), -1);
//! assert_eq!(Direction::from_str("right"), Some(Direction::Right));
//! ```

use serde::{Deserialize, Serialize};

pub mod board_text;
pub mod events;
pub mod int_grid;

pub use board_text::{format_board, BoardText, CellToken, ParseBoardError};
pub use events::{ComboEvent, GridAnomaly, GridEvent};
pub use int_grid::IntGrid;

/// Default board width in cells
pub const DEFAULT_WIDTH: usize = 6;

/// Default board height in cells
pub const DEFAULT_HEIGHT: usize = 12;

/// Default number of preview rows below the visible board
pub const DEFAULT_PREVIEW_LINES: usize = 1;

/// Minimum run length that clears
pub const MIN_COMBO_LEN: usize = 3;

/// A block must have rested this many ticks before it can take part in a combo.
pub const MIN_COMBO_AGE_FRAMES: u32 = 2;

/// Simplified-grid code of an empty cell
pub const EMPTY_CODE: i32 = 0;

/// Simplified-grid code of a garbage cell
pub const GARBAGE_CODE: i32 = 99;

/// Simplified-grid code of a cell the solver must treat as a fixed obstacle
pub const IRRELEVANT_CODE: i32 = -1;

/// Fraction of the base fall speed gained per tick spent falling
pub const FALL_ACCELERATION: f32 = 0.09;

/// Snap tolerance used when checking for cell boundary crossings
pub const ALIGN_EPSILON: f32 = 0.001;

/// Fall-speed bonus (cells per second) given to the last member of a converted garbage batch
pub const CONVERSION_MOMENTUM: f32 = 2.0;

/// Base freeze after a combo (seconds)
pub const COMBO_FREEZE_SECONDS: f32 = 1.0;

/// Extra freeze per cleared block (seconds)
pub const COMBO_FREEZE_PER_BLOCK_SECONDS: f32 = 0.1;

/// Cells above its row at which freshly added garbage starts falling
pub const GARBAGE_SPAWN_OFFSET: f32 = 1.0;

/// Fraction of the board height above which the solver considers the stack dangerous
pub const DANGER_HEIGHT_RATIO: f32 = 0.77;

/// Default horizontal (swap) and vertical (fall) speeds in cells per second
pub const DEFAULT_MOVING_SPEED: Vec2 = Vec2 { x: 12.0, y: 10.0 };

/// Continuous 2D position in cell units
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Horizontal swap direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    /// Column offset of the swap target
    pub fn dx(&self) -> i32 {
        match self {
            Direction::Left => -1,
            Direction::Right => 1,
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Parse direction from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "left" | "l" => Some(Direction::Left),
            "right" | "r" => Some(Direction::Right),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

/// Block movement state
///
/// - **None**: idle and aligned on its cell
/// - **Fall**: actively dropping
/// - **Horizontal**: mid-swap with a neighbor
/// - **Wait**: swap just completed; the next tick decides whether it falls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Movement {
    #[default]
    None,
    Fall,
    Horizontal,
    Wait,
}

impl Movement {
    pub fn is_moving(&self) -> bool {
        matches!(self, Movement::Fall | Movement::Horizontal)
    }
}

/// Identity of a block color or of garbage.
///
/// Definitions are small immutable values; every block carries a copy of the
/// definition it was drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockDefinition {
    pub id: u8,
    pub is_garbage: bool,
    /// Minimum level before this definition can be drawn from the random pool
    pub min_level: u32,
    /// Minimum board width before this definition can be drawn from the random pool
    pub min_width: usize,
}

impl BlockDefinition {
    /// An ungated color
    pub const fn color(id: u8) -> Self {
        Self {
            id,
            is_garbage: false,
            min_level: 0,
            min_width: 0,
        }
    }

    pub const fn garbage() -> Self {
        Self {
            id: GARBAGE_CODE as u8,
            is_garbage: true,
            min_level: 0,
            min_width: 0,
        }
    }

    pub const fn gated(id: u8, min_level: u32, min_width: usize) -> Self {
        Self {
            id,
            is_garbage: false,
            min_level,
            min_width,
        }
    }

    /// Simplified-grid code for this definition
    pub fn code(&self) -> i32 {
        if self.is_garbage {
            GARBAGE_CODE
        } else {
            self.id as i32
        }
    }

    /// Whether this definition may be drawn at the given level on a board of the given width
    pub fn is_available(&self, level: u32, width: usize) -> bool {
        !self.is_garbage && level >= self.min_level && width >= self.min_width
    }
}

/// The stock palette: four ungated colors plus two gated ones.
pub fn default_palette() -> Vec<BlockDefinition> {
    vec![
        BlockDefinition::color(1),
        BlockDefinition::color(2),
        BlockDefinition::color(3),
        BlockDefinition::color(4),
        BlockDefinition::gated(5, 0, 5),
        BlockDefinition::gated(6, 10, 6),
    ]
}
