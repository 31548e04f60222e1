//! Core simulation module - pure, deterministic, and testable
//!
//! This crate holds the playfield simulation: blocks, the grid that moves
//! them, and the seeded randomness behind every procedural choice. It has
//! **zero dependencies** on rendering, input or I/O, making it:
//!
//! - **Deterministic**: the same seed and the same inputs replay the same game
//! - **Testable**: boards are scripted from a compact text notation
//! - **Portable**: runs headless, in tests, or under any presentation layer
//!
//! # Module Structure
//!
//! - [`block`]: per-cell state machine and cached capability flags
//! - [`grid`]: the scrolling playfield, physics, combos, chains and garbage
//! - [`rng`]: seeded random source shared by every gameplay draw
//! - [`animation`]: optional presentation hooks that stagger clears and conversions
//!
//! # Game Rules
//!
//! - **Swaps**: any two horizontally adjacent cells can swap unless garbage is involved
//! - **Gravity**: unsupported blocks fall, accelerating the longer they drop
//! - **Combos**: three or more resting blocks of one color in a row or column clear;
//!   crossing runs clear together as one combo
//! - **Chains**: a combo that includes a block which fell because of an earlier
//!   clear extends the running chain
//! - **Garbage**: obstruction groups break into colors when a combo touches them
//! - **Scroll**: the stack rises steadily; combos freeze it for a while
//!
//! # Example
//!
//! ```
//! use panel_clash_core::{Grid, GridConfig};
//! use panel_clash_types::Direction;
//!
//! let mut grid = Grid::from_text("0 0 0 0\n1 0 0 0\n2 0 1 1", GridConfig::default(), 1).unwrap();
//! assert!(grid.move_block(0, 1, Direction::Right).success);
//! for _ in 0..60 {
//!     grid.update(0.0, 1.0 / 60.0, true, true);
//! }
//! assert_eq!(grid.to_text(), "0 0 0 0\n0 0 0 0\n2 0 0 0");
//! ```
//!
//! # Timing
//!
//! Call [`Grid::update`](grid::Grid::update) once per frame with the elapsed
//! time in seconds and the scroll distance (in rows) for that frame. Speeds
//! are in cells per second; freezes are in seconds.

pub mod animation;
pub mod block;
pub mod grid;
pub mod rng;

pub use panel_clash_types as types;

// Re-export commonly used types for convenience
pub use animation::{BlockAnimator, NoAnimation, StaggeredAnimation};
pub use block::{Block, BlockId, PendingChange};
pub use grid::{Grid, GridClearState, GridConfig, MoveResult, Preload};
pub use rng::GameRandom;
