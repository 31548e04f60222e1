//! AI engine - move search over simplified grids
//!
//! The engine plays the grid's rules on [`IntGrid`](panel_clash_types::IntGrid)
//! copies: one `i32` per cell, gravity applied a column at a time and combos
//! cleared in whole steps. It never holds a reference into a live grid.
//!
//! # Module Structure
//!
//! - [`sim`]: settle, run detection, swaps and move enumeration on int grids
//! - [`heuristic`]: table-driven move weights
//! - [`ai_move`]: search-tree nodes and the swaps they plan
//! - [`beam`]: ranking and per-depth pruning
//! - [`solver`]: the bounded search and its Idle / Playing / SpeedUp state machine
//!
//! # Example
//!
//! ```
//! use panel_clash_engine::{AiSolver, SolverConfig, SolverDecision};
//! use panel_clash_types::IntGrid;
//!
//! let board = IntGrid::from_text("0 0 0 0\n1 0 0 0\n2 0 1 1").unwrap();
//! let config = SolverConfig { min_rows_to_plan: 1, ..SolverConfig::default() };
//! let mut solver = AiSolver::new(config, 7).unwrap();
//! assert!(matches!(solver.work_on(&board), SolverDecision::Play(_)));
//! ```

pub mod ai_move;
pub mod beam;
pub mod heuristic;
pub mod sim;
pub mod solver;

pub use ai_move::{AiMove, PlannedMove};
pub use heuristic::{weight_move, MoveWeight, WeightValues};
pub use solver::{AiSolver, ConfigError, SolverConfig, SolverDecision, SolverState};
