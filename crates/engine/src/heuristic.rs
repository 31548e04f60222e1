//! Move weighting over a simplified grid.
//!
//! Every number lives in [`WeightValues`] so difficulty tuning is a data
//! change. The scan itself is [`sim::find_runs`]: columns first, then rows.

use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

use panel_clash_types::{IntGrid, DANGER_HEIGHT_RATIO, GARBAGE_CODE};

use crate::sim::{self, Run};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightValues {
    pub combo3: f32,
    pub combo4: f32,
    pub combo5: f32,
    pub combo6_plus: f32,
    /// Bonus per run touching a garbage cell
    pub garbage_adjacent: f32,
    /// Added once per ply of depth (negative)
    pub depth_penalty: f32,
    /// Applied when the stack is high and the move clears nothing (negative)
    pub danger: f32,
    /// Bonus per extra clear step resolved after the move's own combo
    pub chain: f32,
}

impl Default for WeightValues {
    fn default() -> Self {
        Self {
            combo3: 10.0,
            combo4: 20.0,
            combo5: 40.0,
            combo6_plus: 80.0,
            garbage_adjacent: 15.0,
            depth_penalty: -2.0,
            danger: -50.0,
            chain: 25.0,
        }
    }
}

impl WeightValues {
    /// Tiered weight for a run of `len` cells
    pub fn combo_weight(&self, len: usize) -> f32 {
        match len {
            0..=2 => 0.0,
            3 => self.combo3,
            4 => self.combo4,
            5 => self.combo5,
            _ => self.combo6_plus,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoveWeight {
    pub total: f32,
    /// Every cell of every qualifying run, deduplicated, in scan order
    pub combo_cells: Vec<(i32, i32)>,
    pub combo_count: u32,
}

impl MoveWeight {
    pub fn has_combo(&self) -> bool {
        self.combo_count > 0
    }
}

fn neighbors(x: i32, y: i32) -> ArrayVec<(i32, i32), 4> {
    let mut out = ArrayVec::new();
    out.push((x - 1, y));
    out.push((x + 1, y));
    out.push((x, y - 1));
    out.push((x, y + 1));
    out
}

fn touches_garbage(grid: &IntGrid, run: &Run) -> bool {
    run.cells.iter().any(|&(x, y)| {
        neighbors(x, y)
            .into_iter()
            .any(|(nx, ny)| grid.get(nx, ny) == Some(GARBAGE_CODE))
    })
}

/// Weight the grid as it stands after a move at the given depth.
pub fn weight_move(
    grid: &IntGrid,
    width: usize,
    height: usize,
    depth: u32,
    weights: &WeightValues,
) -> MoveWeight {
    let runs = sim::find_runs(grid);
    let mut result = MoveWeight::default();

    for run in &runs {
        result.total += weights.combo_weight(run.len());
        if touches_garbage(grid, run) {
            result.total += weights.garbage_adjacent;
        }
        for &cell in &run.cells {
            let (x, y) = cell;
            if x < 0 || x >= width as i32 || y < 0 || y >= height as i32 {
                continue;
            }
            if !result.combo_cells.contains(&cell) {
                result.combo_cells.push(cell);
            }
        }
    }
    result.combo_count = runs.len() as u32;
    result.total += weights.depth_penalty * depth as f32;

    if runs.is_empty() {
        let danger_row = DANGER_HEIGHT_RATIO * height as f32;
        if let Some(top) = grid.highest_occupied_row() {
            if top as f32 >= danger_row {
                result.total += weights.danger;
            }
        }
    }
    result
}
