//! Presentation hooks
//!
//! A grid can run with no presentation attached. When a hook is installed it
//! decides how long a cleared block lingers before it empties, and how long a
//! broken garbage cell waits before it turns into its new color. The grid
//! counts those delays down itself; no callback ever re-enters the grid.

use std::fmt::Debug;

pub trait BlockAnimator: Debug {
    /// Delay in seconds before the cleared block at `cell` empties.
    /// `index` is its position in the combo's stagger order.
    fn on_empty(&mut self, cell: (i32, i32), index: usize, total: usize) -> f32 {
        let _ = (cell, index, total);
        0.0
    }

    /// Delay in seconds before the garbage cell at `cell` converts.
    fn on_conversion(&mut self, cell: (i32, i32), index: usize, total: usize) -> f32 {
        let _ = (cell, index, total);
        0.0
    }
}

/// Default hook: everything happens at once
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAnimation;

impl BlockAnimator for NoAnimation {}

/// Fixed per-index stagger, the way the stock visuals pop blocks one after another
#[derive(Debug, Clone, Copy)]
pub struct StaggeredAnimation {
    pub empty_step: f32,
    pub conversion_step: f32,
}

impl Default for StaggeredAnimation {
    fn default() -> Self {
        Self {
            empty_step: 0.15,
            conversion_step: 0.1,
        }
    }
}

impl BlockAnimator for StaggeredAnimation {
    fn on_empty(&mut self, _cell: (i32, i32), index: usize, _total: usize) -> f32 {
        self.empty_step * (index + 1) as f32
    }

    fn on_conversion(&mut self, _cell: (i32, i32), index: usize, _total: usize) -> f32 {
        self.conversion_step * (index + 1) as f32
    }
}
