//! Simplified simulation over [`IntGrid`].
//!
//! These functions replay the grid's rules without timing: a swap is
//! instantaneous, gravity settles a whole column at once and every run of
//! three or more clears in one step. Garbage falls per column like any other
//! cell and never joins a run; irrelevant (`-1`) cells never move and hold up
//! whatever sits on them.

use panel_clash_types::{Direction, IntGrid, EMPTY_CODE, GARBAGE_CODE, IRRELEVANT_CODE, MIN_COMBO_LEN};

/// A straight run of one color
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub code: i32,
    pub cells: Vec<(i32, i32)>,
}

impl Run {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Drop every movable cell onto the next support below. Returns true if anything moved.
pub fn settle(grid: &mut IntGrid) -> bool {
    let width = grid.width() as i32;
    let height = grid.height() as i32;
    let mut changed = false;

    for x in 0..width {
        let mut write = 0;
        for y in 0..height {
            let code = grid.get(x, y).unwrap_or(EMPTY_CODE);
            if code == IRRELEVANT_CODE {
                write = y + 1;
            } else if code != EMPTY_CODE {
                if write != y {
                    grid.set(x, write, code);
                    grid.set(x, y, EMPTY_CODE);
                    changed = true;
                }
                write += 1;
            }
        }
    }
    changed
}

/// Runs of 3+ identical colors, columns first, then rows
pub fn find_runs(grid: &IntGrid) -> Vec<Run> {
    let width = grid.width() as i32;
    let height = grid.height() as i32;
    let mut runs = Vec::new();

    for x in 0..width {
        collect_runs(grid, (0..height).map(|y| (x, y)), &mut runs);
    }
    for y in 0..height {
        collect_runs(grid, (0..width).map(|x| (x, y)), &mut runs);
    }
    runs
}

fn collect_runs(grid: &IntGrid, cells: impl Iterator<Item = (i32, i32)>, runs: &mut Vec<Run>) {
    let mut current = Run {
        code: EMPTY_CODE,
        cells: Vec::new(),
    };
    for (x, y) in cells {
        let code = grid.get(x, y).unwrap_or(EMPTY_CODE);
        if IntGrid::is_color(code) && code == current.code {
            current.cells.push((x, y));
            continue;
        }
        if current.len() >= MIN_COMBO_LEN {
            runs.push(current.clone());
        }
        current.code = code;
        current.cells.clear();
        if IntGrid::is_color(code) {
            current.cells.push((x, y));
        }
    }
    if current.len() >= MIN_COMBO_LEN {
        runs.push(current);
    }
}

/// Empty every cell of `runs`. Returns the number of cells cleared.
pub fn clear_runs(grid: &mut IntGrid, runs: &[Run]) -> usize {
    let mut cleared = 0;
    for run in runs {
        for &(x, y) in &run.cells {
            if grid.get(x, y) != Some(EMPTY_CODE) {
                grid.set(x, y, EMPTY_CODE);
                cleared += 1;
            }
        }
    }
    cleared
}

/// Clear and settle until nothing matches. Returns the number of clear steps.
pub fn resolve(grid: &mut IntGrid) -> u32 {
    settle(grid);
    let mut steps = 0;
    loop {
        let runs = find_runs(grid);
        if runs.is_empty() {
            return steps;
        }
        clear_runs(grid, &runs);
        settle(grid);
        steps += 1;
    }
}

/// Whether swapping `(x, y)` with its neighbor in `direction` is a legal move
pub fn can_swap(grid: &IntGrid, x: i32, y: i32, direction: Direction) -> bool {
    let (Some(a), Some(b)) = (grid.get(x, y), grid.get(x + direction.dx(), y)) else {
        return false;
    };
    let blocked = |c: i32| c == IRRELEVANT_CODE || c == GARBAGE_CODE;
    if blocked(a) || blocked(b) {
        return false;
    }
    a != b
}

/// Swap two cells in place; the grid is not settled afterwards.
pub fn apply_swap(grid: &mut IntGrid, x: i32, y: i32, direction: Direction) -> bool {
    if !can_swap(grid, x, y, direction) {
        return false;
    }
    let other = x + direction.dx();
    let (Some(a), Some(b)) = (grid.get(x, y), grid.get(other, y)) else {
        return false;
    };
    grid.set(x, y, b);
    grid.set(other, y, a);
    true
}

/// Legal rightward swaps whose left cell lies in `x_from..=x_to`
pub fn get_moves(grid: &IntGrid, x_from: i32, x_to: i32) -> Vec<(i32, i32)> {
    let last = grid.width() as i32 - 2;
    let from = x_from.max(0);
    let to = x_to.min(last);
    let mut moves = Vec::new();
    for y in 0..grid.height() as i32 {
        for x in from..=to {
            if can_swap(grid, x, y, Direction::Right) {
                moves.push((x, y));
            }
        }
    }
    moves
}
