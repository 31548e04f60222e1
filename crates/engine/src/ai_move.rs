use serde::{Deserialize, Serialize};

use panel_clash_types::{Direction, IntGrid, EMPTY_CODE};

use crate::heuristic::{weight_move, WeightValues};
use crate::sim;

/// A swap the controller should feed back into `Grid::move_block`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlannedMove {
    pub x: i32,
    pub y: i32,
    pub direction: Direction,
}

/// One node of the search tree.
///
/// `grid` is the board after this swap with every combo it caused cleared
/// and settled, so children search the post-clear board. `weight` and
/// `combo_count` accumulate along the parent chain.
#[derive(Debug, Clone, PartialEq)]
pub struct AiMove {
    pub x: i32,
    pub y: i32,
    pub direction: Direction,
    pub weight: f32,
    pub combo_count: u32,
    pub depth: u32,
    pub grid: IntGrid,
    /// Index of the parent node in the solver's tree
    pub parent: Option<usize>,
    /// Cells of the combos this swap made directly
    pub combo_cells: Vec<(i32, i32)>,
}

impl AiMove {
    /// Swap `(x, y)` rightward on a copy of `base` and weigh the result.
    ///
    /// Returns `None` when the swap is illegal.
    pub fn evaluate(
        base: &IntGrid,
        x: i32,
        y: i32,
        depth: u32,
        parent: Option<(usize, &AiMove)>,
        weights: &WeightValues,
    ) -> Option<AiMove> {
        let mut grid = base.clone();
        if !sim::apply_swap(&mut grid, x, y, Direction::Right) {
            return None;
        }
        sim::settle(&mut grid);

        let scored = weight_move(&grid, grid.width(), grid.height(), depth, weights);
        let mut weight = scored.total;
        let mut combo_count = scored.combo_count;

        if scored.has_combo() {
            for &(cx, cy) in &scored.combo_cells {
                grid.set(cx, cy, EMPTY_CODE);
            }
            sim::settle(&mut grid);
            loop {
                let runs = sim::find_runs(&grid);
                if runs.is_empty() {
                    break;
                }
                weight += weights.chain;
                combo_count += runs.len() as u32;
                sim::clear_runs(&mut grid, &runs);
                sim::settle(&mut grid);
            }
        }

        let (parent_index, parent_weight, parent_combos) = match parent {
            Some((index, node)) => (Some(index), node.weight, node.combo_count),
            None => (None, 0.0, 0),
        };

        Some(AiMove {
            x,
            y,
            direction: Direction::Right,
            weight: parent_weight + weight,
            combo_count: parent_combos + combo_count,
            depth,
            grid,
            parent: parent_index,
            combo_cells: scored.combo_cells,
        })
    }

    pub fn planned(&self) -> PlannedMove {
        PlannedMove {
            x: self.x,
            y: self.y,
            direction: self.direction,
        }
    }

    pub fn has_combo(&self) -> bool {
        self.combo_count > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(text: &str) -> IntGrid {
        IntGrid::from_text(text).unwrap()
    }

    #[test]
    fn illegal_swap_yields_nothing() {
        let g = grid("1 1 0");
        assert!(AiMove::evaluate(&g, 0, 0, 0, None, &WeightValues::default()).is_none());
    }

    #[test]
    fn combo_is_cleared_on_the_node_grid() {
        let g = grid("0 0 0 0\n1 0 0 0\n2 0 1 1");
        let node = AiMove::evaluate(&g, 0, 1, 0, None, &WeightValues::default()).unwrap();
        assert_eq!(node.combo_count, 1);
        assert_eq!(node.weight, 10.0);
        assert_eq!(node.combo_cells, vec![(1, 0), (2, 0), (3, 0)]);
        assert_eq!(node.grid.to_text(), "0 0 0 0\n0 0 0 0\n2 0 0 0");
        assert_eq!(node.planned().direction, Direction::Right);
    }

    #[test]
    fn chain_steps_add_weight() {
        let g = grid("0 2 2 0\n1 2 1 1");
        let node = AiMove::evaluate(&g, 0, 0, 0, None, &WeightValues::default()).unwrap();
        assert_eq!(node.combo_count, 2);
        assert_eq!(node.weight, 10.0 + 25.0);
        assert_eq!(node.grid.occupied(), 0);
    }

    #[test]
    fn children_accumulate_parent_totals() {
        let g = grid("1 2 1 1");
        let weights = WeightValues::default();
        let root = AiMove::evaluate(&g, 0, 0, 0, None, &weights).unwrap();
        assert_eq!(root.weight, 10.0);
        let child = AiMove::evaluate(&root.grid, 0, 0, 1, Some((0, &root)), &weights);
        let child = child.unwrap();
        assert_eq!(child.parent, Some(0));
        assert_eq!(child.weight, 10.0 - 2.0);
        assert_eq!(child.combo_count, 1);
    }
}
