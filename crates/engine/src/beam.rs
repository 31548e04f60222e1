use std::cmp::Ordering;

use crate::ai_move::AiMove;

/// Solver ranking: heavier first, then shallower, then bottom-left first.
pub fn rank(a: &AiMove, b: &AiMove) -> Ordering {
    b.weight
        .total_cmp(&a.weight)
        .then(a.depth.cmp(&b.depth))
        .then(a.y.cmp(&b.y))
        .then(a.x.cmp(&b.x))
}

/*
 * Top-N selection without sorting the entire list.
 * - O(n) partition + O(k log k) sort of the kept prefix.
 */
pub(crate) fn prune_top_n(mut xs: Vec<AiMove>, n: usize) -> Vec<AiMove> {
    if n == 0 {
        xs.clear();
        return xs;
    }
    if n >= xs.len() {
        xs.sort_by(rank);
        return xs;
    }

    xs.select_nth_unstable_by(n - 1, rank);
    xs.truncate(n);
    xs.sort_by(rank);
    xs
}
