//! Bounded tree search that drives a non-human player.
//!
//! The solver never touches a live [`Grid`]: it snapshots it with
//! [`Grid::to_int_array`], searches copies of that snapshot and hands back a
//! queue of swaps for the controller to feed into `Grid::move_block`.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use panel_clash_core::{GameRandom, Grid};
use panel_clash_types::IntGrid;

use crate::ai_move::{AiMove, PlannedMove};
use crate::beam::{prune_top_n, rank};
use crate::heuristic::WeightValues;
use crate::sim;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Plies searched, root included
    pub max_depth: usize,
    /// Moves kept per depth; the root limit is a random sample, deeper ones keep the heaviest per parent
    pub branch_limits: Vec<usize>,
    pub mistake_probability: f32,
    /// A mistake picks one of the next `mistake_range` candidates after the best
    pub mistake_range: usize,
    pub force_after_failures: u32,
    pub speed_up_probability: f32,
    /// Below this many occupied rows the solver asks for a speed-up instead of planning
    pub min_rows_to_plan: usize,
    pub weights: WeightValues,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            branch_limits: vec![24, 6, 3],
            mistake_probability: 0.0,
            mistake_range: 4,
            force_after_failures: 3,
            speed_up_probability: 0.3,
            min_rows_to_plan: 3,
            weights: WeightValues::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("max_depth must be at least 1")]
    ZeroDepth,
    #[error("branch_limits has {found} entries but max_depth needs {expected}")]
    MissingBranchLimits { expected: usize, found: usize },
    #[error("branch limit at depth {depth} is zero")]
    ZeroBranchLimit { depth: usize },
    #[error("{name} must be within [0, 1], got {value}")]
    Probability { name: &'static str, value: f32 },
    #[error("mistake_range must be at least 1")]
    ZeroMistakeRange,
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::ZeroDepth
            | ConfigError::MissingBranchLimits { .. }
            | ConfigError::ZeroBranchLimit { .. } => "invalid_search_shape",
            ConfigError::Probability { .. } => "invalid_probability",
            ConfigError::ZeroMistakeRange => "invalid_mistake_range",
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::ZeroDepth);
        }
        if self.branch_limits.len() < self.max_depth {
            return Err(ConfigError::MissingBranchLimits {
                expected: self.max_depth,
                found: self.branch_limits.len(),
            });
        }
        if let Some(depth) = self.branch_limits[..self.max_depth]
            .iter()
            .position(|&limit| limit == 0)
        {
            return Err(ConfigError::ZeroBranchLimit { depth });
        }
        for (name, value) in [
            ("mistake_probability", self.mistake_probability),
            ("speed_up_probability", self.speed_up_probability),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Probability { name, value });
            }
        }
        if self.mistake_range == 0 {
            return Err(ConfigError::ZeroMistakeRange);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverState {
    Idle,
    Playing,
    SpeedUp,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SolverDecision {
    /// Swaps to play in order, root first
    Play(Vec<PlannedMove>),
    SpeedUp,
    Idle,
}

#[derive(Debug, Clone)]
pub struct AiSolver {
    config: SolverConfig,
    random: GameRandom,
    queue: VecDeque<PlannedMove>,
    tree: Vec<AiMove>,
    failures: u32,
    state: SolverState,
}

impl AiSolver {
    pub fn new(config: SolverConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            random: GameRandom::new(seed),
            queue: VecDeque::new(),
            tree: Vec::new(),
            failures: 0,
            state: SolverState::Idle,
        })
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn state(&self) -> SolverState {
        self.state
    }

    /// Consecutive searches that found nothing worth playing
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Every node evaluated by the last search, parents before children
    pub fn tree(&self) -> &[AiMove] {
        &self.tree
    }

    pub fn pending_moves(&self) -> impl Iterator<Item = &PlannedMove> {
        self.queue.iter()
    }

    /// Pop the next queued swap. The solver goes idle once the queue drains.
    pub fn next_move(&mut self) -> Option<PlannedMove> {
        let next = self.queue.pop_front();
        if self.queue.is_empty() && self.state == SolverState::Playing {
            self.state = SolverState::Idle;
        }
        next
    }

    /// Drop the queued plan, e.g. after the board moved under it
    pub fn cancel(&mut self) {
        self.queue.clear();
        if self.state == SolverState::Playing {
            self.state = SolverState::Idle;
        }
    }

    pub fn work(&mut self, grid: &Grid) -> SolverDecision {
        self.work_on(&grid.to_int_array())
    }

    pub fn work_on(&mut self, snapshot: &IntGrid) -> SolverDecision {
        self.queue.clear();
        self.tree.clear();

        let mut grid = snapshot.clone();
        sim::resolve(&mut grid);

        let rows = grid.highest_occupied_row().map_or(0, |top| top + 1);
        if rows < self.config.min_rows_to_plan {
            self.state = SolverState::SpeedUp;
            return SolverDecision::SpeedUp;
        }

        self.search(&grid);
        self.decide()
    }

    fn search(&mut self, grid: &IntGrid) {
        let weights = self.config.weights;
        let last_x = grid.width() as i32 - 1;

        let mut roots: Vec<AiMove> = sim::get_moves(grid, 0, last_x)
            .into_iter()
            .filter_map(|(x, y)| AiMove::evaluate(grid, x, y, 0, None, &weights))
            .collect();
        let root_limit = self.config.branch_limits[0];
        if roots.len() > root_limit {
            self.random.shuffle(&mut roots);
            roots.truncate(root_limit);
        }

        let mut frontier = Vec::with_capacity(roots.len());
        for node in roots {
            frontier.push(self.tree.len());
            self.tree.push(node);
        }

        for depth in 1..self.config.max_depth {
            let limit = self.config.branch_limits[depth];
            let mut next = Vec::new();
            for &parent in &frontier {
                let node = &self.tree[parent];
                let children: Vec<AiMove> = sim::get_moves(&node.grid, node.x - 1, node.x + 1)
                    .into_iter()
                    .filter_map(|(x, y)| {
                        AiMove::evaluate(&node.grid, x, y, depth as u32, Some((parent, node)), &weights)
                    })
                    .collect();
                for child in prune_top_n(children, limit) {
                    next.push(self.tree.len());
                    self.tree.push(child);
                }
            }
            frontier = next;
        }
    }

    /// Ranks every node, so a shallow prefix of a longer path counts as a leaf
    /// and its own path can be played.
    fn decide(&mut self) -> SolverDecision {
        let mut ranked: Vec<usize> = (0..self.tree.len()).collect();
        ranked.sort_by(|&a, &b| rank(&self.tree[a], &self.tree[b]));

        let mut pick = 0;
        if ranked.len() > 1 && self.random.chance(self.config.mistake_probability) {
            let upper = self.config.mistake_range.min(ranked.len() - 1);
            pick = self.random.range_usize(1, upper + 1);
        }

        if let Some(&chosen) = ranked.get(pick) {
            if self.tree[chosen].has_combo() {
                let path = self.path_to(chosen);
                return self.play(path);
            }
        }

        self.failures += 1;
        if self.failures >= self.config.force_after_failures {
            let best_root = ranked
                .iter()
                .copied()
                .find(|&i| self.tree[i].parent.is_none());
            if let Some(root) = best_root {
                let planned = self.tree[root].planned();
                return self.play(vec![planned]);
            }
        }

        if self.random.chance(self.config.speed_up_probability) {
            self.state = SolverState::SpeedUp;
            SolverDecision::SpeedUp
        } else {
            self.state = SolverState::Idle;
            SolverDecision::Idle
        }
    }

    fn play(&mut self, path: Vec<PlannedMove>) -> SolverDecision {
        self.failures = 0;
        self.queue = path.iter().copied().collect();
        self.state = SolverState::Playing;
        SolverDecision::Play(path)
    }

    /// Root-to-leaf swaps ending at `leaf`
    fn path_to(&self, leaf: usize) -> Vec<PlannedMove> {
        let mut path = Vec::new();
        let mut cursor = Some(leaf);
        while let Some(index) = cursor {
            let node = &self.tree[index];
            path.push(node.planned());
            cursor = node.parent;
        }
        path.reverse();
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panel_clash_core::GridConfig;
    use panel_clash_types::Direction;

    const BOARD: &str = "0 0 0 0\n1 0 0 0\n2 0 1 1";

    fn config() -> SolverConfig {
        SolverConfig {
            max_depth: 2,
            branch_limits: vec![50, 50],
            min_rows_to_plan: 1,
            speed_up_probability: 0.0,
            ..SolverConfig::default()
        }
    }

    fn grid(text: &str) -> IntGrid {
        IntGrid::from_text(text).unwrap()
    }

    #[test]
    fn finds_the_single_combo() {
        let mut solver = AiSolver::new(config(), 3).unwrap();
        let decision = solver.work_on(&grid(BOARD));
        let expected = PlannedMove {
            x: 0,
            y: 1,
            direction: Direction::Right,
        };
        assert_eq!(decision, SolverDecision::Play(vec![expected]));
        // The combo sits on a root that has children of its own.
        let tree = solver.tree();
        assert!(tree
            .iter()
            .any(|node| node.depth == 1 && node.parent.map_or(false, |p| tree[p].has_combo())));
        assert_eq!(solver.state(), SolverState::Playing);
        assert_eq!(solver.pending_moves().count(), 1);

        assert_eq!(solver.next_move(), Some(expected));
        assert_eq!(solver.next_move(), None);
        assert_eq!(solver.state(), SolverState::Idle);
    }

    #[test]
    fn works_from_a_live_grid() {
        let live = Grid::from_text(BOARD, GridConfig::default(), 1).unwrap();
        let mut solver = AiSolver::new(config(), 3).unwrap();
        let decision = solver.work(&live);
        assert!(matches!(decision, SolverDecision::Play(ref moves) if moves.len() == 1));
    }

    #[test]
    fn low_stack_asks_for_speed_up() {
        let mut solver = AiSolver::new(
            SolverConfig {
                min_rows_to_plan: 3,
                ..config()
            },
            0,
        )
        .unwrap();
        assert_eq!(solver.work_on(&grid(BOARD)), SolverDecision::SpeedUp);
        assert_eq!(solver.state(), SolverState::SpeedUp);
        assert!(solver.tree().is_empty());
    }

    #[test]
    fn failures_force_the_best_root_move() {
        let board = grid("1 2 3 4 1 2");
        let mut solver = AiSolver::new(
            SolverConfig {
                force_after_failures: 2,
                ..config()
            },
            9,
        )
        .unwrap();

        assert_eq!(solver.work_on(&board), SolverDecision::Idle);
        assert_eq!(solver.failures(), 1);

        let decision = solver.work_on(&board);
        assert_eq!(
            decision,
            SolverDecision::Play(vec![PlannedMove {
                x: 0,
                y: 0,
                direction: Direction::Right,
            }])
        );
        assert_eq!(solver.failures(), 0);
    }

    #[test]
    fn forced_mistake_skips_the_combo() {
        let mut solver = AiSolver::new(
            SolverConfig {
                max_depth: 1,
                mistake_probability: 1.0,
                mistake_range: 1,
                force_after_failures: 10,
                ..config()
            },
            4,
        )
        .unwrap();
        assert_eq!(solver.work_on(&grid(BOARD)), SolverDecision::Idle);
        assert_eq!(solver.failures(), 1);
    }

    #[test]
    fn root_sampling_respects_the_limit() {
        let board = grid("1 2 3 4 1 2\n2 3 4 1 2 3\n3 4 1 2 3 4");
        let mut solver = AiSolver::new(
            SolverConfig {
                max_depth: 2,
                branch_limits: vec![4, 2],
                ..config()
            },
            11,
        )
        .unwrap();
        solver.work_on(&board);
        let roots = solver.tree().iter().filter(|m| m.depth == 0).count();
        let children = solver.tree().iter().filter(|m| m.depth == 1).count();
        assert_eq!(roots, 4);
        assert!(children <= 8);
        for node in solver.tree().iter().filter(|m| m.depth == 1) {
            let parent = &solver.tree()[node.parent.unwrap()];
            assert!((node.x - parent.x).abs() <= 1);
        }
    }

    #[test]
    fn validation_rejects_bad_configs() {
        let bad = SolverConfig {
            max_depth: 0,
            ..SolverConfig::default()
        };
        assert_eq!(bad.validate(), Err(ConfigError::ZeroDepth));

        let bad = SolverConfig {
            max_depth: 4,
            ..SolverConfig::default()
        };
        let err = bad.validate().unwrap_err();
        assert_eq!(err.code(), "invalid_search_shape");

        let bad = SolverConfig {
            branch_limits: vec![24, 0, 3],
            ..SolverConfig::default()
        };
        assert_eq!(bad.validate(), Err(ConfigError::ZeroBranchLimit { depth: 1 }));

        let bad = SolverConfig {
            mistake_probability: 1.5,
            ..SolverConfig::default()
        };
        let err = AiSolver::new(bad, 0).unwrap_err();
        assert_eq!(err.code(), "invalid_probability");
        assert_eq!(err.to_string(), "mistake_probability must be within [0, 1], got 1.5");
    }

    #[test]
    fn config_loads_from_json() {
        let config: SolverConfig =
            serde_json::from_str(r#"{"max_depth": 2, "branch_limits": [10, 4], "weights": {"chain": 40}}"#)
                .unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.weights.chain, 40.0);
        assert_eq!(config.weights.combo3, 10.0);
        assert_eq!(config.force_after_failures, 3);
    }
}
