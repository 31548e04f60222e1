//! Grid scenario tests scripted with the text fixture notation

use panel_clash::core::{Grid, GridClearState, GridConfig};
use panel_clash::types::{Direction, GridEvent, Movement};

const DT: f32 = 1.0 / 60.0;

fn grid(text: &str) -> Grid {
    let config = GridConfig {
        generate_new_lines: false,
        ..GridConfig::default()
    };
    Grid::from_text(text, config, 0).unwrap()
}

fn tick(grid: &mut Grid) -> Vec<GridEvent> {
    grid.update(0.0, DT, true, true);
    grid.take_events()
}

fn run(grid: &mut Grid, ticks: usize) -> Vec<GridEvent> {
    let mut events = Vec::new();
    for _ in 0..ticks {
        events.extend(tick(grid));
    }
    events
}

fn combo_sizes(events: &[GridEvent]) -> Vec<usize> {
    events
        .iter()
        .filter_map(GridEvent::as_combo)
        .map(|c| c.size())
        .collect()
}

fn assert_groups_aligned(grid: &Grid) {
    for block in grid.blocks() {
        let Some(right) = block.right() else {
            continue;
        };
        let other = grid.block(right).unwrap();
        assert_eq!(block.y(), other.y(), "group split across rows");
        assert_eq!(block.position().y, other.position().y);
        assert_eq!(block.movement(), other.movement());
    }
}

#[test]
fn test_single_row_combo() {
    let mut g = grid("1 1 1 0");
    let events = run(&mut g, 10);
    assert_eq!(combo_sizes(&events), vec![3]);
    assert_eq!(g.to_text(), "0 0 0 0");
    assert!(g.is_settled());
}

#[test]
fn test_two_rows_are_two_combos() {
    let mut g = grid("2 2 2 0\n1 1 1 0");
    let events = run(&mut g, 10);
    assert_eq!(combo_sizes(&events), vec![3, 3]);
    assert_eq!(g.to_text(), "0 0 0 0\n0 0 0 0");
}

#[test]
fn test_swap_into_combo() {
    let mut g = grid("0 0 0 0\n1 0 0 0\n2 0 1 1");
    let result = g.move_block(0, 1, Direction::Right);
    assert!(result.success);
    let events = run(&mut g, 90);
    assert_eq!(combo_sizes(&events), vec![3]);
    assert_eq!(g.to_text(), "0 0 0 0\n0 0 0 0\n2 0 0 0");
}

#[test]
fn test_garbage_group_falls_aligned_after_left_swap() {
    let mut g = grid("x x x 0\n0 4 0 0\n1 1 0 1");
    assert!(g.move_block(3, 0, Direction::Left).success);

    let mut events = Vec::new();
    for _ in 0..120 {
        events.extend(tick(&mut g));
        assert_groups_aligned(&g);
    }

    assert_eq!(combo_sizes(&events), vec![3]);
    assert!(!events
        .iter()
        .any(|e| matches!(e, GridEvent::GarbageBroken { .. })));
    assert_eq!(g.to_text(), "0 0 0 0\nx x x 0\n0 4 0 0");

    let leader = g.id_at(0, 1).unwrap();
    assert_eq!(g.group_members(leader).len(), 3);
    for id in g.group_members(leader) {
        let block = g.block(id).unwrap();
        assert_eq!(block.y(), 1);
        assert_eq!(block.movement(), Movement::None);
    }
}

#[test]
fn test_garbage_group_steps_down_through_repeated_left_swaps() {
    let mut g = grid(
        &[
            "x x x 0", "0 4 0 0", "1 1 0 1", "3 3 0 3", "2 2 0 2", "1 1 0 1", "3 3 0 3",
            "2 2 0 2", "1 1 0 1",
        ]
        .join("\n"),
    );

    let mut events = Vec::new();
    for swap in 0..7 {
        assert!(g.move_block(3, 0, Direction::Left).success, "swap {swap}");
        for _ in 0..120 {
            events.extend(tick(&mut g));
            assert_groups_aligned(&g);
        }
        assert!(g.is_settled(), "swap {swap}");

        let leader = g.id_at(0, 7 - swap).unwrap();
        assert_eq!(g.group_members(leader).len(), 3, "swap {swap}");
    }

    assert_eq!(combo_sizes(&events), vec![3; 7]);
    assert!(!events
        .iter()
        .any(|e| matches!(e, GridEvent::GarbageBroken { .. } | GridEvent::Anomaly(_))));
    assert_eq!(
        g.to_text(),
        ["0 0 0 0"; 7].join("\n") + "\nx x x 0\n0 4 0 0"
    );

    for id in g.group_members(g.id_at(0, 1).unwrap()) {
        let block = g.block(id).unwrap();
        assert_eq!(block.y(), 1);
        assert_eq!(block.position().y, 1.0);
        assert_eq!(block.movement(), Movement::None);
    }
    let support = g.get(1, 0).unwrap();
    assert!(!support.is_empty());
    assert!(!support.is_garbage());
}

#[test]
fn test_clear_state_reports_stuck_board() {
    let g = grid("1 0 0 0\n2 2 1 0");
    assert_eq!(g.clear_state(), GridClearState::NoComboPossible);
    assert_eq!(g.clear_state().code(), -2);
}

#[test]
fn test_chain_through_falling_block() {
    let mut g = grid("2 0 0 0\n1 0 0 0\n1 0 0 0\n1 2 2 0");
    let events = run(&mut g, 120);
    let chains: Vec<u32> = events
        .iter()
        .filter_map(GridEvent::as_combo)
        .map(|c| c.chain)
        .collect();
    assert_eq!(chains, vec![1, 2]);
    assert!(events.contains(&GridEvent::ChainEnded { length: 2 }));
}

#[test]
fn test_swap_symmetry() {
    let config = GridConfig {
        width: 6,
        height: 8,
        ..GridConfig::default()
    };
    for y in 0..4 {
        for x in 0..5 {
            let mut a = Grid::new(config.clone(), 17);
            let mut b = Grid::new(config.clone(), 17);
            let ra = a.move_block(x, y, Direction::Right);
            let rb = b.move_block(x + 1, y, Direction::Left);
            assert_eq!(ra.success, rb.success, "swap at ({x}, {y})");
            run(&mut a, 30);
            run(&mut b, 30);
            assert_eq!(a.to_text(), b.to_text(), "swap at ({x}, {y})");
        }
    }
}

#[test]
fn test_swapping_colored_blocks_clears_and_drops() {
    let mut g = grid("0 1 0 0\n1 2 1 1");
    assert!(g.move_block(0, 0, Direction::Right).success);
    let events = run(&mut g, 90);
    assert_eq!(combo_sizes(&events), vec![3]);
    assert_eq!(g.to_text(), "0 0 0 0\n2 1 0 0");
}

#[test]
fn test_int_array_matches_settled_board() {
    let mut g = grid("0 3 0\nx x 0\n1 2 1");
    run(&mut g, 5);
    let ints = g.to_int_array();
    assert_eq!(ints.to_text(), g.to_text());
}
