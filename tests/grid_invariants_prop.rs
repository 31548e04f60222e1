/**
 * Property/invariant tests for the grid and the simplified simulation.
 *
 * Invariants covered:
 * - Every cell, preview rows included, maps to exactly one block whose own
 *   coordinates agree, also after several dings land in one update.
 * - Garbage groups stay on one row with identical vertical positions every tick.
 * - No tick ever reports two blocks claiming the same cell.
 * - Remapping an already consistent grid changes nothing.
 * - Settling an int grid is idempotent and `resolve` leaves no runs behind.
 */
use proptest::prelude::*;

use panel_clash::core::{Grid, GridConfig};
use panel_clash::engine::sim;
use panel_clash::types::{Direction, GridAnomaly, GridEvent, IntGrid};

const DT: f32 = 1.0 / 60.0;

fn assert_map_consistent(grid: &Grid) {
    for y in -(grid.preview_lines() as i32)..grid.height() as i32 {
        for x in 0..grid.width() as i32 {
            let block = grid.get(x, y).expect("every cell has a block");
            assert_eq!((block.x(), block.y()), (x, y));
        }
    }
    let height = grid.height() as i32;
    assert!(grid.blocks().iter().all(|b| b.y() < height));
}

fn assert_groups_aligned(grid: &Grid) {
    for block in grid.blocks() {
        if let Some(right) = block.right() {
            let other = grid.block(right).expect("linked block exists");
            assert_eq!(block.y(), other.y());
            assert_eq!(block.position().y, other.position().y);
        }
    }
}

fn assert_no_duplicates(events: &[GridEvent]) {
    for event in events {
        assert!(
            !matches!(event.as_anomaly(), Some(GridAnomaly::DuplicateCell { .. })),
            "{event:?}"
        );
    }
}

fn int_grid_strategy() -> impl Strategy<Value = IntGrid> {
    (3usize..7, 3usize..8).prop_flat_map(|(width, height)| {
        prop::collection::vec(
            prop_oneof![
                4 => Just(0),
                6 => 1i32..5,
                1 => Just(99),
                1 => Just(-1),
            ],
            width * height,
        )
        .prop_map(move |cells| {
            let mut grid = IntGrid::new(width, height);
            for (i, code) in cells.into_iter().enumerate() {
                grid.set((i % width) as i32, (i / width) as i32, code);
            }
            grid
        })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn random_play_keeps_grid_consistent(
        seed in any::<u64>(),
        swaps in prop::collection::vec((0i32..5, 0i32..10, 1usize..12), 1..30),
        garbage_every in 2usize..8,
    ) {
        let config = GridConfig {
            width: 6,
            height: 10,
            initial_lines: 4,
            ..GridConfig::default()
        };
        let mut grid = Grid::new(config, seed);

        for (i, (x, y, ticks)) in swaps.into_iter().enumerate() {
            grid.move_block(x, y, Direction::Right);
            if i % garbage_every == 0 {
                if let Some(gx) = grid.can_add_garbage(3) {
                    grid.add_garbage(3, gx);
                }
            }
            for _ in 0..ticks {
                grid.update(0.02, DT, true, false);
                let events = grid.take_events();
                assert_no_duplicates(&events);
                assert_groups_aligned(&grid);
            }
            // A row lifted past the top is recycled at the start of the next update.
            grid.update(0.0, DT, true, true);
            assert_no_duplicates(&grid.take_events());
            assert_map_consistent(&grid);
        }

        grid.remap();
        assert!(grid.take_events().is_empty());
        let before = grid.to_text();
        grid.remap();
        prop_assert_eq!(before, grid.to_text());
        prop_assert!(grid.take_events().is_empty());
    }

    #[test]
    fn several_dings_per_update_keep_every_cell_mapped(
        seed in any::<u64>(),
        dings in 2u32..5,
        fraction in 0.0f32..0.9,
        idle in 1usize..6,
    ) {
        let config = GridConfig {
            width: 6,
            height: 12,
            initial_lines: 4,
            ..GridConfig::default()
        };
        let mut grid = Grid::new(config, seed);

        grid.update(dings as f32 + fraction, DT, false, false);
        let line_ups = grid
            .take_events()
            .iter()
            .filter(|e| matches!(e, GridEvent::LineUp { .. }))
            .count();
        prop_assert_eq!(line_ups, dings as usize);

        for _ in 0..idle {
            grid.update(0.0, DT, false, true);
            assert_no_duplicates(&grid.take_events());
        }
        assert_map_consistent(&grid);
    }

    #[test]
    fn settle_is_idempotent(mut grid in int_grid_strategy()) {
        sim::settle(&mut grid);
        let settled = grid.clone();
        prop_assert!(!sim::settle(&mut grid));
        prop_assert_eq!(settled, grid);
    }

    #[test]
    fn resolve_leaves_no_runs(mut grid in int_grid_strategy()) {
        let occupied = grid.occupied();
        sim::resolve(&mut grid);
        prop_assert!(sim::find_runs(&grid).is_empty());
        prop_assert!(grid.occupied() <= occupied);
        prop_assert!(!sim::settle(&mut grid));
    }
}
