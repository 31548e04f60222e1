use criterion::{black_box, criterion_group, criterion_main, Criterion};
use panel_clash::core::{Grid, GridConfig};
use panel_clash::engine::{sim, AiSolver, SolverConfig};
use panel_clash::types::{Direction, IntGrid};

const DT: f32 = 1.0 / 60.0;

fn bench_grid_tick(c: &mut Criterion) {
    let mut grid = Grid::new(GridConfig::default(), 12345);

    c.bench_function("grid_tick_16ms", |b| {
        b.iter(|| {
            grid.update(black_box(0.0), DT, true, true);
            grid.take_events();
        })
    });
}

fn bench_swap_and_settle(c: &mut Criterion) {
    c.bench_function("swap_and_settle", |b| {
        b.iter(|| {
            let mut grid = Grid::new(GridConfig::default(), 12345);
            grid.move_block(2, 0, Direction::Right);
            for _ in 0..30 {
                grid.update(0.0, DT, true, true);
            }
            grid.take_events()
        })
    });
}

fn bench_int_resolve(c: &mut Criterion) {
    let board = IntGrid::from_text(
        "0 0 0 0 0 0\n2 0 0 0 0 0\n1 0 0 0 0 0\n1 0 0 0 0 0\n1 2 2 0 3 0\n4 3 4 1 3 2",
    )
    .unwrap();

    c.bench_function("int_resolve_chain", |b| {
        b.iter(|| {
            let mut grid = board.clone();
            sim::resolve(black_box(&mut grid))
        })
    });
}

fn bench_solver_work(c: &mut Criterion) {
    let grid = Grid::new(
        GridConfig {
            initial_lines: 6,
            ..GridConfig::default()
        },
        12345,
    );
    let snapshot = grid.to_int_array();
    let mut solver = AiSolver::new(SolverConfig::default(), 1).unwrap();

    c.bench_function("solver_work_default", |b| {
        b.iter(|| solver.work_on(black_box(&snapshot)))
    });
}

criterion_group!(
    benches,
    bench_grid_tick,
    bench_swap_and_settle,
    bench_int_resolve,
    bench_solver_work
);
criterion_main!(benches);
