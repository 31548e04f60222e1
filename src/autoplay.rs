//! Headless driver: one grid played by the solver until it tops out.
//!
//! Configuration comes from `PANEL_CLASH_*` environment variables. When
//! `PANEL_CLASH_LOG_PATH` is set every grid event is appended to that file as
//! one JSON line `{"tick", "player", "event"}`.

use std::fs::{File, OpenOptions};
use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::core::{Grid, GridConfig};
use crate::engine::{AiSolver, SolverConfig, SolverDecision};
use crate::types::{GridAnomaly, GridEvent, DEFAULT_HEIGHT, DEFAULT_WIDTH};

#[derive(Debug, Clone)]
pub struct AutoplayConfig {
    pub seed: u64,
    /// Hard stop after this many ticks
    pub ticks: u64,
    pub width: usize,
    pub height: usize,
    pub tick_seconds: f32,
    /// Passive scroll in rows per second
    pub scroll_speed: f32,
    /// Scroll multiplier while the solver asks for a speed-up
    pub speed_up_factor: f32,
    /// Ticks between two solver actions
    pub move_interval: u32,
    /// Ticks between garbage drops; 0 disables garbage
    pub garbage_interval: u64,
    pub garbage_width: usize,
    pub player: usize,
    pub solver: SolverConfig,
    pub log_path: Option<String>,
}

impl Default for AutoplayConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            ticks: 3600,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            tick_seconds: 1.0 / 60.0,
            scroll_speed: 0.05,
            speed_up_factor: 6.0,
            move_interval: 8,
            garbage_interval: 600,
            garbage_width: 3,
            player: 0,
            solver: SolverConfig::default(),
            log_path: None,
        }
    }
}

impl AutoplayConfig {
    /// Create from environment variables, falling back to defaults for unset or unparsable numbers
    pub fn from_env() -> Result<Self> {
        use std::env;

        let defaults = Self::default();
        let seed = env::var("PANEL_CLASH_SEED")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.seed);
        let ticks = env::var("PANEL_CLASH_TICKS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.ticks);
        let width = env::var("PANEL_CLASH_WIDTH")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.width);
        let height = env::var("PANEL_CLASH_HEIGHT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.height);
        let scroll_speed = env::var("PANEL_CLASH_SCROLL")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.scroll_speed);

        let solver = match non_empty_var("PANEL_CLASH_AI_CONFIG") {
            Some(path) => load_solver_config(&path)?,
            None => defaults.solver.clone(),
        };

        Ok(Self {
            seed,
            ticks,
            width,
            height,
            scroll_speed,
            solver,
            log_path: non_empty_var("PANEL_CLASH_LOG_PATH"),
            ..defaults
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .and_then(|s| if s.is_empty() { None } else { Some(s) })
}

/// Read a JSON `SolverConfig`; missing fields keep their defaults.
pub fn load_solver_config(path: &str) -> Result<SolverConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading solver config {}", path))?;
    let config: SolverConfig =
        serde_json::from_str(&text).with_context(|| format!("parsing solver config {}", path))?;
    config
        .validate()
        .with_context(|| format!("invalid solver config {}", path))?;
    Ok(config)
}

#[derive(Serialize)]
struct EventRecord<'a> {
    tick: u64,
    player: usize,
    event: &'a GridEvent,
}

/// Append-only JSONL sink; a failed write closes it for the rest of the run.
struct EventLog {
    file: Option<File>,
    buf: Vec<u8>,
}

impl EventLog {
    fn open(path: Option<&str>) -> Result<Self> {
        let file = match path {
            Some(path) => Some(
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("opening event log {}", path))?,
            ),
            None => None,
        };
        Ok(Self {
            file,
            buf: Vec::with_capacity(256),
        })
    }

    fn record(&mut self, tick: u64, player: usize, event: &GridEvent) {
        let Some(file) = self.file.as_mut() else {
            return;
        };
        self.buf.clear();
        if serde_json::to_writer(&mut self.buf, &EventRecord { tick, player, event }).is_err() {
            return;
        }
        self.buf.push(b'\n');
        if file.write_all(&self.buf).is_err() {
            self.file = None;
        }
    }

    fn flush(&mut self) {
        if let Some(file) = self.file.as_mut() {
            let _ = file.flush();
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AutoplaySummary {
    pub ticks: u64,
    pub combos: u32,
    pub best_chain: u32,
    pub garbage_added: u32,
    pub garbage_broken: u32,
    pub moves: u32,
    pub topped_out: bool,
    pub anomalies: Vec<GridAnomaly>,
    pub final_board: String,
}

pub struct Autoplay {
    config: AutoplayConfig,
    grid: Grid,
    solver: AiSolver,
    log: EventLog,
    summary: AutoplaySummary,
    move_cooldown: u32,
    speed_up: bool,
}

impl Autoplay {
    pub fn new(config: AutoplayConfig) -> Result<Self> {
        let grid_config = GridConfig {
            width: config.width,
            height: config.height,
            ..GridConfig::default()
        };
        let grid = Grid::new(grid_config, config.seed);
        Self::with_grid(config, grid)
    }

    /// Drive an already-built grid, e.g. one scripted from fixture text
    pub fn with_grid(config: AutoplayConfig, grid: Grid) -> Result<Self> {
        let solver = AiSolver::new(config.solver.clone(), config.seed.wrapping_add(1))
            .context("building solver")?;
        let log = EventLog::open(config.log_path.as_deref())?;
        Ok(Self {
            config,
            grid,
            solver,
            log,
            summary: AutoplaySummary::default(),
            move_cooldown: 0,
            speed_up: false,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn solver(&self) -> &AiSolver {
        &self.solver
    }

    pub fn summary(&self) -> &AutoplaySummary {
        &self.summary
    }

    /// Advance one tick. Returns false once the run is over.
    pub fn step(&mut self) -> bool {
        if self.summary.topped_out || self.summary.ticks >= self.config.ticks {
            return false;
        }
        self.summary.ticks += 1;
        let tick = self.summary.ticks;

        self.control();

        if self.config.garbage_interval > 0 && tick % self.config.garbage_interval == 0 {
            let width = self.config.garbage_width;
            if let Some(x) = self.grid.can_add_garbage(width) {
                self.grid.add_garbage(width, x);
            }
        }

        let mut scroll = self.config.scroll_speed * self.config.tick_seconds;
        if self.speed_up {
            scroll *= self.config.speed_up_factor;
        }
        self.grid.update(scroll, self.config.tick_seconds, true, false);

        for event in self.grid.take_events() {
            self.log.record(tick, self.config.player, &event);
            self.tally(&event);
        }

        if self.grid.is_topped_out() {
            self.summary.topped_out = true;
        }
        !self.summary.topped_out && self.summary.ticks < self.config.ticks
    }

    fn control(&mut self) {
        if self.move_cooldown > 0 {
            self.move_cooldown -= 1;
            return;
        }
        if !self.grid.is_settled() {
            return;
        }

        if let Some(planned) = self.solver.next_move() {
            if self
                .grid
                .move_block(planned.x, planned.y, planned.direction)
                .success
            {
                self.summary.moves += 1;
            } else {
                self.solver.cancel();
            }
            self.speed_up = false;
        } else {
            self.speed_up = self.solver.work(&self.grid) == SolverDecision::SpeedUp;
        }
        self.move_cooldown = self.config.move_interval;
    }

    fn tally(&mut self, event: &GridEvent) {
        match event {
            GridEvent::ComboDetected(combo) => {
                self.summary.combos += 1;
                self.summary.best_chain = self.summary.best_chain.max(combo.chain);
            }
            GridEvent::GarbageAdded { .. } => self.summary.garbage_added += 1,
            GridEvent::GarbageBroken { .. } => self.summary.garbage_broken += 1,
            // Planned coordinates are stale once the stack moves up.
            GridEvent::LineUp { .. } => self.solver.cancel(),
            GridEvent::Anomaly(anomaly) => self.summary.anomalies.push(anomaly.clone()),
            _ => {}
        }
    }

    pub fn run(mut self) -> AutoplaySummary {
        while self.step() {}
        self.log.flush();
        self.summary.final_board = self.grid.to_text();
        self.summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet(ticks: u64) -> AutoplayConfig {
        AutoplayConfig {
            ticks,
            scroll_speed: 0.0,
            garbage_interval: 0,
            solver: SolverConfig {
                min_rows_to_plan: 1,
                speed_up_probability: 0.0,
                force_after_failures: 1000,
                ..SolverConfig::default()
            },
            ..AutoplayConfig::default()
        }
    }

    #[test]
    fn solver_clears_a_scripted_board() {
        let grid = Grid::from_text("0 0 0 0\n1 0 0 0\n2 0 1 1", GridConfig::default(), 1).unwrap();
        let summary = Autoplay::with_grid(quiet(120), grid).unwrap().run();
        assert_eq!(summary.moves, 1);
        assert_eq!(summary.combos, 1);
        assert!(!summary.topped_out);
        assert!(summary.anomalies.is_empty());
        assert_eq!(summary.final_board, "0 0 0 0\n0 0 0 0\n2 0 0 0");
    }

    #[test]
    fn stops_at_the_tick_limit() {
        let mut autoplay = Autoplay::new(quiet(5)).unwrap();
        let mut steps = 0;
        while autoplay.step() {
            steps += 1;
        }
        assert_eq!(steps, 4);
        assert_eq!(autoplay.summary().ticks, 5);
        assert!(!autoplay.step());
    }

    #[test]
    fn topped_out_board_ends_the_run() {
        let grid = Grid::from_text("1 2 3\n2 3 1\n3 1 2", GridConfig::default(), 2).unwrap();
        let summary = Autoplay::with_grid(quiet(100), grid).unwrap().run();
        assert!(summary.topped_out);
        assert_eq!(summary.ticks, 1);
    }

    #[test]
    fn events_are_logged_as_json_lines() {
        let path = std::env::temp_dir().join(format!("panel-clash-log-{}.jsonl", std::process::id()));
        let _ = std::fs::remove_file(&path);
        let config = AutoplayConfig {
            log_path: Some(path.to_string_lossy().into_owned()),
            ..quiet(120)
        };
        let grid = Grid::from_text("0 0 0 0\n1 0 0 0\n2 0 1 1", GridConfig::default(), 1).unwrap();
        Autoplay::with_grid(config, grid).unwrap().run();

        let text = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        let records: Vec<serde_json::Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert!(!records.is_empty());
        assert!(records.iter().all(|r| r["player"] == 0 && r["tick"].as_u64().is_some()));
        assert!(records
            .iter()
            .any(|r| r["event"]["type"] == "combo_detected"));
    }

    #[test]
    fn bad_solver_config_is_rejected() {
        let config = AutoplayConfig {
            solver: SolverConfig {
                max_depth: 0,
                ..SolverConfig::default()
            },
            ..AutoplayConfig::default()
        };
        assert!(Autoplay::new(config).is_err());
    }
}
