//! Panel Clash (workspace facade crate).
//!
//! This package re-exports the simulation, engine and shared types as
//! `panel_clash::{core,engine,types}` and hosts the headless autoplay driver.
//! The implementation lives in dedicated crates under `crates/`.

pub use panel_clash_core as core;
pub use panel_clash_engine as engine;
pub use panel_clash_types as types;

pub mod autoplay;
