//! Grid notifications.
//!
//! The grid queues one event per logical occurrence while it ticks; the
//! presentation layer (or the autoplay driver) drains the queue afterwards.
//! Every payload is an owned snapshot, never a reference into the grid.

use serde::Serialize;
use thiserror::Error;

/// A cleared run (or merged cluster of runs) of one color
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComboEvent {
    pub definition: u8,
    /// Cleared cells, in stagger order
    pub cells: Vec<(i32, i32)>,
    /// Chain counter after this combo (1 for the first combo of a sequence)
    pub chain: u32,
    /// Whether any cleared block was chainable
    pub is_chain: bool,
    /// Number of garbage groups broken by this combo
    pub garbage_broken: usize,
}

impl ComboEvent {
    pub fn size(&self) -> usize {
        self.cells.len()
    }
}

/// Invariant violations. The offending operation is skipped; the simulation keeps running.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GridAnomaly {
    #[error("two blocks claim cell ({x}, {y}) during remap")]
    DuplicateCell { x: i32, y: i32 },
    #[error("refused swap at row {y} between columns {x} and {other_x}: garbage cannot swap with a block")]
    GarbageSwap { x: i32, y: i32, other_x: i32 },
    #[error("refused to spawn zero-width garbage")]
    ZeroWidthGarbage,
    #[error("garbage slot ({x}, {y}) is not free")]
    GarbageSlotOccupied { x: i32, y: i32 },
    #[error("ignored a scroll amount that is not a finite number")]
    NonFiniteScroll,
    #[error("row {y} scrolled past the top but is not empty")]
    TopRowNotEmpty { y: i32 },
    #[error("garbage follower ({x}, {y}) had to be forced onto row {leader_y}")]
    GroupMisaligned { x: i32, y: i32, leader_y: i32 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum GridEvent {
    ComboDetected(ComboEvent),
    FallEnded { x: i32, y: i32 },
    /// The scroll crossed an integer boundary and every row moved up
    LineUp { scroll_value: f32 },
    /// A recycled row was regenerated at the bottom of the preview area
    LineGenerated { y: i32 },
    GarbageAdded { x: i32, y: i32, width: usize },
    GarbageBroken { x: i32, y: i32, width: usize },
    FreezeEnded { multiplier_frame: u32 },
    ChainEnded { length: u32 },
    Anomaly(GridAnomaly),
}

impl GridEvent {
    pub fn as_combo(&self) -> Option<&ComboEvent> {
        match self {
            GridEvent::ComboDetected(combo) => Some(combo),
            _ => None,
        }
    }

    pub fn as_anomaly(&self) -> Option<&GridAnomaly> {
        match self {
            GridEvent::Anomaly(anomaly) => Some(anomaly),
            _ => None,
        }
    }
}
