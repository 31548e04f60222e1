//! Block module - one playfield cell
//!
//! Blocks are created once per cell when the grid is built and never dropped:
//! clearing a block empties it, recycling a row refills it. Garbage groups are
//! expressed with `left`/`right` handles into the grid's block arena.
//!
//! The cached flags (`can_combo`, `can_move`, `is_destructable`) are read for
//! every cell on every tick, so they are recomputed by each mutator instead of
//! being derived on demand.

use panel_clash_types::{BlockDefinition, Movement, Vec2, CONVERSION_MOMENTUM, EMPTY_CODE};

/// Handle of a block inside its grid's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub usize);

/// A delayed change scheduled by an animation hook
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PendingChange {
    Empty { remaining: f32 },
    Convert { remaining: f32, definition: BlockDefinition },
}

impl PendingChange {
    fn remaining_mut(&mut self) -> &mut f32 {
        match self {
            PendingChange::Empty { remaining } => remaining,
            PendingChange::Convert { remaining, .. } => remaining,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Block {
    pub(crate) id: BlockId,
    pub(crate) x: i32,
    pub(crate) y: i32,
    pub(crate) position: Vec2,
    definition: Option<BlockDefinition>,
    is_active: bool,
    movement: Movement,
    previous_movement: Movement,
    is_being_removed: bool,
    pending: Option<PendingChange>,
    pub(crate) left: Option<BlockId>,
    pub(crate) right: Option<BlockId>,

    can_combo: bool,
    can_move: bool,
    is_destructable: bool,

    pub(crate) fall_momentum: f32,
    /// Ticks spent in the current fall
    pub(crate) fall_duration: f32,
    pub(crate) chainable: bool,
    /// Ticks since the last movement change
    pub(crate) frame_count: u32,
    pub(crate) previous_x: i32,
    pub(crate) previous_y: i32,
    pub(crate) direction_x: i32,
    pub(crate) fall_target: i32,
    /// Bumped whenever a garbage link touching this block changes
    pub(crate) edge_revision: u32,
}

impl Block {
    pub(crate) fn new(id: BlockId, x: i32, y: i32) -> Self {
        Self {
            id,
            x,
            y,
            position: Vec2::new(x as f32, y as f32),
            definition: None,
            is_active: false,
            movement: Movement::None,
            previous_movement: Movement::None,
            is_being_removed: false,
            pending: None,
            left: None,
            right: None,
            can_combo: false,
            can_move: false,
            is_destructable: false,
            fall_momentum: 0.0,
            fall_duration: 0.0,
            chainable: false,
            frame_count: 0,
            previous_x: x,
            previous_y: y,
            direction_x: 0,
            fall_target: y,
            edge_revision: 0,
        }
    }

    fn refresh_flags(&mut self) {
        let idle = self.is_active && !self.is_being_removed && self.pending.is_none();
        let color = matches!(self.definition, Some(d) if !d.is_garbage);

        self.can_combo = idle && self.movement == Movement::None && color;
        self.can_move =
            idle && color && matches!(self.movement, Movement::None | Movement::Wait);
        self.is_destructable =
            idle && self.definition.is_some() && self.movement != Movement::Fall;
    }

    /// Replace the block's identity. Clears removal state and chain eligibility.
    pub fn set_definition(&mut self, definition: BlockDefinition, active: bool) {
        self.empty();
        self.definition = Some(definition);
        self.is_active = active;
        self.refresh_flags();
    }

    /// Clear the cell. Links are the grid's business and stay untouched.
    pub fn empty(&mut self) {
        self.definition = None;
        self.is_being_removed = false;
        self.pending = None;
        self.chainable = false;
        self.fall_momentum = 0.0;
        self.fall_duration = 0.0;
        self.set_movement(Movement::None);
        self.refresh_flags();
    }

    pub fn set_active(&mut self, active: bool) {
        self.is_active = active;
        self.refresh_flags();
    }

    pub fn set_movement(&mut self, movement: Movement) {
        if movement != self.movement {
            self.previous_movement = self.movement;
            self.frame_count = 0;
        }
        self.movement = movement;
        self.refresh_flags();
    }

    pub(crate) fn mark_removing(&mut self) {
        self.is_being_removed = true;
        self.refresh_flags();
    }

    /// Empty now when `delay <= 0`, otherwise stay in removal until the delay runs out.
    /// Returns true if the block was emptied immediately.
    pub fn empty_with_animation(&mut self, delay: f32) -> bool {
        if delay <= 0.0 {
            self.empty();
            return true;
        }
        self.is_being_removed = true;
        self.pending = Some(PendingChange::Empty { remaining: delay });
        self.refresh_flags();
        false
    }

    /// Turn this (garbage) block into `definition`, member `index` of a batch of `total`.
    /// Returns true if the conversion happened immediately.
    pub fn convert_to(
        &mut self,
        index: usize,
        total: usize,
        definition: BlockDefinition,
        delay: f32,
    ) -> bool {
        let momentum = CONVERSION_MOMENTUM * (index + 1) as f32 / total.max(1) as f32;
        if delay <= 0.0 {
            self.finish_conversion(definition, momentum);
            return true;
        }
        self.fall_momentum = momentum;
        self.pending = Some(PendingChange::Convert {
            remaining: delay,
            definition,
        });
        self.refresh_flags();
        false
    }

    pub(crate) fn finish_conversion(&mut self, definition: BlockDefinition, momentum: f32) {
        self.set_definition(definition, true);
        self.frame_count = 0;
        self.fall_momentum = momentum;
        self.chainable = !definition.is_garbage;
    }

    /// Count down a scheduled change; returns it once it is due.
    pub(crate) fn tick_pending(&mut self, elapsed: f32) -> Option<PendingChange> {
        let pending = self.pending.as_mut()?;
        let remaining = pending.remaining_mut();
        *remaining -= elapsed;
        if *remaining > 0.0 {
            return None;
        }
        let due = *pending;
        self.pending = None;
        self.refresh_flags();
        Some(due)
    }

    /// Shift one row up (scroll ding)
    pub fn line_up(&mut self) {
        self.y += 1;
        self.previous_y += 1;
        self.position.y += 1.0;
        self.fall_target += 1;
    }

    /// Falling and still more than one cell above the landing row
    pub fn interruptable_fall(&self) -> bool {
        self.movement == Movement::Fall && self.position.y - self.fall_target as f32 > 1.0
    }

    pub fn id(&self) -> BlockId {
        self.id
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn definition(&self) -> Option<BlockDefinition> {
        self.definition
    }

    pub fn code(&self) -> i32 {
        self.definition.map_or(EMPTY_CODE, |d| d.code())
    }

    pub fn is_empty(&self) -> bool {
        self.definition.is_none()
    }

    pub fn is_garbage(&self) -> bool {
        matches!(self.definition, Some(d) if d.is_garbage)
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn movement(&self) -> Movement {
        self.movement
    }

    pub fn previous_movement(&self) -> Movement {
        self.previous_movement
    }

    pub fn is_being_removed(&self) -> bool {
        self.is_being_removed
    }

    pub fn pending(&self) -> Option<PendingChange> {
        self.pending
    }

    /// Being removed or waiting on a conversion
    pub fn is_busy(&self) -> bool {
        self.is_being_removed || self.pending.is_some()
    }

    pub fn can_combo(&self) -> bool {
        self.can_combo
    }

    pub fn can_move(&self) -> bool {
        self.can_move
    }

    pub fn is_destructable(&self) -> bool {
        self.is_destructable
    }

    pub fn left(&self) -> Option<BlockId> {
        self.left
    }

    pub fn right(&self) -> Option<BlockId> {
        self.right
    }

    pub fn chainable(&self) -> bool {
        self.chainable
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    pub fn fall_momentum(&self) -> f32 {
        self.fall_momentum
    }

    pub fn fall_duration(&self) -> f32 {
        self.fall_duration
    }

    pub fn fall_target(&self) -> i32 {
        self.fall_target
    }

    pub fn previous_cell(&self) -> (i32, i32) {
        (self.previous_x, self.previous_y)
    }

    pub fn direction_x(&self) -> i32 {
        self.direction_x
    }

    pub fn edge_revision(&self) -> u32 {
        self.edge_revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn colored(id: u8) -> Block {
        let mut b = Block::new(BlockId(0), 2, 3);
        b.set_definition(BlockDefinition::color(id), true);
        b
    }

    #[test]
    fn fresh_block_is_empty_and_inert() {
        let b = Block::new(BlockId(4), 1, -1);
        assert!(b.is_empty());
        assert!(!b.can_combo());
        assert!(!b.can_move());
        assert!(!b.is_destructable());
        assert_eq!(b.position(), Vec2::new(1.0, -1.0));
    }

    #[test]
    fn flags_follow_movement() {
        let mut b = colored(1);
        assert!(b.can_combo() && b.can_move() && b.is_destructable());

        b.set_movement(Movement::Wait);
        assert!(!b.can_combo());
        assert!(b.can_move());

        b.set_movement(Movement::Fall);
        assert!(!b.can_move());
        assert!(!b.is_destructable());

        b.set_movement(Movement::Horizontal);
        assert!(!b.can_move());
        assert!(b.is_destructable());
    }

    #[test]
    fn inactive_blocks_do_nothing() {
        let mut b = Block::new(BlockId(0), 0, -1);
        b.set_definition(BlockDefinition::color(2), false);
        assert!(!b.can_combo() && !b.can_move() && !b.is_destructable());
        b.set_active(true);
        assert!(b.can_combo());
    }

    #[test]
    fn garbage_is_destructable_but_never_combos_or_moves() {
        let mut b = Block::new(BlockId(0), 0, 0);
        b.set_definition(BlockDefinition::garbage(), true);
        assert!(b.is_garbage());
        assert!(!b.can_combo());
        assert!(!b.can_move());
        assert!(b.is_destructable());
    }

    #[test]
    fn movement_change_resets_frame_count() {
        let mut b = colored(1);
        b.frame_count = 10;
        b.set_movement(Movement::None);
        assert_eq!(b.frame_count(), 10);
        b.set_movement(Movement::Fall);
        assert_eq!(b.frame_count(), 0);
        assert_eq!(b.previous_movement(), Movement::None);
    }

    #[test]
    fn delayed_empty_keeps_block_busy() {
        let mut b = colored(3);
        b.mark_removing();
        assert!(!b.empty_with_animation(0.2));
        assert!(b.is_busy());
        assert!(!b.is_destructable());

        assert!(b.tick_pending(0.1).is_none());
        assert!(matches!(
            b.tick_pending(0.15),
            Some(PendingChange::Empty { .. })
        ));
        assert!(b.pending().is_none());
        assert!(b.is_being_removed());
    }

    #[test]
    fn immediate_empty() {
        let mut b = colored(3);
        b.chainable = true;
        assert!(b.empty_with_animation(0.0));
        assert!(b.is_empty());
        assert!(!b.chainable());
    }

    #[test]
    fn conversion_momentum_scales_with_batch_index() {
        let mut first = Block::new(BlockId(0), 0, 0);
        first.set_definition(BlockDefinition::garbage(), true);
        assert!(first.convert_to(0, 4, BlockDefinition::color(2), 0.0));
        assert_eq!(first.code(), 2);
        assert!(first.chainable());
        assert!((first.fall_momentum() - CONVERSION_MOMENTUM * 0.25).abs() < 1e-6);

        let mut last = Block::new(BlockId(1), 3, 0);
        last.set_definition(BlockDefinition::garbage(), true);
        assert!(!last.convert_to(3, 4, BlockDefinition::color(2), 0.5));
        assert!(last.is_garbage());
        assert!(last.is_busy());
        assert!((last.fall_momentum() - CONVERSION_MOMENTUM).abs() < 1e-6);
    }

    #[test]
    fn line_up_moves_everything_one_row() {
        let mut b = colored(1);
        b.line_up();
        assert_eq!(b.y(), 4);
        assert_eq!(b.previous_cell().1, 4);
        assert_eq!(b.position().y, 4.0);
        assert_eq!(b.fall_target(), 4);
    }

    #[test]
    fn interruptable_only_while_high_above_target() {
        let mut b = colored(1);
        b.set_movement(Movement::Fall);
        b.fall_target = 0;
        b.position.y = 3.0;
        assert!(b.interruptable_fall());
        b.position.y = 0.5;
        assert!(!b.interruptable_fall());
        b.set_movement(Movement::None);
        b.position.y = 3.0;
        assert!(!b.interruptable_fall());
    }
}
