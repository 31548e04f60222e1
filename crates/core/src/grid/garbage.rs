//! Garbage groups: spawning into the top row and breaking into colors.

use arrayvec::ArrayVec;

use panel_clash_types::{GridAnomaly, GridEvent, Movement};

use super::Grid;
use crate::block::BlockId;

impl Grid {
    fn slot_free(&self, x: i32, y: i32) -> bool {
        matches!(
            self.get(x, y),
            Some(b) if b.is_empty() && !b.is_busy() && b.movement() == Movement::None
        )
    }

    /// Column where a garbage group of `width` cells fits in the top row.
    ///
    /// The widest free run wins (ties drawn at random); the group is shifted at
    /// random within any spare room of that run.
    pub fn can_add_garbage(&mut self, width: usize) -> Option<i32> {
        if width == 0 {
            self.push_anomaly(GridAnomaly::ZeroWidthGarbage);
            return None;
        }
        if width > self.config.width {
            return None;
        }

        let y = self.config.height as i32 - 1;
        let board_width = self.config.width as i32;
        let mut runs: Vec<(i32, usize)> = Vec::new();
        let mut start: Option<i32> = None;
        for x in 0..=board_width {
            let free = x < board_width && self.slot_free(x, y);
            match (free, start) {
                (true, None) => start = Some(x),
                (false, Some(s)) => {
                    runs.push((s, (x - s) as usize));
                    start = None;
                }
                _ => {}
            }
        }

        let widest = runs.iter().map(|r| r.1).max()?;
        if widest < width {
            return None;
        }
        let candidates: Vec<(i32, usize)> = runs.into_iter().filter(|r| r.1 == widest).collect();
        let &(start, len) = self.random.choose(&candidates)?;
        let shift = self.random.range_usize(0, len - width + 1);
        Some(start + shift as i32)
    }

    /// Spawn a linked garbage group in the top row starting at column `x`.
    /// Returns the leftmost member.
    pub fn add_garbage(&mut self, width: usize, x: i32) -> Option<BlockId> {
        if width == 0 {
            self.push_anomaly(GridAnomaly::ZeroWidthGarbage);
            return None;
        }
        let y = self.config.height as i32 - 1;
        for cx in x..x + width as i32 {
            if !self.slot_free(cx, y) {
                self.push_anomaly(GridAnomaly::GarbageSlotOccupied { x: cx, y });
                return None;
            }
        }

        let members: Vec<BlockId> = (x..x + width as i32)
            .filter_map(|cx| self.id_at(cx, y))
            .collect();
        let spawn_y = y as f32 + self.config.garbage_spawn_offset;
        let garbage = self.garbage;
        for id in &members {
            let block = self.block_mut(*id);
            block.set_definition(garbage, true);
            block.position.y = spawn_y;
            block.fall_target = y;
            block.fall_duration = 0.0;
            block.set_movement(Movement::Fall);
        }
        for pair in members.windows(2) {
            self.link(pair[0], pair[1]);
        }

        self.events.push(GridEvent::GarbageAdded { x, y, width });
        members.first().copied()
    }

    /// Break the garbage group containing `id`
    pub fn break_garbage(&mut self, id: BlockId) -> bool {
        if self.block(id).is_none() {
            return false;
        }
        let leader = self.leftest(id);
        self.break_group(leader, None)
    }

    /// Unlink the group and convert every member. `exclude` is the color that broke it.
    pub(crate) fn break_group(&mut self, leader: BlockId, exclude: Option<u8>) -> bool {
        let members = self.group_members(leader);
        if members.is_empty() || !self.block_ref(members[0]).is_garbage() {
            return false;
        }

        for id in &members {
            let block = self.block_mut(*id);
            block.left = None;
            block.right = None;
            block.edge_revision += 1;
        }

        let total = members.len();
        let surprise = if total > 1 && total == self.config.width {
            Some(self.random.range_usize(0, total))
        } else {
            None
        };

        let (first_x, y) = {
            let b = self.block_ref(members[0]);
            (b.x, b.y)
        };
        let mut previous: Option<u8> = None;
        for (index, id) in members.iter().enumerate() {
            let (x, y) = {
                let b = self.block_ref(*id);
                (b.x, b.y)
            };
            let definition = if surprise == Some(index) {
                self.garbage
            } else {
                let mut extra: ArrayVec<u8, 2> = ArrayVec::new();
                extra.extend(exclude);
                extra.extend(previous);
                self.random_definition(x, y, &extra)
            };
            previous = (!definition.is_garbage).then_some(definition.id);

            let delay = self.animator.on_conversion((x, y), index, total);
            self.block_mut(*id).convert_to(index, total, definition, delay);
        }

        self.events.push(GridEvent::GarbageBroken {
            x: first_x,
            y,
            width: total,
        });
        true
    }
}
