//! Per-tick motion: swaps, falls and garbage group alignment.

use panel_clash_types::{
    Direction, GridAnomaly, GridEvent, Movement, ALIGN_EPSILON, FALL_ACCELERATION,
    MIN_COMBO_AGE_FRAMES,
};

use super::Grid;
use crate::block::BlockId;

/// Outcome of a swap request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MoveResult {
    pub success: bool,
    /// Block that was at the requested cell
    pub first: Option<BlockId>,
    /// Block that was at the neighboring cell in the swap direction
    pub second: Option<BlockId>,
    pub first_origin: (i32, i32),
    pub second_origin: (i32, i32),
}

impl Grid {
    /// Swap the block at `(x, y)` with its neighbor in `direction`.
    pub fn move_block(&mut self, x: i32, y: i32, direction: Direction) -> MoveResult {
        let other_x = x + direction.dx();
        let mut result = MoveResult {
            first_origin: (x, y),
            second_origin: (other_x, y),
            ..MoveResult::default()
        };

        let width = self.config.width as i32;
        let height = self.config.height as i32;
        if x < 0 || other_x < 0 || x >= width || other_x >= width || y < 0 || y >= height {
            return result;
        }
        let (Some(first), Some(second)) = (self.id_at(x, y), self.id_at(other_x, y)) else {
            return result;
        };
        result.first = Some(first);
        result.second = Some(second);

        let (a, b) = (self.block_ref(first), self.block_ref(second));
        if a.is_empty() && b.is_empty() {
            return result;
        }
        if a.is_garbage() || b.is_garbage() {
            if !a.is_empty() && !b.is_empty() {
                self.push_anomaly(GridAnomaly::GarbageSwap { x, y, other_x });
            }
            return result;
        }
        if !self.swappable(first) || !self.swappable(second) {
            return result;
        }

        self.swap_horizontal(first, second, direction);
        result.success = true;
        result
    }

    /// Same as [`Grid::move_block`], addressed by handle
    pub fn move_id(&mut self, id: BlockId, direction: Direction) -> MoveResult {
        match self.block(id) {
            Some(block) => {
                let (x, y) = (block.x, block.y);
                self.move_block(x, y, direction)
            }
            None => MoveResult::default(),
        }
    }

    fn swappable(&self, id: BlockId) -> bool {
        let block = self.block_ref(id);
        if !block.is_active() || block.is_busy() {
            return false;
        }
        if block.is_empty() {
            return matches!(block.movement(), Movement::None | Movement::Wait);
        }
        block.can_move() || block.interruptable_fall()
    }

    fn swap_horizontal(&mut self, first: BlockId, second: BlockId, direction: Direction) {
        let dx = direction.dx();
        for (id, dir) in [(first, dx), (second, -dx)] {
            let block = self.block_mut(id);
            if block.movement() == Movement::Fall {
                block.position.y = block.y as f32;
                block.fall_duration = 0.0;
                block.fall_target = block.y;
            }
            block.previous_x = block.x;
            block.previous_y = block.y;
            block.x += dir;
            block.direction_x = dir;
            block.chainable = false;
            block.set_movement(Movement::Horizontal);
            let key = (block.x, block.y);
            self.map.insert(key, id);
        }
    }

    /// Start a fall right away if there is room below. Returns false otherwise.
    pub fn force_fall(&mut self, id: BlockId) -> bool {
        if self.block(id).is_none() {
            return false;
        }
        let members = self.group_members(id);
        let leader = self.block_ref(members[0]);
        if leader.is_empty()
            || !leader.is_active()
            || leader.is_busy()
            || !matches!(leader.movement(), Movement::None | Movement::Wait)
        {
            return false;
        }
        let depth = self.fall_depth(&members);
        if depth <= 0 {
            return false;
        }
        self.start_fall(&members, depth);
        true
    }

    pub(crate) fn physics(&mut self, elapsed: f32) {
        let mut order: Vec<BlockId> = self.blocks.iter().map(|b| b.id).collect();
        order.sort_by_key(|id| {
            let b = &self.blocks[id.0];
            (b.y, b.x)
        });
        for block in &mut self.blocks {
            block.frame_count = block.frame_count.saturating_add(1);
        }

        for id in order {
            let block = self.block_ref(id);
            if block.movement() == Movement::Horizontal {
                self.step_horizontal(id, elapsed);
                continue;
            }
            if block.is_empty() {
                if block.movement() != Movement::None {
                    self.block_mut(id).set_movement(Movement::None);
                }
                continue;
            }
            if !block.is_active() || block.is_busy() {
                continue;
            }
            if block.left.is_some() {
                self.follow_leader(id);
                continue;
            }
            self.step_vertical(id, elapsed);
        }
    }

    fn step_horizontal(&mut self, id: BlockId, elapsed: f32) {
        let speed = self.config.moving_speed.x;
        let block = self.block_mut(id);
        let dir = block.direction_x as f32;
        block.position.x += dir * speed * elapsed;
        let remaining = (block.x as f32 - block.position.x) * dir;
        if block.direction_x == 0 || remaining <= ALIGN_EPSILON {
            block.position.x = block.x as f32;
            block.set_movement(Movement::Wait);
        }
    }

    fn step_vertical(&mut self, id: BlockId, elapsed: f32) {
        let members = self.group_members(id);
        let leader = self.block_ref(id);
        let (x, y, movement) = (leader.x, leader.y, leader.movement());

        match movement {
            Movement::None | Movement::Wait => {
                let depth = self.fall_depth(&members);
                if depth > 0 {
                    self.start_fall(&members, depth);
                } else if movement == Movement::Wait {
                    for m in &members {
                        self.block_mut(*m).set_movement(Movement::None);
                    }
                } else if leader.chainable
                    && leader.frame_count > MIN_COMBO_AGE_FRAMES
                    && !self.supported_by_busy(x, y)
                {
                    for m in &members {
                        self.block_mut(*m).chainable = false;
                    }
                }
            }
            Movement::Fall => self.integrate_fall(&members, elapsed),
            Movement::Horizontal => {}
        }
    }

    fn start_fall(&mut self, members: &[BlockId], depth: i32) {
        for m in members {
            let block = self.block_mut(*m);
            block.fall_target = block.y - depth;
            block.fall_duration = 0.0;
            block.set_movement(Movement::Fall);
        }
    }

    fn integrate_fall(&mut self, members: &[BlockId], elapsed: f32) {
        let Some(&leader) = members.first() else {
            return;
        };
        let depth = self.fall_depth(members);
        let base_speed = self.config.moving_speed.y;

        let block = self.block_mut(leader);
        let mut y = block.y;
        let target = y - depth;
        block.fall_duration += 1.0;
        let duration = block.fall_duration;
        let speed = base_speed * (1.0 + FALL_ACCELERATION * duration) + block.fall_momentum;
        let mut new_pos = (block.position.y - speed * elapsed).max(target as f32);

        while new_pos <= (y - 1) as f32 + ALIGN_EPSILON {
            if !self.can_descend(members) {
                new_pos = new_pos.max(y as f32);
                break;
            }
            self.descend(members);
            y -= 1;
        }

        for m in members {
            let block = self.block_mut(*m);
            block.position.y = new_pos;
            block.fall_target = target;
            block.fall_duration = duration;
        }

        if y == target && new_pos <= target as f32 + ALIGN_EPSILON {
            self.stop_and_align(members);
        }
    }

    /// Empty cells below the group before the first obstruction.
    /// Falling blocks are passed through without being counted.
    pub(crate) fn fall_depth(&self, members: &[BlockId]) -> i32 {
        members
            .iter()
            .map(|m| {
                let b = self.block_ref(*m);
                self.column_depth(b.x, b.y)
            })
            .min()
            .unwrap_or(0)
    }

    fn column_depth(&self, x: i32, y: i32) -> i32 {
        let mut depth = 0;
        let mut cy = y - 1;
        while cy >= 0 {
            let Some(below) = self.get(x, cy) else {
                break;
            };
            if below.is_busy() {
                break;
            }
            if below.is_empty() {
                if below.movement() == Movement::Horizontal {
                    break;
                }
                depth += 1;
            } else if below.movement() != Movement::Fall {
                break;
            }
            cy -= 1;
        }
        depth
    }

    fn can_descend(&self, members: &[BlockId]) -> bool {
        members.iter().all(|m| {
            let b = self.block_ref(*m);
            b.y > 0
                && matches!(
                    self.get(b.x, b.y - 1),
                    Some(below) if below.is_empty()
                        && !below.is_busy()
                        && below.movement() != Movement::Horizontal
                )
        })
    }

    /// Swap every member with the empty cell below it
    fn descend(&mut self, members: &[BlockId]) {
        for m in members {
            let (x, y) = {
                let b = self.block_ref(*m);
                (b.x, b.y)
            };
            let Some(below) = self.id_at(x, y - 1) else {
                continue;
            };

            let block = self.block_mut(*m);
            block.previous_y = y;
            block.y = y - 1;

            let empty = self.block_mut(below);
            empty.previous_y = y - 1;
            empty.y = y;
            empty.position.x = x as f32;
            empty.position.y = y as f32;
            empty.fall_target = y;

            self.map.insert((x, y - 1), *m);
            self.map.insert((x, y), below);
        }
    }

    fn stop_and_align(&mut self, members: &[BlockId]) {
        for m in members {
            let block = self.block_mut(*m);
            block.position.y = block.y as f32;
            block.fall_momentum = 0.0;
            block.fall_duration = 0.0;
            block.fall_target = block.y;
            block.set_movement(Movement::None);
            let (x, y, chainable) = (block.x, block.y, block.chainable);

            self.events.push(GridEvent::FallEnded { x, y });
            if chainable {
                self.propagate_chainable(x, y + 1);
            }
        }
    }

    /// Mirror the leader's row and motion. A follower found on another row is
    /// forced back by swapping with whatever sits on the leader's row.
    fn follow_leader(&mut self, id: BlockId) {
        let leader = self.leftest(id);
        let lead = self.block_ref(leader);
        let (leader_y, position_y, movement, duration, momentum, target) = (
            lead.y,
            lead.position.y,
            lead.movement(),
            lead.fall_duration,
            lead.fall_momentum,
            lead.fall_target,
        );

        let (x, y) = {
            let b = self.block_ref(id);
            (b.x, b.y)
        };
        if y != leader_y {
            self.push_anomaly(GridAnomaly::GroupMisaligned { x, y, leader_y });
            if let Some(other) = self.id_at(x, leader_y) {
                let displaced = self.block_mut(other);
                displaced.y = y;
                displaced.position.y = y as f32;
                displaced.fall_target = y;
                self.map.insert((x, y), other);
            }
            self.block_mut(id).y = leader_y;
            self.map.insert((x, leader_y), id);
        }

        let block = self.block_mut(id);
        block.position.y = position_y;
        block.fall_duration = duration;
        block.fall_momentum = momentum;
        block.fall_target = target;
        block.set_movement(movement);
    }

    /// Whether the column under `(x, y)` contains a block still being cleared
    fn supported_by_busy(&self, x: i32, y: i32) -> bool {
        let mut cy = y - 1;
        while cy >= 0 {
            match self.get(x, cy) {
                Some(b) if b.is_busy() => return true,
                Some(b) if !b.is_empty() => cy -= 1,
                _ => return false,
            }
        }
        false
    }
}
