//! Combo detection, chains and the scroll freeze.

use rustc_hash::FxHashMap;

use panel_clash_types::{ComboEvent, GridEvent, Movement, MIN_COMBO_AGE_FRAMES, MIN_COMBO_LEN};

use super::Grid;
use crate::block::BlockId;

impl Grid {
    fn combo_key(&self, x: i32, y: i32) -> Option<(BlockId, u8)> {
        let id = self.id_at(x, y)?;
        let block = self.block_ref(id);
        if !block.can_combo() || block.frame_count() < MIN_COMBO_AGE_FRAMES {
            return None;
        }
        block.definition().map(|d| (id, d.id))
    }

    /// Runs of 3+ along rows, then along columns
    fn find_runs(&self) -> Vec<Vec<BlockId>> {
        let width = self.config.width as i32;
        let height = self.config.height as i32;
        let mut runs = Vec::new();
        for y in 0..height {
            self.scan_line((0..width).map(|x| (x, y)), &mut runs);
        }
        for x in 0..width {
            self.scan_line((0..height).map(|y| (x, y)), &mut runs);
        }
        runs
    }

    fn scan_line(&self, cells: impl Iterator<Item = (i32, i32)>, runs: &mut Vec<Vec<BlockId>>) {
        let mut current: Vec<BlockId> = Vec::new();
        let mut color: Option<u8> = None;
        for (x, y) in cells {
            match self.combo_key(x, y) {
                Some((id, c)) if color == Some(c) => current.push(id),
                key => {
                    if current.len() >= MIN_COMBO_LEN {
                        runs.push(std::mem::take(&mut current));
                    }
                    current.clear();
                    color = key.map(|(_, c)| c);
                    if let Some((id, _)) = key {
                        current.push(id);
                    }
                }
            }
        }
        if current.len() >= MIN_COMBO_LEN {
            runs.push(current);
        }
    }

    pub(crate) fn detect_combos(&mut self) {
        let runs = self.find_runs();
        if runs.is_empty() {
            return;
        }
        for combo in merge_runs(runs) {
            self.resolve_combo(combo);
        }
    }

    fn resolve_combo(&mut self, mut cells: Vec<BlockId>) {
        cells.sort_by_key(|id| {
            let b = self.block_ref(*id);
            (-b.y, b.x)
        });
        let Some(definition) = cells.first().and_then(|id| self.block_ref(*id).definition()) else {
            return;
        };

        let is_chain = cells.iter().any(|id| self.block_ref(*id).chainable);
        self.chain = if is_chain {
            self.chain.max(1) + 1
        } else {
            self.chain.max(1)
        };

        for id in &cells {
            self.block_mut(*id).mark_removing();
        }
        let coords: Vec<(i32, i32)> = cells
            .iter()
            .map(|id| {
                let b = self.block_ref(*id);
                (b.x, b.y)
            })
            .collect();

        let mut garbage: Vec<BlockId> = Vec::new();
        for &(x, y) in &coords {
            for (nx, ny) in [(x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)] {
                let Some(n) = self.id_at(nx, ny) else {
                    continue;
                };
                let neighbor = self.block_ref(n);
                if neighbor.is_garbage() && neighbor.is_destructable() {
                    let leader = self.leftest(n);
                    if !garbage.contains(&leader) {
                        garbage.push(leader);
                    }
                }
            }
        }

        for &(x, y) in &coords {
            self.propagate_chainable(x, y + 1);
        }

        let size = cells.len();
        self.freeze(
            self.config.combo_freeze_seconds
                + self.config.combo_freeze_per_block_seconds * size as f32,
        );

        self.events.push(GridEvent::ComboDetected(ComboEvent {
            definition: definition.id,
            cells: coords.clone(),
            chain: self.chain,
            is_chain,
            garbage_broken: garbage.len(),
        }));

        for leader in garbage {
            self.break_group(leader, Some(definition.id));
        }

        for (index, id) in cells.into_iter().enumerate() {
            let delay = self.animator.on_empty(coords[index], index, size);
            if delay <= 0.0 {
                self.empty_block(id);
            } else {
                self.block_mut(id).empty_with_animation(delay);
            }
        }
    }

    /// Mark the contiguous colored blocks from `(x, from_y)` upward as chainable
    pub(crate) fn propagate_chainable(&mut self, x: i32, from_y: i32) {
        let height = self.config.height as i32;
        for y in from_y..height {
            let Some(id) = self.id_at(x, y) else {
                break;
            };
            let block = self.block_mut(id);
            if block.is_empty() || block.is_garbage() || block.is_busy() {
                break;
            }
            block.chainable = true;
        }
    }

    pub(crate) fn track_chain_end(&mut self) {
        if self.chain == 0 {
            return;
        }
        let running = self
            .blocks
            .iter()
            .any(|b| b.chainable || b.is_busy() || b.movement() == Movement::Fall);
        if !running {
            self.events.push(GridEvent::ChainEnded { length: self.chain });
            self.chain = 0;
        }
    }

    /// Hold the scroll for at least `duration` seconds
    pub fn freeze(&mut self, duration: f32) {
        self.freeze_cooldown = self.freeze_cooldown.max(duration);
    }

    /// Cancel a running freeze
    pub fn warm(&mut self) {
        if self.freeze_cooldown > 0.0 {
            self.freeze_cooldown = 0.0;
            self.end_freeze();
        }
    }

    pub(crate) fn decay_freeze(&mut self, elapsed: f32) {
        if self.freeze_cooldown <= 0.0 {
            return;
        }
        self.freeze_cooldown -= elapsed;
        if self.freeze_cooldown <= 0.0 {
            self.freeze_cooldown = 0.0;
            self.end_freeze();
        }
    }

    fn end_freeze(&mut self) {
        self.multiplier_frame += 1;
        self.events.push(GridEvent::FreezeEnded {
            multiplier_frame: self.multiplier_frame,
        });
    }
}

/// Merge runs that share a block, keeping first-seen order
fn merge_runs(runs: Vec<Vec<BlockId>>) -> Vec<Vec<BlockId>> {
    let mut groups: Vec<Vec<BlockId>> = Vec::new();
    let mut owner: FxHashMap<BlockId, usize> = FxHashMap::default();

    for run in runs {
        let mut target: Option<usize> = None;
        for id in &run {
            let Some(&group) = owner.get(id) else {
                continue;
            };
            match target {
                None => target = Some(group),
                Some(t) if t != group => {
                    let moved = std::mem::take(&mut groups[group]);
                    for m in &moved {
                        owner.insert(*m, t);
                    }
                    groups[t].extend(moved);
                }
                Some(_) => {}
            }
        }

        let t = match target {
            Some(t) => t,
            None => {
                groups.push(Vec::new());
                groups.len() - 1
            }
        };
        for id in run {
            if !owner.contains_key(&id) {
                owner.insert(id, t);
                groups[t].push(id);
            }
        }
    }

    groups.retain(|g| !g.is_empty());
    groups
}
