//! Scrolling: the stack rises one row per ding and emptied rows come back as previews.

use panel_clash_types::{GridAnomaly, GridEvent, Movement, Vec2};

use super::Grid;
use crate::block::{Block, BlockId};

impl Grid {
    /// A block has come to rest in the top row. Garbage still dropping in
    /// from above does not count.
    pub fn is_topped_out(&self) -> bool {
        self.top_row_any(|b| b.movement() != Movement::Fall)
    }

    fn top_row_any(&self, pred: impl Fn(&Block) -> bool) -> bool {
        let y = self.config.height as i32 - 1;
        (0..self.config.width as i32).any(|x| {
            self.get(x, y)
                .map_or(false, |b| b.is_active() && !b.is_empty() && pred(b))
        })
    }

    fn has_pending_removal(&self) -> bool {
        self.blocks.iter().any(|b| b.is_busy())
    }

    pub(crate) fn apply_scroll(&mut self, scroll: f32) {
        if !scroll.is_finite() {
            self.push_anomaly(GridAnomaly::NonFiniteScroll);
            return;
        }
        // Falling blocks in the top row hold the stack too.
        if scroll <= 0.0
            || self.is_frozen()
            || self.top_row_any(|_| true)
            || self.has_pending_removal()
        {
            return;
        }

        self.previous_scroll_value = self.scroll_value;
        self.scroll_value += scroll;
        self.scroll_since_last_ding += scroll;

        while self.scroll_since_last_ding >= 1.0 {
            if self.top_row_any(|_| true) {
                let overflow = self.scroll_since_last_ding - 1.0;
                self.scroll_value -= overflow;
                self.scroll_since_last_ding = 1.0;
                break;
            }
            // Only one row may wait above the grid; the rest of the scroll
            // carries over until it has been recycled.
            if !self.recycle_top_row() {
                break;
            }
            self.scroll_since_last_ding -= 1.0;
            self.ding();
        }
    }

    fn ding(&mut self) {
        for block in &mut self.blocks {
            block.line_up();
            if block.y == 0 && !block.is_active() {
                block.set_active(true);
            }
        }
        self.remap();
        self.events.push(GridEvent::LineUp {
            scroll_value: self.scroll_value,
        });
    }

    /// Move an emptied row that scrolled past the top down into the preview area.
    /// Returns false while a row is still waiting above the grid.
    pub(crate) fn recycle_top_row(&mut self) -> bool {
        let y = self.config.height as i32;
        let row: Vec<BlockId> = (0..self.config.width as i32)
            .filter_map(|x| self.id_at(x, y))
            .collect();
        if row.is_empty() {
            return true;
        }
        if row.iter().any(|id| !self.block_ref(*id).is_empty()) {
            self.push_anomaly(GridAnomaly::TopRowNotEmpty { y });
            return false;
        }
        if row.iter().any(|id| {
            let b = self.block_ref(*id);
            b.is_busy() || b.movement() != Movement::None
        }) {
            return false;
        }

        let new_y = -(self.config.preview_lines as i32);
        for id in &row {
            let block = &mut self.blocks[id.0];
            let x = block.x;
            self.map.remove(&(x, y));
            block.y = new_y;
            block.previous_x = x;
            block.previous_y = new_y;
            block.position = Vec2::new(x as f32, new_y as f32);
            block.fall_target = new_y;
            block.set_active(new_y >= 0);
            self.map.insert((x, new_y), *id);
        }

        for id in &row {
            let x = self.block_ref(*id).x;
            if self.config.generate_new_lines {
                let definition = self.random_definition(x, new_y, &[]);
                self.block_mut(*id).set_definition(definition, new_y >= 0);
            } else {
                self.block_mut(*id).empty();
            }
        }

        self.events.push(GridEvent::LineGenerated { y: new_y });
        true
    }
}
