//! Grid module - the scrolling playfield
//!
//! The grid owns every [`Block`] in an arena and a position map from `(x, y)`
//! to arena handle. Rows `-preview_lines..height` always hold one block per
//! cell; clearing empties blocks in place and scrolling recycles the emptied
//! top row into the preview area.
//!
//! # Tick order
//!
//! [`Grid::update`] runs, in this order:
//!
//! 1. combo detection (runs of 3+ resting blocks, merged when they share a cell)
//! 2. staggered empties and conversions that came due
//! 3. freeze decay
//! 4. top-row recycling
//! 5. physics, cell by cell from the bottom row up
//! 6. scroll and dings
//! 7. remap, highest-row and chain bookkeeping
//!
//! Later steps rely on the earlier ones having run. Everything observable
//! happens through the event queue drained by [`Grid::take_events`].
//!
//! # Example
//!
//! ```
//! use panel_clash_core::{Grid, GridConfig};
//!
//! let mut grid = Grid::from_text("1 1 1 0", GridConfig::default(), 7).unwrap();
//! for _ in 0..10 {
//!     grid.update(0.0, 1.0 / 60.0, true, true);
//! }
//! assert_eq!(grid.to_text(), "0 0 0 0");
//! ```

mod combo;
mod garbage;
mod physics;
mod scroll;

use std::collections::BTreeMap;

use arrayvec::ArrayVec;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use panel_clash_types::{
    default_palette, format_board, BlockDefinition, BoardText, CellToken, GridAnomaly, GridEvent,
    IntGrid, Movement, ParseBoardError, Vec2, COMBO_FREEZE_PER_BLOCK_SECONDS,
    COMBO_FREEZE_SECONDS, DEFAULT_HEIGHT, DEFAULT_MOVING_SPEED, DEFAULT_PREVIEW_LINES,
    DEFAULT_WIDTH, GARBAGE_SPAWN_OFFSET, IRRELEVANT_CODE, MIN_COMBO_LEN,
};

use crate::animation::{BlockAnimator, NoAnimation};
use crate::block::{Block, BlockId, PendingChange};
use crate::rng::GameRandom;

pub use physics::MoveResult;

/// Grid construction parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub width: usize,
    pub height: usize,
    pub preview_lines: usize,
    /// Rows filled at random by [`Grid::new`]
    pub initial_lines: usize,
    /// Swap speed (`x`) and base fall speed (`y`), cells per second
    pub moving_speed: Vec2,
    /// Refill recycled rows with random blocks
    pub generate_new_lines: bool,
    pub combo_freeze_seconds: f32,
    pub combo_freeze_per_block_seconds: f32,
    pub garbage_spawn_offset: f32,
    pub level: u32,
    pub palette: Vec<BlockDefinition>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            preview_lines: DEFAULT_PREVIEW_LINES,
            initial_lines: 5,
            moving_speed: DEFAULT_MOVING_SPEED,
            generate_new_lines: true,
            combo_freeze_seconds: COMBO_FREEZE_SECONDS,
            combo_freeze_per_block_seconds: COMBO_FREEZE_PER_BLOCK_SECONDS,
            garbage_spawn_offset: GARBAGE_SPAWN_OFFSET,
            level: 0,
            palette: default_palette(),
        }
    }
}

/// Whether any combo can still be made from the colors on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GridClearState {
    Playable,
    Empty,
    NoComboPossible,
}

impl GridClearState {
    pub fn code(&self) -> i32 {
        match self {
            GridClearState::Playable => 0,
            GridClearState::Empty => 1,
            GridClearState::NoComboPossible => -2,
        }
    }
}

/// Scripted initial content, keyed by `(x, y)`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Preload {
    cells: BTreeMap<(i32, i32), BlockDefinition>,
}

impl Preload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, x: i32, y: i32, definition: BlockDefinition) -> &mut Self {
        self.cells.insert((x, y), definition);
        self
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Convert parsed fixture text; irrelevant cells have no meaning on a live grid.
    pub fn from_board(board: &BoardText) -> Result<Self, ParseBoardError> {
        let mut preload = Self::new();
        for y in 0..board.height() {
            for x in 0..board.width() {
                match board.cell(x, y) {
                    Some(CellToken::Color(id)) => {
                        preload.insert(x as i32, y as i32, BlockDefinition::color(id));
                    }
                    Some(CellToken::Garbage) => {
                        preload.insert(x as i32, y as i32, BlockDefinition::garbage());
                    }
                    Some(CellToken::Irrelevant) => {
                        return Err(ParseBoardError::Unsupported {
                            row: board.written_row(y),
                            col: x,
                            token: "-".to_string(),
                        });
                    }
                    Some(CellToken::Empty) | None => {}
                }
            }
        }
        Ok(preload)
    }
}

#[derive(Debug)]
pub struct Grid {
    config: GridConfig,
    blocks: Vec<Block>,
    map: FxHashMap<(i32, i32), BlockId>,
    garbage: BlockDefinition,
    random: GameRandom,
    animator: Box<dyn BlockAnimator>,
    events: Vec<GridEvent>,

    scroll_value: f32,
    previous_scroll_value: f32,
    scroll_since_last_ding: f32,
    freeze_cooldown: f32,
    multiplier_frame: u32,
    highest_row: Option<i32>,
    chain: u32,
    frame: u64,
}

impl Grid {
    fn blank(config: GridConfig, seed: u64) -> Self {
        let preview = config.preview_lines as i32;
        let width = config.width as i32;
        let height = config.height as i32;

        let capacity = config.width * (config.height + config.preview_lines);
        let mut blocks = Vec::with_capacity(capacity);
        let mut map = FxHashMap::with_capacity_and_hasher(capacity, Default::default());
        for y in -preview..height {
            for x in 0..width {
                let id = BlockId(blocks.len());
                let mut block = Block::new(id, x, y);
                block.set_active(y >= 0);
                map.insert((x, y), id);
                blocks.push(block);
            }
        }

        Self {
            config,
            blocks,
            map,
            garbage: BlockDefinition::garbage(),
            random: GameRandom::new(seed),
            animator: Box::new(NoAnimation),
            events: Vec::new(),
            scroll_value: 0.0,
            previous_scroll_value: 0.0,
            scroll_since_last_ding: 0.0,
            freeze_cooldown: 0.0,
            multiplier_frame: 0,
            highest_row: None,
            chain: 0,
            frame: 0,
        }
    }

    fn fill_rows(&mut self, rows: std::ops::Range<i32>) {
        for y in rows {
            for x in 0..self.config.width as i32 {
                let definition = self.random_definition(x, y, &[]);
                if let Some(id) = self.id_at(x, y) {
                    self.blocks[id.0].set_definition(definition, y >= 0);
                }
            }
        }
    }

    /// Random board: preview rows plus `initial_lines` rows, no ready-made combos.
    pub fn new(config: GridConfig, seed: u64) -> Self {
        let mut grid = Self::blank(config, seed);
        let preview = grid.config.preview_lines as i32;
        let lines = grid.config.initial_lines.min(grid.config.height) as i32;
        let from = if grid.config.generate_new_lines { -preview } else { 0 };
        grid.fill_rows(from..lines);
        grid.refresh_highest_row();
        grid
    }

    /// Scripted board. Horizontally adjacent garbage cells become one linked group.
    pub fn with_preload(config: GridConfig, seed: u64, preload: &Preload) -> Self {
        let mut grid = Self::blank(config, seed);
        if grid.config.generate_new_lines {
            let preview = grid.config.preview_lines as i32;
            grid.fill_rows(-preview..0);
        }

        for (&(x, y), &definition) in &preload.cells {
            if y < 0 {
                continue;
            }
            if let Some(id) = grid.id_at(x, y) {
                grid.blocks[id.0].set_definition(definition, true);
            }
        }

        for y in 0..grid.config.height as i32 {
            for x in 1..grid.config.width as i32 {
                let (Some(a), Some(b)) = (grid.id_at(x - 1, y), grid.id_at(x, y)) else {
                    continue;
                };
                if grid.blocks[a.0].is_garbage() && grid.blocks[b.0].is_garbage() {
                    grid.link(a, b);
                }
            }
        }

        grid.refresh_highest_row();
        grid
    }

    /// Build from fixture text. The text decides width and height; the rest comes from `config`.
    pub fn from_text(text: &str, config: GridConfig, seed: u64) -> Result<Self, ParseBoardError> {
        let board = BoardText::parse(text)?;
        let preload = Preload::from_board(&board)?;
        let config = GridConfig {
            width: board.width(),
            height: board.height(),
            ..config
        };
        Ok(Self::with_preload(config, seed, &preload))
    }

    /// Advance one tick
    pub fn update(&mut self, scroll: f32, elapsed: f32, check_combos: bool, no_scroll: bool) {
        self.frame += 1;
        if check_combos {
            self.detect_combos();
        }
        self.advance_pending(elapsed);
        self.decay_freeze(elapsed);
        self.recycle_top_row();
        self.physics(elapsed);
        if !no_scroll {
            self.apply_scroll(scroll);
        }
        self.remap();
        self.refresh_highest_row();
        self.track_chain_end();
    }

    /// Rebuild the position map from each block's own coordinates.
    /// The first block claiming a cell keeps it; later claimants are reported.
    pub fn remap(&mut self) {
        let mut map = FxHashMap::with_capacity_and_hasher(self.blocks.len(), Default::default());
        for block in &self.blocks {
            let key = (block.x, block.y);
            if map.contains_key(&key) {
                self.events.push(GridEvent::Anomaly(GridAnomaly::DuplicateCell {
                    x: block.x,
                    y: block.y,
                }));
                continue;
            }
            map.insert(key, block.id);
        }
        self.map = map;
    }

    fn advance_pending(&mut self, elapsed: f32) {
        for index in 0..self.blocks.len() {
            match self.blocks[index].tick_pending(elapsed) {
                Some(PendingChange::Empty { .. }) => self.empty_block(BlockId(index)),
                Some(PendingChange::Convert { definition, .. }) => {
                    let block = &mut self.blocks[index];
                    let momentum = block.fall_momentum;
                    block.finish_conversion(definition, momentum);
                }
                None => {}
            }
        }
    }

    fn refresh_highest_row(&mut self) {
        let height = self.config.height as i32;
        self.highest_row = self
            .blocks
            .iter()
            .filter(|b| b.y >= 0 && b.y < height && b.is_active() && !b.is_empty())
            .map(|b| b.y)
            .max();
    }

    /// Random color for `(x, y)` that does not complete a run of three with two
    /// equal neighbors to the left, above or below. `extra` ids are excluded too.
    pub(crate) fn random_definition(&mut self, x: i32, y: i32, extra: &[u8]) -> BlockDefinition {
        let mut excluded: ArrayVec<u8, 8> = ArrayVec::new();
        let pairs = [
            ((x - 1, y), (x - 2, y)),
            ((x, y + 1), (x, y + 2)),
            ((x, y - 1), (x, y - 2)),
        ];
        for (a, b) in pairs {
            if let (Some(a), Some(b)) = (self.color_id_at(a.0, a.1), self.color_id_at(b.0, b.1)) {
                if a == b {
                    let _ = excluded.try_push(a);
                }
            }
        }
        for &id in extra {
            let _ = excluded.try_push(id);
        }

        let level = self.config.level;
        let width = self.config.width;
        let available: Vec<BlockDefinition> = self
            .config
            .palette
            .iter()
            .copied()
            .filter(|d| d.is_available(level, width))
            .collect();
        let allowed: Vec<BlockDefinition> = available
            .iter()
            .copied()
            .filter(|d| !excluded.contains(&d.id))
            .collect();

        // neighbor rules give way before the caller's exclusions do
        let pool = if !allowed.is_empty() {
            allowed
        } else {
            let relaxed: Vec<BlockDefinition> = available
                .iter()
                .copied()
                .filter(|d| !extra.contains(&d.id))
                .collect();
            if relaxed.is_empty() {
                available
            } else {
                relaxed
            }
        };
        self.random
            .choose(&pool)
            .copied()
            .unwrap_or(BlockDefinition::color(1))
    }

    fn color_id_at(&self, x: i32, y: i32) -> Option<u8> {
        let block = self.get(x, y)?;
        match block.definition() {
            Some(d) if !d.is_garbage => Some(d.id),
            _ => None,
        }
    }

    pub(crate) fn link(&mut self, left: BlockId, right: BlockId) {
        self.blocks[left.0].right = Some(right);
        self.blocks[right.0].left = Some(left);
        for id in self.group_members(left) {
            self.blocks[id.0].edge_revision += 1;
        }
    }

    /// Empty a block, detaching it from any garbage group first
    pub(crate) fn empty_block(&mut self, id: BlockId) {
        if let Some(left) = self.blocks[id.0].left.take() {
            self.blocks[left.0].right = None;
            self.blocks[left.0].edge_revision += 1;
        }
        if let Some(right) = self.blocks[id.0].right.take() {
            self.blocks[right.0].left = None;
            self.blocks[right.0].edge_revision += 1;
        }
        self.blocks[id.0].empty();
    }

    #[inline(always)]
    pub(crate) fn block_ref(&self, id: BlockId) -> &Block {
        &self.blocks[id.0]
    }

    #[inline(always)]
    pub(crate) fn block_mut(&mut self, id: BlockId) -> &mut Block {
        &mut self.blocks[id.0]
    }

    pub(crate) fn push_anomaly(&mut self, anomaly: GridAnomaly) {
        self.events.push(GridEvent::Anomaly(anomaly));
    }

    // ----- queries -----

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn width(&self) -> usize {
        self.config.width
    }

    pub fn height(&self) -> usize {
        self.config.height
    }

    pub fn preview_lines(&self) -> usize {
        self.config.preview_lines
    }

    pub fn id_at(&self, x: i32, y: i32) -> Option<BlockId> {
        self.map.get(&(x, y)).copied()
    }

    pub fn get(&self, x: i32, y: i32) -> Option<&Block> {
        self.id_at(x, y).map(|id| &self.blocks[id.0])
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.0)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Blocks of row `y`, left to right
    pub fn get_line(&self, y: i32) -> Vec<BlockId> {
        (0..self.config.width as i32)
            .filter_map(|x| self.id_at(x, y))
            .collect()
    }

    /// Blocks of column `x`, preview rows first
    pub fn get_column(&self, x: i32) -> Vec<BlockId> {
        let preview = self.config.preview_lines as i32;
        (-preview..self.config.height as i32)
            .filter_map(|y| self.id_at(x, y))
            .collect()
    }

    /// Leftmost member of the garbage group containing `id`
    pub fn leftest(&self, id: BlockId) -> BlockId {
        let mut current = id;
        for _ in 0..self.config.width {
            match self.blocks.get(current.0).and_then(|b| b.left) {
                Some(left) => current = left,
                None => break,
            }
        }
        current
    }

    pub fn rightest(&self, id: BlockId) -> BlockId {
        let mut current = id;
        for _ in 0..self.config.width {
            match self.blocks.get(current.0).and_then(|b| b.right) {
                Some(right) => current = right,
                None => break,
            }
        }
        current
    }

    /// Every member of the group containing `id`, left to right. A lone block is its own group.
    pub fn group_members(&self, id: BlockId) -> Vec<BlockId> {
        let mut members = Vec::with_capacity(1);
        if id.0 >= self.blocks.len() {
            return members;
        }
        let mut current = Some(self.leftest(id));
        while let Some(member) = current {
            if members.len() >= self.config.width.max(1) {
                break;
            }
            members.push(member);
            current = self.blocks[member.0].right;
        }
        members
    }

    pub fn take_events(&mut self) -> Vec<GridEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[GridEvent] {
        &self.events
    }

    pub fn set_animator(&mut self, animator: Box<dyn BlockAnimator>) {
        self.animator = animator;
    }

    pub fn set_level(&mut self, level: u32) {
        self.config.level = level;
    }

    pub fn random_mut(&mut self) -> &mut GameRandom {
        &mut self.random
    }

    pub fn scroll_value(&self) -> f32 {
        self.scroll_value
    }

    pub fn previous_scroll_value(&self) -> f32 {
        self.previous_scroll_value
    }

    pub fn freeze_cooldown(&self) -> f32 {
        self.freeze_cooldown
    }

    pub fn is_frozen(&self) -> bool {
        self.freeze_cooldown > 0.0
    }

    pub fn multiplier_frame(&self) -> u32 {
        self.multiplier_frame
    }

    /// Highest visible row holding a block, if any
    pub fn highest_row(&self) -> Option<i32> {
        self.highest_row
    }

    /// Current chain counter; 0 when no chain is running
    pub fn chain(&self) -> u32 {
        self.chain
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Nothing moving, falling, clearing or converting
    pub fn is_settled(&self) -> bool {
        self.blocks
            .iter()
            .all(|b| !b.is_busy() && b.movement() == Movement::None)
    }

    pub fn clear_state(&self) -> GridClearState {
        let mut counts: FxHashMap<u8, usize> = FxHashMap::default();
        for block in &self.blocks {
            if block.y < 0 || block.y >= self.config.height as i32 || !block.is_active() {
                continue;
            }
            if let Some(d) = block.definition() {
                if !d.is_garbage {
                    *counts.entry(d.id).or_insert(0) += 1;
                }
            }
        }
        if counts.is_empty() {
            GridClearState::Empty
        } else if counts.values().all(|&n| n < MIN_COMBO_LEN) {
            GridClearState::NoComboPossible
        } else {
            GridClearState::Playable
        }
    }

    /// Visible rows in fixture notation
    pub fn to_text(&self) -> String {
        format_board(self.config.width, self.config.height, |x, y| {
            match self.get(x as i32, y as i32).and_then(Block::definition) {
                None => CellToken::Empty,
                Some(d) if d.is_garbage => CellToken::Garbage,
                Some(d) => CellToken::Color(d.id),
            }
        })
    }

    /// Simplified snapshot for the solver; cells in the middle of a swap,
    /// clear or conversion read as irrelevant.
    pub fn to_int_array(&self) -> IntGrid {
        let mut grid = IntGrid::new(self.config.width, self.config.height);
        for y in 0..self.config.height as i32 {
            for x in 0..self.config.width as i32 {
                let Some(block) = self.get(x, y) else {
                    continue;
                };
                let code = if block.is_busy() || block.movement() == Movement::Horizontal {
                    IRRELEVANT_CODE
                } else {
                    block.code()
                };
                grid.set(x, y, code);
            }
        }
        grid
    }
}
