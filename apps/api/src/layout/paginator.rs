//! Paginator — the layout state machine.
//!
//! # Architecture
//! - `step` is a pure reducer: `(block, upcoming, state, context) -> (state, events)`.
//!   It measures the block, decides page breaks and requests illustration slots, but
//!   never builds pages itself.
//! - `PageAssembler` folds the events into `Page`s and resolves slots through the
//!   `IllustrationScheduler`.
//! - `paginate` drives both, closes the last chapter with `finish`, and hands any block
//!   the main pass did not complete to the recovery pass.
//!
//! # Chapter boundaries
//! Chapters are 1-based; blocks before the first `Heading1` form chapter 0. On each
//! `Heading1` the previous chapter closes (pending `Middle`, then `Bottom`), the chapter
//! index advances, the page breaks if `chapter_starts_new_page` is set and the page holds
//! more than headings (a part title keeps its first chapter heading), and the new
//! chapter's `Top` slot fires before the heading. `Middle` fires after the first body
//! block of a chapter. Slots fire only when occupied, and each one leaves the cursor at
//! the top of a fresh page.

use tracing::{debug, error};

use crate::content::blocks::{Block, BlockKind};
use crate::layout::document::{Illustration, IllustrationPosition};
use crate::layout::estimator::PaginationHints;
use crate::layout::font_metrics::{measure_text, wrap_lines, FontFace};
use crate::layout::geometry::LayoutConfig;
use crate::layout::illustration::compose_illustration_page;
use crate::layout::page::{Color, DrawOp, Fragment, Page, TextPage, TextRun};
use crate::layout::recovery::recover;
use crate::layout::scheduler::{IllustrationScheduler, SlotOccupancy};

/// Float slack for fit comparisons.
pub const EPS: f32 = 0.01;
pub const SEPARATOR_MARK: &str = "* * *";

// ────────────────────────────────────────────────────────────────────────────
// State, context and events
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaginationState {
    pub current_y: f32,
    /// Content pages closed before the current one (the cover is not counted).
    pub current_page_index: usize,
    pub current_chapter_index: usize,
    pub processed_block_count: usize,
    pub page_has_content: bool,
    /// Any non-heading line on the current page.
    pub page_has_body: bool,
    pub middle_fired: bool,
}

impl PaginationState {
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            current_y: config.margins.top,
            current_page_index: 0,
            current_chapter_index: 0,
            processed_block_count: 0,
            page_has_content: false,
            page_has_body: false,
            middle_fired: false,
        }
    }
}

/// Read-only inputs shared by every step of one build.
pub struct LayoutContext<'a> {
    pub config: &'a LayoutConfig,
    pub hints: &'a PaginationHints,
    pub slots: &'a SlotOccupancy,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    PageBreak,
    Line {
        fragment: Fragment,
        run: TextRun,
        height: f32,
    },
    Spacing(f32),
    IllustrationSlot {
        chapter: usize,
        position: IllustrationPosition,
    },
    TrailingIllustrations {
        after_chapter: usize,
    },
    BlockDone {
        source_index: usize,
    },
}

pub type Reducer =
    fn(&Block, &[Block], PaginationState, &LayoutContext<'_>) -> (PaginationState, Vec<PageEvent>);

// ────────────────────────────────────────────────────────────────────────────
// Reducer
// ────────────────────────────────────────────────────────────────────────────

/// Places one block. `upcoming` is the rest of the sequence after `block`.
pub fn step(
    block: &Block,
    upcoming: &[Block],
    state: PaginationState,
    ctx: &LayoutContext<'_>,
) -> (PaginationState, Vec<PageEvent>) {
    let mut placement = Placement::new(ctx, state);

    if placement.state.processed_block_count == 0 {
        placement.emit_slot(0, IllustrationPosition::Top);
    }
    if block.kind == BlockKind::Heading1 {
        placement.open_chapter();
    }

    match block.kind {
        BlockKind::Heading1 | BlockKind::Heading2 | BlockKind::Heading3 => {
            placement.place_heading(block, upcoming)
        }
        BlockKind::Separator => placement.place_separator(block),
        BlockKind::Paragraph | BlockKind::Emphasis => placement.place_body(block),
    }

    placement.state.processed_block_count += 1;
    placement.events.push(PageEvent::BlockDone {
        source_index: block.source_index,
    });

    if block.kind.is_body() && !placement.state.middle_fired {
        let chapter = placement.state.current_chapter_index;
        placement.emit_slot(chapter, IllustrationPosition::Middle);
        placement.state.middle_fired = true;
    }

    (placement.state, placement.events)
}

/// Closes the last chapter and flushes illustrations aimed past it.
pub fn finish(state: PaginationState, ctx: &LayoutContext<'_>) -> (PaginationState, Vec<PageEvent>) {
    let mut placement = Placement::new(ctx, state);
    if placement.state.processed_block_count == 0 {
        placement.emit_slot(0, IllustrationPosition::Top);
    }
    placement.close_chapter();

    let last = placement.state.current_chapter_index;
    let beyond = ctx.slots.count_beyond(last);
    if beyond > 0 {
        placement.advance_past_illustrations(beyond);
        placement
            .events
            .push(PageEvent::TrailingIllustrations { after_chapter: last });
    }
    (placement.state, placement.events)
}

struct Placement<'a> {
    ctx: &'a LayoutContext<'a>,
    state: PaginationState,
    events: Vec<PageEvent>,
}

impl<'a> Placement<'a> {
    fn new(ctx: &'a LayoutContext<'a>, state: PaginationState) -> Self {
        Self {
            ctx,
            state,
            events: Vec::new(),
        }
    }

    fn config(&self) -> &'a LayoutConfig {
        self.ctx.config
    }

    fn fresh_page(&mut self) {
        self.state.current_y = self.config().margins.top;
        self.state.page_has_content = false;
        self.state.page_has_body = false;
    }

    fn break_page(&mut self) {
        if self.state.page_has_content {
            self.events.push(PageEvent::PageBreak);
            self.state.current_page_index += 1;
            self.fresh_page();
        }
    }

    fn advance_past_illustrations(&mut self, count: usize) {
        if self.state.page_has_content {
            self.state.current_page_index += 1;
        }
        self.state.current_page_index += count;
        self.fresh_page();
    }

    fn emit_slot(&mut self, chapter: usize, position: IllustrationPosition) {
        let count = self.ctx.slots.count(chapter, position);
        if count == 0 {
            return;
        }
        self.advance_past_illustrations(count);
        self.events
            .push(PageEvent::IllustrationSlot { chapter, position });
    }

    fn close_chapter(&mut self) {
        let chapter = self.state.current_chapter_index;
        if !self.state.middle_fired {
            self.emit_slot(chapter, IllustrationPosition::Middle);
            self.state.middle_fired = true;
        }
        self.emit_slot(chapter, IllustrationPosition::Bottom);
    }

    fn open_chapter(&mut self) {
        self.close_chapter();
        self.state.current_chapter_index += 1;
        self.state.middle_fired = false;
        if self.config().chapter_starts_new_page && self.state.page_has_body {
            self.break_page();
        }
        let chapter = self.state.current_chapter_index;
        self.emit_slot(chapter, IllustrationPosition::Top);
    }

    fn remaining(&self) -> f32 {
        self.config().content_bottom() - self.state.current_y
    }

    fn fits(&self, height: f32) -> bool {
        height <= self.remaining() + EPS
    }

    #[allow(clippy::too_many_arguments)]
    fn place_line(
        &mut self,
        block: &Block,
        line_index: usize,
        fragment_text: String,
        run_text: &str,
        face: FontFace,
        size_pt: f32,
        centered: bool,
    ) {
        let config = self.config();
        let height = config.line_height_for(block.kind);
        if self.state.page_has_content && !self.fits(height) {
            self.break_page();
        }

        let x = if centered {
            let width = measure_text(run_text, face, size_pt);
            config.margins.left + ((config.content_width() - width) / 2.0).max(0.0)
        } else {
            config.margins.left
        };
        let run = TextRun::plain(x, self.state.current_y, run_text, face, size_pt, Color::INK);

        self.events.push(PageEvent::Line {
            fragment: Fragment {
                source_index: block.source_index,
                kind: block.kind,
                line_index,
                text: fragment_text,
            },
            run,
            height,
        });
        self.state.current_y += height;
        self.state.page_has_content = true;
        self.state.page_has_body |= !block.kind.is_heading();
    }

    /// Spacing never pushes the cursor past the bottom margin.
    fn add_spacing(&mut self, height: f32) {
        let spacing = height.min(self.remaining().max(0.0));
        if spacing > 0.0 {
            self.events.push(PageEvent::Spacing(spacing));
            self.state.current_y += spacing;
        }
    }

    /// An always-fits line taller than the page leaves the cursor below the margin.
    fn settle(&mut self) {
        if self.remaining() < -EPS {
            self.break_page();
        }
    }

    fn wrapped(&self, block: &Block) -> Vec<String> {
        let config = self.config();
        let lines = wrap_lines(
            &block.text,
            config.face_for(block.kind),
            config.size_for(block.kind),
            config.content_width(),
        );
        if lines.is_empty() {
            vec![String::new()]
        } else {
            lines
        }
    }

    /// Height the blocks after a heading need on the same page as it.
    fn keep_with_next(&self, upcoming: &[Block]) -> f32 {
        let config = self.config();
        let mut keep = 0.0;
        for next in upcoming {
            match next.kind {
                BlockKind::Heading1 | BlockKind::Heading2 | BlockKind::Heading3 => {
                    keep += self.wrapped(next).len() as f32 * config.line_height_for(next.kind)
                        + config.heading_space_after(next.kind);
                    if keep >= config.content_height() {
                        break;
                    }
                }
                BlockKind::Separator => {
                    keep += config.body_line_height();
                    break;
                }
                BlockKind::Paragraph | BlockKind::Emphasis => {
                    let lines = self
                        .wrapped(next)
                        .len()
                        .min(config.min_lines_before_break.max(1));
                    keep += lines as f32 * config.line_height_for(next.kind);
                    break;
                }
            }
        }
        keep
    }

    fn place_heading(&mut self, block: &Block, upcoming: &[Block]) {
        let config = self.config();
        let lines = self.wrapped(block);
        let face = config.face_for(block.kind);
        let size = config.size_for(block.kind);
        let space_after = config.heading_space_after(block.kind);
        let needed = lines.len() as f32 * config.line_height_for(block.kind)
            + space_after
            + self.keep_with_next(upcoming);

        // Strict comparison so the following block's leading lines are sure to fit.
        if self.state.page_has_content && self.remaining() < needed {
            self.break_page();
        }

        let centered = block.kind == BlockKind::Heading1;
        for (i, line) in lines.iter().enumerate() {
            self.place_line(block, i, line.clone(), line, face, size, centered);
        }
        self.add_spacing(space_after);
        self.settle();
    }

    fn place_separator(&mut self, block: &Block) {
        let config = self.config();
        let face = config.face_for(block.kind);
        let size = config.size_for(block.kind);
        self.place_line(block, 0, block.text.clone(), SEPARATOR_MARK, face, size, true);
        self.add_spacing(config.paragraph_spacing_pt * self.ctx.hints.spacing_scale);
        self.settle();
    }

    fn place_body(&mut self, block: &Block) {
        let config = self.config();
        let lines = self.wrapped(block);
        let face = config.face_for(block.kind);
        let size = config.size_for(block.kind);
        let line_height = config.line_height_for(block.kind);

        // Orphan control: keep at least `min_lines_before_break` lines together.
        let leading = lines.len().min(config.min_lines_before_break.max(1));
        if self.state.page_has_content && !self.fits(leading as f32 * line_height) {
            self.break_page();
        }

        for (i, line) in lines.iter().enumerate() {
            self.place_line(block, i, line.clone(), line, face, size, false);
        }
        self.add_spacing(config.paragraph_spacing_pt * self.ctx.hints.spacing_scale);
        self.settle();
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Page assembly
// ────────────────────────────────────────────────────────────────────────────

struct PageAssembler<'a> {
    config: &'a LayoutConfig,
    scheduler: &'a mut IllustrationScheduler,
    pages: Vec<Page>,
    current: Option<TextPage>,
}

impl<'a> PageAssembler<'a> {
    fn new(config: &'a LayoutConfig, scheduler: &'a mut IllustrationScheduler) -> Self {
        Self {
            config,
            scheduler,
            pages: Vec::new(),
            current: None,
        }
    }

    fn close_page(&mut self) {
        if let Some(page) = self.current.take() {
            self.pages.push(Page::Text(page));
        }
    }

    fn push_illustrations(&mut self, illustrations: Vec<Illustration>) {
        self.close_page();
        for illustration in &illustrations {
            self.pages
                .push(compose_illustration_page(illustration, self.config));
        }
    }

    fn apply(&mut self, event: PageEvent) {
        match event {
            PageEvent::PageBreak => self.close_page(),
            PageEvent::Line {
                fragment,
                run,
                height,
            } => {
                let config = self.config;
                let page = self
                    .current
                    .get_or_insert_with(|| TextPage::blank(config));
                page.ops.push(DrawOp::Text(run));
                page.fragments.push(fragment);
                page.consumed_height += height;
            }
            PageEvent::Spacing(height) => {
                if let Some(page) = self.current.as_mut() {
                    page.consumed_height += height;
                }
            }
            PageEvent::IllustrationSlot { chapter, position } => {
                let illustrations = self.scheduler.take(chapter, position);
                self.push_illustrations(illustrations);
            }
            PageEvent::TrailingIllustrations { after_chapter } => {
                let illustrations = self.scheduler.drain_beyond(after_chapter);
                self.push_illustrations(illustrations);
            }
            PageEvent::BlockDone { .. } => {}
        }
    }

    fn into_pages(mut self) -> Vec<Page> {
        self.close_page();
        self.pages
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Driver
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Pagination {
    /// Content pages in reading order. The cover is not included.
    pub pages: Vec<Page>,
    pub state: PaginationState,
    /// Blocks placed by the recovery pass. Zero on every healthy build.
    pub recovered_blocks: usize,
}

/// Lays out `blocks` into content pages, consuming every illustration in `scheduler`.
pub fn paginate(
    blocks: &[Block],
    config: &LayoutConfig,
    hints: &PaginationHints,
    scheduler: &mut IllustrationScheduler,
) -> Pagination {
    paginate_with(blocks, config, hints, scheduler, step)
}

fn paginate_with(
    blocks: &[Block],
    config: &LayoutConfig,
    hints: &PaginationHints,
    scheduler: &mut IllustrationScheduler,
    reducer: Reducer,
) -> Pagination {
    let slots = scheduler.occupancy();
    let ctx = LayoutContext {
        config,
        hints,
        slots: &slots,
    };

    let mut state = PaginationState::new(config);
    let mut completed = vec![false; blocks.len()];
    let mut assembler = PageAssembler::new(config, scheduler);

    for (i, block) in blocks.iter().enumerate() {
        let (next_state, events) = reducer(block, &blocks[i + 1..], state, &ctx);
        state = next_state;
        for event in events {
            if matches!(event, PageEvent::BlockDone { .. }) {
                completed[i] = true;
            }
            assembler.apply(event);
        }
    }

    let (final_state, events) = finish(state, &ctx);
    state = final_state;
    for event in events {
        assembler.apply(event);
    }
    let mut pages = assembler.into_pages();

    let mut recovered_blocks = 0;
    let missing = completed.iter().filter(|done| !**done).count();
    if missing > 0 || state.processed_block_count < blocks.len() {
        error!(
            missing,
            processed = state.processed_block_count,
            total = blocks.len(),
            "Pagination left blocks unplaced, running recovery pass"
        );
        let recovery = recover(blocks, &mut completed, config);
        recovered_blocks = recovery.recovered_blocks;
        state.processed_block_count += recovered_blocks;
        pages.extend(recovery.pages);
    }

    debug!(
        pages = pages.len(),
        chapters = state.current_chapter_index,
        illustrations = slots.total(),
        recovered_blocks,
        "Pagination complete"
    );
    Pagination {
        pages,
        state,
        recovered_blocks,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
