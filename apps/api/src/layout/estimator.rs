//! Page-count estimation — soft pagination hints derived from the requested length.
//!
//! Hints only steer paragraph spacing. They never remove or truncate content, so the
//! real page count may differ from the target.

use serde::{Deserialize, Serialize};

use crate::content::blocks::{Block, BlockKind};
use crate::layout::font_metrics::wrap_lines;
use crate::layout::geometry::LayoutConfig;

pub const WORDS_PER_PAGE: u32 = 300;
pub const MIN_SPACING_SCALE: f32 = 0.75;
pub const MAX_SPACING_SCALE: f32 = 1.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthClass {
    Short,
    Medium,
    Long,
    Epic,
}

impl LengthClass {
    pub fn target_words(&self) -> u32 {
        match self {
            LengthClass::Short => 1500,
            LengthClass::Medium => 4500,
            LengthClass::Long => 9000,
            LengthClass::Epic => 18000,
        }
    }
}

/// Where the target page count came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetSource {
    Explicit,
    LengthClass,
    Natural,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginationHints {
    /// Pages including the cover.
    pub target_page_count: u32,
    /// Pages the content needs at unscaled spacing, including the cover.
    pub natural_page_count: u32,
    pub lines_per_page: u32,
    /// Advisory only.
    pub max_paragraphs_per_page: u32,
    /// Multiplier for paragraph spacing.
    pub spacing_scale: f32,
    pub source: TargetSource,
}

impl PaginationHints {
    /// Hints that leave spacing untouched.
    pub fn neutral(config: &LayoutConfig) -> Self {
        Self {
            target_page_count: 2,
            natural_page_count: 2,
            lines_per_page: lines_per_page(config),
            max_paragraphs_per_page: 1,
            spacing_scale: 1.0,
            source: TargetSource::Natural,
        }
    }
}

/// Size of the content at the current geometry, in body lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentMeasure {
    pub total_lines: u32,
    pub body_blocks: u32,
    pub words: u32,
}

impl ContentMeasure {
    pub fn of(blocks: &[Block], config: &LayoutConfig) -> Self {
        let body_line = config.body_line_height();
        let width = config.content_width();
        let mut height = 0.0_f32;
        let mut body_blocks = 0u32;
        let mut words = 0u32;

        for block in blocks {
            let lines = match block.kind {
                BlockKind::Separator => 1,
                kind => wrap_lines(&block.text, config.face_for(kind), config.size_for(kind), width)
                    .len()
                    .max(1),
            };
            height += lines as f32 * config.line_height_for(block.kind);
            height += if block.kind.is_heading() {
                config.heading_space_after(block.kind)
            } else {
                config.paragraph_spacing_pt
            };
            if block.kind.is_body() {
                body_blocks += 1;
            }
            words += block.word_count() as u32;
        }

        Self {
            total_lines: (height / body_line).ceil() as u32,
            body_blocks,
            words,
        }
    }
}

pub fn lines_per_page(config: &LayoutConfig) -> u32 {
    ((config.content_height() / config.body_line_height()).floor() as u32).max(1)
}

/// Derives hints from an explicit page count, a length class, or the content itself,
/// in that order of preference.
pub fn estimate(
    measure: ContentMeasure,
    desired_page_count: Option<u32>,
    length_class: Option<LengthClass>,
    config: &LayoutConfig,
) -> PaginationHints {
    let lines_per_page = lines_per_page(config);
    let natural_content_pages = measure.total_lines.div_ceil(lines_per_page).max(1);
    let natural_page_count = natural_content_pages + 1;

    let (target_page_count, source) = match (desired_page_count, length_class) {
        (Some(pages), _) => (pages.max(2), TargetSource::Explicit),
        (None, Some(class)) => (
            class.target_words().div_ceil(WORDS_PER_PAGE) + 1,
            TargetSource::LengthClass,
        ),
        (None, None) => (natural_page_count, TargetSource::Natural),
    };

    let target_content_pages = target_page_count.saturating_sub(1).max(1);
    let spacing_scale = (target_content_pages as f32 / natural_content_pages as f32)
        .clamp(MIN_SPACING_SCALE, MAX_SPACING_SCALE);
    let max_paragraphs_per_page = measure.body_blocks.div_ceil(target_content_pages).max(1);

    PaginationHints {
        target_page_count,
        natural_page_count,
        lines_per_page,
        max_paragraphs_per_page,
        spacing_scale,
        source,
    }
}
