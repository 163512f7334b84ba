//! Layout engine entry point: validate, estimate, paginate, decorate.

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::layout::cover::compose_cover;
use crate::layout::document::Document;
use crate::layout::estimator::{estimate, ContentMeasure, PaginationHints};
use crate::layout::geometry::{LayoutConfig, LayoutError};
use crate::layout::numbering::number_pages;
use crate::layout::page::Page;
use crate::layout::paginator::paginate;
use crate::layout::scheduler::IllustrationScheduler;
use crate::layout::watermark::stamp_watermark;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutReport {
    pub block_count: usize,
    pub chapter_count: usize,
    /// Blocks placed by the recovery pass. Non-zero means a pagination defect.
    pub recovered_blocks: usize,
    pub illustration_pages: usize,
    pub placeholder_illustrations: usize,
    pub target_page_count: u32,
    /// Pages including the cover.
    pub page_count: usize,
}

#[derive(Debug, Clone)]
pub struct LaidOutBook {
    /// Cover first, then numbered content pages.
    pub pages: Vec<Page>,
    pub hints: PaginationHints,
    pub report: LayoutReport,
}

/// Lays out a whole document. Fails only on invalid geometry, before any page exists.
pub fn lay_out(document: &Document, config: &LayoutConfig) -> Result<LaidOutBook, LayoutError> {
    config.validate()?;

    let measure = ContentMeasure::of(&document.blocks, config);
    let hints = estimate(
        measure,
        document.desired_page_count,
        document.length_class,
        config,
    );

    let mut scheduler = IllustrationScheduler::new(document.illustrations.iter().cloned());
    let pagination = paginate(&document.blocks, config, &hints, &mut scheduler);
    if scheduler.remaining() > 0 {
        error!(
            remaining = scheduler.remaining(),
            "Illustrations left unscheduled after pagination"
        );
    }

    let mut pages = Vec::with_capacity(pagination.pages.len() + 1);
    pages.push(compose_cover(document, config));
    pages.extend(pagination.pages);
    stamp_watermark(&mut pages, config);
    number_pages(&mut pages, config);

    let illustration_pages: Vec<_> = pages.iter().filter_map(Page::as_illustration).collect();
    let report = LayoutReport {
        block_count: document.blocks.len(),
        chapter_count: pagination.state.current_chapter_index,
        recovered_blocks: pagination.recovered_blocks,
        illustration_pages: illustration_pages.len(),
        placeholder_illustrations: illustration_pages.iter().filter(|p| p.placeholder).count(),
        target_page_count: hints.target_page_count,
        page_count: pages.len(),
    };

    info!(
        pages = report.page_count,
        target = report.target_page_count,
        chapters = report.chapter_count,
        illustrations = report.illustration_pages,
        spacing_scale = hints.spacing_scale,
        "Document laid out"
    );

    Ok(LaidOutBook {
        pages,
        hints,
        report,
    })
}
