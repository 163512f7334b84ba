//! Cover composition.
//!
//! With artwork the image runs full-bleed and every text line is drawn twice: a dark
//! copy nudged down-right, then the light main copy. Without artwork (or when the image
//! could not be decoded) the page is a flat fill in the document background color with
//! dark ink.

use crate::layout::document::{Document, ImageAsset};
use crate::layout::font_metrics::{measure_text, wrap_lines, FontFace};
use crate::layout::geometry::LayoutConfig;
use crate::layout::page::{Color, CoverPage, DrawOp, Page, TextRun};

const SHADOW_OFFSET_PT: f32 = 1.5;
const SHADOW_OPACITY: f32 = 0.75;
const TITLE_SCALE: f32 = 1.5;
const ATTRIBUTION_SIZE_PT: f32 = 9.0;
const UNTITLED: &str = "Untitled";

struct CoverInk {
    fill: Color,
    shadow: bool,
}

fn push_centered(
    ops: &mut Vec<DrawOp>,
    config: &LayoutConfig,
    ink: &CoverInk,
    text: &str,
    face: FontFace,
    size_pt: f32,
    y: f32,
) {
    let width = measure_text(text, face, size_pt);
    let x = ((config.page_width_pt - width) / 2.0).max(0.0);
    if ink.shadow {
        let mut shadow = TextRun::plain(
            x + SHADOW_OFFSET_PT,
            y + SHADOW_OFFSET_PT,
            text,
            face,
            size_pt,
            Color::SHADOW,
        );
        shadow.opacity = SHADOW_OPACITY;
        ops.push(DrawOp::Text(shadow));
    }
    ops.push(DrawOp::Text(TextRun::plain(x, y, text, face, size_pt, ink.fill)));
}

/// Builds the unnumbered first page.
pub fn compose_cover(document: &Document, config: &LayoutConfig) -> Page {
    let mut ops = Vec::new();

    let artwork = match &document.cover_image {
        Some(ImageAsset::Available { resource_id, .. }) => Some(resource_id.clone()),
        _ => None,
    };
    let has_image = artwork.is_some();

    let ink = match artwork {
        Some(resource_id) => {
            ops.push(DrawOp::Image {
                x: 0.0,
                y: 0.0,
                width: config.page_width_pt,
                height: config.page_height_pt,
                resource_id,
            });
            CoverInk {
                fill: Color::LIGHT,
                shadow: true,
            }
        }
        None => {
            ops.push(DrawOp::FillRect {
                x: 0.0,
                y: 0.0,
                width: config.page_width_pt,
                height: config.page_height_pt,
                color: document.background_color,
            });
            CoverInk {
                fill: Color::INK,
                shadow: false,
            }
        }
    };

    let title = if document.title.trim().is_empty() {
        UNTITLED
    } else {
        document.title.as_str()
    };
    let title_size = config.heading1_size_pt * TITLE_SCALE;
    let title_line = title_size * config.line_height;
    let mut y = config.page_height_pt / 3.0;
    for line in wrap_lines(title, FontFace::SerifBold, title_size, config.content_width()) {
        push_centered(&mut ops, config, &ink, &line, FontFace::SerifBold, title_size, y);
        y += title_line;
    }

    if !document.author.trim().is_empty() {
        let author_size = config.heading2_size_pt;
        y += author_size;
        for line in wrap_lines(&document.author, FontFace::Serif, author_size, config.content_width()) {
            push_centered(&mut ops, config, &ink, &line, FontFace::Serif, author_size, y);
            y += author_size * config.line_height;
        }
    }

    if !config.attribution.trim().is_empty() {
        let y = config.page_height_pt
            - (config.margins.bottom / 2.0).max(ATTRIBUTION_SIZE_PT * config.line_height)
            - ATTRIBUTION_SIZE_PT / 2.0;
        push_centered(
            &mut ops,
            config,
            &ink,
            &config.attribution,
            FontFace::SerifItalic,
            ATTRIBUTION_SIZE_PT,
            y.max(0.0),
        );
    }

    Page::Cover(CoverPage { ops, has_image })
}
