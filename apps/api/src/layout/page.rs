//! Abstract page model: positioned draw operations, independent of any output format.
//!
//! Coordinates are PDF points with the origin at the top-left corner; a text run's `y`
//! is the top of its line box.

use serde::{Deserialize, Serialize};

use crate::content::blocks::BlockKind;
use crate::layout::document::IllustrationPosition;
use crate::layout::font_metrics::FontFace;
use crate::layout::geometry::LayoutConfig;

// ────────────────────────────────────────────────────────────────────────────
// Primitives
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const INK: Color = Color::rgb(33, 33, 33);
    pub const SHADOW: Color = Color::rgb(20, 20, 20);
    pub const LIGHT: Color = Color::rgb(250, 250, 245);
    pub const GRAY: Color = Color::rgb(128, 128, 128);
    pub const PLACEHOLDER: Color = Color::rgb(228, 228, 228);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rrggbb` or `rrggbb`. Returns `None` for anything else.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub x: f32,
    pub y: f32,
    pub text: String,
    pub face: FontFace,
    pub size_pt: f32,
    pub color: Color,
    pub opacity: f32,
    /// Counter-clockwise rotation around the run origin.
    pub rotation_deg: f32,
}

impl TextRun {
    /// An opaque, unrotated run.
    pub fn plain(x: f32, y: f32, text: impl Into<String>, face: FontFace, size_pt: f32, color: Color) -> Self {
        Self {
            x,
            y,
            text: text.into(),
            face,
            size_pt,
            color,
            opacity: 1.0,
            rotation_deg: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    FillRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Color,
    },
    Text(TextRun),
    Image {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        resource_id: String,
    },
}

impl DrawOp {
    pub fn is_fill(&self) -> bool {
        matches!(self, DrawOp::FillRect { .. })
    }

    pub fn as_text(&self) -> Option<&TextRun> {
        match self {
            DrawOp::Text(run) => Some(run),
            _ => None,
        }
    }
}

/// One placed line of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub source_index: usize,
    pub kind: BlockKind,
    pub line_index: usize,
    pub text: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Pages
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverPage {
    pub ops: Vec<DrawOp>,
    /// False when the cover fell back to a flat fill.
    pub has_image: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextPage {
    pub number: Option<u32>,
    pub ops: Vec<DrawOp>,
    /// Height of lines and spacing placed below the top margin.
    pub consumed_height: f32,
    pub fragments: Vec<Fragment>,
}

impl TextPage {
    /// An empty page carrying only its background fill.
    pub fn blank(config: &LayoutConfig) -> Self {
        Self {
            number: None,
            ops: vec![background(config)],
            consumed_height: 0.0,
            fragments: Vec::new(),
        }
    }
}

/// Full-page fill in the configured page color.
pub fn background(config: &LayoutConfig) -> DrawOp {
    DrawOp::FillRect {
        x: 0.0,
        y: 0.0,
        width: config.page_width_pt,
        height: config.page_height_pt,
        color: config.page_color,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IllustrationPage {
    pub number: Option<u32>,
    pub ops: Vec<DrawOp>,
    pub illustration_id: String,
    pub chapter_index: usize,
    pub position: IllustrationPosition,
    /// True when the image was unavailable and a placeholder was drawn.
    pub placeholder: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Page {
    Cover(CoverPage),
    Text(TextPage),
    Illustration(IllustrationPage),
}

impl Page {
    pub fn ops(&self) -> &[DrawOp] {
        match self {
            Page::Cover(p) => &p.ops,
            Page::Text(p) => &p.ops,
            Page::Illustration(p) => &p.ops,
        }
    }

    pub fn ops_mut(&mut self) -> &mut Vec<DrawOp> {
        match self {
            Page::Cover(p) => &mut p.ops,
            Page::Text(p) => &mut p.ops,
            Page::Illustration(p) => &mut p.ops,
        }
    }

    #[cfg(test)]
    pub fn number(&self) -> Option<u32> {
        match self {
            Page::Cover(_) => None,
            Page::Text(p) => p.number,
            Page::Illustration(p) => p.number,
        }
    }

    /// No-op on the cover, which is never numbered.
    pub fn set_number(&mut self, number: u32) {
        match self {
            Page::Cover(_) => {}
            Page::Text(p) => p.number = Some(number),
            Page::Illustration(p) => p.number = Some(number),
        }
    }

    pub fn is_cover(&self) -> bool {
        matches!(self, Page::Cover(_))
    }

    #[cfg(test)]
    pub fn fragments(&self) -> &[Fragment] {
        match self {
            Page::Text(p) => &p.fragments,
            _ => &[],
        }
    }

    pub fn as_illustration(&self) -> Option<&IllustrationPage> {
        match self {
            Page::Illustration(p) => Some(p),
            _ => None,
        }
    }
}
