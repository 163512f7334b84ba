//! Page geometry and typography knobs for one build.
//!
//! `LayoutConfig` is a plain value passed into the engine; there are no globals.
//! `validate` is the only source of fatal layout errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::content::blocks::BlockKind;
use crate::layout::font_metrics::FontFace;
use crate::layout::page::Color;

/// Fatal layout failures. Everything else degrades instead of failing.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LayoutError {
    #[error("Invalid layout configuration: {0}")]
    Configuration(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Default for Margins {
    fn default() -> Self {
        Self::uniform(72.0)
    }
}

impl Margins {
    pub fn uniform(pt: f32) -> Self {
        Self {
            top: pt,
            right: pt,
            bottom: pt,
            left: pt,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkConfig {
    pub enabled: bool,
    pub text: String,
    pub opacity: f32,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            text: "PREVIEW".to_string(),
            opacity: 0.08,
        }
    }
}

/// Layout knobs. Defaults: US Letter, 1" margins, 11pt Times body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub page_width_pt: f32,
    pub page_height_pt: f32,
    pub margins: Margins,
    pub heading1_size_pt: f32,
    pub heading2_size_pt: f32,
    pub heading3_size_pt: f32,
    pub body_size_pt: f32,
    /// Line box height as a multiple of the font size.
    pub line_height: f32,
    /// Space after a block, before `spacing_scale` is applied.
    pub paragraph_spacing_pt: f32,
    pub chapter_starts_new_page: bool,
    pub min_lines_before_break: usize,
    pub page_color: Color,
    pub watermark: WatermarkConfig,
    /// Small italic line at the bottom of the cover.
    pub attribution: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_width_pt: 612.0,
            page_height_pt: 792.0,
            margins: Margins::default(),
            heading1_size_pt: 24.0,
            heading2_size_pt: 18.0,
            heading3_size_pt: 14.0,
            body_size_pt: 11.0,
            line_height: 1.4,
            paragraph_spacing_pt: 8.0,
            chapter_starts_new_page: true,
            min_lines_before_break: 2,
            page_color: Color::WHITE,
            watermark: WatermarkConfig::default(),
            attribution: "Made with Bookbinder".to_string(),
        }
    }
}

fn positive(name: &str, value: f32) -> Result<(), LayoutError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(LayoutError::Configuration(format!(
            "{name} must be positive, got {value}"
        )))
    }
}

impl LayoutConfig {
    /// Rejects geometry under which no layout is possible.
    pub fn validate(&self) -> Result<(), LayoutError> {
        positive("page_width_pt", self.page_width_pt)?;
        positive("page_height_pt", self.page_height_pt)?;

        let m = &self.margins;
        for (name, value) in [
            ("margins.top", m.top),
            ("margins.right", m.right),
            ("margins.bottom", m.bottom),
            ("margins.left", m.left),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(LayoutError::Configuration(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }
        if m.left + m.right >= self.page_width_pt {
            return Err(LayoutError::Configuration(format!(
                "horizontal margins ({} + {}) leave no content width on a {}pt page",
                m.left, m.right, self.page_width_pt
            )));
        }
        if m.top + m.bottom >= self.page_height_pt {
            return Err(LayoutError::Configuration(format!(
                "vertical margins ({} + {}) leave no content height on a {}pt page",
                m.top, m.bottom, self.page_height_pt
            )));
        }

        positive("heading1_size_pt", self.heading1_size_pt)?;
        positive("heading2_size_pt", self.heading2_size_pt)?;
        positive("heading3_size_pt", self.heading3_size_pt)?;
        positive("body_size_pt", self.body_size_pt)?;
        positive("line_height", self.line_height)?;

        if !self.paragraph_spacing_pt.is_finite() || self.paragraph_spacing_pt < 0.0 {
            return Err(LayoutError::Configuration(format!(
                "paragraph_spacing_pt must be non-negative, got {}",
                self.paragraph_spacing_pt
            )));
        }
        if !(0.0..=1.0).contains(&self.watermark.opacity) {
            return Err(LayoutError::Configuration(format!(
                "watermark.opacity must be within [0, 1], got {}",
                self.watermark.opacity
            )));
        }
        Ok(())
    }

    pub fn content_width(&self) -> f32 {
        self.page_width_pt - self.margins.left - self.margins.right
    }

    pub fn content_height(&self) -> f32 {
        self.page_height_pt - self.margins.top - self.margins.bottom
    }

    /// Lowest y a line box may reach.
    pub fn content_bottom(&self) -> f32 {
        self.page_height_pt - self.margins.bottom
    }

    pub fn size_for(&self, kind: BlockKind) -> f32 {
        match kind {
            BlockKind::Heading1 => self.heading1_size_pt,
            BlockKind::Heading2 => self.heading2_size_pt,
            BlockKind::Heading3 => self.heading3_size_pt,
            BlockKind::Paragraph | BlockKind::Separator | BlockKind::Emphasis => {
                self.body_size_pt
            }
        }
    }

    pub fn face_for(&self, kind: BlockKind) -> FontFace {
        match kind {
            BlockKind::Heading1 | BlockKind::Heading2 | BlockKind::Heading3 => {
                FontFace::SerifBold
            }
            BlockKind::Emphasis => FontFace::SerifItalic,
            BlockKind::Paragraph | BlockKind::Separator => FontFace::Serif,
        }
    }

    pub fn line_height_for(&self, kind: BlockKind) -> f32 {
        self.size_for(kind) * self.line_height
    }

    pub fn body_line_height(&self) -> f32 {
        self.line_height_for(BlockKind::Paragraph)
    }

    /// Space kept below a heading before the next block.
    pub fn heading_space_after(&self, kind: BlockKind) -> f32 {
        self.size_for(kind) * 0.75
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = LayoutConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.content_width(), 468.0);
        assert_eq!(config.content_height(), 648.0);
        assert_eq!(config.content_bottom(), 720.0);
    }

    #[test]
    fn test_vertical_margins_exceeding_height_rejected() {
        let config = LayoutConfig {
            margins: Margins {
                top: 400.0,
                bottom: 400.0,
                ..Margins::default()
            },
            ..LayoutConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, LayoutError::Configuration(ref m) if m.contains("vertical")));
    }

    #[test]
    fn test_margins_equal_to_width_rejected() {
        let config = LayoutConfig {
            margins: Margins {
                left: 306.0,
                right: 306.0,
                ..Margins::default()
            },
            ..LayoutConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_positive_sizes_rejected() {
        let config = LayoutConfig {
            body_size_pt: 0.0,
            ..LayoutConfig::default()
        };
        assert!(config.validate().is_err());

        let config = LayoutConfig {
            line_height: -1.0,
            ..LayoutConfig::default()
        };
        assert!(config.validate().is_err());

        let config = LayoutConfig {
            page_width_pt: f32::NAN,
            ..LayoutConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_faces_and_sizes_per_kind() {
        let config = LayoutConfig::default();
        assert_eq!(config.face_for(BlockKind::Heading1), FontFace::SerifBold);
        assert_eq!(config.face_for(BlockKind::Emphasis), FontFace::SerifItalic);
        assert_eq!(config.size_for(BlockKind::Heading2), 18.0);
        assert!((config.body_line_height() - 15.4).abs() < 1e-4);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: LayoutConfig =
            serde_json::from_str(r#"{"body_size_pt": 12.0, "margins": {"top": 36.0}}"#)
                .unwrap();
        assert_eq!(config.body_size_pt, 12.0);
        assert_eq!(config.margins.top, 36.0);
        assert_eq!(config.margins.left, 72.0);
        assert!(config.chapter_starts_new_page);
    }
}
