use serde::{Deserialize, Serialize};

use crate::content::blocks::Block;
use crate::layout::estimator::LengthClass;
use crate::layout::page::Color;

/// Where an illustration sits relative to its chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IllustrationPosition {
    /// Before the chapter heading.
    Top,
    /// After the chapter's first body block.
    Middle,
    /// After the chapter's last block.
    Bottom,
}

/// A probed image. Bytes stay in the caller's resource table, keyed by `resource_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImageAsset {
    Available {
        resource_id: String,
        format: String,
        width_px: u32,
        height_px: u32,
    },
    Unavailable {
        resource_id: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Illustration {
    pub id: String,
    /// 1-based; chapter 0 is the front matter before the first `Heading1`.
    pub target_chapter_index: usize,
    pub position: IllustrationPosition,
    pub image: ImageAsset,
}

/// Everything one build lays out. Consumed read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    pub author: String,
    pub background_color: Color,
    pub desired_page_count: Option<u32>,
    pub length_class: Option<LengthClass>,
    pub blocks: Vec<Block>,
    pub cover_image: Option<ImageAsset>,
    pub illustrations: Vec<Illustration>,
}

impl Document {
    pub fn new(title: impl Into<String>, author: impl Into<String>, blocks: Vec<Block>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            background_color: Color::WHITE,
            desired_page_count: None,
            length_class: None,
            blocks,
            cover_image: None,
            illustrations: Vec::new(),
        }
    }
}
