use serde::{Deserialize, Serialize};

use crate::content::normalizer::{reparses_as_paragraph, LITERAL_MARK};

/// Structural kind of a content block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Heading1,
    Heading2,
    Heading3,
    Paragraph,
    Separator,
    Emphasis,
}

impl BlockKind {
    pub fn is_heading(&self) -> bool {
        matches!(
            self,
            BlockKind::Heading1 | BlockKind::Heading2 | BlockKind::Heading3
        )
    }

    /// Paragraph-like blocks that may break across pages.
    pub fn is_body(&self) -> bool {
        matches!(self, BlockKind::Paragraph | BlockKind::Emphasis)
    }

    /// Heading rank (1 = strongest). `None` for non-headings.
    pub fn heading_level(&self) -> Option<u8> {
        match self {
            BlockKind::Heading1 => Some(1),
            BlockKind::Heading2 => Some(2),
            BlockKind::Heading3 => Some(3),
            _ => None,
        }
    }
}

/// An atomic content unit. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub kind: BlockKind,
    pub text: String,
    /// Position of the block in the normalized sequence.
    pub source_index: usize,
}

impl Block {
    pub fn new(kind: BlockKind, text: impl Into<String>, source_index: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            source_index,
        }
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// Renders blocks back to the lightweight markup the normalizer accepts.
///
/// `normalize(&render_blocks(&normalize(raw)))` equals `normalize(raw)`. Paragraphs that
/// would read back as structure are written as literals.
pub fn render_blocks(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(|block| match block.kind {
            BlockKind::Heading1 => format!("# {}", block.text),
            BlockKind::Heading2 => format!("## {}", block.text),
            BlockKind::Heading3 => format!("### {}", block.text),
            BlockKind::Separator => "* * *".to_string(),
            BlockKind::Emphasis => format!("*{}*", block.text),
            BlockKind::Paragraph if reparses_as_paragraph(&block.text) => block.text.clone(),
            BlockKind::Paragraph => format!("{LITERAL_MARK}{}", block.text),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
