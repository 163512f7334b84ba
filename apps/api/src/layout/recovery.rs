//! Recovery pass — places every block the main pagination pass left unmarked.
//!
//! Never reached on a healthy build. Layout here is minimal: left-aligned lines in
//! source order, a fresh page on any overflow, no keep-with-next and no illustrations.

use tracing::warn;

use crate::content::blocks::Block;
use crate::layout::font_metrics::wrap_lines;
use crate::layout::geometry::LayoutConfig;
use crate::layout::page::{Color, DrawOp, Fragment, Page, TextPage, TextRun};
use crate::layout::paginator::{EPS, SEPARATOR_MARK};

#[derive(Debug, Clone, Default)]
pub struct Recovery {
    pub pages: Vec<Page>,
    pub recovered_blocks: usize,
}

/// Renders each block whose `completed` flag is false and marks it done.
pub fn recover(blocks: &[Block], completed: &mut [bool], config: &LayoutConfig) -> Recovery {
    let mut pages = Vec::new();
    let mut page = TextPage::blank(config);
    let mut y = config.margins.top;
    let mut recovered_blocks = 0;

    for (block, done) in blocks.iter().zip(completed.iter_mut()) {
        if *done {
            continue;
        }
        warn!(
            source_index = block.source_index,
            kind = ?block.kind,
            "Recovering unplaced block"
        );

        let face = config.face_for(block.kind);
        let size = config.size_for(block.kind);
        let height = config.line_height_for(block.kind);
        let mut lines = wrap_lines(&block.text, face, size, config.content_width());
        if lines.is_empty() {
            lines.push(String::new());
        }

        for (line_index, line) in lines.into_iter().enumerate() {
            if !page.fragments.is_empty() && y + height > config.content_bottom() + EPS {
                pages.push(Page::Text(std::mem::replace(&mut page, TextPage::blank(config))));
                y = config.margins.top;
            }
            let run_text = if block.kind.is_body() || block.kind.is_heading() {
                line.clone()
            } else {
                SEPARATOR_MARK.to_string()
            };
            page.ops.push(DrawOp::Text(TextRun::plain(
                config.margins.left,
                y,
                run_text,
                face,
                size,
                Color::INK,
            )));
            page.fragments.push(Fragment {
                source_index: block.source_index,
                kind: block.kind,
                line_index,
                text: line,
            });
            page.consumed_height += height;
            y += height;
        }

        *done = true;
        recovered_blocks += 1;
    }

    if !page.fragments.is_empty() {
        pages.push(Page::Text(page));
    }
    Recovery {
        pages,
        recovered_blocks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::blocks::BlockKind;

    fn make_blocks() -> Vec<Block> {
        vec![
            Block::new(BlockKind::Heading1, "Chapter 1", 0),
            Block::new(BlockKind::Paragraph, "word ".repeat(900).trim(), 1),
            Block::new(BlockKind::Separator, "* * *", 2),
            Block::new(BlockKind::Paragraph, "Tail.", 3),
        ]
    }

    #[test]
    fn test_nothing_to_recover() {
        let blocks = make_blocks();
        let mut completed = vec![true; blocks.len()];
        let recovery = recover(&blocks, &mut completed, &LayoutConfig::default());
        assert_eq!(recovery.recovered_blocks, 0);
        assert!(recovery.pages.is_empty());
    }

    #[test]
    fn test_recovers_only_unplaced_blocks_in_order() {
        let blocks = make_blocks();
        let config = LayoutConfig::default();
        let mut completed = vec![true, false, true, false];
        let recovery = recover(&blocks, &mut completed, &config);

        assert_eq!(recovery.recovered_blocks, 2);
        assert!(completed.iter().all(|d| *d));
        assert!(recovery.pages.len() >= 2, "900 words should overflow a page");

        let fragments: Vec<&Fragment> = recovery.pages.iter().flat_map(|p| p.fragments()).collect();
        let body: Vec<&str> = fragments
            .iter()
            .filter(|f| f.source_index == 1)
            .map(|f| f.text.as_str())
            .collect();
        assert_eq!(body.join(" "), blocks[1].text);
        assert_eq!(fragments.last().unwrap().text, "Tail.");

        for page in &recovery.pages {
            if let Page::Text(text) = page {
                assert!(text.consumed_height <= config.content_height() + EPS);
            }
        }
    }
}
