use crate::layout::font_metrics::{measure_text, FontFace};
use crate::layout::geometry::{LayoutConfig, WatermarkConfig};
use crate::layout::page::{Color, DrawOp, Page, TextRun};

const ROTATION_DEG: f32 = 45.0;
/// Share of the page diagonal the mark spans.
const DIAGONAL_SHARE: f32 = 0.6;

fn watermark_run(watermark: &WatermarkConfig, config: &LayoutConfig) -> Option<TextRun> {
    let text = watermark.text.trim();
    if text.is_empty() {
        return None;
    }
    let diagonal = config.page_width_pt.hypot(config.page_height_pt);
    let unit_width = measure_text(text, FontFace::SansBold, 1.0);
    if unit_width <= 0.0 {
        return None;
    }
    let size_pt = diagonal * DIAGONAL_SHARE / unit_width;
    let width = unit_width * size_pt;

    // Position the run origin so the rotated baseline is centered on the page.
    let (sin, cos) = ROTATION_DEG.to_radians().sin_cos();
    let x = config.page_width_pt / 2.0 - cos * width / 2.0;
    let y = config.page_height_pt / 2.0 + sin * width / 2.0;

    Some(TextRun {
        x,
        y,
        text: text.to_string(),
        face: FontFace::SansBold,
        size_pt,
        color: Color::GRAY,
        opacity: watermark.opacity,
        rotation_deg: ROTATION_DEG,
    })
}

/// Adds the diagonal mark to every non-cover page, directly after the page's
/// background fill (or first when there is none). No-op when disabled.
pub fn stamp_watermark(pages: &mut [Page], config: &LayoutConfig) {
    if !config.watermark.enabled {
        return;
    }
    let Some(run) = watermark_run(&config.watermark, config) else {
        return;
    };

    for page in pages.iter_mut().filter(|p| !p.is_cover()) {
        let ops = page.ops_mut();
        let at = match ops.first() {
            Some(first) if first.is_fill() => 1,
            _ => 0,
        };
        ops.insert(at, DrawOp::Text(run.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::page::{background, CoverPage, IllustrationPage, TextPage};
    use crate::layout::document::IllustrationPosition;

    fn make_config(enabled: bool) -> LayoutConfig {
        let mut config = LayoutConfig::default();
        config.watermark.enabled = enabled;
        config
    }

    fn make_pages(config: &LayoutConfig) -> Vec<Page> {
        let mut text = TextPage::blank(config);
        text.ops.push(DrawOp::Text(TextRun::plain(
            72.0,
            72.0,
            "Body",
            FontFace::Serif,
            11.0,
            Color::INK,
        )));
        vec![
            Page::Cover(CoverPage {
                ops: vec![background(config)],
                has_image: false,
            }),
            Page::Text(text),
            Page::Illustration(IllustrationPage {
                number: None,
                ops: vec![DrawOp::Image {
                    x: 0.0,
                    y: 0.0,
                    width: 10.0,
                    height: 10.0,
                    resource_id: "r".to_string(),
                }],
                illustration_id: "i".to_string(),
                chapter_index: 1,
                position: IllustrationPosition::Top,
                placeholder: false,
            }),
        ]
    }

    #[test]
    fn test_disabled_watermark_changes_nothing() {
        let config = make_config(false);
        let mut pages = make_pages(&config);
        let before = pages.clone();
        stamp_watermark(&mut pages, &config);
        assert_eq!(pages, before);
    }

    #[test]
    fn test_watermark_follows_background_and_skips_cover() {
        let config = make_config(true);
        let mut pages = make_pages(&config);
        stamp_watermark(&mut pages, &config);

        assert_eq!(pages[0].ops().len(), 1);

        let text_ops = pages[1].ops();
        assert!(text_ops[0].is_fill());
        let mark = text_ops[1].as_text().unwrap();
        assert_eq!(mark.text, "PREVIEW");
        assert_eq!(mark.opacity, 0.08);
        assert_eq!(mark.rotation_deg, 45.0);
        assert_eq!(text_ops[2].as_text().unwrap().text, "Body");

        // No background fill: the mark goes first.
        assert_eq!(pages[2].ops()[0].as_text().unwrap().text, "PREVIEW");
    }

    #[test]
    fn test_mark_is_large_and_centered() {
        let config = make_config(true);
        let run = watermark_run(&config.watermark, &config).unwrap();
        assert!(run.size_pt > 60.0);
        let width = measure_text(&run.text, run.face, run.size_pt);
        let (sin, cos) = 45f32.to_radians().sin_cos();
        let mid_x = run.x + cos * width / 2.0;
        let mid_y = run.y - sin * width / 2.0;
        assert!((mid_x - config.page_width_pt / 2.0).abs() < 1e-2);
        assert!((mid_y - config.page_height_pt / 2.0).abs() < 1e-2);
    }

    #[test]
    fn test_blank_text_skips_stamping() {
        let mut config = make_config(true);
        config.watermark.text = "   ".to_string();
        let mut pages = make_pages(&config);
        let before = pages.clone();
        stamp_watermark(&mut pages, &config);
        assert_eq!(pages, before);
    }
}
