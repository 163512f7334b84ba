use crate::layout::document::{Illustration, ImageAsset};
use crate::layout::font_metrics::{measure_text, FontFace};
use crate::layout::geometry::LayoutConfig;
use crate::layout::page::{background, Color, DrawOp, IllustrationPage, Page, TextRun};

const PLACEHOLDER_CAPTION: &str = "Illustration unavailable";
const CAPTION_SIZE_PT: f32 = 12.0;

/// A dedicated page for one illustration, fitted inside the margins with its aspect
/// ratio kept. Unavailable images get a gray placeholder box with a caption.
pub fn compose_illustration_page(illustration: &Illustration, config: &LayoutConfig) -> Page {
    let mut ops = vec![background(config)];
    let box_x = config.margins.left;
    let box_y = config.margins.top;
    let box_w = config.content_width();
    let box_h = config.content_height();

    let placeholder = match &illustration.image {
        ImageAsset::Available {
            resource_id,
            width_px,
            height_px,
            ..
        } if *width_px > 0 && *height_px > 0 => {
            let scale = (box_w / *width_px as f32).min(box_h / *height_px as f32);
            let width = *width_px as f32 * scale;
            let height = *height_px as f32 * scale;
            ops.push(DrawOp::Image {
                x: box_x + (box_w - width) / 2.0,
                y: box_y + (box_h - height) / 2.0,
                width,
                height,
                resource_id: resource_id.clone(),
            });
            false
        }
        _ => {
            ops.push(DrawOp::FillRect {
                x: box_x,
                y: box_y,
                width: box_w,
                height: box_h,
                color: Color::PLACEHOLDER,
            });
            let caption_w = measure_text(PLACEHOLDER_CAPTION, FontFace::Sans, CAPTION_SIZE_PT);
            ops.push(DrawOp::Text(TextRun::plain(
                box_x + ((box_w - caption_w) / 2.0).max(0.0),
                box_y + (box_h - CAPTION_SIZE_PT) / 2.0,
                PLACEHOLDER_CAPTION,
                FontFace::Sans,
                CAPTION_SIZE_PT,
                Color::GRAY,
            )));
            true
        }
    };

    Page::Illustration(IllustrationPage {
        number: None,
        ops,
        illustration_id: illustration.id.clone(),
        chapter_index: illustration.target_chapter_index,
        position: illustration.position,
        placeholder,
    })
}
