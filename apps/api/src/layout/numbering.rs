use crate::layout::font_metrics::{measure_text, FontFace};
use crate::layout::geometry::LayoutConfig;
use crate::layout::page::{Color, DrawOp, Page, TextRun};

const NUMBER_SIZE_PT: f32 = 9.0;

/// Numbers every page after the cover from 1, stamping the number centered in the
/// bottom margin. Returns the last number assigned (0 when there are no content pages).
pub fn number_pages(pages: &mut [Page], config: &LayoutConfig) -> u32 {
    let y = config.content_bottom()
        + ((config.margins.bottom - NUMBER_SIZE_PT) / 2.0).max(0.0);
    let mut number = 0u32;

    for page in pages.iter_mut().filter(|p| !p.is_cover()) {
        number += 1;
        page.set_number(number);

        let label = number.to_string();
        let width = measure_text(&label, FontFace::Sans, NUMBER_SIZE_PT);
        page.ops_mut().push(DrawOp::Text(TextRun::plain(
            (config.page_width_pt - width) / 2.0,
            y,
            label,
            FontFace::Sans,
            NUMBER_SIZE_PT,
            Color::GRAY,
        )));
    }
    number
}
