//! Static font-metric tables for the two base families used by the book layout.
//!
//! Widths are the Adobe AFM advance widths of Helvetica and Times-Roman, scaled to
//! em units (1/1000 of the AFM value). Bold and italic faces reuse the regular table
//! with a small width factor. This is an approximation: the renderer uses exact glyph
//! metrics, and the paginator only needs line counts that do not under-estimate.
//!
//! All tables cover ASCII 0x20..=0x7E (95 printable characters).
//! Index = (char as usize) - 32.

use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Font faces
// ────────────────────────────────────────────────────────────────────────────

/// The faces a page may reference. Serialized in draw operations so renderers can
/// map them to real fonts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontFace {
    /// Body text.
    Serif,
    /// Emphasis blocks and the cover attribution line.
    SerifItalic,
    /// Chapter headings and the cover title.
    SerifBold,
    /// Page numbers and placeholder captions.
    Sans,
    /// Watermark.
    SansBold,
}

impl FontFace {
    /// Width multiplier applied on top of the regular table.
    fn width_factor(&self) -> f32 {
        match self {
            FontFace::Serif | FontFace::Sans => 1.0,
            FontFace::SerifItalic => 0.96,
            FontFace::SerifBold | FontFace::SansBold => 1.08,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Font metric table
// ────────────────────────────────────────────────────────────────────────────

/// Static character-width table for a font family.
///
/// Width array slot layout:
/// ```text
/// [0]=sp  [1]=!   [2]="   [3]=#   [4]=$   [5]=%   [6]=&   [7]='
/// [8]=(   [9]=)   [10]=*  [11]=+  [12]=,  [13]=-  [14]=.  [15]=/
/// [16..25]=0-9
/// [26]=:  [27]=;  [28]=<  [29]==  [30]=>  [31]=?  [32]=@
/// [33..58]=A-Z
/// [59]=[  [60]=\  [61]=]  [62]=^  [63]=_  [64]=`
/// [65..90]=a-z
/// [91]={  [92]=|  [93]=}  [94]=~
/// ```
pub struct FontMetricTable {
    widths: [f32; 95],
    /// Fallback width for non-ASCII characters (codepoints > 0x7E).
    pub average_char_width: f32,
    pub space_width: f32,
}

impl FontMetricTable {
    /// Measures the rendered width of a string in em units.
    ///
    /// Non-ASCII characters fall back to `average_char_width`.
    pub fn measure_str(&self, s: &str) -> f32 {
        s.chars()
            .map(|c| {
                let code = c as usize;
                if (32..=126).contains(&code) {
                    self.widths[code - 32]
                } else {
                    self.average_char_width
                }
            })
            .sum()
    }
}

/// Helvetica: AFM widths / 1000.
static HELVETICA_TABLE: FontMetricTable = FontMetricTable {
    #[rustfmt::skip]
    widths: [
        // sp     !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
        0.278, 0.278, 0.355, 0.556, 0.556, 0.889, 0.667, 0.191, 0.333, 0.333, 0.389, 0.584, 0.278, 0.333, 0.278, 0.278,
        // 0      1      2      3      4      5      6      7      8      9
        0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556,
        // :      ;      <      =      >      ?      @
        0.278, 0.278, 0.584, 0.584, 0.584, 0.556, 1.015,
        // A      B      C      D      E      F      G      H      I      J      K      L      M
        0.667, 0.667, 0.722, 0.722, 0.667, 0.611, 0.778, 0.722, 0.278, 0.500, 0.667, 0.556, 0.833,
        // N      O      P      Q      R      S      T      U      V      W      X      Y      Z
        0.722, 0.778, 0.667, 0.778, 0.722, 0.667, 0.611, 0.722, 0.667, 0.944, 0.667, 0.667, 0.611,
        // [      \      ]      ^      _      `
        0.278, 0.278, 0.278, 0.469, 0.556, 0.333,
        // a      b      c      d      e      f      g      h      i      j      k      l      m
        0.556, 0.556, 0.500, 0.556, 0.556, 0.278, 0.556, 0.556, 0.222, 0.222, 0.500, 0.222, 0.833,
        // n      o      p      q      r      s      t      u      v      w      x      y      z
        0.556, 0.556, 0.556, 0.556, 0.333, 0.500, 0.278, 0.556, 0.500, 0.722, 0.500, 0.500, 0.500,
        // {      |      }      ~
        0.334, 0.260, 0.334, 0.584,
    ],
    average_char_width: 0.52,
    space_width: 0.278,
};

/// Times-Roman: AFM widths / 1000.
static TIMES_TABLE: FontMetricTable = FontMetricTable {
    #[rustfmt::skip]
    widths: [
        // sp     !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
        0.250, 0.333, 0.408, 0.500, 0.500, 0.833, 0.778, 0.180, 0.333, 0.333, 0.500, 0.564, 0.250, 0.333, 0.250, 0.278,
        // 0      1      2      3      4      5      6      7      8      9
        0.500, 0.500, 0.500, 0.500, 0.500, 0.500, 0.500, 0.500, 0.500, 0.500,
        // :      ;      <      =      >      ?      @
        0.278, 0.278, 0.564, 0.564, 0.564, 0.444, 0.921,
        // A      B      C      D      E      F      G      H      I      J      K      L      M
        0.722, 0.667, 0.667, 0.722, 0.611, 0.556, 0.722, 0.722, 0.333, 0.389, 0.722, 0.611, 0.889,
        // N      O      P      Q      R      S      T      U      V      W      X      Y      Z
        0.722, 0.722, 0.556, 0.722, 0.667, 0.556, 0.611, 0.722, 0.722, 0.944, 0.722, 0.722, 0.611,
        // [      \      ]      ^      _      `
        0.333, 0.278, 0.333, 0.469, 0.500, 0.333,
        // a      b      c      d      e      f      g      h      i      j      k      l      m
        0.444, 0.500, 0.444, 0.500, 0.444, 0.333, 0.500, 0.500, 0.278, 0.278, 0.500, 0.278, 0.778,
        // n      o      p      q      r      s      t      u      v      w      x      y      z
        0.500, 0.500, 0.500, 0.500, 0.333, 0.389, 0.278, 0.500, 0.500, 0.722, 0.500, 0.500, 0.444,
        // {      |      }      ~
        0.480, 0.200, 0.480, 0.541,
    ],
    average_char_width: 0.47,
    space_width: 0.250,
};

/// Returns the static metric table backing a face.
pub fn get_metrics(face: FontFace) -> &'static FontMetricTable {
    match face {
        FontFace::Serif | FontFace::SerifItalic | FontFace::SerifBold => &TIMES_TABLE,
        FontFace::Sans | FontFace::SansBold => &HELVETICA_TABLE,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Measuring and wrapping
// ────────────────────────────────────────────────────────────────────────────

/// Width of `text` in points when set in `face` at `size_pt`.
pub fn measure_text(text: &str, face: FontFace, size_pt: f32) -> f32 {
    get_metrics(face).measure_str(text) * size_pt * face.width_factor()
}

/// Greedy word-wrap at `max_width_pt`. Returns the printed lines.
///
/// Words are re-joined with single spaces, so for whitespace-normalized input
/// `lines.join(" ") == text`. A word wider than the line stays intact on its own line.
/// Empty or whitespace-only text yields no lines.
pub fn wrap_lines(text: &str, face: FontFace, size_pt: f32, max_width_pt: f32) -> Vec<String> {
    let metrics = get_metrics(face);
    let scale = size_pt * face.width_factor();
    let space_w = metrics.space_width * scale;

    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0.0_f32;

    for word in text.split_whitespace() {
        let word_w = metrics.measure_str(word) * scale;
        if current.is_empty() {
            current.push_str(word);
            current_width = word_w;
        } else if current_width + space_w + word_w > max_width_pt {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_width = word_w;
        } else {
            current.push(' ');
            current.push_str(word);
            current_width += space_w + word_w;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_str_empty_returns_zero() {
        assert_eq!(get_metrics(FontFace::Sans).measure_str(""), 0.0);
    }

    #[test]
    fn test_measure_str_ascii_characters() {
        // "Rust" in Helvetica = R(0.722) + u(0.556) + s(0.500) + t(0.278) = 2.056
        let width = get_metrics(FontFace::Sans).measure_str("Rust");
        assert!((width - 2.056).abs() < 1e-3, "got {width}");
    }

    #[test]
    fn test_measure_str_non_ascii_falls_back() {
        let metrics = get_metrics(FontFace::Serif);
        let width = metrics.measure_str("é");
        assert!((width - metrics.average_char_width).abs() < 1e-4);
    }

    #[test]
    fn test_measure_text_scales_with_size() {
        let small = measure_text("Chapter", FontFace::Serif, 10.0);
        let large = measure_text("Chapter", FontFace::Serif, 20.0);
        assert!((large - 2.0 * small).abs() < 1e-3);
    }

    #[test]
    fn test_bold_wider_than_regular() {
        let regular = measure_text("Chapter One", FontFace::Serif, 12.0);
        let bold = measure_text("Chapter One", FontFace::SerifBold, 12.0);
        assert!(bold > regular);
    }

    #[test]
    fn test_wrap_lines_empty_text_has_no_lines() {
        assert!(wrap_lines("   ", FontFace::Serif, 11.0, 300.0).is_empty());
    }

    #[test]
    fn test_wrap_lines_short_text_single_line() {
        let lines = wrap_lines("Short text.", FontFace::Serif, 11.0, 300.0);
        assert_eq!(lines, vec!["Short text.".to_string()]);
    }

    #[test]
    fn test_wrap_lines_rejoins_to_input() {
        let text = "word ".repeat(200);
        let text = text.trim_end();
        let lines = wrap_lines(text, FontFace::Serif, 11.0, 200.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.join(" "), text);
        for line in &lines {
            assert!(measure_text(line, FontFace::Serif, 11.0) <= 200.0 + 1e-3);
        }
    }

    #[test]
    fn test_wrap_lines_overlong_word_kept_intact() {
        let word = "x".repeat(400);
        let lines = wrap_lines(&format!("a {word} b"), FontFace::Sans, 11.0, 100.0);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], word);
    }
}
