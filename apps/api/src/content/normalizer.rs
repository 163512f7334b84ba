//! Content normalization — turns raw generated prose into an ordered `Block` sequence.
//!
//! # Pipeline
//! 1. Strip artifacts that apply across lines: `<!-- comments -->`, word-count parentheticals.
//! 2. Split on blank lines into chunks. Inside a chunk, markdown heading and separator
//!    lines become their own blocks; a bare "Chapter N" line counts only as the first line
//!    of its chunk. The remaining lines join into one paragraph. A paragraph starting with
//!    `\` is literal text and keeps its markers.
//! 3. Strip inline bold/italic markers. A paragraph wrapped entirely in one emphasis pair
//!    becomes an `Emphasis` block.
//! 4. Collapse duplicated headings, first inside one heading's text, then between
//!    adjacent heading blocks.
//! 5. Split over-long paragraphs at sentence boundaries.
//! 6. Synthesize chapter headings when a long text has none.
//!
//! Normalization never fails: empty input yields one placeholder paragraph. Running it on
//! `render_blocks` of its own output returns the same blocks.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::content::blocks::{Block, BlockKind};

// ────────────────────────────────────────────────────────────────────────────
// Options
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct NormalizerOptions {
    /// Paragraphs longer than this (in characters) are split at sentence boundaries.
    pub max_paragraph_chars: usize,
    /// Heading-less content longer than this gets synthesized chapter headings.
    pub synthesize_headings_after_chars: usize,
    /// Approximate chapter length used when synthesizing headings.
    pub synthesized_chapter_chars: usize,
    /// Text of the single block produced for empty input.
    pub placeholder_text: String,
}

impl Default for NormalizerOptions {
    fn default() -> Self {
        Self {
            max_paragraph_chars: 1200,
            synthesize_headings_after_chars: 6000,
            synthesized_chapter_chars: 4000,
            placeholder_text: "This story is waiting to be written.".to_string(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Patterns
// ────────────────────────────────────────────────────────────────────────────

static COMMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("comment pattern"));

static WORD_COUNT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)[\(\[]\s*(?:word\s*count\s*[:\-]?\s*~?\d[\d,]*(?:\s*words?)?|(?:approx(?:\.|imately)?\s*|about\s*|~\s*)?\d[\d,]*\s*words?)\s*[\)\]]",
    )
    .expect("word count pattern")
});

static BLANK_LINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").expect("blank line pattern"));

static MD_HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#{1,6})\s+(.+?)(?:\s+#+)?\s*$").expect("markdown heading pattern"));

static CHAPTER_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:chapter|part)\s+(?:[0-9]+|[ivxlcdm]+|one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve|thirteen|fourteen|fifteen|sixteen|seventeen|eighteen|nineteen|twenty)(?:\s*[:.\-–—]\s*\S.*|\s+(?:chapter|part)\s.*)?$",
    )
    .expect("chapter line pattern")
});

static SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[*\-_=~]\s*){3,}$").expect("separator pattern"));

static EMPHASIS_STAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\*([^*\s][^*]*[^*\s]|[^*\s])\*$").expect("emphasis pattern"));

static EMPHASIS_UNDERSCORE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^_([^_\s][^_]*[^_\s]|[^_\s])_$").expect("emphasis pattern"));

static BOLD_STAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*([^*]+?)\*\*").expect("bold pattern"));

static BOLD_UNDERSCORE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"__([^_]+?)__").expect("bold pattern"));

static ITALIC_STAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*([^*\s](?:[^*]*[^*\s])?)\*").expect("italic pattern"));

static ITALIC_UNDERSCORE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b_([^_\s](?:[^_]*[^_\s])?)_\b").expect("italic pattern"));

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

const MAX_BARE_HEADING_CHARS: usize = 80;
const MAX_BARE_HEADING_WORDS: usize = 12;
const SEPARATOR_TEXT: &str = "* * *";
/// Leading marker of a literal paragraph.
pub(crate) const LITERAL_MARK: char = '\\';

// ────────────────────────────────────────────────────────────────────────────
// Entry point
// ────────────────────────────────────────────────────────────────────────────

/// A block before indices are assigned.
#[derive(Debug, Clone, PartialEq)]
struct Draft {
    kind: BlockKind,
    text: String,
}

impl Draft {
    fn new(kind: BlockKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Normalizes raw content into an ordered, non-empty block sequence.
pub fn normalize(raw: &str, options: &NormalizerOptions) -> Vec<Block> {
    let cleaned = strip_artifacts(raw);

    let mut drafts = Vec::new();
    for chunk in BLANK_LINE_RE.split(&cleaned) {
        drafts.extend(parse_chunk(chunk));
    }

    let drafts = collapse_adjacent_headings(drafts);
    let drafts = split_long_paragraphs(drafts, options.max_paragraph_chars);
    let mut drafts = synthesize_chapters(drafts, options);

    if drafts.is_empty() {
        debug!("Empty content, substituting placeholder block");
        drafts.push(Draft::new(BlockKind::Paragraph, options.placeholder_text.clone()));
    }

    let blocks: Vec<Block> = drafts
        .into_iter()
        .enumerate()
        .map(|(i, d)| Block::new(d.kind, d.text, i))
        .collect();

    debug!(
        blocks = blocks.len(),
        headings = blocks.iter().filter(|b| b.kind.is_heading()).count(),
        "Content normalized"
    );
    blocks
}

// ────────────────────────────────────────────────────────────────────────────
// Chunk parsing
// ────────────────────────────────────────────────────────────────────────────

fn strip_artifacts(raw: &str) -> String {
    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");
    let without_comments = COMMENT_RE.replace_all(&unified, "");
    WORD_COUNT_RE.replace_all(&without_comments, "").into_owned()
}

fn parse_chunk(chunk: &str) -> Vec<Draft> {
    let mut drafts = Vec::new();
    let mut body_lines: Vec<&str> = Vec::new();

    let lines = chunk.lines().map(str::trim).filter(|l| !l.is_empty());
    for (i, line) in lines.enumerate() {
        if let Some(structural) = classify_line(line, i == 0) {
            flush_paragraph(&mut body_lines, &mut drafts);
            drafts.push(structural);
        } else {
            body_lines.push(line);
        }
    }
    flush_paragraph(&mut body_lines, &mut drafts);
    drafts
}

/// Whether `text`, written out on its own line, parses back into the same paragraph.
pub(crate) fn reparses_as_paragraph(text: &str) -> bool {
    parse_chunk(text) == [Draft::new(BlockKind::Paragraph, text)]
}

/// Returns a heading or separator draft for structural lines, `None` for body text.
/// Bare chapter lines count only where `chunk_start` is set.
fn classify_line(line: &str, chunk_start: bool) -> Option<Draft> {
    if SEPARATOR_RE.is_match(line) {
        return Some(Draft::new(BlockKind::Separator, SEPARATOR_TEXT));
    }
    // A line wrapped in one emphasis pair is styled prose, never a heading.
    if is_whole_emphasis(line) {
        return None;
    }

    let plain = collapse_whitespace(&strip_inline_markers(line));
    if let Some(caps) = MD_HEADING_RE.captures(&plain) {
        let kind = match caps[1].len() {
            1 => BlockKind::Heading1,
            2 => BlockKind::Heading2,
            _ => BlockKind::Heading3,
        };
        let text = dedupe_heading_text(&caps[2]);
        if text.is_empty() {
            return None;
        }
        return Some(Draft::new(kind, text));
    }

    if chunk_start && is_bare_chapter_line(&plain) {
        return Some(Draft::new(BlockKind::Heading1, dedupe_heading_text(&plain)));
    }
    None
}

fn is_bare_chapter_line(text: &str) -> bool {
    CHAPTER_LINE_RE.is_match(text)
        && text.chars().count() <= MAX_BARE_HEADING_CHARS
        && text.split_whitespace().count() <= MAX_BARE_HEADING_WORDS
        && !text.ends_with(['.', ',', ';'])
}

fn is_whole_emphasis(text: &str) -> bool {
    EMPHASIS_STAR_RE.is_match(text) || EMPHASIS_UNDERSCORE_RE.is_match(text)
}

fn flush_paragraph(lines: &mut Vec<&str>, drafts: &mut Vec<Draft>) {
    if lines.is_empty() {
        return;
    }
    let joined = collapse_whitespace(&lines.join(" "));
    lines.clear();

    if let Some(literal) = joined.strip_prefix(LITERAL_MARK) {
        let literal = literal.trim_start();
        if !literal.is_empty() {
            drafts.push(Draft::new(BlockKind::Paragraph, literal));
        }
        return;
    }

    let emphasis_inner = EMPHASIS_STAR_RE
        .captures(&joined)
        .or_else(|| EMPHASIS_UNDERSCORE_RE.captures(&joined))
        .map(|caps| caps[1].to_string());

    let (kind, text) = match emphasis_inner {
        Some(inner) => (BlockKind::Emphasis, inner),
        None => (BlockKind::Paragraph, joined),
    };
    let text = collapse_whitespace(&strip_inline_markers(&text));
    if !text.is_empty() {
        drafts.push(Draft::new(kind, text));
    }
}

fn strip_inline_markers(text: &str) -> String {
    let text = BOLD_STAR_RE.replace_all(text, "$1");
    let text = BOLD_UNDERSCORE_RE.replace_all(&text, "$1");
    let text = ITALIC_STAR_RE.replace_all(&text, "$1");
    ITALIC_UNDERSCORE_RE.replace_all(&text, "$1").into_owned()
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text.trim(), " ").into_owned()
}

// ────────────────────────────────────────────────────────────────────────────
// Heading de-duplication
// ────────────────────────────────────────────────────────────────────────────

/// Comparison key: lowercase alphanumerics separated by single spaces.
fn heading_key(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// `("chapter", "3")` for words like `Chapter 3:`.
fn label_at(words: &[&str], at: usize) -> Option<(String, String)> {
    let kind = words.get(at)?.to_ascii_lowercase();
    if kind != "chapter" && kind != "part" {
        return None;
    }
    let number = heading_key(words.get(at + 1)?);
    if number.is_empty() || number.contains(' ') {
        return None;
    }
    Some((kind, number))
}

/// Collapses a heading whose text repeats itself, e.g. "Chapter 3: Dawn Chapter 3: Dawn"
/// or "Chapter 3 Chapter 3: Dawn". The more descriptive copy wins.
fn dedupe_heading_text(text: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();

    if words.len() >= 2 && words.len() % 2 == 0 {
        let (first, second) = words.split_at(words.len() / 2);
        let second = second.join(" ");
        if heading_key(&first.join(" ")) == heading_key(&second) {
            return dedupe_heading_text(&second);
        }
    }

    if let Some(label) = label_at(&words, 0) {
        for k in 2..words.len().saturating_sub(1) {
            if label_at(&words, k).as_ref() == Some(&label) {
                let first = words[..k].join(" ");
                let second = words[k..].join(" ");
                let keep = if second.len() >= first.len() {
                    second
                } else {
                    first
                };
                return dedupe_heading_text(&keep);
            }
        }
    }

    words.join(" ")
}

fn is_chapter_label_key(key: &str) -> bool {
    let words: Vec<&str> = key.split(' ').collect();
    words.len() == 2 && (words[0] == "chapter" || words[0] == "part")
}

fn headings_duplicate(a: &str, b: &str) -> bool {
    let (ka, kb) = (heading_key(a), heading_key(b));
    if ka == kb {
        return true;
    }
    let (short, long) = if ka.len() <= kb.len() {
        (ka, kb)
    } else {
        (kb, ka)
    };
    is_chapter_label_key(&short)
        && long.starts_with(&short)
        && long[short.len()..].starts_with(' ')
}

fn stronger_heading(a: BlockKind, b: BlockKind) -> BlockKind {
    match (a.heading_level(), b.heading_level()) {
        (Some(la), Some(lb)) if lb < la => b,
        _ => a,
    }
}

fn collapse_adjacent_headings(drafts: Vec<Draft>) -> Vec<Draft> {
    let mut out: Vec<Draft> = Vec::with_capacity(drafts.len());
    for draft in drafts {
        if let Some(prev) = out.last_mut() {
            if draft.kind.is_heading()
                && prev.kind.is_heading()
                && headings_duplicate(&prev.text, &draft.text)
            {
                let kind = stronger_heading(prev.kind, draft.kind);
                if heading_key(&draft.text).len() > heading_key(&prev.text).len() {
                    prev.text = draft.text;
                }
                prev.kind = kind;
                continue;
            }
        }
        out.push(draft);
    }
    out
}

// ────────────────────────────────────────────────────────────────────────────
// Paragraph splitting and chapter synthesis
// ────────────────────────────────────────────────────────────────────────────

/// Splits whitespace-normalized text after `.`, `!` or `?` (plus closing quotes and
/// brackets) when followed by a space. `sentences.join(" ") == text`.
fn split_sentences(text: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < chars.len() {
        if matches!(chars[i].1, '.' | '!' | '?') {
            let mut j = i + 1;
            while j < chars.len()
                && matches!(
                    chars[j].1,
                    '.' | '!' | '?' | '"' | '\'' | '\u{201D}' | '\u{2019}' | ')' | ']'
                )
            {
                j += 1;
            }
            if j < chars.len() && chars[j].1 == ' ' {
                let end = chars[j].0;
                sentences.push(&text[start..end]);
                start = end + 1;
                i = j + 1;
                continue;
            }
            i = j;
            continue;
        }
        i += 1;
    }
    if start < text.len() {
        sentences.push(&text[start..]);
    }
    sentences
}

fn split_paragraph(text: &str, max_chars: usize) -> Vec<String> {
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;
    for sentence in split_sentences(text) {
        let len = sentence.chars().count();
        if !current.is_empty() && current_len + 1 + len > max_chars {
            pieces.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(sentence);
        current_len += len;
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

fn split_long_paragraphs(drafts: Vec<Draft>, max_chars: usize) -> Vec<Draft> {
    let max_chars = max_chars.max(1);
    drafts
        .into_iter()
        .flat_map(|draft| {
            if draft.kind.is_body() {
                split_paragraph(&draft.text, max_chars)
                    .into_iter()
                    .map(|text| Draft::new(draft.kind, text))
                    .collect()
            } else {
                vec![draft]
            }
        })
        .collect()
}

fn synthesize_chapters(drafts: Vec<Draft>, options: &NormalizerOptions) -> Vec<Draft> {
    let total: usize = drafts.iter().map(|d| d.text.chars().count()).sum();
    if drafts.iter().any(|d| d.kind.is_heading()) || total <= options.synthesize_headings_after_chars
    {
        return drafts;
    }

    let chapters = total.div_ceil(options.synthesized_chapter_chars.max(1)).max(1);
    let per_chapter = total / chapters;
    debug!(chapters, total_chars = total, "Synthesizing chapter headings");

    let mut out = Vec::with_capacity(drafts.len() + chapters);
    let mut number = 1;
    let mut accumulated = 0usize;
    out.push(Draft::new(BlockKind::Heading1, "Chapter 1"));
    for draft in drafts {
        if accumulated >= per_chapter && number < chapters {
            number += 1;
            out.push(Draft::new(BlockKind::Heading1, format!("Chapter {number}")));
            accumulated = 0;
        }
        accumulated += draft.text.chars().count();
        out.push(draft);
    }
    out
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::blocks::render_blocks;

    fn run(raw: &str) -> Vec<Block> {
        normalize(raw, &NormalizerOptions::default())
    }

    fn kinds(blocks: &[Block]) -> Vec<BlockKind> {
        blocks.iter().map(|b| b.kind).collect()
    }

    #[test]
    fn test_empty_input_yields_placeholder() {
        let blocks = run("");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind, BlockKind::Paragraph);
        assert_eq!(blocks[0].text, NormalizerOptions::default().placeholder_text);

        let blocks = run("  \n\n \t \n");
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn test_heading_and_paragraph() {
        let blocks = run("# Chapter 1\n\nShort text.");
        assert_eq!(kinds(&blocks), vec![BlockKind::Heading1, BlockKind::Paragraph]);
        assert_eq!(blocks[0].text, "Chapter 1");
        assert_eq!(blocks[1].text, "Short text.");
        assert_eq!(blocks[1].source_index, 1);
    }

    #[test]
    fn test_heading_levels_and_separator() {
        let blocks = run("## Part of it\n\n### Aside\n\n---\n\n#### Deep");
        assert_eq!(
            kinds(&blocks),
            vec![
                BlockKind::Heading2,
                BlockKind::Heading3,
                BlockKind::Separator,
                BlockKind::Heading3
            ]
        );
        assert_eq!(blocks[2].text, "* * *");
    }

    #[test]
    fn test_heading_closing_hashes_trimmed() {
        let blocks = run("## Learning C# ##\n\nBody.");
        assert_eq!(blocks[0].text, "Learning C#");
    }

    #[test]
    fn test_heading_line_without_blank_line_splits_chunk() {
        let blocks = run("# Chapter 2\nThe rain began.\nIt did not stop.");
        assert_eq!(kinds(&blocks), vec![BlockKind::Heading1, BlockKind::Paragraph]);
        assert_eq!(blocks[1].text, "The rain began. It did not stop.");
    }

    #[test]
    fn test_bare_chapter_line_is_heading() {
        let blocks = run("**Chapter Three: The Sea**\n\nWaves.");
        assert_eq!(blocks[0].kind, BlockKind::Heading1);
        assert_eq!(blocks[0].text, "Chapter Three: The Sea");
    }

    #[test]
    fn test_chapter_sentence_stays_paragraph() {
        let blocks = run("Chapter 5 was the one she liked best.");
        assert_eq!(kinds(&blocks), vec![BlockKind::Paragraph]);
    }

    #[test]
    fn test_wrapped_prose_line_is_not_a_chapter() {
        let blocks = run(
            "She remembered the night well.\nPart one of the plan was simple and she knew\nit by heart.",
        );
        assert_eq!(kinds(&blocks), vec![BlockKind::Paragraph]);
        assert_eq!(
            blocks[0].text,
            "She remembered the night well. Part one of the plan was simple and she knew it by heart."
        );
    }

    #[test]
    fn test_bare_chapter_line_only_at_chunk_start() {
        let blocks = run("Chapter 4\nThe door opened.");
        assert_eq!(kinds(&blocks), vec![BlockKind::Heading1, BlockKind::Paragraph]);

        let blocks = run("The door opened.\nChapter 4");
        assert_eq!(kinds(&blocks), vec![BlockKind::Paragraph]);
    }

    #[test]
    fn test_chapter_label_needs_title_separator() {
        assert!(is_bare_chapter_line("Chapter 12"));
        assert!(is_bare_chapter_line("Part IV - The Return"));
        assert!(is_bare_chapter_line("Chapter Two: Embers"));
        assert!(!is_bare_chapter_line("Chapter 5 began, and ended"));
        assert!(!is_bare_chapter_line("Part one of the plan was simple"));
        assert!(!is_bare_chapter_line("Chapter 5 -"));
    }

    #[test]
    fn test_literal_paragraph_keeps_markup() {
        let blocks = run("\\-- -");
        assert_eq!(kinds(&blocks), vec![BlockKind::Paragraph]);
        assert_eq!(blocks[0].text, "-- -");

        let blocks = run("\\*not emphasis*");
        assert_eq!(blocks[0].kind, BlockKind::Paragraph);
        assert_eq!(blocks[0].text, "*not emphasis*");
    }

    #[test]
    fn test_reparses_as_paragraph() {
        assert!(reparses_as_paragraph("Plain words."));
        assert!(!reparses_as_paragraph("Chapter 5 - Dawn"));
        assert!(!reparses_as_paragraph("-- -"));
        assert!(!reparses_as_paragraph("\\escaped"));
    }

    #[test]
    fn test_strips_comments_word_counts_and_markers() {
        let raw = "<!-- draft\nnotes -->The **bold** and *quiet* fox (Word count: 1,200) ran __far__.";
        let blocks = run(raw);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text, "The bold and quiet fox ran far.");
    }

    #[test]
    fn test_word_count_variants_removed() {
        let blocks = run("Ends here. (approx. 300 words)\n\nNext [450 words]");
        assert_eq!(blocks[0].text, "Ends here.");
        assert_eq!(blocks[1].text, "Next");
    }

    #[test]
    fn test_parenthetical_year_kept() {
        let blocks = run("It was built in (1999) by hand.");
        assert_eq!(blocks[0].text, "It was built in (1999) by hand.");
    }

    #[test]
    fn test_snake_case_not_treated_as_italic() {
        let blocks = run("The file was named snake_case_name today.");
        assert_eq!(blocks[0].text, "The file was named snake_case_name today.");
    }

    #[test]
    fn test_whole_paragraph_emphasis() {
        let blocks = run("*Dear reader,\nthis is a letter.*");
        assert_eq!(kinds(&blocks), vec![BlockKind::Emphasis]);
        assert_eq!(blocks[0].text, "Dear reader, this is a letter.");
    }

    #[test]
    fn test_duplicated_heading_text_collapsed() {
        let blocks = run("# Chapter 3: Dawn Chapter 3: Dawn\n\nText.");
        assert_eq!(blocks[0].text, "Chapter 3: Dawn");

        let blocks = run("# Chapter 3 Chapter 3: Dawn\n\nText.");
        assert_eq!(blocks[0].text, "Chapter 3: Dawn");
    }

    #[test]
    fn test_adjacent_duplicate_headings_collapsed() {
        let blocks = run("# Chapter 1\n\n## Chapter 1: The Beginning\n\nOnce.");
        assert_eq!(kinds(&blocks), vec![BlockKind::Heading1, BlockKind::Paragraph]);
        assert_eq!(blocks[0].text, "Chapter 1: The Beginning");

        let blocks = run("# The Storm\n\n# the storm!\n\nRain.");
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn test_distinct_adjacent_headings_kept() {
        let blocks = run("# Chapter 1\n\n## The Beginning\n\nOnce.");
        assert_eq!(
            kinds(&blocks),
            vec![BlockKind::Heading1, BlockKind::Heading2, BlockKind::Paragraph]
        );

        let blocks = run("# Chapter 1\n\n# Chapter 10");
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn test_long_paragraph_split_at_sentences_without_loss() {
        let sentence = "The lighthouse keeper counted every wave that broke on the rocks below.";
        let paragraph = vec![sentence; 60].join(" ");
        let options = NormalizerOptions::default();
        let blocks = normalize(&format!("# Chapter 1\n\n{paragraph}"), &options);

        let pieces: Vec<&Block> = blocks.iter().filter(|b| b.kind.is_body()).collect();
        assert!(pieces.len() > 1, "paragraph should be split");
        for piece in &pieces {
            assert!(piece.text.chars().count() <= options.max_paragraph_chars);
            assert!(piece.text.ends_with('.'));
        }
        let rejoined = pieces
            .iter()
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(rejoined, paragraph);
    }

    #[test]
    fn test_single_overlong_sentence_kept_whole() {
        let sentence = "word ".repeat(400);
        let blocks = run(&format!("# One\n\n{}", sentence.trim()));
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].word_count(), 400);
    }

    #[test]
    fn test_split_sentences_handles_quotes() {
        let parts = split_sentences("\"Stop!\" she said. He did? Yes.");
        assert_eq!(parts, vec!["\"Stop!\"", "she said.", "He did?", "Yes."]);
    }

    #[test]
    fn test_chapters_synthesized_for_long_headingless_text() {
        let paragraph = "A quiet afternoon passed by the river bank without event. ".repeat(10);
        let raw = vec![paragraph.trim(); 20].join("\n\n");
        let blocks = run(&raw);

        let headings: Vec<&Block> = blocks.iter().filter(|b| b.kind.is_heading()).collect();
        assert!(headings.len() >= 2, "expected synthesized chapters");
        assert_eq!(blocks[0].kind, BlockKind::Heading1);
        assert_eq!(headings[0].text, "Chapter 1");
        assert_eq!(headings[1].text, "Chapter 2");
        assert_eq!(blocks.iter().filter(|b| b.kind.is_body()).count(), 20);
    }

    #[test]
    fn test_short_headingless_text_not_synthesized() {
        let blocks = run("One paragraph.\n\nAnother paragraph.");
        assert!(blocks.iter().all(|b| !b.kind.is_heading()));
    }

    #[test]
    fn test_source_indices_are_sequential() {
        let blocks = run("# A\n\nOne.\n\n***\n\nTwo.\n\n## B\n\nThree.");
        for (i, block) in blocks.iter().enumerate() {
            assert_eq!(block.source_index, i);
        }
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let long = "She walked. ".repeat(150);
        let samples = vec![
            String::new(),
            "# Chapter 1\n\nShort text.".to_string(),
            "**Chapter 2** Chapter 2\n\n<!-- x -->Body *with* marks (300 words).\n\n***\n\n_A note._"
                .to_string(),
            format!("# Chapter 1\n\n## Chapter 1: Start\n\n{long}"),
            "Plain text only.\n\nAnd more.".to_string(),
            format!("{}\n\n{}", "Long prose goes on. ".repeat(200), "Tail. ".repeat(200)),
            "Chapter 5 began,\nand ended".to_string(),
            "--\n-".to_string(),
            "Chapter 5 -\nDawn".to_string(),
            "# Title\nChapter 5".to_string(),
            "\\\\*kept* as typed".to_string(),
            "Intro line\n***bold-ish***\n\\tail".to_string(),
        ];
        let options = NormalizerOptions::default();
        for sample in samples {
            let first = normalize(&sample, &options);
            let second = normalize(&render_blocks(&first), &options);
            assert_eq!(first, second, "not idempotent for {sample:?}");
        }
    }
}
