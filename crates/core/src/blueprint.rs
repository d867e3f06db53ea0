//! Blueprint parsing: generated slide-deck text to typed slide records.
//!
//! Two layouts are understood:
//!
//! ```text
//! 1. **Model Architecture**          === MODEL ARCHITECTURE ===
//! - Encoder built from 6 layers      - Encoder built from 6 layers
//!
//! Slide 2: Results
//! * Achieves 85.2% accuracy
//! ```
//!
//! Numbered headers (`N. **Title**` or `Slide N: Title`, optionally behind a
//! markdown `#` prefix) are tried first;
//! when none are found the text is split on `=== TITLE ===` fences.

use crate::config::DeckConfig;
use crate::normalize::{clean_title, compact_title};
use crate::types::{QaPair, SlideRecord};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Header of a numbered slide: `3. **Title**`, `**Slide 3: Title**` or
/// `## Slide 3: Title`.
static NUMBERED_HEADER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?:#{1,6}[ \t]*)?(?:\d+\.[ \t]+\*\*|(?:\*\*)?Slide[ \t]+\d+[ \t]*:)(?P<title>[^\n]*)$",
    )
    .unwrap()
});

/// Fenced section header: `=== TITLE ===`.
static FENCE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"={3,}[ \t]*(?P<title>[^=\n]+?)[ \t]*={3,}").unwrap());

/// Leading bullet marker.
static BULLET_MARKER_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-•*]\s*").unwrap());

/// Inline field label such as `**Bullet:**` or `Visual Notes:`.
static FIELD_LABEL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\**\s*(?P<label>bullet(?:\s+point)?|key\s+points?|visual(?:\s+notes?)?|visuals)\s*\**\s*:\s*\**\s*",
    )
    .unwrap()
});

/// A line that is entirely bold, e.g. `**Key Points:**`. Treated as a
/// sub-heading, not a bullet.
static BOLD_HEADING_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\*\*[^*]+\*\*:?$").unwrap());

/// Literal that opens the trailing presenter-notes block.
const PRESENTER_NOTES_MARKER: &str = "Presenter Notes:";

/// Question lines longer than this are ignored.
const MAX_QUESTION_CHARS: usize = 200;

/// Answer lines longer than this are ignored.
const MAX_ANSWER_CHARS: usize = 300;

/// Which textual convention a blueprint was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutKind {
    /// `N. **Title**` or `Slide N: Title` headers.
    Numbered,
    /// `=== TITLE ===` fences.
    Fenced,
    /// Neither convention was found.
    Unrecognized,
}

/// A raw slide segment: header title and the body text that follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub title: &'a str,
    pub body: &'a str,
}

/// Result of layout detection, carrying the segments of the detected layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlueprintLayout<'a> {
    Numbered(Vec<Segment<'a>>),
    Fenced(Vec<Segment<'a>>),
    Unrecognized,
}

impl<'a> BlueprintLayout<'a> {
    /// Detect the layout of `text` and split it into segments.
    pub fn detect(text: &'a str) -> Self {
        let numbered = split_segments(text, &NUMBERED_HEADER_REGEX);
        if !numbered.is_empty() {
            return Self::Numbered(numbered);
        }

        let fenced = split_segments(text, &FENCE_REGEX);
        if !fenced.is_empty() {
            return Self::Fenced(fenced);
        }

        Self::Unrecognized
    }

    pub fn kind(&self) -> LayoutKind {
        match self {
            Self::Numbered(_) => LayoutKind::Numbered,
            Self::Fenced(_) => LayoutKind::Fenced,
            Self::Unrecognized => LayoutKind::Unrecognized,
        }
    }

    pub fn segments(&self) -> &[Segment<'a>] {
        match self {
            Self::Numbered(segments) | Self::Fenced(segments) => segments,
            Self::Unrecognized => &[],
        }
    }
}

/// Split `text` at every header match; each segment's body runs until the
/// next header.
fn split_segments<'a>(text: &'a str, header: &Regex) -> Vec<Segment<'a>> {
    let headers: Vec<_> = header.captures_iter(text).collect();

    headers
        .iter()
        .enumerate()
        .filter_map(|(i, caps)| {
            let whole = caps.get(0)?;
            let title = caps.name("title")?.as_str();
            let end = headers
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map(|m| m.start())
                .unwrap_or(text.len());
            Some(Segment {
                title,
                body: &text[whole.end()..end],
            })
        })
        .collect()
}

/// A fully parsed blueprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blueprint {
    pub layout: LayoutKind,

    /// Slides in emission order. Segments without bullets are omitted.
    pub slides: Vec<SlideRecord>,

    /// Questions and answers mined from the presenter notes.
    pub qa_pairs: Vec<QaPair>,

    /// Raw presenter-notes block, if the blueprint had one.
    pub presenter_notes: Option<String>,
}

/// Parser turning generated blueprint text into slide records.
#[derive(Debug, Clone)]
pub struct BlueprintParser {
    compact_titles: bool,
    title_max_chars: usize,
    title_max_words: usize,
    max_qa_pairs: usize,
}

impl Default for BlueprintParser {
    fn default() -> Self {
        Self::from_config(&DeckConfig::default())
    }
}

impl BlueprintParser {
    /// Create a parser with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &DeckConfig) -> Self {
        Self {
            compact_titles: config.compact_titles,
            title_max_chars: config.title_max_chars,
            title_max_words: config.title_max_words.max(1),
            max_qa_pairs: config.max_qa_pairs,
        }
    }

    /// Shorten long titles to a handful of words.
    pub fn with_compact_titles(mut self, compact: bool) -> Self {
        self.compact_titles = compact;
        self
    }

    /// Set the maximum number of Q&A pairs kept from the presenter notes.
    pub fn with_max_qa_pairs(mut self, max: usize) -> Self {
        self.max_qa_pairs = max;
        self
    }

    /// Parse blueprint text into slides and presenter-notes Q&A.
    pub fn parse(&self, text: &str) -> Blueprint {
        let (body, notes) = split_presenter_notes(text);
        let layout = BlueprintLayout::detect(body);

        if layout.kind() == LayoutKind::Unrecognized && !body.trim().is_empty() {
            log::warn!("Blueprint matches no known layout; no slides parsed");
        }

        let slides: Vec<SlideRecord> = layout
            .segments()
            .iter()
            .filter_map(|segment| self.parse_segment(segment))
            .collect();

        log::info!(
            "Parsed {} slides from {} {:?} segments",
            slides.len(),
            layout.segments().len(),
            layout.kind()
        );

        let qa_pairs = notes
            .map(|n| extract_qa_pairs(n, self.max_qa_pairs))
            .unwrap_or_default();

        Blueprint {
            layout: layout.kind(),
            slides,
            qa_pairs,
            presenter_notes: notes.map(|n| n.trim().to_string()),
        }
    }

    /// Parse one segment; `None` when it has no usable bullets.
    fn parse_segment(&self, segment: &Segment<'_>) -> Option<SlideRecord> {
        let mut title = clean_title(segment.title);
        if self.compact_titles {
            title = compact_title(&title, self.title_max_chars, self.title_max_words);
        }

        let (bullets, visual_hint) = parse_body(segment.body);
        if bullets.is_empty() {
            log::debug!("Dropping segment '{}': no bullets", title);
            return None;
        }

        Some(SlideRecord {
            title,
            bullets,
            visual_hint,
        })
    }
}

/// Extract bullets and an optional visual hint from a segment body.
fn parse_body(body: &str) -> (Vec<String>, Option<String>) {
    let mut bullets = Vec::new();
    let mut visual_hint = None;

    for raw in body.lines() {
        let line = raw.trim();
        if line.is_empty() || BOLD_HEADING_REGEX.is_match(line) {
            continue;
        }

        if let Some(marker) = BULLET_MARKER_REGEX.find(line) {
            let rest = &line[marker.end()..];
            if BOLD_HEADING_REGEX.is_match(rest) {
                continue;
            }
            let (label, text) = match FIELD_LABEL_REGEX.captures(rest) {
                Some(caps) => {
                    let label = caps.name("label").map(|m| m.as_str().to_lowercase());
                    let end = caps.get(0).map(|m| m.end()).unwrap_or(0);
                    (label, rest[end..].trim())
                }
                None => (None, rest.trim()),
            };

            let is_visual = label.as_deref().is_some_and(|l| l.starts_with("visual"));
            if is_visual {
                if !text.is_empty() {
                    visual_hint = Some(text.to_string());
                }
            } else if text.chars().any(char::is_alphanumeric) {
                bullets.push(text.to_string());
            }
        } else if let Some(pos) = line.to_lowercase().find("visual:") {
            // Byte offsets line up: the ASCII label survives lowercasing.
            let hint = line.get(pos + "visual:".len()..).unwrap_or("").trim();
            let hint = hint.trim_matches('*').trim();
            if !hint.is_empty() {
                visual_hint = Some(hint.to_string());
            }
        }
    }

    (bullets, visual_hint)
}

/// Split off the trailing presenter-notes block.
///
/// Returns the blueprint without the block and the block's content.
pub fn split_presenter_notes(text: &str) -> (&str, Option<&str>) {
    let Some(pos) = text.find(PRESENTER_NOTES_MARKER) else {
        return (text, None);
    };

    let line_start = text[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let notes = text[pos + PRESENTER_NOTES_MARKER.len()..].trim_start_matches('*');

    (&text[..line_start], Some(notes))
}

/// Pair question lines with the `+ `-prefixed line that answers them.
pub fn extract_qa_pairs(notes: &str, max_pairs: usize) -> Vec<QaPair> {
    let mut pairs = Vec::new();
    let mut current_question: Option<String> = None;

    for raw in notes.lines() {
        if pairs.len() >= max_pairs {
            break;
        }
        let line = raw.trim();

        if is_question(line) {
            let question = BULLET_MARKER_REGEX
                .replace(line, "")
                .replace("+ ", "")
                .replace('*', "")
                .trim()
                .to_string();
            if !question.is_empty() && question.chars().count() < MAX_QUESTION_CHARS {
                current_question = Some(question);
            }
        } else if current_question.is_some()
            && line.starts_with("+ ")
            && !line.to_lowercase().contains("answer")
        {
            let answer = line.replace("+ ", "").trim().to_string();
            if !answer.is_empty() && answer.chars().count() < MAX_ANSWER_CHARS {
                if let Some(question) = current_question.take() {
                    pairs.push(QaPair { question, answer });
                }
            }
        }
    }

    pairs
}

fn is_question(line: &str) -> bool {
    line.contains('?') && ["What", "How", "Why"].iter().any(|w| line.contains(w))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbered_bold_headers() {
        let text = "Intro text\n\n1. **Introduction**\n- Paper overview\n- Main idea\n\n2. **Model Architecture**\n* Encoder with 6 layers\n";
        let blueprint = BlueprintParser::new().parse(text);

        assert_eq!(blueprint.layout, LayoutKind::Numbered);
        assert_eq!(blueprint.slides.len(), 2);
        assert_eq!(blueprint.slides[0].title, "Introduction");
        assert_eq!(blueprint.slides[0].bullets, vec!["Paper overview", "Main idea"]);
        assert_eq!(blueprint.slides[1].title, "Model Architecture");
        assert_eq!(blueprint.slides[1].bullets, vec!["Encoder with 6 layers"]);
    }

    #[test]
    fn test_slide_n_headers() {
        let text = "**Slide 1: Background**\n- Prior work on Q-learning\n\nSlide 2: Results\n• Achieves 85.2% accuracy\n";
        let blueprint = BlueprintParser::new().parse(text);

        assert_eq!(blueprint.layout, LayoutKind::Numbered);
        let titles: Vec<_> = blueprint.slides.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Background", "Results"]);
        assert_eq!(blueprint.slides[1].bullets, vec!["Achieves 85.2% accuracy"]);
    }

    #[test]
    fn test_markdown_heading_slide_headers() {
        let text = "## Slide 1: Introduction\n- Overview\n\n## Slide 2: Results\n- 85% accuracy\n\n### 3. **Conclusion**\n- Wrap up\n";
        let blueprint = BlueprintParser::new().parse(text);

        assert_eq!(blueprint.layout, LayoutKind::Numbered);
        let titles: Vec<_> = blueprint.slides.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Introduction", "Results", "Conclusion"]);
        assert_eq!(blueprint.slides[0].bullets, vec!["Overview"]);
        assert_eq!(blueprint.slides[1].bullets, vec!["85% accuracy"]);
    }

    #[test]
    fn test_numbered_bold_header_keeps_inner_label() {
        let blueprint = BlueprintParser::new().parse("1. **Slide 1: Intro**\n- Hello\n");
        assert_eq!(blueprint.slides[0].title, "Slide 1: Intro");
    }

    #[test]
    fn test_single_numbered_slide_is_not_fallback() {
        let text = "1. **Overview**\n- Only slide\n";
        let blueprint = BlueprintParser::new().parse(text);
        assert_eq!(blueprint.layout, LayoutKind::Numbered);
        assert_eq!(blueprint.slides.len(), 1);
    }

    #[test]
    fn test_fenced_sections() {
        let text = "=== INTRODUCTION ===\n- Point A\n- Point B\n=== RESULTS ===\n- 85% accuracy\n";
        let blueprint = BlueprintParser::new().parse(text);

        assert_eq!(blueprint.layout, LayoutKind::Fenced);
        assert_eq!(blueprint.slides.len(), 2);
        assert_eq!(blueprint.slides[0].title, "INTRODUCTION");
        assert_eq!(blueprint.slides[0].bullets, vec!["Point A", "Point B"]);
        assert_eq!(blueprint.slides[1].title, "RESULTS");
    }

    #[test]
    fn test_unrecognized_layout() {
        let blueprint = BlueprintParser::new().parse("just some prose\n- with a dash");
        assert_eq!(blueprint.layout, LayoutKind::Unrecognized);
        assert!(blueprint.slides.is_empty());
    }

    #[test]
    fn test_detect_returns_segments() {
        let layout = BlueprintLayout::detect("=== A ===\nbody a\n=== B ===\nbody b");
        assert_eq!(layout.kind(), LayoutKind::Fenced);
        let segments = layout.segments();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].title, "A");
        assert_eq!(segments[0].body.trim(), "body a");
        assert_eq!(segments[1].body.trim(), "body b");
    }

    #[test]
    fn test_segment_without_bullets_dropped() {
        let text = "1. **Empty**\nNo bullets here\n\n2. **Full**\n- One bullet\n";
        let blueprint = BlueprintParser::new().parse(text);
        assert_eq!(blueprint.slides.len(), 1);
        assert_eq!(blueprint.slides[0].title, "Full");
    }

    #[test]
    fn test_field_labels_stripped() {
        let text = "1. **Method**\n- **Bullet:** Uses attention\n- Bullet: Recurrent core\n* **Key Points:**\n";
        let blueprint = BlueprintParser::new().parse(text);
        assert_eq!(
            blueprint.slides[0].bullets,
            vec!["Uses attention", "Recurrent core"]
        );
    }

    #[test]
    fn test_visual_hint_extracted() {
        let text = "1. **Architecture**\n- Encoder and decoder\n- **Visual Notes:** Figure 1 diagram\n";
        let blueprint = BlueprintParser::new().parse(text);
        let slide = &blueprint.slides[0];
        assert_eq!(slide.bullets, vec!["Encoder and decoder"]);
        assert_eq!(slide.visual_hint.as_deref(), Some("Figure 1 diagram"));
    }

    #[test]
    fn test_inline_visual_line() {
        let text = "=== RESULTS ===\n- Better scores\nVisual: bar chart of scores\n";
        let blueprint = BlueprintParser::new().parse(text);
        assert_eq!(blueprint.slides[0].bullets, vec!["Better scores"]);
        assert_eq!(
            blueprint.slides[0].visual_hint.as_deref(),
            Some("bar chart of scores")
        );
    }

    #[test]
    fn test_bold_heading_lines_skipped() {
        let text = "1. **Results**\n**Highlights**\n- Real bullet\n";
        let blueprint = BlueprintParser::new().parse(text);
        assert_eq!(blueprint.slides[0].bullets, vec!["Real bullet"]);
    }

    #[test]
    fn test_titles_have_no_markup() {
        let text = "1. **Deep Attention**\n- a\n\n**Slide 2: Results**\n- b\n";
        let blueprint = BlueprintParser::new().parse(text);
        for slide in &blueprint.slides {
            assert!(!slide.title.contains('*'), "markup left in {:?}", slide.title);
        }
    }

    #[test]
    fn test_compact_titles() {
        let text = "=== A Very Long Title About Deep Attention Recurrent Q Networks ===\n- point\n";
        let parser = BlueprintParser::new().with_compact_titles(true);
        let blueprint = parser.parse(text);
        assert_eq!(blueprint.slides[0].title, "A Very Long Title About...");

        let blueprint = BlueprintParser::new().parse(text);
        assert_eq!(
            blueprint.slides[0].title,
            "A Very Long Title About Deep Attention Recurrent Q Networks"
        );
    }

    #[test]
    fn test_presenter_notes_removed_before_splitting() {
        let text = "1. **Intro**\n- Overview\n\n**Presenter Notes:**\n- Why does attention help?\n+ It focuses on relevant regions\n";
        let blueprint = BlueprintParser::new().parse(text);

        assert_eq!(blueprint.slides.len(), 1);
        assert_eq!(blueprint.slides[0].bullets, vec!["Overview"]);
        assert_eq!(blueprint.qa_pairs.len(), 1);
        assert_eq!(blueprint.qa_pairs[0].question, "Why does attention help?");
        assert_eq!(blueprint.qa_pairs[0].answer, "It focuses on relevant regions");
        assert!(blueprint.presenter_notes.is_some());
    }

    #[test]
    fn test_split_presenter_notes() {
        let (body, notes) = split_presenter_notes("slides\n**Presenter Notes:** notes here");
        assert_eq!(body, "slides\n");
        assert_eq!(notes, Some(" notes here"));

        let (body, notes) = split_presenter_notes("no notes");
        assert_eq!(body, "no notes");
        assert_eq!(notes, None);
    }

    #[test]
    fn test_extract_qa_pairs() {
        let notes = "What is the main idea?\n+ Answer: skip this\n+ Attention over frames\nHow is it trained?\n+ With Q-learning\nA stray line\n+ orphan answer\n";
        let pairs = extract_qa_pairs(notes, 5);

        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].question, "What is the main idea?");
        assert_eq!(pairs[0].answer, "Attention over frames");
        assert_eq!(pairs[1].question, "How is it trained?");
        assert_eq!(pairs[1].answer, "With Q-learning");
        assert_eq!(pairs[0].to_string(), "Q: What is the main idea?\nA: Attention over frames");
    }

    #[test]
    fn test_extract_qa_pairs_capped() {
        let notes = (0..8)
            .map(|i| format!("Why {}?\n+ Because {}\n", i, i))
            .collect::<String>();
        assert_eq!(extract_qa_pairs(&notes, 5).len(), 5);
        assert_eq!(extract_qa_pairs(&notes, 2).len(), 2);
    }

    #[test]
    fn test_round_trip_counts_and_order() {
        for (k, b) in [(1usize, 1usize), (3, 2), (5, 4)] {
            let mut numbered = String::new();
            let mut fenced = String::new();
            for slide in 0..k {
                numbered.push_str(&format!("{}. **Title {}**\n", slide + 1, slide));
                fenced.push_str(&format!("=== Title {} ===\n", slide));
                for bullet in 0..b {
                    numbered.push_str(&format!("- point {} {}\n", slide, bullet));
                    fenced.push_str(&format!("- point {} {}\n", slide, bullet));
                }
            }

            for text in [&numbered, &fenced] {
                let blueprint = BlueprintParser::new().parse(text);
                assert_eq!(blueprint.slides.len(), k);
                for (slide_idx, slide) in blueprint.slides.iter().enumerate() {
                    assert_eq!(slide.title, format!("Title {}", slide_idx));
                    let expected: Vec<String> =
                        (0..b).map(|i| format!("point {} {}", slide_idx, i)).collect();
                    assert_eq!(slide.bullets, expected);
                }
            }
        }
    }
}
