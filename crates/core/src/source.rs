//! Preparation of the paper's extracted text.
//!
//! PDF extraction leaves compatibility glyphs (ligatures, full-width
//! digits), words split across line ends and ragged whitespace. The
//! verifier compares bullets against this text, so it is cleaned first.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Word hyphenated across a line break.
static BROKEN_WORD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w)-\s+(\w)").unwrap());

static WHITESPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static FIGURE_CAPTION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:Figure|Fig\.?)\s+(\d+)[:.]?\s*([^\n]+)").unwrap());

static TABLE_CAPTION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Table\s+(\d+)[:.]?\s*([^\n]+)").unwrap());

/// Headings longer than this are treated as body text.
const MAX_HEADING_CHARS: usize = 50;

/// Section names and the heading prefixes that open them, in priority order.
const SECTION_RULES: &[(&str, &[&str])] = &[
    ("abstract", &["abstract", "summary"]),
    ("introduction", &["introduction", "background"]),
    ("methods", &["method", "methodology", "approach", "materials and methods"]),
    ("experiments", &["experiment", "evaluation", "implementation"]),
    ("results", &["result", "finding"]),
    ("discussion", &["discussion", "analysis"]),
    ("conclusion", &["conclusion", "future work"]),
    ("references", &["reference", "bibliography"]),
];

/// Section that content belongs to before any heading is seen.
const INITIAL_SECTION: &str = "introduction";

/// Normalize extracted paper text for claim verification.
///
/// Applies NFKC, re-joins hyphenated words and collapses whitespace.
pub fn clean_source_text(raw: &str) -> String {
    let normalized: String = raw.nfkc().collect();
    let collapsed = WHITESPACE_REGEX.replace_all(&normalized, " ");
    BROKEN_WORD_REGEX
        .replace_all(&collapsed, "$1$2")
        .trim()
        .to_string()
}

/// A named section of the paper and its content lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSection {
    pub name: String,
    pub content: String,
}

/// Split raw (line-structured) paper text into sections.
///
/// A short line starting with a known heading word opens a section. When a
/// section name repeats, the later content replaces the earlier one but the
/// section keeps its original position.
pub fn identify_sections(text: &str) -> Vec<SourceSection> {
    let mut sections: Vec<SourceSection> = Vec::new();
    let mut current = INITIAL_SECTION;
    let mut content: Vec<&str> = Vec::new();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match heading_section(line) {
            Some(name) => {
                store_section(&mut sections, current, &content);
                current = name;
                content.clear();
            }
            None => content.push(line),
        }
    }
    store_section(&mut sections, current, &content);

    log::debug!(
        "Identified sections: {}",
        sections.iter().map(|s| s.name.as_str()).collect::<Vec<_>>().join(", ")
    );
    sections
}

fn heading_section(line: &str) -> Option<&'static str> {
    if line.chars().count() >= MAX_HEADING_CHARS {
        return None;
    }
    let lower = line.to_lowercase();
    SECTION_RULES
        .iter()
        .find(|(_, prefixes)| prefixes.iter().any(|p| lower.starts_with(p)))
        .map(|(name, _)| *name)
}

fn store_section(sections: &mut Vec<SourceSection>, name: &str, content: &[&str]) {
    if content.is_empty() {
        return;
    }
    let content = content.join("\n");
    match sections.iter_mut().find(|s| s.name == name) {
        Some(existing) => existing.content = content,
        None => sections.push(SourceSection {
            name: name.to_string(),
            content,
        }),
    }
}

/// Whether a caption belongs to a figure or a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    Figure,
    Table,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Figure => f.write_str("figure"),
            Self::Table => f.write_str("table"),
        }
    }
}

/// A numbered figure or table caption found in the paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FigureReference {
    pub kind: ReferenceKind,
    pub number: u32,
    pub caption: String,
}

/// Find figure and table captions. Figures are listed before tables.
pub fn extract_figure_references(text: &str) -> Vec<FigureReference> {
    let figures = captions(&FIGURE_CAPTION_REGEX, text, ReferenceKind::Figure);
    let tables = captions(&TABLE_CAPTION_REGEX, text, ReferenceKind::Table);
    figures.chain(tables).collect()
}

fn captions<'t>(
    regex: &'t Regex,
    text: &'t str,
    kind: ReferenceKind,
) -> impl Iterator<Item = FigureReference> + 't {
    regex.captures_iter(text).filter_map(move |caps| {
        let number = caps.get(1)?.as_str().parse().ok()?;
        let caption = caps.get(2)?.as_str().trim().to_string();
        Some(FigureReference {
            kind,
            number,
            caption,
        })
    })
}
