//! Slide classification, duplicate merging and narrative reordering.
//!
//! Slides are first merged by title similarity, then stably sorted into the
//! canonical order Introduction, Background, Methodology, Experimental,
//! Results, Discussion, Conclusion. Unclassified slides sort between
//! Methodology and Experimental.

use crate::config::DeckConfig;
use crate::normalize::jaccard_similarity;
use crate::types::SlideRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical presentation section of a slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Introduction,
    Background,
    Methodology,
    Experimental,
    Results,
    Discussion,
    Conclusion,
    Other,
}

impl Section {
    /// Sort key of this section in the canonical narrative.
    pub fn order_key(self) -> f64 {
        match self {
            Self::Introduction => 1.0,
            Self::Background => 2.0,
            Self::Methodology => 3.0,
            Self::Other => 3.5,
            Self::Experimental => 4.0,
            Self::Results => 5.0,
            Self::Discussion => 6.0,
            Self::Conclusion => 7.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Introduction => "introduction",
            Self::Background => "background",
            Self::Methodology => "methodology",
            Self::Experimental => "experimental",
            Self::Results => "results",
            Self::Discussion => "discussion",
            Self::Conclusion => "conclusion",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Title keywords, tested in order; the first section with a hit wins.
const TITLE_RULES: &[(Section, &[&str])] = &[
    (Section::Introduction, &["introduction", "intro", "overview", "abstract"]),
    (
        Section::Background,
        &["background", "related work", "motivation", "problem", "prior work"],
    ),
    (
        Section::Methodology,
        &["method", "approach", "architecture", "model", "design", "proposed", "algorithm"],
    ),
    (
        Section::Experimental,
        &["experiment", "evaluation", "setup", "implementation", "training"],
    ),
    (
        Section::Results,
        &["result", "performance", "comparison", "analysis", "findings"],
    ),
    (
        Section::Discussion,
        &["discussion", "limitation", "future work", "implication"],
    ),
    (Section::Conclusion, &["conclusion", "summary", "takeaway"]),
];

/// Bullet-content keywords, consulted only when the title is inconclusive.
const CONTENT_RULES: &[(Section, &[&str])] = &[
    (Section::Methodology, &["architecture", "model", "layer", "network"]),
    (Section::Results, &["accuracy", "performance", "outperform", "score"]),
    (
        Section::Experimental,
        &["training", "optimizer", "hyperparameter", "epoch"],
    ),
    (Section::Discussion, &["limitation", "future", "improve"]),
];

fn first_rule_hit(text: &str, rules: &[(Section, &[&str])]) -> Option<Section> {
    rules
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(section, _)| *section)
}

/// Assign a canonical section to a slide from its title, falling back to
/// its bullets, and finally to [`Section::Other`].
pub fn classify(title: &str, bullets: &[String]) -> Section {
    let title_lower = title.to_lowercase();
    if let Some(section) = first_rule_hit(&title_lower, TITLE_RULES) {
        return section;
    }

    let content = bullets.join(" ").to_lowercase();
    first_rule_hit(&content, CONTENT_RULES).unwrap_or(Section::Other)
}

/// Stable sort by section order; ties keep their original order.
pub fn reorder(slides: Vec<SlideRecord>) -> Vec<SlideRecord> {
    let mut keyed: Vec<(f64, usize, Section, SlideRecord)> = slides
        .into_iter()
        .enumerate()
        .map(|(i, slide)| {
            let section = classify(&slide.title, &slide.bullets);
            (section.order_key(), i, section, slide)
        })
        .collect();

    keyed.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    let mut current: Option<Section> = None;
    for (position, (_, _, section, slide)) in keyed.iter().enumerate() {
        if current != Some(*section) {
            current = Some(*section);
            log::debug!("{}:", section.as_str().to_uppercase());
        }
        log::debug!("  {}. {}", position + 1, slide.title);
    }

    keyed.into_iter().map(|(_, _, _, slide)| slide).collect()
}

/// Organizer that merges duplicate slides and restores narrative order.
#[derive(Debug, Clone)]
pub struct SlideOrganizer {
    similarity_threshold: f64,
    max_bullets: usize,
}

impl Default for SlideOrganizer {
    fn default() -> Self {
        Self::from_config(&DeckConfig::default())
    }
}

impl SlideOrganizer {
    /// Create an organizer with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &DeckConfig) -> Self {
        Self {
            similarity_threshold: config.merge_similarity_threshold,
            max_bullets: config.max_bullets_per_slide.max(1),
        }
    }

    /// Set the title similarity above which slides are merged.
    pub fn with_similarity_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    /// Set the number of bullets kept per slide after merging.
    pub fn with_max_bullets(mut self, max: usize) -> Self {
        self.max_bullets = max.max(1);
        self
    }

    /// Merge later slides whose titles are similar to an earlier one.
    ///
    /// Scans left to right; the first unconsumed slide absorbs the novel
    /// bullets of every later similar slide. Each survivor is then truncated
    /// to the bullet limit.
    pub fn merge_duplicates(&self, slides: Vec<SlideRecord>) -> Vec<SlideRecord> {
        let titles: Vec<String> = slides.iter().map(|s| s.title.to_lowercase()).collect();
        let mut consumed = vec![false; slides.len()];
        let mut absorbed: Vec<Vec<usize>> = vec![Vec::new(); slides.len()];

        for i in 0..slides.len() {
            if consumed[i] {
                continue;
            }
            for j in (i + 1)..slides.len() {
                if consumed[j] {
                    continue;
                }
                if jaccard_similarity(&titles[i], &titles[j]) > self.similarity_threshold {
                    consumed[j] = true;
                    absorbed[i].push(j);
                    log::debug!(
                        "Merged duplicate '{}' into '{}'",
                        slides[j].title,
                        slides[i].title
                    );
                }
            }
        }

        let mut slots: Vec<Option<SlideRecord>> = slides.into_iter().map(Some).collect();
        let mut merged = Vec::new();

        for i in 0..slots.len() {
            if consumed[i] {
                continue;
            }
            let Some(mut slide) = slots[i].take() else {
                continue;
            };
            for &j in &absorbed[i] {
                if let Some(other) = slots[j].take() {
                    for bullet in other.bullets {
                        if !slide.bullets.contains(&bullet) {
                            slide.bullets.push(bullet);
                        }
                    }
                    if slide.visual_hint.is_none() {
                        slide.visual_hint = other.visual_hint;
                    }
                }
            }
            slide.bullets.truncate(self.max_bullets);
            merged.push(slide);
        }

        merged
    }

    /// Merge duplicates, drop slides without bullets, then reorder.
    pub fn organize(&self, slides: Vec<SlideRecord>) -> Vec<SlideRecord> {
        let before = slides.len();
        let merged: Vec<SlideRecord> = self
            .merge_duplicates(slides)
            .into_iter()
            .filter(|s| !s.bullets.is_empty())
            .collect();
        let organized = reorder(merged);

        log::info!("Organized {} slides into {}", before, organized.len());
        organized
    }
}
