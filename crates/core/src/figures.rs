//! Matching extracted figures to slides.
//!
//! Slides are matched in presentation order and each image is used at most
//! once: earlier slides get first pick. A figure explicitly recommended for
//! a slide in the blueprint wins outright; otherwise every remaining image
//! is scored against the slide's text and the best one is kept if it clears
//! the threshold.

use crate::config::DeckConfig;
use crate::image_type::{ImageTag, ImageTypeClassifier};
use crate::normalize::paper_keywords;
use crate::types::{ImageAsset, MatchReason, MatchResult, SlideRecord};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;
use std::sync::LazyLock;

static SLIDE_REF_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Slide (\d+):").unwrap());

static FIGURE_MENTION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Figure (\d+|[A-Z]):|Table (\d+):|diagram|chart|plot|graph").unwrap()
});

static RECOMMENDED_FIGURE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)figure\s*(\d+)").unwrap());

/// Bonus when a topic's preferred image type is present.
const PREFERRED_TYPE_SCORE: i32 = 10;

/// Bonus for any other topic hit.
const TOPIC_SCORE: i32 = 3;

/// Bonus when the image sits on a page typical for the topic.
const PAGE_SCORE: i32 = 5;

/// Bonus per paper keyword found in the file name.
const KEYWORD_SCORE: i32 = 8;

/// Penalty for embedded icons and logos.
const EMBEDDED_PENALTY: i32 = 5;

const EMBEDDED_MARKERS: &[&str] = &["embedded", "icon"];

/// Content topic used for scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Topic {
    Architecture,
    Results,
    Method,
    Training,
    Data,
}

/// Topic keywords and the image type each topic prefers.
const TOPIC_RULES: &[(Topic, &[&str], Option<ImageTag>)] = &[
    (
        Topic::Architecture,
        &["architecture", "model", "network", "structure", "design", "layer"],
        Some(ImageTag::Diagram),
    ),
    (
        Topic::Results,
        &["results", "performance", "accuracy", "comparison", "evaluation", "experiment", "score"],
        Some(ImageTag::Chart),
    ),
    (
        Topic::Method,
        &["method", "approach", "algorithm", "procedure", "mechanism", "process"],
        None,
    ),
    (
        Topic::Training,
        &["training", "optimization", "learning", "convergence", "loss", "epoch"],
        None,
    ),
    (
        Topic::Data,
        &["data", "dataset", "samples", "distribution", "augmentation", "preprocessing"],
        Some(ImageTag::Table),
    ),
];

/// Exclusive page ranges typical for a topic. At most one bonus is paid.
const PAGE_RULES: &[(Topic, u32, u32)] = &[
    (Topic::Results, 4, u32::MAX),
    (Topic::Method, 2, 6),
    (Topic::Architecture, 2, 5),
];

/// A figure mention found in the blueprint under a `Slide N:` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FigureHint {
    /// The mentioning line, trimmed.
    pub line: String,

    /// The two lines before and after, joined with spaces.
    pub context: String,
}

/// Figure hints keyed by 1-based slide number.
pub type Recommendations = BTreeMap<usize, Vec<FigureHint>>;

/// Collect figure/table/chart mentions under each `Slide N:` header.
pub fn extract_recommendations(blueprint: &str) -> Recommendations {
    let lines: Vec<&str> = blueprint.lines().collect();
    let mut recommendations = Recommendations::new();
    let mut current_slide: Option<usize> = None;

    for (i, line) in lines.iter().enumerate() {
        if let Some(number) = SLIDE_REF_REGEX
            .captures(line)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<usize>().ok())
        {
            current_slide = Some(number).filter(|n| *n > 0);
            if let Some(n) = current_slide {
                recommendations.insert(n, Vec::new());
            }
        }

        let Some(slide) = current_slide else {
            continue;
        };

        if FIGURE_MENTION_REGEX.is_match(line) {
            let start = i.saturating_sub(2);
            let end = (i + 3).min(lines.len());
            recommendations.entry(slide).or_default().push(FigureHint {
                line: line.trim().to_string(),
                context: lines[start..end].join(" "),
            });
        }
    }

    recommendations
}

/// An asset together with its inferred tags.
#[derive(Debug, Clone)]
pub struct CandidateAsset<'a> {
    pub asset: &'a ImageAsset,
    pub tags: BTreeSet<ImageTag>,
}

/// Result of matching one slide, borrowing the chosen candidate.
#[derive(Debug, Clone)]
pub struct SlideMatch<'c, 'a> {
    pub candidate: Option<&'c CandidateAsset<'a>>,
    pub score: i32,
    pub reason: MatchReason,
}

/// Greedy slide-to-figure matcher.
#[derive(Debug)]
pub struct FigureMatcher {
    classifier: ImageTypeClassifier,
    score_threshold: i32,
}

impl Default for FigureMatcher {
    fn default() -> Self {
        Self::from_config(&DeckConfig::default())
    }
}

impl FigureMatcher {
    /// Create a matcher with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &DeckConfig) -> Self {
        Self {
            classifier: ImageTypeClassifier::new(),
            score_threshold: config.match_score_threshold,
        }
    }

    /// Use a custom image classifier (e.g. one with text recognition).
    pub fn with_classifier(mut self, classifier: ImageTypeClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Set the minimum score for a match to be accepted.
    pub fn with_score_threshold(mut self, threshold: i32) -> Self {
        self.score_threshold = threshold;
        self
    }

    /// Infer tags for every asset in the pool.
    pub fn classify_pool<'a>(&self, assets: &'a [ImageAsset]) -> Vec<CandidateAsset<'a>> {
        assets
            .iter()
            .map(|asset| CandidateAsset {
                asset,
                tags: self.classifier.infer_types(asset),
            })
            .collect()
    }

    /// Match every slide, in order, against a shrinking pool of assets.
    ///
    /// Returns one result per slide; no asset path is used twice.
    pub fn smart_match(
        &self,
        slides: &[SlideRecord],
        blueprint: &str,
        assets: &[ImageAsset],
    ) -> Vec<MatchResult> {
        let candidates = self.classify_pool(assets);
        let keywords = paper_keywords(blueprint);
        let recommendations = extract_recommendations(blueprint);
        let mut used: HashSet<&Path> = HashSet::new();
        let mut results = Vec::with_capacity(slides.len());

        log::info!("Matching {} slides against {} figures", slides.len(), assets.len());

        for (index, slide) in slides.iter().enumerate() {
            let available: Vec<&CandidateAsset<'_>> = candidates
                .iter()
                .filter(|c| !used.contains(c.asset.path.as_path()))
                .collect();

            if available.is_empty() {
                log::debug!("Slide {}: no more figures available", index + 1);
                results.push(MatchResult {
                    slide_index: index,
                    asset: None,
                    score: 0,
                    reason: MatchReason::NoAssetsLeft,
                });
                continue;
            }

            let matched = self.match_one(
                slide,
                index + 1,
                &recommendations,
                &available,
                &keywords,
            );

            match matched.candidate {
                Some(candidate) => {
                    log::debug!(
                        "Slide {} ({}): {} ({}, score {})",
                        index + 1,
                        slide.title,
                        candidate.asset.path.display(),
                        matched.reason,
                        matched.score
                    );
                    used.insert(candidate.asset.path.as_path());
                }
                None => log::debug!("Slide {} ({}): no relevant figure", index + 1, slide.title),
            }

            results.push(MatchResult {
                slide_index: index,
                asset: matched.candidate.map(|c| c.asset.clone()),
                score: matched.score,
                reason: matched.reason,
            });
        }

        results
    }

    /// Pick the best available asset for one slide.
    pub fn match_one<'c, 'a>(
        &self,
        slide: &SlideRecord,
        slide_number: usize,
        recommendations: &Recommendations,
        available: &[&'c CandidateAsset<'a>],
        paper_keywords: &[String],
    ) -> SlideMatch<'c, 'a> {
        let content = slide.content_lower();

        if let Some(candidate) = recommended_candidate(slide_number, recommendations, available) {
            return SlideMatch {
                candidate: Some(candidate),
                score: score_candidate(&content, candidate, paper_keywords),
                reason: MatchReason::Recommended,
            };
        }

        let mut best: Option<&'c CandidateAsset<'a>> = None;
        let mut best_score = 0;

        for &candidate in available {
            let score = score_candidate(&content, candidate, paper_keywords);
            if score > best_score {
                best_score = score;
                best = Some(candidate);
            }
        }

        if best.is_some() && best_score >= self.score_threshold {
            SlideMatch {
                candidate: best,
                score: best_score,
                reason: MatchReason::Scored,
            }
        } else {
            SlideMatch {
                candidate: None,
                score: best_score,
                reason: MatchReason::NoMatch,
            }
        }
    }
}

/// An available asset tagged with a figure number the blueprint names for
/// this slide.
fn recommended_candidate<'c, 'a>(
    slide_number: usize,
    recommendations: &Recommendations,
    available: &[&'c CandidateAsset<'a>],
) -> Option<&'c CandidateAsset<'a>> {
    let hints = recommendations.get(&slide_number)?;

    hints
        .iter()
        .filter_map(|hint| {
            RECOMMENDED_FIGURE_REGEX
                .captures(&hint.line)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<u32>().ok())
        })
        .find_map(|number| {
            let tag = ImageTag::Figure(number);
            available.iter().copied().find(|c| c.tags.contains(&tag))
        })
}

fn score_candidate(content: &str, candidate: &CandidateAsset<'_>, paper_keywords: &[String]) -> i32 {
    let file_name = candidate.asset.file_name_lower();
    let mut score = 0;

    let mut topics = Vec::new();

    for (topic, words, preferred) in TOPIC_RULES {
        let hit = words.iter().any(|w| content.contains(w))
            || (*topic == Topic::Architecture
                && paper_keywords.iter().any(|k| content.contains(k.as_str())));
        if !hit {
            continue;
        }
        topics.push(*topic);
        if preferred.as_ref().is_some_and(|t| candidate.tags.contains(t)) {
            score += PREFERRED_TYPE_SCORE;
        } else {
            score += TOPIC_SCORE;
        }
    }

    let page = candidate.asset.page;
    if page > 0
        && PAGE_RULES
            .iter()
            .any(|(topic, above, below)| topics.contains(topic) && page > *above && page < *below)
    {
        score += PAGE_SCORE;
    }

    for keyword in paper_keywords {
        if file_name.contains(keyword.as_str()) {
            score += KEYWORD_SCORE;
        }
    }

    if EMBEDDED_MARKERS.iter().any(|m| file_name.contains(m)) {
        score -= EMBEDDED_PENALTY;
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ImageSize;

    fn chart(name: &str, page: u32) -> ImageAsset {
        ImageAsset::new(name, page, Some(ImageSize::new(900, 400)))
    }

    fn diagram(name: &str, page: u32) -> ImageAsset {
        ImageAsset::new(name, page, Some(ImageSize::new(500, 500)))
    }

    fn table(name: &str, page: u32) -> ImageAsset {
        ImageAsset::new(name, page, Some(ImageSize::new(300, 700)))
    }

    fn slide(title: &str, bullets: &[&str]) -> SlideRecord {
        SlideRecord::new(title, bullets.iter().copied())
    }

    #[test]
    fn test_extract_recommendations() {
        let blueprint = "intro line\nSlide 1: Overview\n- text\nSlide 2: Results\n- see Figure 3: accuracy curves\n- a bar chart of scores\nSlide 3: Outro\n";
        let recs = extract_recommendations(blueprint);

        assert_eq!(recs.get(&1).map(Vec::len), Some(0));
        let hints = &recs[&2];
        assert_eq!(hints.len(), 2);
        assert_eq!(hints[0].line, "- see Figure 3: accuracy curves");
        assert_eq!(
            hints[0].context,
            "- text Slide 2: Results - see Figure 3: accuracy curves - a bar chart of scores Slide 3: Outro"
        );
        assert!(recs[&3].is_empty());
    }

    #[test]
    fn test_mentions_before_first_slide_ignored() {
        let recs = extract_recommendations("A chart up front\nSlide 1: Start\n");
        assert_eq!(recs.len(), 1);
        assert!(recs[&1].is_empty());
    }

    #[test]
    fn test_results_slide_prefers_late_chart() {
        let assets = vec![table("page1_img1.png", 1), chart("page6_img1.png", 6)];
        let slides = vec![slide("Results", &["Better than before"])];

        let results = FigureMatcher::new().smart_match(&slides, "", &assets);

        assert_eq!(results.len(), 1);
        let chosen = results[0].asset.as_ref().unwrap();
        assert_eq!(chosen.path, Path::new("page6_img1.png"));
        assert_eq!(results[0].score, 15);
        assert_eq!(results[0].reason, MatchReason::Scored);
    }

    #[test]
    fn test_scores_individual_candidates() {
        let assets = vec![table("page1_img1.png", 1), chart("page6_img1.png", 6)];
        let matcher = FigureMatcher::new();
        let pool = matcher.classify_pool(&assets);
        let content = "results better than before";

        assert_eq!(score_candidate(content, &pool[0], &[]), 3);
        assert_eq!(score_candidate(content, &pool[1], &[]), 15);
    }

    #[test]
    fn test_data_slide_prefers_table() {
        let assets = vec![table("page1_img1.png", 1), chart("page1_img2.png", 1)];
        let matcher = FigureMatcher::new();
        let pool = matcher.classify_pool(&assets);
        let content = "dataset statistics";

        assert_eq!(score_candidate(content, &pool[0], &[]), 10);
        assert_eq!(score_candidate(content, &pool[1], &[]), 3);
    }

    #[test]
    fn test_method_page_window() {
        let assets = vec![
            ImageAsset::new("page2_img1.png", 2, None),
            ImageAsset::new("page3_img1.png", 3, None),
            ImageAsset::new("page5_img1.png", 5, None),
            ImageAsset::new("page6_img1.png", 6, None),
        ];
        let matcher = FigureMatcher::new();
        let pool = matcher.classify_pool(&assets);
        let content = "method overview";

        // topic hit +3, page bonus +5 only on pages 3 to 5
        let scores: Vec<i32> = pool.iter().map(|c| score_candidate(content, c, &[])).collect();
        assert_eq!(scores, vec![3, 8, 8, 3]);
    }

    #[test]
    fn test_page_bonus_follows_topic_keywords() {
        // "accuracy" alone puts the slide in the results topic
        let assets = vec![chart("page6_img1.png", 6), chart("page3_img1.png", 3)];
        let matcher = FigureMatcher::new();
        let pool = matcher.classify_pool(&assets);

        assert_eq!(score_candidate("accuracy improves", &pool[0], &[]), 15);
        assert_eq!(score_candidate("accuracy improves", &pool[1], &[]), 10);
    }

    #[test]
    fn test_below_threshold_is_no_match() {
        let assets = vec![table("page1_img1.png", 1)];
        let slides = vec![slide("Results", &["Better than before"])];

        let results = FigureMatcher::new().smart_match(&slides, "", &assets);
        assert_eq!(results[0].asset, None);
        assert_eq!(results[0].score, 3);
        assert_eq!(results[0].reason, MatchReason::NoMatch);

        let results = FigureMatcher::new()
            .with_score_threshold(3)
            .smart_match(&slides, "", &assets);
        assert!(results[0].asset.is_some());
    }

    #[test]
    fn test_recommended_figure_wins() {
        let assets = vec![chart("page6_img1.png", 6), table("page2_figure_4.png", 2)];
        let slides = vec![slide("Results", &["accuracy improves"])];
        let blueprint = "Slide 1: Results\n- Figure 4: the comparison\n";

        let results = FigureMatcher::new().smart_match(&slides, blueprint, &assets);
        let chosen = results[0].asset.as_ref().unwrap();
        assert_eq!(chosen.path, Path::new("page2_figure_4.png"));
        assert_eq!(results[0].reason, MatchReason::Recommended);
    }

    #[test]
    fn test_recommendation_for_other_slide_ignored() {
        let assets = vec![chart("page6_img1.png", 6), table("page2_figure_4.png", 2)];
        let slides = vec![slide("Results", &["accuracy improves"])];
        let blueprint = "Slide 2: Data\n- Figure 4: the samples\n";

        let results = FigureMatcher::new().smart_match(&slides, blueprint, &assets);
        assert_eq!(
            results[0].asset.as_ref().unwrap().path,
            Path::new("page6_img1.png")
        );
        assert_eq!(results[0].reason, MatchReason::Scored);
    }

    #[test]
    fn test_assets_used_at_most_once() {
        let assets = vec![chart("page6_img1.png", 6), chart("page7_img1.png", 7)];
        let slides = vec![
            slide("Results", &["accuracy"]),
            slide("More Results", &["performance"]),
            slide("Final Results", &["comparison"]),
        ];

        let results = FigureMatcher::new().smart_match(&slides, "", &assets);
        assert_eq!(results.len(), 3);

        let mut seen = HashSet::new();
        for result in &results {
            if let Some(asset) = &result.asset {
                assert!(seen.insert(asset.path.clone()), "reused {:?}", asset.path);
            }
        }
        assert_eq!(results[0].asset.as_ref().unwrap().path, Path::new("page6_img1.png"));
        assert_eq!(results[1].asset.as_ref().unwrap().path, Path::new("page7_img1.png"));
        assert_eq!(results[2].reason, MatchReason::NoAssetsLeft);
    }

    #[test]
    fn test_duplicate_paths_count_as_one_asset() {
        let assets = vec![chart("page6_img1.png", 6), chart("page6_img1.png", 6)];
        let slides = vec![slide("Results", &["accuracy"]), slide("More Results", &["score"])];

        let results = FigureMatcher::new().smart_match(&slides, "", &assets);
        assert!(results[0].asset.is_some());
        assert_eq!(results[1].reason, MatchReason::NoAssetsLeft);
    }

    #[test]
    fn test_architecture_slide_prefers_diagram() {
        let assets = vec![chart("page9_img1.png", 9), diagram("page3_img2.png", 3)];
        let slides = vec![slide("Model Architecture", &["Encoder network"])];

        let results = FigureMatcher::new().smart_match(&slides, "", &assets);
        assert_eq!(
            results[0].asset.as_ref().unwrap().path,
            Path::new("page3_img2.png")
        );
        // diagram +10, architecture page bonus +5
        assert_eq!(results[0].score, 15);
    }

    #[test]
    fn test_paper_keyword_in_file_name() {
        let assets = vec![
            ImageAsset::new("attentionnet_overview.png", 0, None),
            ImageAsset::new("other.png", 0, None),
        ];
        let slides = vec![slide("Overview", &["What we built"])];
        let blueprint = "1. **Overview**\n- We propose AttentionNet\n";

        let results = FigureMatcher::new().smart_match(&slides, blueprint, &assets);
        assert_eq!(
            results[0].asset.as_ref().unwrap().path,
            Path::new("attentionnet_overview.png")
        );
        assert_eq!(results[0].score, 8);
    }

    #[test]
    fn test_embedded_images_penalized() {
        let assets = vec![diagram("page3_embedded_logo.png", 3)];
        let matcher = FigureMatcher::new();
        let pool = matcher.classify_pool(&assets);

        // diagram +10, page +5, embedded -5
        assert_eq!(score_candidate("model architecture", &pool[0], &[]), 10);
    }

    #[test]
    fn test_no_assets() {
        let slides = vec![slide("Results", &["x"])];
        let results = FigureMatcher::new().smart_match(&slides, "", &[]);
        assert_eq!(results[0].reason, MatchReason::NoAssetsLeft);
        assert_eq!(results[0].asset, None);
    }
}
