//! Hallucination filter: checks numeric and named claims in bullets
//! against the source paper text.
//!
//! Each bullet is split into atomic claims by an ordered rule table. A bullet
//! without claims is kept as-is; otherwise every claim must be found in the
//! source and the weakest claim's confidence decides the verdict.

use crate::config::DeckConfig;
use crate::types::SlideRecord;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

/// Kind of factual claim a bullet can make.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimKind {
    Percentage,
    Count,
    Accuracy,
    LearningRate,
    BatchSize,
    ArchitectureMetric,
    ModelName,
}

/// An atomic factual assertion found in a bullet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub kind: ClaimKind,

    /// The full matched span, as written in the bullet.
    pub matched_text: String,

    /// The value part of the match (the number or the name).
    pub normalized_value: String,
}

/// One extraction rule: a pattern, the claim kind it yields, and the capture
/// group holding the value.
struct ClaimRule {
    pattern: Regex,
    kind: ClaimKind,
    value_group: usize,
}

impl ClaimRule {
    fn new(pattern: &str, kind: ClaimKind, value_group: usize) -> Self {
        Self {
            pattern: Regex::new(pattern).unwrap(),
            kind,
            value_group,
        }
    }
}

/// Ordered claim-extraction rules.
static CLAIM_RULES: LazyLock<Vec<ClaimRule>> = LazyLock::new(|| {
    vec![
        ClaimRule::new(r"(\d+\.?\d*%)", ClaimKind::Percentage, 1),
        ClaimRule::new(
            r"(?i)(\d+\.?\d*[KMB])\s*(parameters|images|samples)",
            ClaimKind::Count,
            1,
        ),
        ClaimRule::new(r"(?i)accuracy[:\s]+(\d+\.?\d*)", ClaimKind::Accuracy, 1),
        ClaimRule::new(r"(?i)learning rate[:\s]+(\d+\.?\d*)", ClaimKind::LearningRate, 1),
        ClaimRule::new(r"(?i)batch size[:\s]+(\d+)", ClaimKind::BatchSize, 1),
        ClaimRule::new(
            r"(?i)(\d+)\s*(layers|epochs|classes)",
            ClaimKind::ArchitectureMetric,
            1,
        ),
        ClaimRule::new(r"\b([A-Z][a-zA-Z]*Net[-\d]*)\b", ClaimKind::ModelName, 1),
    ]
});

static NUMBER_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+\.?\d*").unwrap());

/// Accuracy figure mentioned in a bullet, for the consistency check.
static ACCURACY_MENTION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)accuracy[:\s]+(\d+\.?\d*)%?").unwrap());

/// Parameter count mentioned in a bullet, for the consistency check.
static PARAMETER_MENTION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+\.?\d*)[KMB]?\s*parameters").unwrap());

/// Confidence of an exact substring match.
const EXACT_CONFIDENCE: f64 = 1.0;

/// Confidence when a number from the claim appears in the source.
const NUMERIC_CONFIDENCE: f64 = 0.8;

/// Confidence when most of the claim's words appear in the source.
const WORD_OVERLAP_CONFIDENCE: f64 = 0.6;

/// Fraction of claim words that must be found for a word-overlap match.
const WORD_OVERLAP_RATIO: f64 = 0.7;

/// Extract every claim from a bullet, rule by rule.
pub fn extract_claims(bullet: &str) -> Vec<Claim> {
    CLAIM_RULES
        .iter()
        .flat_map(|rule| {
            rule.pattern.captures_iter(bullet).filter_map(move |caps| {
                let whole = caps.get(0)?;
                let value = caps.get(rule.value_group).unwrap_or(whole);
                Some(Claim {
                    kind: rule.kind,
                    matched_text: whole.as_str().to_string(),
                    normalized_value: value.as_str().to_string(),
                })
            })
        })
        .collect()
}

/// Check a single claim against the source text.
///
/// Returns whether the claim is supported and with what confidence:
/// exact substring 1.0, shared number 0.8, word overlap 0.6.
pub fn verify_claim(claim_text: &str, source_text: &str) -> (bool, f64) {
    let claim_lower = claim_text.to_lowercase();
    let source_lower = source_text.to_lowercase();

    if source_lower.contains(&claim_lower) {
        return (true, EXACT_CONFIDENCE);
    }

    if NUMBER_REGEX
        .find_iter(claim_text)
        .any(|num| source_text.contains(num.as_str()))
    {
        return (true, NUMERIC_CONFIDENCE);
    }

    let words: Vec<&str> = claim_lower.split_whitespace().collect();
    if words.len() >= 3 {
        let found = words
            .iter()
            .filter(|w| w.chars().count() > 3 && source_lower.contains(*w))
            .count();
        if found as f64 >= words.len() as f64 * WORD_OVERLAP_RATIO {
            return (true, WORD_OVERLAP_CONFIDENCE);
        }
    }

    (false, 0.0)
}

/// Per-bullet verification outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verdict {
    /// The bullet makes no checkable claims.
    NoClaims,
    /// Every claim was found; confidence is the weakest claim's.
    Verified { confidence: f64 },
    /// At least one claim could not be supported.
    Unverifiable { unverified: Vec<Claim> },
}

/// A bullet that was removed, with the claims that sank it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlaggedBullet {
    /// Index of the slide in the verifier's input.
    pub slide_index: usize,
    pub bullet: String,
    pub unverified: Vec<Claim>,
}

/// Summary of one verification pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub verified_bullets: usize,
    pub no_claim_bullets: usize,
    pub flagged: Vec<FlaggedBullet>,

    /// Slides dropped because every bullet was flagged.
    pub removed_slides: usize,

    /// Advisory warnings from the number-consistency check.
    pub warnings: Vec<String>,
}

impl VerificationReport {
    pub fn removed_bullets(&self) -> usize {
        self.flagged.len()
    }
}

/// Verifier that filters unsupported bullets out of slides.
#[derive(Debug, Clone)]
pub struct FactVerifier {
    min_confidence: f64,
}

impl Default for FactVerifier {
    fn default() -> Self {
        Self::from_config(&DeckConfig::default())
    }
}

impl FactVerifier {
    /// Create a verifier with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &DeckConfig) -> Self {
        Self {
            min_confidence: config.min_confidence,
        }
    }

    /// Set the minimum confidence a verified bullet needs.
    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    /// Verify one bullet. The weakest claim governs the whole bullet.
    pub fn verify_bullet(&self, bullet: &str, source_text: &str) -> Verdict {
        let claims = extract_claims(bullet);
        if claims.is_empty() {
            return Verdict::NoClaims;
        }

        let mut min_confidence = 1.0_f64;
        let mut unverified = Vec::new();

        for claim in claims {
            let (verified, confidence) = verify_claim(&claim.matched_text, source_text);
            min_confidence = min_confidence.min(confidence);
            if !verified {
                unverified.push(claim);
            }
        }

        if unverified.is_empty() && min_confidence >= self.min_confidence {
            Verdict::Verified {
                confidence: min_confidence,
            }
        } else {
            Verdict::Unverifiable { unverified }
        }
    }

    /// Whether a verdict keeps its bullet.
    pub fn retains(&self, verdict: &Verdict) -> bool {
        match verdict {
            Verdict::NoClaims => true,
            Verdict::Verified { confidence } => *confidence >= self.min_confidence,
            Verdict::Unverifiable { .. } => false,
        }
    }

    /// Remove unsupported bullets; slides left without bullets are dropped.
    pub fn filter_slides(
        &self,
        slides: Vec<SlideRecord>,
        source_text: &str,
    ) -> (Vec<SlideRecord>, VerificationReport) {
        let mut report = VerificationReport::default();
        let mut kept_slides = Vec::with_capacity(slides.len());

        for (slide_index, mut slide) in slides.into_iter().enumerate() {
            let mut kept = Vec::with_capacity(slide.bullets.len());

            for bullet in slide.bullets {
                let verdict = self.verify_bullet(&bullet, source_text);
                if self.retains(&verdict) {
                    match verdict {
                        Verdict::NoClaims => report.no_claim_bullets += 1,
                        _ => report.verified_bullets += 1,
                    }
                    kept.push(bullet);
                    continue;
                }

                log::debug!(
                    "Slide {}: removing unsupported bullet '{}'",
                    slide_index + 1,
                    bullet
                );
                let unverified = match verdict {
                    Verdict::Unverifiable { unverified } => unverified,
                    _ => Vec::new(),
                };
                report.flagged.push(FlaggedBullet {
                    slide_index,
                    bullet,
                    unverified,
                });
            }

            if kept.is_empty() {
                log::debug!("Dropping slide '{}': no verified bullets left", slide.title);
                report.removed_slides += 1;
                continue;
            }

            slide.bullets = kept;
            kept_slides.push(slide);
        }

        report.warnings = check_number_consistency(&kept_slides);

        if report.flagged.is_empty() {
            log::info!("All bullets verified against source");
        } else {
            log::info!(
                "Removed {} unsupported bullets and {} empty slides",
                report.removed_bullets(),
                report.removed_slides
            );
        }

        (kept_slides, report)
    }
}

/// Report contexts ("accuracy", "parameters") mentioned with more than one
/// distinct value across the deck. Never removes content.
pub fn check_number_consistency(slides: &[SlideRecord]) -> Vec<String> {
    let contexts: [(&str, &Regex); 2] = [
        ("accuracy", &ACCURACY_MENTION_REGEX),
        ("parameters", &PARAMETER_MENTION_REGEX),
    ];

    let mut values_by_context: BTreeMap<&str, BTreeSet<String>> = BTreeMap::new();

    for bullet in slides.iter().flat_map(|s| s.bullets.iter()) {
        for (context, pattern) in &contexts {
            if let Some(value) = pattern
                .captures(bullet)
                .and_then(|caps| caps.get(1))
                .map(|m| canonical_number(m.as_str()))
            {
                values_by_context.entry(*context).or_default().insert(value);
            }
        }
    }

    let warnings: Vec<String> = contexts
        .iter()
        .filter_map(|(context, _)| {
            let values = values_by_context.get(context)?;
            (values.len() > 1).then(|| {
                format!(
                    "Inconsistent {} values: {}",
                    context,
                    values.iter().cloned().collect::<Vec<_>>().join(", ")
                )
            })
        })
        .collect();

    for warning in &warnings {
        log::warn!("{}", warning);
    }

    warnings
}

/// "85.0" and "85" are the same figure.
fn canonical_number(raw: &str) -> String {
    raw.parse::<f64>()
        .map(|v| v.to_string())
        .unwrap_or_else(|_| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "Our model achieves 85.2% accuracy on the ImageNet dataset.\n\
        We use the ResNet-50 architecture as our backbone.\n\
        Training was performed for 100 epochs.";

    fn kinds(claims: &[Claim]) -> Vec<ClaimKind> {
        claims.iter().map(|c| c.kind).collect()
    }

    #[test]
    fn test_extract_percentage_and_model_name() {
        let claims = extract_claims("Achieves 85.2% accuracy on ImageNet");
        assert_eq!(kinds(&claims), vec![ClaimKind::Percentage, ClaimKind::ModelName]);
        assert_eq!(claims[0].matched_text, "85.2%");
        assert_eq!(claims[1].normalized_value, "ImageNet");
    }

    #[test]
    fn test_extract_count_and_metrics() {
        let claims = extract_claims("25M parameters, batch size: 32, learning rate: 0.001");
        assert_eq!(
            kinds(&claims),
            vec![ClaimKind::Count, ClaimKind::LearningRate, ClaimKind::BatchSize]
        );
        assert_eq!(claims[0].normalized_value, "25M");
        assert_eq!(claims[1].normalized_value, "0.001");
        assert_eq!(claims[2].normalized_value, "32");

        let claims = extract_claims("Accuracy: 91.5 after 12 layers and 90 epochs");
        assert_eq!(
            kinds(&claims),
            vec![
                ClaimKind::Accuracy,
                ClaimKind::ArchitectureMetric,
                ClaimKind::ArchitectureMetric
            ]
        );
        assert_eq!(claims[1].matched_text, "12 layers");
        assert_eq!(claims[2].normalized_value, "90");
    }

    #[test]
    fn test_extract_no_claims() {
        assert!(extract_claims("Attention helps the agent focus").is_empty());
    }

    #[test]
    fn test_model_name_with_suffix() {
        let claims = extract_claims("Uses ResNet-50 backbone");
        assert_eq!(kinds(&claims), vec![ClaimKind::ModelName]);
        assert_eq!(claims[0].matched_text, "ResNet-50");
    }

    #[test]
    fn test_verify_claim_exact() {
        assert_eq!(verify_claim("85.2%", SOURCE), (true, 1.0));
        assert_eq!(verify_claim("IMAGENET", SOURCE), (true, 1.0));
    }

    #[test]
    fn test_verify_claim_numeric() {
        assert_eq!(verify_claim("100 training epochs", SOURCE), (true, 0.8));
    }

    #[test]
    fn test_verify_claim_word_overlap() {
        let (ok, confidence) = verify_claim("backbone quality looks great", SOURCE);
        assert!(!ok);
        assert_eq!(confidence, 0.0);

        // three of four words found
        let (ok, confidence) = verify_claim("backbone architecture performed well", SOURCE);
        assert!(ok);
        assert_eq!(confidence, 0.6);
    }

    #[test]
    fn test_verify_claim_missing() {
        assert_eq!(verify_claim("500 epochs", SOURCE), (false, 0.0));
    }

    #[test]
    fn test_verified_bullet_exact_match() {
        let verifier = FactVerifier::new();
        let verdict = verifier.verify_bullet("Achieves 85.2% accuracy on ImageNet", SOURCE);
        assert_eq!(verdict, Verdict::Verified { confidence: 1.0 });
        assert!(verifier.retains(&verdict));
    }

    #[test]
    fn test_unverified_bullet_removed() {
        let verifier = FactVerifier::new();
        let verdict = verifier.verify_bullet("Trained with 500 epochs", SOURCE);
        match &verdict {
            Verdict::Unverifiable { unverified } => {
                assert_eq!(unverified.len(), 1);
                assert_eq!(unverified[0].matched_text, "500 epochs");
            }
            other => panic!("expected unverifiable, got {:?}", other),
        }
        assert!(!verifier.retains(&verdict));
    }

    #[test]
    fn test_no_claims_kept() {
        let verifier = FactVerifier::new();
        let verdict = verifier.verify_bullet("Attention improves focus", SOURCE);
        assert_eq!(verdict, Verdict::NoClaims);
        assert!(verifier.retains(&verdict));
    }

    #[test]
    fn test_fail_closed_on_mixed_claims() {
        let verifier = FactVerifier::new();
        // 100 is found via numbers, 77.7% is not found at all
        let verdict = verifier.verify_bullet("100 epochs reach 77.7% top-1", SOURCE);
        assert!(matches!(verdict, Verdict::Unverifiable { .. }));

        let slides = vec![SlideRecord::new(
            "Results",
            ["100 epochs reach 77.7% top-1", "Trained for 100 epochs"],
        )];
        let (kept, report) = verifier.filter_slides(slides, SOURCE);
        assert_eq!(kept[0].bullets, vec!["Trained for 100 epochs"]);
        assert_eq!(report.removed_bullets(), 1);
        assert_eq!(report.flagged[0].bullet, "100 epochs reach 77.7% top-1");
    }

    #[test]
    fn test_min_confidence_threshold() {
        let strict = FactVerifier::new().with_min_confidence(0.9);
        // Numeric match only: confidence 0.8
        let verdict = strict.verify_bullet("Ran 100 epochs of training", "we ran 100 steps");
        assert!(matches!(verdict, Verdict::Unverifiable { ref unverified } if unverified.is_empty()));
        assert!(!strict.retains(&verdict));
    }

    #[test]
    fn test_filter_drops_emptied_slides() {
        let verifier = FactVerifier::new();
        let slides = vec![
            SlideRecord::new("Made Up", ["Trained with 500 epochs", "Reaches 99.9% accuracy"]),
            SlideRecord::new("Real", ["Achieves 85.2% accuracy on ImageNet", "Uses attention"]),
        ];
        let (kept, report) = verifier.filter_slides(slides, SOURCE);

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "Real");
        assert_eq!(kept[0].bullets.len(), 2);
        assert_eq!(report.removed_slides, 1);
        assert_eq!(report.removed_bullets(), 2);
        assert_eq!(report.verified_bullets, 1);
        assert_eq!(report.no_claim_bullets, 1);
        assert!(report.flagged.iter().all(|f| f.slide_index == 0));
    }

    #[test]
    fn test_number_consistency_warnings() {
        let slides = vec![
            SlideRecord::new("A", ["Accuracy: 85.2% on test", "Has 25M parameters"]),
            SlideRecord::new("B", ["accuracy 90 on val", "Has 25M parameters"]),
        ];
        let warnings = check_number_consistency(&slides);
        assert_eq!(warnings, vec!["Inconsistent accuracy values: 85.2, 90"]);
    }

    #[test]
    fn test_number_consistency_treats_equal_values_alike() {
        let slides = vec![SlideRecord::new(
            "A",
            ["accuracy: 85.0", "accuracy 85", "10M parameters", "12M parameters"],
        )];
        let warnings = check_number_consistency(&slides);
        assert_eq!(warnings, vec!["Inconsistent parameters values: 10, 12"]);
    }
}
