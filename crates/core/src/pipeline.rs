//! End-to-end driver from blueprint text to an illustrated slide plan.

use crate::blueprint::{BlueprintParser, LayoutKind};
use crate::config::DeckConfig;
use crate::figures::FigureMatcher;
use crate::organize::SlideOrganizer;
use crate::source::{clean_source_text, extract_figure_references, identify_sections, FigureReference};
use crate::types::{ImageAsset, MatchResult, QaPair, SlideRecord};
use crate::verify::{check_number_consistency, FactVerifier, VerificationReport};
use serde::{Deserialize, Serialize};

/// Final ordered, illustrated slide sequence ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckPlan {
    /// Layout the blueprint was recognized as.
    pub layout: LayoutKind,

    /// Slides in presentation order.
    pub slides: Vec<SlideRecord>,

    /// One entry per slide, same order as `slides`.
    pub matches: Vec<MatchResult>,

    pub qa_pairs: Vec<QaPair>,

    pub report: VerificationReport,

    /// Section names found in the source, in order.
    #[serde(default)]
    pub source_sections: Vec<String>,

    /// Figure and table captions found in the source.
    #[serde(default)]
    pub figure_references: Vec<FigureReference>,
}

impl DeckPlan {
    /// Image chosen for the slide at `index`, if any.
    pub fn figure_for(&self, index: usize) -> Option<&ImageAsset> {
        self.matches
            .iter()
            .find(|m| m.slide_index == index)
            .and_then(|m| m.asset.as_ref())
    }

    /// Number of slides that received an image.
    pub fn illustrated_count(&self) -> usize {
        self.matches.iter().filter(|m| m.asset.is_some()).count()
    }
}

/// Runs parse, verification, organization and figure matching in sequence.
#[derive(Debug, Default)]
pub struct DeckPipeline {
    parser: BlueprintParser,
    verifier: FactVerifier,
    organizer: SlideOrganizer,
    matcher: FigureMatcher,
}

impl DeckPipeline {
    /// Create a pipeline with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &DeckConfig) -> Self {
        Self {
            parser: BlueprintParser::from_config(config),
            verifier: FactVerifier::from_config(config),
            organizer: SlideOrganizer::from_config(config),
            matcher: FigureMatcher::from_config(config),
        }
    }

    /// Replace the figure matcher (e.g. to plug in text recognition).
    pub fn with_matcher(mut self, matcher: FigureMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    /// Build a slide plan.
    ///
    /// Without source text, bullets are not verified; the consistency check
    /// still runs.
    pub fn run(&self, blueprint: &str, source: Option<&str>, assets: &[ImageAsset]) -> DeckPlan {
        let parsed = self.parser.parse(blueprint);
        log::info!(
            "Parsed {} slides ({:?} layout), {} Q&A pairs",
            parsed.slides.len(),
            parsed.layout,
            parsed.qa_pairs.len()
        );

        let mut source_sections = Vec::new();
        let mut figure_references = Vec::new();

        let (slides, report) = match source {
            Some(raw) => {
                source_sections = identify_sections(raw).into_iter().map(|s| s.name).collect();
                figure_references = extract_figure_references(raw);
                let cleaned = clean_source_text(raw);
                self.verifier.filter_slides(parsed.slides, &cleaned)
            }
            None => {
                log::warn!("No source text; skipping fact verification");
                let report = VerificationReport {
                    warnings: check_number_consistency(&parsed.slides),
                    ..VerificationReport::default()
                };
                (parsed.slides, report)
            }
        };

        let slides = self.organizer.organize(slides);
        let matches = self.matcher.smart_match(&slides, blueprint, assets);

        let plan = DeckPlan {
            layout: parsed.layout,
            slides,
            matches,
            qa_pairs: parsed.qa_pairs,
            report,
            source_sections,
            figure_references,
        };
        log::info!(
            "Planned {} slides, {} with figures",
            plan.slides.len(),
            plan.illustrated_count()
        );
        plan
    }
}
