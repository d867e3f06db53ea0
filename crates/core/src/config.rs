//! Tunable limits and thresholds shared by the processing stages.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for every deck-generation stage.
///
/// Missing fields in a JSON config file fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckConfig {
    /// Bullets kept per slide after duplicate merging.
    pub max_bullets_per_slide: usize,

    /// Title similarity above which two slides are merged.
    pub merge_similarity_threshold: f64,

    /// Minimum claim confidence for a bullet to be kept.
    pub min_confidence: f64,

    /// Minimum heuristic score for an image to be attached to a slide.
    pub match_score_threshold: i32,

    /// Whether long titles are shortened while parsing.
    pub compact_titles: bool,

    /// Title length (in characters) that triggers compaction.
    pub title_max_chars: usize,

    /// Number of words kept when a title is compacted.
    pub title_max_words: usize,

    /// Maximum number of question/answer pairs taken from presenter notes.
    pub max_qa_pairs: usize,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            max_bullets_per_slide: 4,
            merge_similarity_threshold: 0.7,
            min_confidence: 0.6,
            match_score_threshold: 8,
            compact_titles: false,
            title_max_chars: 50,
            title_max_words: 5,
            max_qa_pairs: 5,
        }
    }
}

impl DeckConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| Error::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    fn validate(&self) -> Result<()> {
        if self.max_bullets_per_slide == 0 {
            return Err(Error::ConfigError(
                "max_bullets_per_slide must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.merge_similarity_threshold) {
            return Err(Error::ConfigError(format!(
                "merge_similarity_threshold must be within 0..=1, got {}",
                self.merge_similarity_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(Error::ConfigError(format!(
                "min_confidence must be within 0..=1, got {}",
                self.min_confidence
            )));
        }
        if self.title_max_words == 0 {
            return Err(Error::ConfigError(
                "title_max_words must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
