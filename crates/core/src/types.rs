//! Domain types shared by the deck-generation stages.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// A single slide parsed from a blueprint: a title and its bullets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideRecord {
    /// Slide title, free of markup tokens.
    pub title: String,

    /// Bullet texts in emission order. Never empty after trimming.
    pub bullets: Vec<String>,

    /// Visual suggestion attached to the slide, kept apart from the bullets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_hint: Option<String>,
}

impl SlideRecord {
    /// Create a slide from a title and bullets, dropping blank bullets.
    pub fn new<S: Into<String>>(title: impl Into<String>, bullets: impl IntoIterator<Item = S>) -> Self {
        Self {
            title: title.into(),
            bullets: bullets
                .into_iter()
                .map(|b| {
                    let b: String = b.into();
                    b.trim().to_string()
                })
                .filter(|b| !b.is_empty())
                .collect(),
            visual_hint: None,
        }
    }

    /// Title and bullets joined and lowercased, for keyword lookups.
    pub fn content_lower(&self) -> String {
        let mut content = self.title.to_lowercase();
        for bullet in &self.bullets {
            content.push(' ');
            content.push_str(&bullet.to_lowercase());
        }
        content
    }
}

/// A question/answer pair mined from presenter notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

impl fmt::Display for QaPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q: {}\nA: {}", self.question, self.answer)
    }
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width divided by height, or `None` for degenerate sizes.
    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        Some(self.width as f64 / self.height as f64)
    }
}

/// An image extracted from the paper, available for illustration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAsset {
    /// Location of the image file.
    pub path: PathBuf,

    /// 1-based page the image was extracted from; 0 if unknown.
    pub page: u32,

    /// Pixel dimensions. `None` when the image could not be decoded.
    pub size: Option<ImageSize>,
}

impl ImageAsset {
    pub fn new(path: impl Into<PathBuf>, page: u32, size: Option<ImageSize>) -> Self {
        Self {
            path: path.into(),
            page,
            size,
        }
    }

    /// Lowercased file name (without directories).
    pub fn file_name_lower(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    }

    /// Load assets from a JSON manifest file.
    ///
    /// Relative paths are resolved against the manifest's directory.
    pub fn load_manifest(path: &Path) -> Result<Vec<ImageAsset>> {
        let content = std::fs::read_to_string(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Self::parse_manifest(&content, base)
    }

    /// Parse a JSON manifest: an array of `{path, page?, size?}` entries.
    pub fn parse_manifest(json: &str, base_dir: &Path) -> Result<Vec<ImageAsset>> {
        let entries: Vec<ManifestEntry> =
            serde_json::from_str(json).map_err(|e| Error::AssetManifestError(e.to_string()))?;

        Ok(entries
            .into_iter()
            .map(|entry| {
                let path = if entry.path.is_absolute() {
                    entry.path
                } else {
                    base_dir.join(entry.path)
                };
                let page = entry
                    .page
                    .or_else(|| crate::normalize::page_from_file_name(&path))
                    .unwrap_or(0);
                ImageAsset::new(path, page, entry.size)
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct ManifestEntry {
    path: PathBuf,
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    size: Option<ImageSize>,
}

/// Why a slide did or did not receive an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchReason {
    /// The blueprint explicitly recommended this figure for the slide.
    Recommended,
    /// The image won the heuristic scoring.
    Scored,
    /// No image reached the score threshold.
    NoMatch,
    /// Every image had already been used by earlier slides.
    NoAssetsLeft,
}

impl fmt::Display for MatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Recommended => "recommended",
            Self::Scored => "scored",
            Self::NoMatch => "no_match",
            Self::NoAssetsLeft => "no_assets_left",
        };
        f.write_str(s)
    }
}

/// Outcome of matching one slide against the image pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// 0-based index of the slide in presentation order.
    pub slide_index: usize,

    /// The chosen image, if any.
    pub asset: Option<ImageAsset>,

    /// Heuristic score of the chosen (or best rejected) image.
    pub score: i32,

    pub reason: MatchReason,
}
