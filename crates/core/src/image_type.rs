//! Guessing what kind of figure an extracted image is.
//!
//! Geometry decides the base tag: wide images are usually charts,
//! square-ish ones diagrams, tall ones tables. A `figure<N>` token in the
//! file name adds a `figure_<N>` tag. Recognized text, when a recognizer is
//! plugged in, only ever adds tags: keywords, and a `figure_<N>` tag for a
//! figure number printed in the image.

use crate::types::ImageAsset;
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

static FIGURE_NUMBER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"figure[_\s-]*(\d+)").unwrap());

/// Recognized-text keywords and the tags they contribute.
const TEXT_KEYWORD_RULES: &[(&[&str], &[&str])] = &[
    (&["attention", "network"], &["attention", "network", "architecture"]),
    (&["table", "algorithm", "method"], &["method", "algorithm"]),
    (&["accuracy", "score", "performance"], &["results"]),
    (&["atari", "game"], &["game", "experimental"]),
];

/// A tag describing an image's likely visual category.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ImageTag {
    Chart,
    Diagram,
    Table,
    /// Numbered figure taken from the file name.
    Figure(u32),
    Unknown,
    /// Keyword found in recognized text.
    Keyword(String),
}

impl fmt::Display for ImageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chart => f.write_str("chart"),
            Self::Diagram => f.write_str("diagram"),
            Self::Table => f.write_str("table"),
            Self::Figure(n) => write!(f, "figure_{}", n),
            Self::Unknown => f.write_str("unknown"),
            Self::Keyword(k) => f.write_str(k),
        }
    }
}

/// Source of text recognized inside an image (OCR).
pub trait TextRecognizer {
    /// Text found in the image, or `None` if it could not be read.
    fn recognize(&self, path: &Path) -> Option<String>;
}

/// Reads text an external OCR tool left next to each image as `<stem>.txt`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SidecarTextRecognizer;

impl TextRecognizer for SidecarTextRecognizer {
    fn recognize(&self, path: &Path) -> Option<String> {
        let sidecar = path.with_extension("txt");
        match std::fs::read_to_string(&sidecar) {
            Ok(text) => Some(text),
            Err(e) => {
                log::debug!("No recognized text at {}: {}", sidecar.display(), e);
                None
            }
        }
    }
}

/// Infers [`ImageTag`]s for image assets.
#[derive(Default)]
pub struct ImageTypeClassifier {
    recognizer: Option<Box<dyn TextRecognizer>>,
}

impl fmt::Debug for ImageTypeClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageTypeClassifier")
            .field("recognizer", &self.recognizer.is_some())
            .finish()
    }
}

impl ImageTypeClassifier {
    /// Create a classifier that uses geometry and file names only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Augment tags with keywords from recognized text.
    pub fn with_recognizer(mut self, recognizer: Box<dyn TextRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    /// Infer the tag set of an asset. Never empty.
    pub fn infer_types(&self, asset: &ImageAsset) -> BTreeSet<ImageTag> {
        let mut tags = BTreeSet::new();

        match asset.size.and_then(|s| s.aspect_ratio()) {
            Some(ratio) => {
                if let Some(tag) = tag_for_aspect_ratio(ratio) {
                    tags.insert(tag);
                }
            }
            None => log::debug!(
                "No usable dimensions for {}; geometry ignored",
                asset.path.display()
            ),
        }

        if let Some(n) = figure_number(&asset.file_name_lower()) {
            tags.insert(ImageTag::Figure(n));
        }

        if tags.is_empty() {
            tags.insert(ImageTag::Unknown);
        }

        if let Some(text) = self
            .recognizer
            .as_ref()
            .and_then(|r| r.recognize(&asset.path))
        {
            let text = text.to_lowercase();
            if let Some(n) = figure_number(&text) {
                tags.insert(ImageTag::Figure(n));
            }
            tags.extend(keyword_tags(&text));
        }

        tags
    }
}

/// Wide: chart. Square-ish: diagram. Tall: table.
fn tag_for_aspect_ratio(ratio: f64) -> Option<ImageTag> {
    if ratio > 1.5 {
        Some(ImageTag::Chart)
    } else if ratio > 0.8 && ratio < 1.2 {
        Some(ImageTag::Diagram)
    } else if ratio < 0.7 {
        Some(ImageTag::Table)
    } else {
        None
    }
}

fn figure_number(file_name: &str) -> Option<u32> {
    FIGURE_NUMBER_REGEX
        .captures(file_name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Keyword tags for lowercased recognized text.
fn keyword_tags(text: &str) -> Vec<ImageTag> {
    TEXT_KEYWORD_RULES
        .iter()
        .filter(|(triggers, _)| triggers.iter().any(|t| text.contains(t)))
        .flat_map(|(_, tags)| tags.iter().map(|t| ImageTag::Keyword(t.to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ImageSize;

    fn asset(name: &str, width: u32, height: u32) -> ImageAsset {
        ImageAsset::new(name, 1, Some(ImageSize::new(width, height)))
    }

    fn tags(list: &[ImageTag]) -> BTreeSet<ImageTag> {
        list.iter().cloned().collect()
    }

    struct FixedText(&'static str);

    impl TextRecognizer for FixedText {
        fn recognize(&self, _path: &Path) -> Option<String> {
            Some(self.0.to_string())
        }
    }

    #[test]
    fn test_geometry_tags() {
        let classifier = ImageTypeClassifier::new();
        assert_eq!(classifier.infer_types(&asset("a.png", 800, 400)), tags(&[ImageTag::Chart]));
        assert_eq!(classifier.infer_types(&asset("b.png", 500, 500)), tags(&[ImageTag::Diagram]));
        assert_eq!(classifier.infer_types(&asset("c.png", 300, 600)), tags(&[ImageTag::Table]));
    }

    #[test]
    fn test_in_between_ratios_are_unknown() {
        let classifier = ImageTypeClassifier::new();
        // 1.33 and 0.75 fall in the gaps
        assert_eq!(classifier.infer_types(&asset("a.png", 400, 300)), tags(&[ImageTag::Unknown]));
        assert_eq!(classifier.infer_types(&asset("b.png", 300, 400)), tags(&[ImageTag::Unknown]));
    }

    #[test]
    fn test_figure_tag_from_file_name() {
        let classifier = ImageTypeClassifier::new();
        let inferred = classifier.infer_types(&asset("page3_Figure_2.png", 800, 400));
        assert_eq!(inferred, tags(&[ImageTag::Chart, ImageTag::Figure(2)]));
        assert_eq!(ImageTag::Figure(2).to_string(), "figure_2");
    }

    #[test]
    fn test_undecodable_asset_is_unknown() {
        let classifier = ImageTypeClassifier::new();
        let broken = ImageAsset::new("page2_img1.png", 2, None);
        assert_eq!(classifier.infer_types(&broken), tags(&[ImageTag::Unknown]));

        let zero = asset("zero.png", 100, 0);
        assert_eq!(classifier.infer_types(&zero), tags(&[ImageTag::Unknown]));
    }

    #[test]
    fn test_recognized_text_is_additive() {
        let classifier =
            ImageTypeClassifier::new().with_recognizer(Box::new(FixedText("Attention Network, Table 2")));
        let inferred = classifier.infer_types(&asset("a.png", 800, 400));

        assert!(inferred.contains(&ImageTag::Chart));
        assert!(inferred.contains(&ImageTag::Keyword("attention".to_string())));
        assert!(inferred.contains(&ImageTag::Keyword("architecture".to_string())));
        assert!(inferred.contains(&ImageTag::Keyword("method".to_string())));
        assert!(!inferred.contains(&ImageTag::Keyword("results".to_string())));
    }

    #[test]
    fn test_sidecar_text_recognizer() {
        let dir = std::env::temp_dir().join(format!("deck-sidecar-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("page6_img1.txt"), "Figure 3. Top-1 accuracy by epoch").unwrap();

        let classifier = ImageTypeClassifier::new().with_recognizer(Box::new(SidecarTextRecognizer));
        let with_text = ImageAsset::new(dir.join("page6_img1.png"), 6, Some(ImageSize::new(800, 400)));
        let without_text = ImageAsset::new(dir.join("page7_img1.png"), 7, Some(ImageSize::new(800, 400)));

        let inferred = classifier.infer_types(&with_text);
        assert!(inferred.contains(&ImageTag::Keyword("results".to_string())));
        assert!(inferred.contains(&ImageTag::Figure(3)));
        assert_eq!(classifier.infer_types(&without_text), tags(&[ImageTag::Chart]));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
