//! Render-ready deck: titles, bullets and embedded image bytes.

use deck_core::{DeckPlan, ImageSize, QaPair};
use std::io;
use std::path::Path;

/// Subtitle used on the title slide when none is given.
pub const DEFAULT_SUBTITLE: &str = "Generated Presentation";

/// An image to embed, with its raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub size: Option<ImageSize>,
}

impl DeckImage {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>, size: Option<ImageSize>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            size,
        }
    }

    /// Lowercased extension, normalizing `jpeg` to `jpg`.
    pub fn extension(&self) -> Option<String> {
        let ext = Path::new(&self.file_name)
            .extension()?
            .to_string_lossy()
            .to_lowercase();
        Some(if ext == "jpeg" { "jpg".to_string() } else { ext })
    }

    /// MIME type for the package, or `None` if the format can't be embedded.
    pub fn content_type(&self) -> Option<&'static str> {
        content_type_for(self.extension()?.as_str())
    }
}

/// MIME type for an embeddable image extension.
pub fn content_type_for(extension: &str) -> Option<&'static str> {
    match extension {
        "png" => Some("image/png"),
        "jpg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

/// One content slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckSlide {
    pub title: String,
    pub bullets: Vec<String>,
    pub image: Option<DeckImage>,
}

/// A complete deck ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckDocument {
    pub title: String,
    pub subtitle: Option<String>,
    pub slides: Vec<DeckSlide>,
    pub qa_pairs: Vec<QaPair>,
}

impl DeckDocument {
    /// Create an empty deck with a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: None,
            slides: Vec::new(),
            qa_pairs: Vec::new(),
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    /// Build a deck from a slide plan.
    ///
    /// `load` supplies the bytes of each matched image. Images that cannot
    /// be loaded, or whose format can't be embedded, are left out and the
    /// slide is rendered text-only.
    pub fn from_plan<F>(plan: &DeckPlan, title: impl Into<String>, mut load: F) -> Self
    where
        F: FnMut(&Path) -> io::Result<Vec<u8>>,
    {
        let slides = plan
            .slides
            .iter()
            .enumerate()
            .map(|(index, slide)| {
                let image = plan.figure_for(index).and_then(|asset| {
                    let file_name = asset.path.file_name()?.to_string_lossy().into_owned();
                    match load(&asset.path) {
                        Ok(bytes) => {
                            let image = DeckImage::new(file_name, bytes, asset.size);
                            if image.content_type().is_none() {
                                log::warn!(
                                    "Unsupported image format {}; slide '{}' rendered without it",
                                    asset.path.display(),
                                    slide.title
                                );
                                return None;
                            }
                            Some(image)
                        }
                        Err(e) => {
                            log::warn!(
                                "Could not read image {}: {}; slide '{}' rendered without it",
                                asset.path.display(),
                                e,
                                slide.title
                            );
                            None
                        }
                    }
                });

                DeckSlide {
                    title: slide.title.clone(),
                    bullets: slide.bullets.clone(),
                    image,
                }
            })
            .collect();

        Self {
            title: title.into(),
            subtitle: None,
            slides,
            qa_pairs: plan.qa_pairs.clone(),
        }
    }

    /// Subtitle to show on the title slide.
    pub fn subtitle_or_default(&self) -> &str {
        self.subtitle.as_deref().unwrap_or(DEFAULT_SUBTITLE)
    }

    /// Slides in the written file: title, content, and Q&A if any.
    pub fn total_slides(&self) -> usize {
        1 + self.slides.len() + usize::from(!self.qa_pairs.is_empty())
    }
}
