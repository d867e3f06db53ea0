//! Core of the paper-to-deck pipeline: blueprint parsing, fact verification,
//! slide organization and figure matching.

pub mod blueprint;
pub mod config;
pub mod error;
pub mod figures;
pub mod image_type;
pub mod normalize;
pub mod organize;
pub mod outline;
pub mod pipeline;
pub mod source;
pub mod types;
pub mod verify;

pub use blueprint::{Blueprint, BlueprintParser, LayoutKind};
pub use config::DeckConfig;
pub use error::{Error, Result};
pub use figures::FigureMatcher;
pub use image_type::{ImageTag, ImageTypeClassifier, SidecarTextRecognizer, TextRecognizer};
pub use organize::{Section, SlideOrganizer};
pub use outline::OutlineFormatter;
pub use pipeline::{DeckPipeline, DeckPlan};
pub use types::{ImageAsset, ImageSize, MatchReason, MatchResult, QaPair, SlideRecord};
pub use verify::{FactVerifier, VerificationReport};
