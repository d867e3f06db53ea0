//! PPTX (Office Open XML) rendering backend for generated slide decks.
//!
//! Writes .pptx files, which are ZIP archives containing XML documents.

pub mod document;
mod slide;
mod templates;
pub mod writer;
mod xml;

pub use document::{DeckDocument, DeckImage, DeckSlide};
pub use writer::PptxWriter;
