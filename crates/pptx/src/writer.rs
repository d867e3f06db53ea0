//! PPTX package writer.
//!
//! Produces a minimal Office Open XML package: one master, one blank layout,
//! one theme, and a slide part per rendered slide with its pictures under
//! `ppt/media/`.

use crate::document::{content_type_for, DeckDocument, DeckSlide};
use crate::slide::{
    emu, picture_frame, Align, Frame, Paragraph, Shape, SlideDrawing, ACCENT, PRIMARY,
    SLIDE_HEIGHT_IN, SLIDE_WIDTH_IN, TEXT, WHITE,
};
use crate::templates::*;
use crate::xml::XmlPart;
use deck_core::{Error, QaPair, Result};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Title of the closing Q&A slide.
pub const QA_SLIDE_TITLE: &str = "Questions & Discussion";

/// Application name recorded in the package properties.
const APPLICATION: &str = "paper-deck";

/// A rendered slide part and its relationships part.
struct SlidePart {
    xml: Vec<u8>,
    rels: Vec<u8>,
}

/// An image to store under `ppt/media/`.
struct MediaPart<'a> {
    name: String,
    extension: String,
    bytes: &'a [u8],
}

/// Writer for PPTX (Office Open XML) presentations.
pub struct PptxWriter;

impl PptxWriter {
    /// Create a new PPTX writer.
    pub fn new() -> Self {
        Self
    }

    /// Write a deck to a file, replacing it if it exists.
    pub fn write_to_path(&self, path: &Path, doc: &DeckDocument) -> Result<()> {
        let file = File::create(path)?;
        let mut out = self.write(BufWriter::new(file), doc)?;
        out.flush()?;
        log::info!("Wrote {} slides to {}", doc.total_slides(), path.display());
        Ok(())
    }

    /// Write a deck to any seekable writer and hand the writer back.
    pub fn write<W: Write + Seek>(&self, writer: W, doc: &DeckDocument) -> Result<W> {
        let mut media = Vec::new();
        let mut slides = vec![render_slide(&title_slide(doc), None)?];

        for (index, slide) in doc.slides.iter().enumerate() {
            let picture = slide.image.as_ref().and_then(|image| {
                let Some(extension) = image.extension().filter(|e| content_type_for(e).is_some())
                else {
                    log::warn!("Skipping image {} with unsupported format", image.file_name);
                    return None;
                };
                let name = format!("image{}.{}", media.len() + 1, extension);
                media.push(MediaPart {
                    name: name.clone(),
                    extension,
                    bytes: &image.bytes,
                });
                Some(name)
            });
            let drawing = content_slide(slide, index + 2, picture.as_deref());
            slides.push(render_slide(&drawing, picture.as_deref())?);
        }

        if !doc.qa_pairs.is_empty() {
            let drawing = qa_slide(&doc.qa_pairs, slides.len() + 1);
            slides.push(render_slide(&drawing, None)?);
        }

        let mut zip = ZipWriter::new(writer);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        let add = |zip: &mut ZipWriter<W>, name: &str, bytes: &[u8]| -> Result<()> {
            zip.start_file(name, options)
                .map_err(|e| Error::ZipError(format!("Failed to add '{}': {}", name, e)))?;
            zip.write_all(bytes)?;
            Ok(())
        };

        add(&mut zip, "[Content_Types].xml", &content_types(slides.len(), &media)?)?;
        add(&mut zip, "_rels/.rels", &package_rels()?)?;
        add(&mut zip, "docProps/core.xml", &core_properties(&doc.title)?)?;
        add(&mut zip, "docProps/app.xml", &app_properties(slides.len())?)?;
        add(&mut zip, "ppt/presentation.xml", &presentation(slides.len())?)?;
        add(&mut zip, "ppt/_rels/presentation.xml.rels", &presentation_rels(slides.len())?)?;
        add(&mut zip, "ppt/slideMasters/slideMaster1.xml", SLIDE_MASTER_XML.as_bytes())?;
        add(
            &mut zip,
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            SLIDE_MASTER_RELS_XML.as_bytes(),
        )?;
        add(&mut zip, "ppt/slideLayouts/slideLayout1.xml", SLIDE_LAYOUT_XML.as_bytes())?;
        add(
            &mut zip,
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            SLIDE_LAYOUT_RELS_XML.as_bytes(),
        )?;
        add(&mut zip, "ppt/theme/theme1.xml", THEME_XML.as_bytes())?;

        for (i, slide) in slides.iter().enumerate() {
            add(&mut zip, &format!("ppt/slides/slide{}.xml", i + 1), &slide.xml)?;
            add(
                &mut zip,
                &format!("ppt/slides/_rels/slide{}.xml.rels", i + 1),
                &slide.rels,
            )?;
        }

        for part in &media {
            add(&mut zip, &format!("ppt/media/{}", part.name), part.bytes)?;
        }

        log::debug!("Packaged {} slides and {} images", slides.len(), media.len());

        zip.finish()
            .map_err(|e| Error::ZipError(format!("Failed to finish archive: {}", e)))
    }
}

impl Default for PptxWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn render_slide(drawing: &SlideDrawing, media_name: Option<&str>) -> Result<SlidePart> {
    let mut rels = RelationshipsPart::new()?;
    rels.add("rId1", REL_SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml")?;
    if let Some(name) = media_name {
        rels.add("rId2", REL_IMAGE, &format!("../media/{}", name))?;
    }
    Ok(SlidePart {
        xml: drawing.to_xml()?,
        rels: rels.finish()?,
    })
}

fn header_bar(height: f64, color: &'static str) -> Shape {
    Shape::Rect {
        frame: Frame::inches(0.0, 0.0, SLIDE_WIDTH_IN, height),
        color,
    }
}

fn footer(number: usize) -> Shape {
    Shape::Text {
        frame: Frame::inches(9.0, 7.2, 0.8, 0.3),
        paragraphs: vec![Paragraph::new(number.to_string(), 12, TEXT).aligned(Align::Right)],
    }
}

fn title_slide(doc: &DeckDocument) -> SlideDrawing {
    let mut drawing = SlideDrawing::new();
    drawing.push(header_bar(1.5, PRIMARY));
    drawing.push(Shape::Text {
        frame: Frame::inches(0.5, 2.5, 9.0, 2.0),
        paragraphs: vec![Paragraph::new(&doc.title, 40, PRIMARY)
            .bold()
            .aligned(Align::Center)],
    });
    drawing.push(Shape::Text {
        frame: Frame::inches(1.0, 4.8, 8.0, 1.0),
        paragraphs: vec![Paragraph::new(doc.subtitle_or_default(), 20, ACCENT).aligned(Align::Center)],
    });
    drawing
}

fn content_slide(slide: &DeckSlide, number: usize, picture: Option<&str>) -> SlideDrawing {
    let mut drawing = SlideDrawing::new();
    drawing.push(header_bar(0.8, PRIMARY));
    drawing.push(Shape::Text {
        frame: Frame::inches(0.5, 0.1, 9.0, 0.65),
        paragraphs: vec![Paragraph::new(&slide.title, 22, WHITE).bold()],
    });
    drawing.push(Shape::Rect {
        frame: Frame::inches(0.5, 1.0, 0.1, 5.5),
        color: ACCENT,
    });

    // text takes the full width unless a picture shares the slide
    let text_width = if picture.is_some() { 4.0 } else { 8.5 };
    drawing.push(Shape::Text {
        frame: Frame::inches(1.0, 1.2, text_width, 5.5),
        paragraphs: slide
            .bullets
            .iter()
            .map(|b| Paragraph::new(b, 18, TEXT).bulleted().spaced(10))
            .collect(),
    });

    if let (Some(name), Some(image)) = (picture, slide.image.as_ref()) {
        drawing.push(Shape::Picture {
            frame: picture_frame(image.size),
            rel_id: "rId2".to_string(),
            name: name.to_string(),
        });
    }

    drawing.push(footer(number));
    drawing
}

fn qa_slide(pairs: &[QaPair], number: usize) -> SlideDrawing {
    let mut drawing = SlideDrawing::new();
    drawing.push(header_bar(0.8, ACCENT));
    drawing.push(Shape::Text {
        frame: Frame::inches(0.5, 0.15, 9.0, 0.5),
        paragraphs: vec![Paragraph::new(QA_SLIDE_TITLE, 28, WHITE).bold()],
    });

    let paragraphs = pairs
        .iter()
        .enumerate()
        .flat_map(|(i, pair)| {
            let question = Paragraph::new(&pair.question, 16, PRIMARY)
                .bold()
                .spaced(if i > 0 { 18 } else { 0 });
            let answer = Paragraph::new(&pair.answer, 14, TEXT).spaced(6);
            [question, answer]
        })
        .collect();

    drawing.push(Shape::Text {
        frame: Frame::inches(0.8, 1.2, 8.4, 5.8),
        paragraphs,
    });
    drawing.push(footer(number));
    drawing
}

/// A `Relationships` part under construction.
struct RelationshipsPart {
    xml: XmlPart,
}

impl RelationshipsPart {
    fn new() -> Result<Self> {
        let mut xml = XmlPart::new()?;
        xml.start("Relationships", &[("xmlns", NS_PACKAGE_REL)])?;
        Ok(Self { xml })
    }

    fn add(&mut self, id: &str, rel_type: &str, target: &str) -> Result<()> {
        self.xml.empty(
            "Relationship",
            &[("Id", id), ("Type", rel_type), ("Target", target)],
        )
    }

    fn finish(mut self) -> Result<Vec<u8>> {
        self.xml.end("Relationships")?;
        Ok(self.xml.into_bytes())
    }
}

fn content_types(slide_count: usize, media: &[MediaPart<'_>]) -> Result<Vec<u8>> {
    let mut xml = XmlPart::new()?;
    xml.start("Types", &[("xmlns", NS_CONTENT_TYPES)])?;
    xml.empty("Default", &[("Extension", "rels"), ("ContentType", CT_RELATIONSHIPS)])?;
    xml.empty("Default", &[("Extension", "xml"), ("ContentType", "application/xml")])?;

    let extensions: BTreeSet<&str> = media.iter().map(|m| m.extension.as_str()).collect();
    for ext in extensions {
        if let Some(content_type) = content_type_for(ext) {
            xml.empty("Default", &[("Extension", ext), ("ContentType", content_type)])?;
        }
    }

    let overrides = [
        ("/ppt/presentation.xml", CT_PRESENTATION),
        ("/ppt/slideMasters/slideMaster1.xml", CT_SLIDE_MASTER),
        ("/ppt/slideLayouts/slideLayout1.xml", CT_SLIDE_LAYOUT),
        ("/ppt/theme/theme1.xml", CT_THEME),
        ("/docProps/core.xml", CT_CORE_PROPERTIES),
        ("/docProps/app.xml", CT_EXTENDED_PROPERTIES),
    ];
    for (part, content_type) in overrides {
        xml.empty("Override", &[("PartName", part), ("ContentType", content_type)])?;
    }
    for i in 1..=slide_count {
        let part = format!("/ppt/slides/slide{}.xml", i);
        xml.empty("Override", &[("PartName", part.as_str()), ("ContentType", CT_SLIDE)])?;
    }

    xml.end("Types")?;
    Ok(xml.into_bytes())
}

fn package_rels() -> Result<Vec<u8>> {
    let mut rels = RelationshipsPart::new()?;
    rels.add("rId1", REL_OFFICE_DOCUMENT, "ppt/presentation.xml")?;
    rels.add("rId2", REL_CORE_PROPERTIES, "docProps/core.xml")?;
    rels.add("rId3", REL_EXTENDED_PROPERTIES, "docProps/app.xml")?;
    rels.finish()
}

fn core_properties(title: &str) -> Result<Vec<u8>> {
    let mut xml = XmlPart::new()?;
    xml.start(
        "cp:coreProperties",
        &[
            (
                "xmlns:cp",
                "http://schemas.openxmlformats.org/package/2006/metadata/core-properties",
            ),
            ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
        ],
    )?;
    xml.leaf("dc:title", &[], title)?;
    xml.leaf("dc:creator", &[], APPLICATION)?;
    xml.end("cp:coreProperties")?;
    Ok(xml.into_bytes())
}

fn app_properties(slide_count: usize) -> Result<Vec<u8>> {
    let mut xml = XmlPart::new()?;
    xml.start(
        "Properties",
        &[(
            "xmlns",
            "http://schemas.openxmlformats.org/officeDocument/2006/extended-properties",
        )],
    )?;
    xml.leaf("Application", &[], APPLICATION)?;
    xml.leaf("Slides", &[], &slide_count.to_string())?;
    xml.end("Properties")?;
    Ok(xml.into_bytes())
}

fn presentation(slide_count: usize) -> Result<Vec<u8>> {
    let mut xml = XmlPart::new()?;
    xml.start(
        "p:presentation",
        &[
            ("xmlns:a", NS_DRAWING),
            ("xmlns:r", NS_REL),
            ("xmlns:p", NS_MAIN),
            ("saveSubsetFonts", "1"),
        ],
    )?;

    xml.start("p:sldMasterIdLst", &[])?;
    xml.empty("p:sldMasterId", &[("id", "2147483648"), ("r:id", "rId1")])?;
    xml.end("p:sldMasterIdLst")?;

    xml.start("p:sldIdLst", &[])?;
    for i in 0..slide_count {
        let id = (256 + i).to_string();
        let rel = format!("rId{}", i + 2);
        xml.empty("p:sldId", &[("id", id.as_str()), ("r:id", rel.as_str())])?;
    }
    xml.end("p:sldIdLst")?;

    let (cx, cy) = (emu(SLIDE_WIDTH_IN).to_string(), emu(SLIDE_HEIGHT_IN).to_string());
    xml.empty(
        "p:sldSz",
        &[("cx", cx.as_str()), ("cy", cy.as_str()), ("type", "screen4x3")],
    )?;
    xml.empty("p:notesSz", &[("cx", "6858000"), ("cy", "9144000")])?;

    xml.end("p:presentation")?;
    Ok(xml.into_bytes())
}

fn presentation_rels(slide_count: usize) -> Result<Vec<u8>> {
    let mut rels = RelationshipsPart::new()?;
    rels.add("rId1", REL_SLIDE_MASTER, "slideMasters/slideMaster1.xml")?;
    for i in 0..slide_count {
        let id = format!("rId{}", i + 2);
        let target = format!("slides/slide{}.xml", i + 1);
        rels.add(&id, REL_SLIDE, &target)?;
    }
    let theme_id = format!("rId{}", slide_count + 2);
    rels.add(&theme_id, REL_THEME, "theme/theme1.xml")?;
    rels.finish()
}
