//! Slide drawings: positioned rectangles, text boxes and pictures.

use crate::templates::{NS_DRAWING, NS_MAIN, NS_REL};
use crate::xml::XmlPart;
use deck_core::{ImageSize, Result};

const EMU_PER_INCH: f64 = 914_400.0;

pub(crate) const SLIDE_WIDTH_IN: f64 = 10.0;
pub(crate) const SLIDE_HEIGHT_IN: f64 = 7.5;

pub(crate) const PRIMARY: &str = "000000";
pub(crate) const ACCENT: &str = "808080";
pub(crate) const TEXT: &str = "202020";
pub(crate) const WHITE: &str = "FFFFFF";

/// Inches to EMU.
pub(crate) fn emu(inches: f64) -> i64 {
    (inches * EMU_PER_INCH).round() as i64
}

/// Position and extent of a shape, in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Frame {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

impl Frame {
    pub fn inches(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x: emu(x),
            y: emu(y),
            cx: emu(width),
            cy: emu(height),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Align {
    Left,
    Center,
    Right,
}

impl Align {
    fn as_attr(self) -> &'static str {
        match self {
            Self::Left => "l",
            Self::Center => "ctr",
            Self::Right => "r",
        }
    }
}

/// A single-run paragraph.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Paragraph {
    pub text: String,
    /// Font size in points.
    pub size: u32,
    pub bold: bool,
    pub color: &'static str,
    pub align: Align,
    pub bullet: bool,
    /// Space before the paragraph, in points.
    pub space_before: u32,
}

impl Paragraph {
    pub fn new(text: impl Into<String>, size: u32, color: &'static str) -> Self {
        Self {
            text: text.into(),
            size,
            bold: false,
            color,
            align: Align::Left,
            bullet: false,
            space_before: 0,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn aligned(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn bulleted(mut self) -> Self {
        self.bullet = true;
        self
    }

    pub fn spaced(mut self, points: u32) -> Self {
        self.space_before = points;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Shape {
    /// Filled rectangle without outline.
    Rect { frame: Frame, color: &'static str },
    Text { frame: Frame, paragraphs: Vec<Paragraph> },
    Picture { frame: Frame, rel_id: String, name: String },
}

/// Picture frame on the right half of a content slide, keeping the image's
/// aspect ratio. Unknown sizes are drawn 4:3.
pub(crate) fn picture_frame(size: Option<ImageSize>) -> Frame {
    const LEFT: f64 = 5.2;
    const TOP: f64 = 1.5;
    const MAX_WIDTH: f64 = 4.3;
    const MAX_HEIGHT: f64 = 5.0;

    let ratio = size.and_then(|s| s.aspect_ratio()).unwrap_or(4.0 / 3.0);
    let mut width = MAX_WIDTH;
    let mut height = width / ratio;
    if height > MAX_HEIGHT {
        height = MAX_HEIGHT;
        width = height * ratio;
    }
    Frame::inches(LEFT, TOP, width, height)
}

/// The shapes of one slide, in z-order.
#[derive(Debug, Clone, Default)]
pub(crate) struct SlideDrawing {
    shapes: Vec<Shape>,
}

impl SlideDrawing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// Serialize as a `p:sld` part.
    pub fn to_xml(&self) -> Result<Vec<u8>> {
        let mut xml = XmlPart::new()?;
        xml.start(
            "p:sld",
            &[("xmlns:a", NS_DRAWING), ("xmlns:r", NS_REL), ("xmlns:p", NS_MAIN)],
        )?;
        xml.start("p:cSld", &[])?;
        xml.start("p:spTree", &[])?;

        xml.start("p:nvGrpSpPr", &[])?;
        xml.empty("p:cNvPr", &[("id", "1"), ("name", "")])?;
        xml.empty("p:cNvGrpSpPr", &[])?;
        xml.empty("p:nvPr", &[])?;
        xml.end("p:nvGrpSpPr")?;
        xml.start("p:grpSpPr", &[])?;
        write_xfrm(&mut xml, Frame { x: 0, y: 0, cx: 0, cy: 0 }, true)?;
        xml.end("p:grpSpPr")?;

        // id 1 is the group itself
        for (i, shape) in self.shapes.iter().enumerate() {
            write_shape(&mut xml, shape, i + 2)?;
        }

        xml.end("p:spTree")?;
        xml.end("p:cSld")?;
        xml.start("p:clrMapOvr", &[])?;
        xml.empty("a:masterClrMapping", &[])?;
        xml.end("p:clrMapOvr")?;
        xml.end("p:sld")?;
        Ok(xml.into_bytes())
    }
}

fn write_xfrm(xml: &mut XmlPart, frame: Frame, group: bool) -> Result<()> {
    let (x, y, cx, cy) = (
        frame.x.to_string(),
        frame.y.to_string(),
        frame.cx.to_string(),
        frame.cy.to_string(),
    );
    xml.start("a:xfrm", &[])?;
    xml.empty("a:off", &[("x", x.as_str()), ("y", y.as_str())])?;
    xml.empty("a:ext", &[("cx", cx.as_str()), ("cy", cy.as_str())])?;
    if group {
        xml.empty("a:chOff", &[("x", x.as_str()), ("y", y.as_str())])?;
        xml.empty("a:chExt", &[("cx", cx.as_str()), ("cy", cy.as_str())])?;
    }
    xml.end("a:xfrm")
}

fn write_rect_geometry(xml: &mut XmlPart) -> Result<()> {
    xml.start("a:prstGeom", &[("prst", "rect")])?;
    xml.empty("a:avLst", &[])?;
    xml.end("a:prstGeom")
}

fn write_solid_fill(xml: &mut XmlPart, color: &str) -> Result<()> {
    xml.start("a:solidFill", &[])?;
    xml.empty("a:srgbClr", &[("val", color)])?;
    xml.end("a:solidFill")
}

fn write_shape(xml: &mut XmlPart, shape: &Shape, id: usize) -> Result<()> {
    let id = id.to_string();
    match shape {
        Shape::Rect { frame, color } => {
            let name = format!("Rectangle {}", id);
            xml.start("p:sp", &[])?;
            xml.start("p:nvSpPr", &[])?;
            xml.empty("p:cNvPr", &[("id", id.as_str()), ("name", name.as_str())])?;
            xml.empty("p:cNvSpPr", &[])?;
            xml.empty("p:nvPr", &[])?;
            xml.end("p:nvSpPr")?;
            xml.start("p:spPr", &[])?;
            write_xfrm(xml, *frame, false)?;
            write_rect_geometry(xml)?;
            write_solid_fill(xml, color)?;
            xml.start("a:ln", &[])?;
            xml.empty("a:noFill", &[])?;
            xml.end("a:ln")?;
            xml.end("p:spPr")?;
            xml.end("p:sp")
        }
        Shape::Text { frame, paragraphs } => {
            let name = format!("TextBox {}", id);
            xml.start("p:sp", &[])?;
            xml.start("p:nvSpPr", &[])?;
            xml.empty("p:cNvPr", &[("id", id.as_str()), ("name", name.as_str())])?;
            xml.empty("p:cNvSpPr", &[("txBox", "1")])?;
            xml.empty("p:nvPr", &[])?;
            xml.end("p:nvSpPr")?;
            xml.start("p:spPr", &[])?;
            write_xfrm(xml, *frame, false)?;
            write_rect_geometry(xml)?;
            xml.empty("a:noFill", &[])?;
            xml.end("p:spPr")?;
            xml.start("p:txBody", &[])?;
            xml.empty("a:bodyPr", &[("wrap", "square"), ("rtlCol", "0")])?;
            xml.empty("a:lstStyle", &[])?;
            for paragraph in paragraphs {
                write_paragraph(xml, paragraph)?;
            }
            xml.end("p:txBody")?;
            xml.end("p:sp")
        }
        Shape::Picture { frame, rel_id, name } => {
            xml.start("p:pic", &[])?;
            xml.start("p:nvPicPr", &[])?;
            xml.empty("p:cNvPr", &[("id", id.as_str()), ("name", name.as_str()), ("descr", name.as_str())])?;
            xml.start("p:cNvPicPr", &[])?;
            xml.empty("a:picLocks", &[("noChangeAspect", "1")])?;
            xml.end("p:cNvPicPr")?;
            xml.empty("p:nvPr", &[])?;
            xml.end("p:nvPicPr")?;
            xml.start("p:blipFill", &[])?;
            xml.empty("a:blip", &[("r:embed", rel_id.as_str())])?;
            xml.start("a:stretch", &[])?;
            xml.empty("a:fillRect", &[])?;
            xml.end("a:stretch")?;
            xml.end("p:blipFill")?;
            xml.start("p:spPr", &[])?;
            write_xfrm(xml, *frame, false)?;
            write_rect_geometry(xml)?;
            xml.end("p:spPr")?;
            xml.end("p:pic")
        }
    }
}

fn write_paragraph(xml: &mut XmlPart, paragraph: &Paragraph) -> Result<()> {
    xml.start("a:p", &[])?;

    let align = paragraph.align.as_attr();
    if paragraph.bullet {
        xml.start(
            "a:pPr",
            &[("marL", "285750"), ("indent", "-285750"), ("algn", align)],
        )?;
    } else {
        xml.start("a:pPr", &[("algn", align)])?;
    }
    if paragraph.space_before > 0 {
        let spacing = (paragraph.space_before * 100).to_string();
        xml.start("a:spcBef", &[])?;
        xml.empty("a:spcPts", &[("val", spacing.as_str())])?;
        xml.end("a:spcBef")?;
    }
    if paragraph.bullet {
        xml.empty("a:buFont", &[("typeface", "Arial")])?;
        xml.empty("a:buChar", &[("char", "\u{2022}")])?;
    } else {
        xml.empty("a:buNone", &[])?;
    }
    xml.end("a:pPr")?;

    let size = (paragraph.size * 100).to_string();
    let bold = if paragraph.bold { "1" } else { "0" };
    xml.start("a:r", &[])?;
    xml.start("a:rPr", &[("lang", "en-US"), ("sz", size.as_str()), ("b", bold), ("dirty", "0")])?;
    write_solid_fill(xml, paragraph.color)?;
    xml.end("a:rPr")?;
    xml.leaf("a:t", &[], &paragraph.text)?;
    xml.end("a:r")?;

    xml.end("a:p")
}
