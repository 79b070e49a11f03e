//! `genpdf` elements for the report content model.
//!
//! Converts [`crate::model`] blocks into renderable elements: captioned
//! images scaled to a layout width, framed tables, fixed spacers and the
//! zero-sized page markers the renderer uses to find where each logical page
//! ended up.

use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;

use image::GenericImageView;

use genpdf::elements::{FrameCellDecorator, Image, LinearLayout, Paragraph, TableLayout};
use genpdf::error::{Context as _, Error};
use genpdf::style::Style;
use genpdf::{render, Alignment, Element, Margins, Mm, Position, RenderResult, Scale, Size};

use crate::model::{Heading, HorizontalAlignment, ImageBlock, ImageSource, RichParagraph, Table};

const DEFAULT_IMAGE_DPI: f64 = 300.0;
const MM_PER_INCH: f64 = 25.4;
const CAPTION_SPACING_MM: f64 = 2.0;
const CELL_PADDING_MM: f64 = 1.5;

pub(crate) fn mm_from_f64(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

fn mm_to_f64(value: Mm) -> f64 {
    let mm: printpdf::Mm = value.into();
    mm.0
}

fn natural_width_mm(image: &image::DynamicImage) -> f64 {
    MM_PER_INCH * f64::from(image.width()) / DEFAULT_IMAGE_DPI
}

/// Maps the model alignment onto `genpdf`'s.
pub fn alignment(alignment: HorizontalAlignment) -> Alignment {
    match alignment {
        HorizontalAlignment::Left => Alignment::Left,
        HorizontalAlignment::Center => Alignment::Center,
        HorizontalAlignment::Right => Alignment::Right,
    }
}

/// Loads an image from in-memory bytes with descriptive errors.
pub fn decode_image_from_bytes(bytes: impl AsRef<[u8]>) -> Result<image::DynamicImage, Error> {
    image::load_from_memory(bytes.as_ref()).context("Failed to decode image from provided bytes")
}

/// Loads an image from the given path with descriptive errors.
pub fn decode_image_from_path(path: impl AsRef<Path>) -> Result<image::DynamicImage, Error> {
    let path = path.as_ref();
    let reader = image::io::Reader::open(path)
        .with_context(|| format!("Failed to open image file {}", path.display()))?;
    reader
        .with_guessed_format()
        .context("Unable to determine image format")?
        .decode()
        .with_context(|| format!("Failed to decode image file {}", path.display()))
}

/// Decodes an image source.
pub fn decode_source(source: &ImageSource) -> Result<image::DynamicImage, Error> {
    match source {
        ImageSource::Bytes(bytes) => decode_image_from_bytes(bytes),
        ImageSource::Path(path) => decode_image_from_path(path),
    }
}

/// Builds a paragraph from styled spans.  Embedded line breaks start new
/// lines stacked vertically.
pub fn rich_paragraph(paragraph: &RichParagraph) -> LinearLayout {
    let align = alignment(paragraph.alignment());
    let mut lines: Vec<Paragraph> = vec![Paragraph::default().aligned(align)];

    for span in paragraph.spans() {
        let style = span.to_styled_string().style;
        for (index, piece) in span.text().split('\n').enumerate() {
            if index > 0 {
                lines.push(Paragraph::default().aligned(align));
            }
            if !piece.is_empty() {
                if let Some(line) = lines.last_mut() {
                    line.push_styled(piece, style);
                }
            }
        }
    }

    let mut layout = LinearLayout::vertical();
    for line in lines {
        layout.push(line);
    }
    layout
}

/// Builds a bold heading.
pub fn heading(heading: &Heading) -> impl Element {
    Paragraph::new(heading.text.as_str())
        .aligned(alignment(heading.alignment))
        .styled(Style::new().bold().with_font_size(heading.level.font_size()))
}

fn cell(text: &str, align: HorizontalAlignment, bold: bool) -> impl Element {
    let paragraph = RichParagraph::plain(text).with_alignment(align);
    let style = if bold { Style::new().bold() } else { Style::new() };
    rich_paragraph(&paragraph)
        .padded(Margins::all(mm_from_f64(CELL_PADDING_MM)))
        .styled(style)
}

/// Column weights proportional to the layout widths, in tenths of a
/// millimetre.
pub fn column_weights(table: &Table) -> Vec<usize> {
    table
        .columns()
        .iter()
        .map(|column| ((column.width_mm * 10.0).round() as usize).max(1))
        .collect()
}

/// Builds a framed grid table.  The header row and emphasized rows are bold.
pub fn table(table: &Table) -> Result<TableLayout, Error> {
    let mut layout = TableLayout::new(column_weights(table));
    layout.set_cell_decorator(FrameCellDecorator::new(true, true, false));

    let alignments: Vec<HorizontalAlignment> = table
        .columns()
        .iter()
        .map(|column| column.alignment)
        .collect();

    let mut push_row = |cells: &[String], bold: bool| -> Result<(), Error> {
        let mut row = layout.row();
        for (index, align) in alignments.iter().enumerate() {
            let text = cells.get(index).map(String::as_str).unwrap_or("");
            row.push_element(cell(text, *align, bold));
        }
        row.push()
    };

    if let Some(head) = table.head() {
        push_row(head, true)?;
    }
    for row in table.rows() {
        push_row(&row.cells, row.emphasized)?;
    }

    Ok(layout)
}

/// An image scaled to a fixed width with an optional caption underneath.
///
/// The image is converted to RGB before embedding since transparency is not
/// supported by the PDF backend.
pub struct CaptionedImage {
    image: Image,
    caption: Option<LinearLayout>,
    spacing: Mm,
}

impl CaptionedImage {
    /// Creates the element from a decoded image.
    pub fn from_dynamic_image(
        image: image::DynamicImage,
        width_mm: f64,
        align: Alignment,
    ) -> Result<Self, Error> {
        let natural = natural_width_mm(&image);
        let rgb = image::DynamicImage::ImageRgb8(image.to_rgb8());
        let mut element = Image::from_dynamic_image(rgb)?;
        if natural > f64::EPSILON {
            let scale = width_mm / natural;
            element.set_scale(Scale::new(scale, scale));
        }
        element.set_alignment(align);

        Ok(Self {
            image: element,
            caption: None,
            spacing: mm_from_f64(CAPTION_SPACING_MM),
        })
    }

    /// Creates the element from an [`ImageBlock`] of the content model.
    pub fn from_block(block: &ImageBlock) -> Result<Self, Error> {
        let decoded = decode_source(block.source())?;
        let mut element =
            Self::from_dynamic_image(decoded, block.width_mm(), alignment(block.alignment()))?;
        element.caption = block.caption().map(rich_paragraph);
        Ok(element)
    }
}

impl Element for CaptionedImage {
    fn render(
        &mut self,
        context: &genpdf::Context,
        mut area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let mut result = RenderResult::default();
        let image_result = self.image.render(context, area.clone(), style)?;
        result.size = result.size.stack_vertical(image_result.size);
        result.has_more |= image_result.has_more;

        let Some(caption) = self.caption.as_mut() else {
            return Ok(result);
        };

        area.add_offset(Position::new(0, image_result.size.height + self.spacing));
        if mm_to_f64(self.spacing) > 0.0 {
            result.size = result.size.stack_vertical(Size::new(0, self.spacing));
        }

        let caption_result = caption.render(context, area, style)?;
        result.size = result.size.stack_vertical(caption_result.size);
        result.has_more |= caption_result.has_more;

        Ok(result)
    }
}

/// Fixed vertical whitespace.  Space that does not fit on the current page is
/// dropped instead of carried over.
pub struct Spacer {
    height: Mm,
}

impl Spacer {
    pub fn new(height_mm: f64) -> Self {
        Self {
            height: mm_from_f64(height_mm),
        }
    }
}

impl Element for Spacer {
    fn render(
        &mut self,
        _context: &genpdf::Context,
        area: render::Area<'_>,
        _style: Style,
    ) -> Result<RenderResult, Error> {
        let available = area.size().height;
        let height = if self.height > available {
            available
        } else {
            self.height
        };
        let mut result = RenderResult::default();
        result.size = Size::new(0, height);
        Ok(result)
    }
}

/// Shared count of the physical pages started so far.
#[derive(Clone, Debug, Default)]
pub struct PageCounter(Rc<Cell<usize>>);

impl PageCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of the page currently being rendered (1-indexed, 0 before the
    /// first page).
    pub fn current(&self) -> usize {
        self.0.get()
    }

    pub(crate) fn advance(&self) -> usize {
        let next = self.0.get() + 1;
        self.0.set(next);
        next
    }
}

/// A zero-sized element that records the physical page it is rendered on.
pub struct PageMarker {
    counter: PageCounter,
    slot: Rc<Cell<Option<usize>>>,
}

impl PageMarker {
    /// Creates a marker and the slot its page number is written to.
    pub fn new(counter: PageCounter) -> (Self, Rc<Cell<Option<usize>>>) {
        let slot = Rc::new(Cell::new(None));
        (
            Self {
                counter,
                slot: Rc::clone(&slot),
            },
            slot,
        )
    }
}

impl Element for PageMarker {
    fn render(
        &mut self,
        _context: &genpdf::Context,
        _area: render::Area<'_>,
        _style: Style,
    ) -> Result<RenderResult, Error> {
        if self.slot.get().is_none() {
            self.slot.set(Some(self.counter.current()));
        }
        Ok(RenderResult::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Column;

    #[test]
    fn column_weights_follow_layout_widths() {
        let table = Table::new(vec![Column::new(60.0), Column::new(120.0), Column::new(0.01)]);
        assert_eq!(column_weights(&table), vec![600, 1200, 1]);
    }

    #[test]
    fn page_counter_is_shared_between_clones() {
        let counter = PageCounter::new();
        let clone = counter.clone();
        assert_eq!(clone.advance(), 1);
        assert_eq!(counter.advance(), 2);
        assert_eq!(clone.current(), 2);
    }

    #[test]
    fn alignment_maps_every_variant() {
        assert!(matches!(alignment(HorizontalAlignment::Left), Alignment::Left));
        assert!(matches!(alignment(HorizontalAlignment::Center), Alignment::Center));
        assert!(matches!(alignment(HorizontalAlignment::Right), Alignment::Right));
    }

    #[test]
    fn decoding_rejects_garbage() {
        assert!(decode_image_from_bytes([0u8, 1, 2, 3]).is_err());
    }
}
