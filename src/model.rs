//! Data structures describing the logical content of a compiled report.
//!
//! The compiler never talks to `genpdf` directly: it accumulates [`Page`]s of
//! [`Block`]s into a [`ReportDocument`], which can be inspected, compared, and
//! rendered later by [`crate::render::PdfRenderer`].  Table cells are plain
//! strings so two compilations of the same survey compare equal.

use crate::richtext::Span;
use crate::scores::ScoreError;

/// Horizontal alignment of paragraphs, table columns and images.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HorizontalAlignment {
    #[default]
    Left,
    Center,
    Right,
}

/// Rich text paragraph carrying inline styling information and alignment.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RichParagraph {
    spans: Vec<Span>,
    alignment: HorizontalAlignment,
}

impl RichParagraph {
    /// Creates a left aligned paragraph from the provided spans.
    pub fn new(spans: impl Into<Vec<Span>>) -> Self {
        Self {
            spans: spans.into(),
            ..Self::default()
        }
    }

    /// Creates a paragraph made of a single unstyled span.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(vec![Span::new(text)])
    }

    /// Returns the spans that make up the paragraph.
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Concatenated text of every span.
    pub fn text(&self) -> String {
        self.spans.iter().map(Span::text).collect()
    }

    /// Returns the configured alignment.
    pub fn alignment(&self) -> HorizontalAlignment {
        self.alignment
    }

    /// Sets the alignment and returns the updated paragraph.
    pub fn with_alignment(mut self, alignment: HorizontalAlignment) -> Self {
        self.alignment = alignment;
        self
    }
}

/// Heading levels, mapped to font sizes by the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeadingLevel {
    /// Report title (22pt).
    Title,
    /// Subtitle under the report title (20pt).
    Subtitle,
    /// Section heading (18pt).
    Section,
    /// Sub-section heading (16pt).
    SubSection,
}

impl HeadingLevel {
    /// Font size in points.
    pub fn font_size(self) -> u8 {
        match self {
            HeadingLevel::Title => 22,
            HeadingLevel::Subtitle => 20,
            HeadingLevel::Section => 18,
            HeadingLevel::SubSection => 16,
        }
    }
}

/// A bold heading line.
#[derive(Clone, Debug, PartialEq)]
pub struct Heading {
    pub text: String,
    pub level: HeadingLevel,
    pub alignment: HorizontalAlignment,
}

/// Representation of image sources supported by the content model.
#[derive(Clone, Debug, PartialEq)]
pub enum ImageSource {
    /// Encoded image bytes (PNG, JPEG, ...).
    Bytes(Vec<u8>),
    /// Image referenced by a file path.
    Path(String),
}

impl ImageSource {
    /// Creates a new in-memory image from raw bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(bytes.into())
    }

    /// Creates an image sourced from a file path.
    pub fn from_path(path: impl Into<String>) -> Self {
        Self::Path(path.into())
    }
}

/// An image laid out at a fixed size.
///
/// The renderer scales the image to `width_mm` keeping its aspect ratio, so
/// `height_mm` is only used by the layout cursor.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageBlock {
    source: ImageSource,
    caption: Option<RichParagraph>,
    alignment: HorizontalAlignment,
    width_mm: f64,
    height_mm: f64,
}

impl ImageBlock {
    /// Creates a new image block of the given rendered size.
    pub fn new(source: ImageSource, width_mm: f64, height_mm: f64) -> Self {
        Self {
            source,
            caption: None,
            alignment: HorizontalAlignment::Left,
            width_mm,
            height_mm,
        }
    }

    /// Returns the image source.
    pub fn source(&self) -> &ImageSource {
        &self.source
    }

    /// Returns the caption paragraph, if any.
    pub fn caption(&self) -> Option<&RichParagraph> {
        self.caption.as_ref()
    }

    /// Returns the configured alignment.
    pub fn alignment(&self) -> HorizontalAlignment {
        self.alignment
    }

    /// Rendered width in millimetres.
    pub fn width_mm(&self) -> f64 {
        self.width_mm
    }

    /// Rendered height in millimetres.
    pub fn height_mm(&self) -> f64 {
        self.height_mm
    }

    /// Sets the caption and returns the updated image block.
    pub fn with_caption(mut self, caption: impl Into<Option<RichParagraph>>) -> Self {
        self.caption = caption.into();
        self
    }

    /// Sets the alignment and returns the updated image block.
    pub fn with_alignment(mut self, alignment: HorizontalAlignment) -> Self {
        self.alignment = alignment;
        self
    }
}

/// Width and alignment of a table column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Column {
    pub width_mm: f64,
    pub alignment: HorizontalAlignment,
}

impl Column {
    /// A left aligned column.
    pub fn new(width_mm: f64) -> Self {
        Self {
            width_mm,
            alignment: HorizontalAlignment::Left,
        }
    }

    /// A centered column.
    pub fn centered(width_mm: f64) -> Self {
        Self {
            width_mm,
            alignment: HorizontalAlignment::Center,
        }
    }

    /// A right aligned column.
    pub fn right(width_mm: f64) -> Self {
        Self {
            width_mm,
            alignment: HorizontalAlignment::Right,
        }
    }
}

/// A body row.  Emphasized rows are rendered bold, like group titles.
#[derive(Clone, Debug, PartialEq)]
pub struct TableRow {
    pub cells: Vec<String>,
    pub emphasized: bool,
}

/// A framed grid table with an optional bold header row.
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    head: Option<Vec<String>>,
    rows: Vec<TableRow>,
}

impl Table {
    /// Creates an empty table with the given columns.
    pub fn new(columns: impl Into<Vec<Column>>) -> Self {
        Self {
            columns: columns.into(),
            head: None,
            rows: Vec::new(),
        }
    }

    /// Sets the header row and returns the updated table.
    pub fn with_head<I, S>(mut self, head: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.head = Some(head.into_iter().map(Into::into).collect());
        self
    }

    /// Appends a body row and returns the updated table.
    pub fn with_row<I, S>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_row(cells, false);
        self
    }

    /// Appends a body row.
    pub fn push_row<I, S>(&mut self, cells: I, emphasized: bool)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(TableRow {
            cells: cells.into_iter().map(Into::into).collect(),
            emphasized,
        });
    }

    /// Returns the column definitions.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the header row, if any.
    pub fn head(&self) -> Option<&[String]> {
        self.head.as_deref()
    }

    /// Returns the body rows.
    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    /// Returns the text of the body cell at `row`, `column`.
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|row| row.cells.get(column))
            .map(String::as_str)
    }
}

/// Individual content blocks that make up a page.
#[derive(Clone, Debug, PartialEq)]
pub enum Block {
    Heading(Heading),
    Paragraph(RichParagraph),
    Table(Table),
    Image(ImageBlock),
    /// Vertical whitespace in millimetres.
    Spacer(f64),
}

impl Block {
    /// Convenience helper for building a paragraph block.
    pub fn paragraph(spans: impl Into<Vec<Span>>) -> Self {
        Self::Paragraph(RichParagraph::new(spans))
    }

    /// Convenience helper for building a heading block.
    pub fn heading(text: impl Into<String>, level: HeadingLevel) -> Self {
        Self::Heading(Heading {
            text: text.into(),
            level,
            alignment: HorizontalAlignment::Left,
        })
    }
}

/// A physical page of the report.  Pages with a title get an outline entry
/// when bookmarks are enabled; continuation pages have none.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page {
    title: Option<String>,
    blocks: Vec<Block>,
}

impl Page {
    /// Creates an empty page.
    pub fn new(title: Option<String>) -> Self {
        Self {
            title,
            blocks: Vec::new(),
        }
    }

    /// Returns the outline title of the page.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Returns the blocks of the page in layout order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Appends a block.
    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Iterates over every table on the page.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Table(table) => Some(table),
            _ => None,
        })
    }

    /// Iterates over every image on the page.
    pub fn images(&self) -> impl Iterator<Item = &ImageBlock> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Image(image) => Some(image),
            _ => None,
        })
    }
}

/// A non-fatal problem the compiler worked around.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportIssue {
    /// Index of the page the skipped content belonged to.
    pub page_index: usize,
    pub reason: ScoreError,
}

/// A fully compiled report.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportDocument {
    title: String,
    file_name: String,
    pages: Vec<Page>,
    issues: Vec<ReportIssue>,
}

impl ReportDocument {
    /// Assembles a document from its compiled parts.
    pub fn new(
        title: impl Into<String>,
        file_name: impl Into<String>,
        pages: Vec<Page>,
        issues: Vec<ReportIssue>,
    ) -> Self {
        Self {
            title: title.into(),
            file_name: file_name.into(),
            pages,
            issues,
        }
    }

    /// Document title stored in the PDF metadata.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// File name the report is exported under.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Returns the pages in order.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Tables and charts that were skipped, with the reason.
    pub fn issues(&self) -> &[ReportIssue] {
        &self.issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_rows_keep_insertion_order() {
        let mut table = Table::new(vec![Column::new(40.0), Column::centered(20.0)])
            .with_head(["Campo", "Valor"])
            .with_row(["a", "1"]);
        table.push_row(["b", "2"], true);

        assert_eq!(table.head().map(<[String]>::len), Some(2));
        assert_eq!(table.cell(1, 0), Some("b"));
        assert!(table.rows()[1].emphasized);
        assert_eq!(table.cell(2, 0), None);
    }

    #[test]
    fn page_filters_blocks_by_kind() {
        let mut page = Page::new(Some("Resumen".to_string()));
        page.push(Block::heading("Resumen", HeadingLevel::Section));
        page.push(Block::Table(Table::new(vec![Column::new(10.0)])));
        page.push(Block::Spacer(5.0));

        assert_eq!(page.tables().count(), 1);
        assert_eq!(page.images().count(), 0);
        assert_eq!(page.title(), Some("Resumen"));
    }
}
