//! Page composition with an explicit vertical cursor.
//!
//! Every append on [`PageComposer`] takes the [`Cursor`] returned by the
//! previous append and hands back the position right below the new block.
//! Block heights are estimated from the same font sizes and column widths the
//! renderer uses; when a block would cross the bottom of the content area the
//! composer opens a continuation page and places the block at its top.

use crate::model::{Block, Heading, ImageBlock, Page, RichParagraph, Table};

/// Height of the usable content area of an A4 page, in millimetres.
pub const CONTENT_HEIGHT_MM: f64 = 262.0;

/// Width of the usable content area of an A4 page, in millimetres.
pub const CONTENT_WIDTH_MM: f64 = 182.0;

/// Spacing left between consecutive tables.
pub const BLOCK_SPACING_MM: f64 = 10.0;

const BODY_LINE_HEIGHT_MM: f64 = 5.0;
const BODY_CHAR_WIDTH_MM: f64 = 2.0;
const CELL_PADDING_MM: f64 = 1.5;
const PT_TO_MM: f64 = 0.3528;

/// Vertical position on the current page, measured from the top of the
/// content area.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Cursor {
    y_mm: f64,
}

impl Cursor {
    /// Top of a fresh page.
    pub const TOP: Cursor = Cursor { y_mm: 0.0 };

    /// Distance from the top of the content area.
    pub fn y_mm(self) -> f64 {
        self.y_mm
    }

    /// Whether nothing has been laid out on the page yet.
    pub fn is_top(self) -> bool {
        self.y_mm <= 0.0
    }

    fn advance(self, height_mm: f64) -> Cursor {
        Cursor {
            y_mm: self.y_mm + height_mm,
        }
    }
}

/// Estimated number of wrapped lines a text needs within `width_mm`.
pub fn wrapped_lines(text: &str, width_mm: f64) -> usize {
    let chars_per_line = ((width_mm / BODY_CHAR_WIDTH_MM).floor() as usize).max(1);
    text.split('\n')
        .map(|line| {
            let chars = line.chars().count();
            ((chars + chars_per_line - 1) / chars_per_line).max(1)
        })
        .sum()
}

/// Estimated rendered height of a table.
pub fn table_height(table: &Table) -> f64 {
    let widths: Vec<f64> = table
        .columns()
        .iter()
        .map(|column| column.width_mm - 2.0 * CELL_PADDING_MM)
        .collect();
    let row_height = |cells: &[String]| {
        let lines = cells
            .iter()
            .zip(widths.iter())
            .map(|(cell, width)| wrapped_lines(cell, *width))
            .max()
            .unwrap_or(1);
        lines as f64 * BODY_LINE_HEIGHT_MM + 2.0 * CELL_PADDING_MM
    };

    let head = table.head().map(row_height).unwrap_or(0.0);
    let body: f64 = table.rows().iter().map(|row| row_height(&row.cells)).sum();
    head + body
}

/// Estimated rendered height of a heading.
pub fn heading_height(heading: &Heading) -> f64 {
    f64::from(heading.level.font_size()) * PT_TO_MM * 1.4
}

/// Estimated rendered height of a paragraph spanning the content width.
pub fn paragraph_height(paragraph: &RichParagraph) -> f64 {
    wrapped_lines(&paragraph.text(), CONTENT_WIDTH_MM) as f64 * BODY_LINE_HEIGHT_MM
}

/// Estimated rendered height of an image including its caption.
pub fn image_height(image: &ImageBlock) -> f64 {
    let caption = image.caption().map(paragraph_height).unwrap_or(0.0);
    image.height_mm() + caption
}

/// Accumulates pages while tracking where the next block goes.
#[derive(Debug)]
pub struct PageComposer {
    pages: Vec<Page>,
    content_height_mm: f64,
}

impl Default for PageComposer {
    fn default() -> Self {
        Self::new(CONTENT_HEIGHT_MM)
    }
}

impl PageComposer {
    /// Creates a composer for pages with the given content height.
    pub fn new(content_height_mm: f64) -> Self {
        Self {
            pages: Vec::new(),
            content_height_mm,
        }
    }

    /// Opens a new page and returns the cursor at its top.
    pub fn start_page(&mut self, title: Option<String>) -> Cursor {
        self.pages.push(Page::new(title));
        Cursor::TOP
    }

    /// Index of the page blocks are currently appended to.
    pub fn current_page_index(&self) -> usize {
        self.pages.len().saturating_sub(1)
    }

    /// Number of pages opened so far.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Appends a heading.
    pub fn heading(&mut self, at: Cursor, heading: Heading) -> Cursor {
        let height = heading_height(&heading);
        self.place(at, height, Block::Heading(heading))
    }

    /// Appends a paragraph.
    pub fn paragraph(&mut self, at: Cursor, paragraph: RichParagraph) -> Cursor {
        let height = paragraph_height(&paragraph);
        self.place(at, height, Block::Paragraph(paragraph))
    }

    /// Appends a table.
    pub fn table(&mut self, at: Cursor, table: Table) -> Cursor {
        let height = table_height(&table);
        self.place(at, height, Block::Table(table))
    }

    /// Appends an image.
    pub fn image(&mut self, at: Cursor, image: ImageBlock) -> Cursor {
        let height = image_height(&image);
        self.place(at, height, Block::Image(image))
    }

    /// Leaves vertical space.  Spacing that would run past the bottom of the
    /// page is dropped; the next block starts on a fresh page anyway.
    pub fn space(&mut self, at: Cursor, height_mm: f64) -> Cursor {
        if at.y_mm + height_mm > self.content_height_mm || at.is_top() {
            return at;
        }
        self.current_page().push(Block::Spacer(height_mm));
        at.advance(height_mm)
    }

    /// Returns the composed pages.
    pub fn finish(self) -> Vec<Page> {
        self.pages
    }

    fn place(&mut self, at: Cursor, height_mm: f64, block: Block) -> Cursor {
        let at = if !at.is_top() && at.y_mm + height_mm > self.content_height_mm {
            self.start_page(None)
        } else {
            at
        };
        self.current_page().push(block);
        at.advance(height_mm.min(self.content_height_mm))
    }

    fn current_page(&mut self) -> &mut Page {
        if self.pages.is_empty() {
            self.pages.push(Page::default());
        }
        let index = self.pages.len() - 1;
        &mut self.pages[index]
    }
}
