//! Rendering of compiled reports to PDF bytes.

use std::cell::Cell;
use std::rc::Rc;

use genpdf::elements::PageBreak;
use genpdf::error::Error;
use log::debug;

use crate::builder::DocumentBuilder;
use crate::elements::{self, CaptionedImage, PageMarker, Spacer};
use crate::model::{Block, ReportDocument};

/// Result of rendering a report.
#[derive(Clone, Debug)]
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    /// Physical page (1-indexed) each logical page of the document started
    /// on, in document order.
    pub page_starts: Vec<Option<usize>>,
}

impl RenderedPdf {
    /// Outline entries for the titled pages of `document`, paired with the
    /// physical page they start on.
    pub fn outline(&self, document: &ReportDocument) -> Vec<(String, usize)> {
        document
            .pages()
            .iter()
            .zip(self.page_starts.iter())
            .filter_map(|(page, start)| Some((page.title()?.to_string(), (*start)?)))
            .collect()
    }
}

/// Renders [`ReportDocument`]s with `genpdf`.
#[derive(Clone, Copy, Debug, Default)]
pub struct PdfRenderer;

impl PdfRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Renders `document` to PDF bytes.
    pub fn render(&self, document: &ReportDocument) -> Result<RenderedPdf, Error> {
        let builder = DocumentBuilder::new()
            .with_title(document.title())
            .with_page_numbers();
        let counter = builder.page_counter();
        let mut pdf = builder.build()?;

        let mut slots: Vec<Rc<Cell<Option<usize>>>> = Vec::with_capacity(document.page_count());
        for (index, page) in document.pages().iter().enumerate() {
            if index > 0 {
                pdf.push(PageBreak::new());
            }
            let (marker, slot) = PageMarker::new(counter.clone());
            pdf.push(marker);
            slots.push(slot);

            for block in page.blocks() {
                match block {
                    Block::Heading(heading) => pdf.push(elements::heading(heading)),
                    Block::Paragraph(paragraph) => pdf.push(elements::rich_paragraph(paragraph)),
                    Block::Table(table) => pdf.push(elements::table(table)?),
                    Block::Image(image) => pdf.push(CaptionedImage::from_block(image)?),
                    Block::Spacer(height) => pdf.push(Spacer::new(*height)),
                }
            }
        }

        let mut bytes = Vec::new();
        pdf.render(&mut bytes)?;
        debug!(
            "Rendered '{}': {} logical pages on {} physical pages",
            document.title(),
            document.page_count(),
            counter.current()
        );

        Ok(RenderedPdf {
            bytes,
            page_starts: slots.iter().map(|slot| slot.get()).collect(),
        })
    }

    /// Renders `document` and adds an outline entry for every titled page.
    #[cfg(feature = "bookmarks")]
    pub fn render_with_bookmarks(
        &self,
        document: &ReportDocument,
    ) -> Result<RenderedPdf, crate::error::ReportError> {
        let mut rendered = self.render(document)?;
        let outline = rendered.outline(document);
        rendered.bytes = crate::bookmarks::apply_page_bookmarks(&rendered.bytes, &outline)?;
        Ok(rendered)
    }
}
