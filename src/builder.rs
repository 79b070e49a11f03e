//! Construction of `genpdf` documents with the report page setup.

use genpdf::error::{Error, ErrorKind};
use genpdf::style::{self, Style};
use genpdf::{self, Alignment, Element, Margins, Mm, PageDecorator, PaperSize, Position, Size};

use crate::elements::{mm_from_f64, PageCounter};
use crate::fonts;

/// Side margins of every page, in millimetres.
pub const SIDE_MARGIN_MM: f64 = 14.0;

/// Top and bottom margins of every page, in millimetres.
pub const VERTICAL_MARGIN_MM: f64 = 10.0;

const FOOTER_HEIGHT_MM: f64 = 8.0;
const BODY_FONT_SIZE: u8 = 10;

type FooterFactory = dyn Fn(usize) -> Box<dyn Element>;

/// Builder for `genpdf::Document` instances set up for the report.
pub struct DocumentBuilder {
    title: Option<String>,
    paper_size: Size,
    margins: Margins,
    footer: Option<FooterSpec>,
    counter: PageCounter,
}

impl Default for DocumentBuilder {
    fn default() -> Self {
        Self {
            title: None,
            paper_size: PaperSize::A4.into(),
            margins: Margins::trbl(
                mm_from_f64(VERTICAL_MARGIN_MM),
                mm_from_f64(SIDE_MARGIN_MM),
                mm_from_f64(VERTICAL_MARGIN_MM),
                mm_from_f64(SIDE_MARGIN_MM),
            ),
            footer: None,
            counter: PageCounter::new(),
        }
    }
}

impl DocumentBuilder {
    /// Creates a builder with A4 paper and the report margins.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the title stored in the PDF metadata.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Overrides the paper size.
    pub fn with_paper_size(mut self, paper_size: impl Into<Size>) -> Self {
        self.paper_size = paper_size.into();
        self
    }

    /// Overrides the page margins.
    pub fn with_margins(mut self, margins: impl Into<Margins>) -> Self {
        self.margins = margins.into();
        self
    }

    /// Configures a footer of fixed height rendered on every page.
    pub fn with_footer<F, E>(mut self, height: impl Into<Mm>, footer: F) -> Self
    where
        F: Fn(usize) -> E + 'static,
        E: Element + 'static,
    {
        self.footer = Some(FooterSpec::new(height, footer));
        self
    }

    /// Adds the centered `Página N` footer.
    pub fn with_page_numbers(self) -> Self {
        self.with_footer(mm_from_f64(FOOTER_HEIGHT_MM), |page| {
            genpdf::elements::Paragraph::new(format!("Página {}", page))
                .aligned(Alignment::Center)
                .styled(Style::new().with_font_size(8))
        })
    }

    /// Counter advanced every time a page is started.  Clones share the same
    /// count, so page markers rendered into the document can read it.
    pub fn page_counter(&self) -> PageCounter {
        self.counter.clone()
    }

    /// Builds the configured document.
    pub fn build(self) -> Result<genpdf::Document, Error> {
        let font_family = fonts::default_font_family()?;
        let mut document = genpdf::Document::new(font_family);

        if let Some(title) = &self.title {
            document.set_title(title.as_str());
        }
        document.set_paper_size(self.paper_size);
        document.set_font_size(BODY_FONT_SIZE);
        document.set_page_decorator(ReportPageDecorator {
            counter: self.counter,
            margins: self.margins,
            footer: self.footer,
        });

        Ok(document)
    }
}

/// Definition of a footer rendered through the page decorator.
pub struct FooterSpec {
    height: Mm,
    factory: Box<FooterFactory>,
}

impl FooterSpec {
    /// Creates a new footer specification.
    pub fn new<F, E>(height: impl Into<Mm>, factory: F) -> Self
    where
        F: Fn(usize) -> E + 'static,
        E: Element + 'static,
    {
        Self {
            height: height.into(),
            factory: Box::new(move |page| Box::new(factory(page)) as Box<dyn Element>),
        }
    }
}

struct ReportPageDecorator {
    counter: PageCounter,
    margins: Margins,
    footer: Option<FooterSpec>,
}

impl PageDecorator for ReportPageDecorator {
    fn decorate_page<'a>(
        &mut self,
        context: &genpdf::Context,
        mut area: genpdf::render::Area<'a>,
        style: style::Style,
    ) -> Result<genpdf::render::Area<'a>, Error> {
        let page = self.counter.advance();
        area.add_margins(self.margins);

        if let Some(footer) = &self.footer {
            let available = area.size().height;
            if footer.height > available {
                return Err(Error::new(
                    "Footer height exceeds available space",
                    ErrorKind::InvalidData,
                ));
            }

            let mut footer_area = area.clone();
            footer_area.add_offset(Position::new(0, available - footer.height));
            let mut element = (footer.factory)(page);
            let result = element.render(context, footer_area, style)?;
            if result.has_more {
                return Err(Error::new(
                    "Footer element does not fit into the reserved space",
                    ErrorKind::PageSizeExceeded,
                ));
            }

            area.set_height(available - footer.height);
        }

        Ok(area)
    }
}
