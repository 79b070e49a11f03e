//! The report compiler.
//!
//! [`ReportCompiler::compile`] walks validated survey data strictly in order:
//! the cover page, one page per evaluator, then the mode specific usability
//! and per-question pages.  Pages are accumulated through a
//! [`PageComposer`], threading the returned [`Cursor`] from one block to the
//! next.  Collaborator failures degrade the output and are logged; zero
//! denominators are recorded on the document as [`ReportIssue`]s.

mod cover;
mod evaluators;
mod heuristic;
mod standard;

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::backend::{BackendClient, NoQuestionCount, QuestionCounter};
use crate::charts::{ChartImage, ChartRenderer, RasterChartRenderer};
use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::layout::{Cursor, PageComposer, CONTENT_WIDTH_MM};
use crate::model::{
    Heading, HeadingLevel, HorizontalAlignment, ImageBlock, ImageSource, ReportDocument,
    ReportIssue, RichParagraph,
};
use crate::render::PdfRenderer;
use crate::richtext::{rgb, Span};
use crate::scores::{Severity, ScoreError};
use crate::screenshot::{fit_within, CaptureError, NoScreenshots, ScreenshotService};
use crate::survey::{Evaluations, ReportData, ReportInput};

/// Title printed on the cover page and stored in the PDF metadata.
pub const REPORT_TITLE: &str = "INFORME DETALLADO DE LA PRUEBA DE DISEÑO";

/// Box prototype screenshots are fitted into, in millimetres.
pub const SCREENSHOT_BOX_MM: (f64, f64) = (180.0, 100.0);

const PIE_BOX_MM: (f64, f64) = (180.0, 100.0);
const GAUGE_BOX_MM: (f64, f64) = (180.0, 60.0);

/// Placeholder used wherever an evaluator left no comment.
pub(crate) const NO_COMMENT: &str = "Sin comentario";

type Hook = Box<dyn Fn()>;

/// A compiled report written to disk.
#[derive(Debug)]
pub struct ExportedReport {
    pub path: PathBuf,
    pub document: ReportDocument,
}

/// Compiles survey results into [`ReportDocument`]s and exports them as PDF.
pub struct ReportCompiler {
    config: ReportConfig,
    charts: Box<dyn ChartRenderer>,
    screenshots: Box<dyn ScreenshotService>,
    questions: Box<dyn QuestionCounter>,
    on_start: Option<Hook>,
    on_end: Option<Hook>,
}

impl ReportCompiler {
    /// Creates a compiler talking to the configured backend.  Fails when the
    /// HTTP client cannot be built with the configured timeout.
    pub fn new(config: ReportConfig) -> Result<Self, ReportError> {
        let backend = BackendClient::new(config.backend_url.clone(), config.http_timeout)?;
        Ok(Self {
            config,
            charts: Box::new(RasterChartRenderer::new()),
            screenshots: Box::new(backend.clone()),
            questions: Box::new(backend),
            on_start: None,
            on_end: None,
        })
    }

    /// Creates a compiler that never contacts the backend: the screen count
    /// renders as 0 and no screenshots are embedded.
    pub fn offline(config: ReportConfig) -> Self {
        Self {
            config,
            charts: Box::new(RasterChartRenderer::new()),
            screenshots: Box::new(NoScreenshots),
            questions: Box::new(NoQuestionCount),
            on_start: None,
            on_end: None,
        }
    }

    /// Replaces the chart renderer.
    pub fn with_chart_renderer(mut self, charts: impl ChartRenderer + 'static) -> Self {
        self.charts = Box::new(charts);
        self
    }

    /// Replaces the screenshot service.
    pub fn with_screenshot_service(mut self, service: impl ScreenshotService + 'static) -> Self {
        self.screenshots = Box::new(service);
        self
    }

    /// Replaces the question counter.
    pub fn with_question_counter(mut self, counter: impl QuestionCounter + 'static) -> Self {
        self.questions = Box::new(counter);
        self
    }

    /// Registers a callback fired when [`export`](Self::export) begins.
    pub fn on_start(mut self, hook: impl Fn() + 'static) -> Self {
        self.on_start = Some(Box::new(hook));
        self
    }

    /// Registers a callback fired when [`export`](Self::export) returns,
    /// whether it succeeded or not.
    pub fn on_end(mut self, hook: impl Fn() + 'static) -> Self {
        self.on_end = Some(Box::new(hook));
        self
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Validates raw input and compiles it.  Missing or malformed survey data
    /// aborts compilation.
    pub fn compile_input(&self, input: ReportInput) -> Result<ReportDocument, ReportError> {
        let data = ReportData::from_input(input)?;
        self.compile(&data)
    }

    /// Compiles validated survey data into a document.
    pub fn compile(&self, data: &ReportData) -> Result<ReportDocument, ReportError> {
        let test = &data.design_test;
        debug!(
            "Compiling report for design test {} ('{}') with {} evaluators",
            test.id,
            test.name,
            data.evaluations.evaluator_count()
        );

        let mut run = Compilation::new(self);
        cover::compose(&mut run, test);

        match &data.evaluations {
            Evaluations::Heuristic(evaluators) => {
                evaluators::compose_heuristic(&mut run, evaluators);
                let tallies = crate::scores::tally_questions(evaluators);
                heuristic::compose_usability(&mut run, &tallies)?;
                heuristic::compose_comments(&mut run, evaluators, &tallies);
            }
            Evaluations::Standard(evaluators) => {
                evaluators::compose_standard(&mut run, evaluators);
                standard::compose_global(&mut run, evaluators)?;
                standard::compose_questions(&mut run, evaluators);
            }
        }

        let document = ReportDocument::new(
            REPORT_TITLE,
            self.config.file_name(&test.name),
            run.composer.finish(),
            run.issues,
        );
        debug!(
            "Compiled {} pages with {} skipped tables",
            document.page_count(),
            document.issues().len()
        );
        Ok(document)
    }

    /// Compiles `input`, renders it and writes the PDF into `output_dir`.
    ///
    /// The start hook fires before anything else and the end hook once the
    /// export returns.
    pub fn export(
        &self,
        input: ReportInput,
        output_dir: impl AsRef<Path>,
    ) -> Result<ExportedReport, ReportError> {
        if let Some(hook) = &self.on_start {
            hook();
        }
        let result = self.export_inner(input, output_dir.as_ref());
        if let Some(hook) = &self.on_end {
            hook();
        }
        result
    }

    fn export_inner(
        &self,
        input: ReportInput,
        output_dir: &Path,
    ) -> Result<ExportedReport, ReportError> {
        let document = self.compile_input(input)?;

        #[cfg(feature = "bookmarks")]
        let rendered = PdfRenderer::new().render_with_bookmarks(&document)?;
        #[cfg(not(feature = "bookmarks"))]
        let rendered = PdfRenderer::new().render(&document)?;

        let path = output_dir.join(document.file_name());
        fs::write(&path, &rendered.bytes).map_err(|source| ReportError::Write {
            path: path.clone(),
            source,
        })?;
        info!(
            "Exported {} ({} bytes, {} pages)",
            path.display(),
            rendered.bytes.len(),
            document.page_count()
        );

        Ok(ExportedReport { path, document })
    }
}

/// State of a single compilation.
pub(crate) struct Compilation<'a> {
    compiler: &'a ReportCompiler,
    composer: PageComposer,
    issues: Vec<ReportIssue>,
}

impl<'a> Compilation<'a> {
    fn new(compiler: &'a ReportCompiler) -> Self {
        Self {
            compiler,
            composer: PageComposer::default(),
            issues: Vec::new(),
        }
    }

    pub(crate) fn config(&self) -> &ReportConfig {
        &self.compiler.config
    }

    pub(crate) fn composer(&mut self) -> &mut PageComposer {
        &mut self.composer
    }

    pub(crate) fn question_count(&self, test_id: u64) -> usize {
        match self.compiler.questions.question_count(test_id) {
            Ok(count) => count,
            Err(err) => {
                warn!("Question count for design test {} unavailable: {}", test_id, err);
                0
            }
        }
    }

    /// Logs a zero denominator and records it against the current page.
    pub(crate) fn skip_table(&mut self, reason: ScoreError) {
        let page_index = self.composer.current_page_index();
        warn!("Skipping usability table on page {}: {}", page_index + 1, reason);
        self.issues.push(ReportIssue { page_index, reason });
    }

    /// Captures `url` and sizes the image for the screenshot box, or logs
    /// why no screenshot is available.
    pub(crate) fn screenshot(&self, url: &str) -> Option<ImageBlock> {
        match self.capture(url) {
            Ok(block) => Some(block),
            Err(err) => {
                warn!("No screenshot for {}: {}", url, err);
                None
            }
        }
    }

    fn capture(&self, url: &str) -> Result<ImageBlock, CaptureError> {
        let bytes = self.compiler.screenshots.capture(url)?;
        let decoded = image::load_from_memory(&bytes)?;
        let (width_px, height_px) = image::GenericImageView::dimensions(&decoded);
        let (max_width, max_height) = SCREENSHOT_BOX_MM;
        let (width, height) = fit_within(width_px, height_px, max_width, max_height)
            .ok_or(CaptureError::Empty)?;
        Ok(ImageBlock::new(ImageSource::from_bytes(bytes), width, height))
    }

    /// Renders a pie and lays it out with its title and legend.  `value_text`
    /// formats the value shown next to each legend label.
    pub(crate) fn pie(
        &mut self,
        at: Cursor,
        labels: &[String],
        values: &[f64],
        title: &str,
        value_text: fn(f64) -> String,
    ) -> Result<Cursor, ReportError> {
        let chart = self.compiler.charts.render_pie(labels, values, title)?;
        let mut spans = vec![Span::new(chart.caption.clone()).bold(), Span::new("\n")];
        for (index, (entry, value)) in chart.legend.iter().zip(values).enumerate() {
            if index > 0 {
                spans.push(Span::new("   "));
            }
            spans.push(
                Span::new(format!("{}: {}", entry.label, value_text(*value)))
                    .bold()
                    .colored(rgb(entry.color)),
            );
        }
        let caption = RichParagraph::new(spans).with_alignment(HorizontalAlignment::Center);
        Ok(self.chart(at, chart, PIE_BOX_MM, caption))
    }

    /// Renders the risk meter followed by the severity recommendation.
    pub(crate) fn risk_gauge(
        &mut self,
        at: Cursor,
        usability_level: f64,
    ) -> Result<Cursor, ReportError> {
        let chart = self.compiler.charts.render_risk_gauge(usability_level)?;
        let caption = RichParagraph::new(vec![Span::new(chart.caption.clone()).bold()])
            .with_alignment(HorizontalAlignment::Center);
        let at = self.chart(at, chart, GAUGE_BOX_MM, caption);

        let severity = Severity::from_missing_percentage(100.0 - usability_level);
        Ok(self
            .composer
            .paragraph(at, RichParagraph::plain(severity.recommendation())))
    }

    fn chart(
        &mut self,
        at: Cursor,
        chart: ChartImage,
        (max_width, max_height): (f64, f64),
        caption: RichParagraph,
    ) -> Cursor {
        let (width, height) = fit_within(chart.width_px, chart.height_px, max_width, max_height)
            .unwrap_or((max_width.min(CONTENT_WIDTH_MM), max_height));
        let block = ImageBlock::new(ImageSource::from_bytes(chart.png), width, height)
            .with_caption(caption)
            .with_alignment(HorizontalAlignment::Center);
        self.composer.image(at, block)
    }
}

pub(crate) fn heading(
    text: impl Into<String>,
    level: HeadingLevel,
    alignment: HorizontalAlignment,
) -> Heading {
    Heading {
        text: text.into(),
        level,
        alignment,
    }
}

/// Text of an optional comment, or the placeholder when it is blank.
pub(crate) fn comment_or_placeholder(comment: Option<&str>) -> String {
    comment
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .unwrap_or(NO_COMMENT)
        .to_string()
}
