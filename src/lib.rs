//! Compiles usability survey results into detailed PDF reports.
//!
//! A design test is scored by evaluators either with heuristics (each broken
//! down into subprinciples scored 0 to 10) or with standard questions typed as
//! `calificacion`, `coherencia` or `legibilidad`.  [`ReportCompiler`] turns
//! the backend's `{design_test, evaluators}` result into a paginated
//! [`ReportDocument`] with usability tables, pie charts and risk gauges, and
//! [`PdfRenderer`] renders it with `genpdf`.

pub mod backend;
pub mod builder;
pub mod charts;
pub mod compiler;
pub mod config;
pub mod elements;
pub mod error;
pub mod fonts;
pub mod layout;
pub mod model;
pub mod render;
pub mod richtext;
pub mod scores;
pub mod screenshot;
pub mod survey;

#[cfg(feature = "bookmarks")]
pub mod bookmarks;

pub use compiler::{ExportedReport, ReportCompiler};
pub use config::ReportConfig;
pub use error::ReportError;
pub use model::ReportDocument;
pub use render::{PdfRenderer, RenderedPdf};
pub use survey::{ReportData, ReportInput};
