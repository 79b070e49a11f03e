//! Chart rasterisation for the usability pages.
//!
//! [`ChartRenderer`] is the seam the compiler talks to.  The bundled
//! [`RasterChartRenderer`] draws pies and the risk meter with `plotters` on
//! an in-memory bitmap and leaves every piece of text (title, legend, the
//! percentage read-out) to the PDF layer, which typesets it next to the image
//! with the same colors as the slices.

use std::io::Cursor;

use image::{DynamicImage, ImageOutputFormat, RgbImage};
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::style::TRANSPARENT;
use thiserror::Error;

use crate::scores::format_percentage;

/// Slice colors, reused cyclically.
pub const PALETTE: [[u8; 3]; 5] = [
    [0xFF, 0x63, 0x84],
    [0x36, 0xA2, 0xEB],
    [0xFF, 0xCE, 0x56],
    [0x4B, 0xC0, 0xC0],
    [0x99, 0x66, 0xFF],
];

const EMPTY_PIE: RGBColor = RGBColor(230, 230, 230);

const GAUGE_LOW: [u8; 3] = [0xF4, 0x43, 0x36];
const GAUGE_MID: [u8; 3] = [0xFF, 0xC1, 0x07];
const GAUGE_HIGH: [u8; 3] = [0x4C, 0xAF, 0x50];

const GAUGE_MARGIN: i32 = 20;
const GAUGE_BAR: (i32, i32) = (100, 140);
const MARKER_TOP: i32 = 70;
const MARKER_RADIUS: i32 = 5;

/// Upper bound of the low zone of the risk meter.
pub const LOW_ZONE_LIMIT: f64 = 33.0;
/// Upper bound of the middle zone of the risk meter.
pub const MID_ZONE_LIMIT: f64 = 66.0;

/// Errors produced while rendering charts.
#[derive(Debug, Error)]
pub enum ChartError {
    /// Labels and values of a pie did not line up.
    #[error("pie chart has {labels} labels but {values} values")]
    MismatchedSeries { labels: usize, values: usize },
    /// The drawing backend rejected an element.
    #[error("failed to draw chart: {0}")]
    Draw(String),
    /// The chart could not be encoded as PNG.
    #[error("failed to encode chart image")]
    Encode(#[from] image::ImageError),
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for ChartError {
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        ChartError::Draw(err.to_string())
    }
}

/// A legend entry accompanying a chart.
#[derive(Clone, Debug, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub color: [u8; 3],
}

/// A rendered chart together with the text the PDF layer prints around it.
#[derive(Clone, Debug, PartialEq)]
pub struct ChartImage {
    /// PNG encoded pixels.
    pub png: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
    pub caption: String,
    pub legend: Vec<LegendEntry>,
}

/// Rasterises the two chart kinds of the report.
pub trait ChartRenderer {
    /// Renders a pie of `values`.  The values do not need to sum to 100.
    fn render_pie(
        &self,
        labels: &[String],
        values: &[f64],
        title: &str,
    ) -> Result<ChartImage, ChartError>;

    /// Renders the risk meter for a usability percentage.
    fn render_risk_gauge(&self, percentage: f64) -> Result<ChartImage, ChartError>;
}

/// Color of the slice at `index`.
pub fn slice_color(index: usize) -> [u8; 3] {
    PALETTE[index % PALETTE.len()]
}

fn rgb_color([r, g, b]: [u8; 3]) -> RGBColor {
    RGBColor(r, g, b)
}

/// Zone of the risk meter a percentage falls into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RiskZone {
    Low,
    Mid,
    High,
}

impl RiskZone {
    /// Classifies a usability percentage.
    pub fn from_percentage(percentage: f64) -> Self {
        let percentage = clamp_percentage(percentage);
        if percentage <= LOW_ZONE_LIMIT {
            RiskZone::Low
        } else if percentage <= MID_ZONE_LIMIT {
            RiskZone::Mid
        } else {
            RiskZone::High
        }
    }

    /// Color of the zone on the meter.
    pub fn color(self) -> [u8; 3] {
        match self {
            RiskZone::Low => GAUGE_LOW,
            RiskZone::Mid => GAUGE_MID,
            RiskZone::High => GAUGE_HIGH,
        }
    }
}

fn clamp_percentage(percentage: f64) -> f64 {
    if percentage.is_finite() {
        percentage.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Horizontal marker offset on a meter of `width` for a usability percentage.
///
/// The two lower zones each span 33% of the meter and the upper zone 34%;
/// within a zone the offset is linear.
pub fn marker_offset(percentage: f64, width: f64) -> f64 {
    let p = clamp_percentage(percentage);
    if p <= LOW_ZONE_LIMIT {
        p / LOW_ZONE_LIMIT * (width * 0.33)
    } else if p <= MID_ZONE_LIMIT {
        (p - LOW_ZONE_LIMIT) / (MID_ZONE_LIMIT - LOW_ZONE_LIMIT) * (width * 0.33) + width * 0.33
    } else {
        (p - MID_ZONE_LIMIT) / (100.0 - MID_ZONE_LIMIT) * (width * 0.34) + width * 0.66
    }
}

/// Color of the meter at `t` (0 at the left end, 1 at the right end).
fn gauge_gradient(t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0);
    let (start, end, t) = if t <= 0.5 {
        (GAUGE_LOW, GAUGE_MID, t * 2.0)
    } else {
        (GAUGE_MID, GAUGE_HIGH, (t - 0.5) * 2.0)
    };
    let channel = |i: usize| {
        let (a, b) = (f64::from(start[i]), f64::from(end[i]));
        (a + (b - a) * t).round() as u8
    };
    RGBColor(channel(0), channel(1), channel(2))
}

fn encode_png(buffer: RgbImage) -> Result<Vec<u8>, ChartError> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(buffer).write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)?;
    Ok(bytes)
}

/// Runs `draw` on a white bitmap of `size` pixels and returns the pixels.
fn draw_bitmap<F>(size: (u32, u32), draw: F) -> Result<RgbImage, ChartError>
where
    F: FnOnce(&DrawingArea<BitMapBackend<'_>, Shift>) -> Result<(), ChartError>,
{
    let (width, height) = size;
    let mut buffer = vec![0u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, size).into_drawing_area();
        root.fill(&WHITE)?;
        draw(&root)?;
        root.present()?;
    }
    RgbImage::from_raw(width, height, buffer)
        .ok_or_else(|| ChartError::Draw("bitmap buffer does not match its size".to_string()))
}

/// Chart renderer drawing with `plotters` into in-memory RGB bitmaps.
#[derive(Clone, Debug)]
pub struct RasterChartRenderer {
    pie_size: (u32, u32),
    gauge_size: (u32, u32),
}

impl Default for RasterChartRenderer {
    fn default() -> Self {
        Self {
            pie_size: (800, 600),
            gauge_size: (400, 200),
        }
    }
}

impl RasterChartRenderer {
    /// Creates a renderer with the default canvas sizes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws the pie slices.  Slices start at twelve o'clock and run
    /// clockwise; negative or non-finite values become empty slices.
    pub fn draw_pie(&self, labels: &[String], values: &[f64]) -> Result<RgbImage, ChartError> {
        let (width, height) = self.pie_size;
        let sizes: Vec<f64> = values
            .iter()
            .map(|value| if value.is_finite() { value.max(0.0) } else { 0.0 })
            .collect();
        let colors: Vec<RGBColor> = (0..sizes.len()).map(|i| rgb_color(slice_color(i))).collect();
        let center = (width as i32 / 2, height as i32 / 2);
        let radius = f64::from(width.min(height)) / 2.0 * 0.9;

        draw_bitmap(self.pie_size, |root| {
            if sizes.iter().sum::<f64>() <= 0.0 {
                root.draw(&Circle::new(center, radius as i32, EMPTY_PIE.filled()))?;
                return Ok(());
            }
            let mut pie = Pie::new(&center, &radius, &sizes, &colors, labels);
            pie.start_angle(-90.0);
            pie.label_style(("sans-serif", 1).into_font().color(&TRANSPARENT));
            root.draw(&pie)?;
            Ok(())
        })
    }

    /// Draws the meter bar and the marker for `percentage`.
    pub fn draw_gauge(&self, percentage: f64) -> Result<RgbImage, ChartError> {
        let (width, _) = self.gauge_size;
        let meter_width = width as i32 - 2 * GAUGE_MARGIN;
        let (bar_top, bar_bottom) = GAUGE_BAR;
        let marker_x =
            GAUGE_MARGIN + marker_offset(percentage, f64::from(meter_width)).round() as i32;

        draw_bitmap(self.gauge_size, |root| {
            for column in 0..meter_width {
                let x = GAUGE_MARGIN + column;
                let color = gauge_gradient((f64::from(column) + 0.5) / f64::from(meter_width));
                root.draw(&Rectangle::new([(x, bar_top), (x + 1, bar_bottom)], color.filled()))?;
            }
            root.draw(&Polygon::new(
                vec![
                    (marker_x, MARKER_TOP),
                    (marker_x - MARKER_RADIUS, bar_top),
                    (marker_x + MARKER_RADIUS, bar_top),
                ],
                BLACK.filled(),
            ))?;
            root.draw(&Circle::new((marker_x, bar_top), MARKER_RADIUS, BLACK.filled()))?;
            Ok(())
        })
    }
}

impl ChartRenderer for RasterChartRenderer {
    fn render_pie(
        &self,
        labels: &[String],
        values: &[f64],
        title: &str,
    ) -> Result<ChartImage, ChartError> {
        if labels.len() != values.len() {
            return Err(ChartError::MismatchedSeries {
                labels: labels.len(),
                values: values.len(),
            });
        }

        let (width_px, height_px) = self.pie_size;
        let legend = labels
            .iter()
            .enumerate()
            .map(|(index, label)| LegendEntry {
                label: label.clone(),
                color: slice_color(index),
            })
            .collect();

        Ok(ChartImage {
            png: encode_png(self.draw_pie(labels, values)?)?,
            width_px,
            height_px,
            caption: title.to_string(),
            legend,
        })
    }

    fn render_risk_gauge(&self, percentage: f64) -> Result<ChartImage, ChartError> {
        let (width_px, height_px) = self.gauge_size;
        Ok(ChartImage {
            png: encode_png(self.draw_gauge(percentage)?)?,
            width_px,
            height_px,
            caption: format!("Usabilidad: {}", format_percentage(clamp_percentage(percentage))),
            legend: Vec::new(),
        })
    }
}
