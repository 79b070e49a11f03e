//! Cover page.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use log::warn;

use super::{heading, Compilation, REPORT_TITLE};
use crate::layout::{Cursor, BLOCK_SPACING_MM};
use crate::model::{
    Column, HeadingLevel, HorizontalAlignment, ImageBlock, ImageSource, RichParagraph, Table,
};
use crate::screenshot::{fit_within, sanitize_prototype_url};
use crate::survey::DesignTest;

const HEADER_IMAGE_BOX_MM: (f64, f64) = (60.0, 60.0);

const MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

const MEASUREMENT_SCALE: [(&str, &str); 5] = [
    ("1 - 2", "Se da la mínima expresión del heurístico en las páginas evaluadas"),
    ("3 - 4", "Se da una expresión baja del heurístico en las páginas evaluadas"),
    ("5 - 6", "Se da una expresión media del heurístico en las páginas evaluadas"),
    ("7 - 8", "Se da una expresión alta del heurístico en las páginas evaluadas"),
    ("9 - 10", "Se da la máxima expresión del heurístico en las páginas evaluadas"),
];

/// Formats a backend timestamp as a Spanish long date (`5 de marzo de 2024`).
/// Unparseable values are printed as they are.
pub(crate) fn long_spanish_date(raw: &str) -> String {
    let raw = raw.trim();
    let date = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.date())
        })
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"));

    match date {
        Ok(date) => format!(
            "{} de {} de {}",
            date.day(),
            MONTHS[date.month0() as usize],
            date.year()
        ),
        Err(_) => raw.to_string(),
    }
}

pub(super) fn compose(run: &mut Compilation<'_>, test: &DesignTest) {
    let at = run.composer().start_page(Some("Portada".to_string()));
    let at = header_image(run, at);

    let at = run.composer().heading(
        at,
        heading(REPORT_TITLE, HeadingLevel::Title, HorizontalAlignment::Center),
    );
    let at = run.composer().heading(
        at,
        heading(test.name.clone(), HeadingLevel::Subtitle, HorizontalAlignment::Center),
    );
    let at = run.composer().space(at, BLOCK_SPACING_MM);
    let at = run.composer().heading(
        at,
        heading(
            "Datos de la prueba de diseño",
            HeadingLevel::Section,
            HorizontalAlignment::Left,
        ),
    );

    let screens = run.question_count(test.id);
    let details = Table::new(vec![Column::right(40.0), Column::new(140.0)])
        .with_row(["Creado en".to_string(), long_spanish_date(&test.created_at)])
        .with_row([
            "Propietario".to_string(),
            test.owner_name.clone().unwrap_or_default(),
        ])
        .with_row(["Nombre".to_string(), test.name.clone()])
        .with_row(["URL".to_string(), sanitize_prototype_url(&test.url)])
        .with_row(["Descripción".to_string(), test.description.clone()])
        .with_row(["Tipo de prueba".to_string(), test.test_type.label().to_string()])
        .with_row([
            "Heurísticas".to_string(),
            if test.has_heuristics { "Sí" } else { "No" }.to_string(),
        ])
        .with_row(["Pantallas".to_string(), screens.to_string()]);
    let at = run.composer().table(at, details);

    if test.has_heuristics {
        measurement_legend(run, at);
    }
}

fn header_image(run: &mut Compilation<'_>, at: Cursor) -> Cursor {
    let Some(path) = run.config().header_image.clone() else {
        return at;
    };

    let (max_width, max_height) = HEADER_IMAGE_BOX_MM;
    let size = image::image_dimensions(&path)
        .map_err(|err| err.to_string())
        .and_then(|(w, h)| {
            fit_within(w, h, max_width, max_height).ok_or_else(|| "image is empty".to_string())
        });

    match size {
        Ok((width, height)) => {
            let block = ImageBlock::new(
                ImageSource::from_path(path.to_string_lossy().into_owned()),
                width,
                height,
            );
            run.composer().image(at, block)
        }
        Err(err) => {
            warn!("Ignoring header image {}: {}", path.display(), err);
            at
        }
    }
}

fn measurement_legend(run: &mut Compilation<'_>, at: Cursor) -> Cursor {
    let at = run.composer().space(at, BLOCK_SPACING_MM);
    let at = run.composer().heading(
        at,
        heading("Mediciones", HeadingLevel::SubSection, HorizontalAlignment::Left),
    );
    let at = run.composer().paragraph(
        at,
        RichParagraph::plain(
            "Las mediciones que dan valor a los heurísticos siguen el siguiente patrón:",
        ),
    );

    let mut legend = Table::new(vec![Column::centered(20.0), Column::new(160.0)])
        .with_head(["Valor", "Observaciones"]);
    for (range, description) in MEASUREMENT_SCALE {
        legend.push_row([range, description], false);
    }
    run.composer().table(at, legend)
}
