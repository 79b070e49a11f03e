//! Heuristic mode: per-question usability breakdowns and comment summaries.

use log::debug;

use super::{comment_or_placeholder, heading, Compilation};
use crate::error::ReportError;
use crate::layout::BLOCK_SPACING_MM;
use crate::model::{Column, HeadingLevel, HorizontalAlignment, Table};
use crate::scores::{
    format_percentage, format_score, QuestionTally, UsabilityBreakdown, USABILITY_GAP_LABEL,
};
use crate::screenshot::sanitize_prototype_url;
use crate::survey::{Evaluator, HeuristicResponse};

/// Title of the per-question percentage pie.
pub const HEURISTIC_PIE_TITLE: &str = "Gráfica de Usabilidad por Heurísticas";

/// Usability table shared by both modes; `dimension` names the first column.
pub(crate) fn usability_table(dimension: &str, breakdown: &UsabilityBreakdown) -> Table {
    let mut table = Table::new(vec![
        Column::new(60.0),
        Column::centered(40.0),
        Column::centered(40.0),
        Column::centered(40.0),
    ])
    .with_head([
        dimension,
        "Puntaje Obtenido",
        "Puntaje Máximo",
        "Porcentaje Obtenido",
    ]);
    for row in &breakdown.rows {
        table.push_row(
            [
                row.label.clone(),
                format_score(row.obtained),
                format_score(row.max),
                format_percentage(row.percentage),
            ],
            false,
        );
    }
    table.push_row(
        [
            USABILITY_GAP_LABEL.to_string(),
            "-".to_string(),
            "-".to_string(),
            format_percentage(breakdown.gap_percentage),
        ],
        false,
    );
    table
}

/// Field/value table identifying a question and its prototype frame.
pub(crate) fn question_fields(title: &str, url: &str) -> Table {
    Table::new(vec![Column::new(50.0), Column::new(130.0)])
        .with_head(["Campo", "Valor"])
        .with_row(["Título de la Pregunta", title])
        .with_row(["URL del Prototipo", url])
}

pub(super) fn compose_usability(
    run: &mut Compilation<'_>,
    tallies: &[QuestionTally],
) -> Result<(), ReportError> {
    for tally in tallies {
        let title = &tally.question.title;
        let at = run
            .composer()
            .start_page(Some(format!("Usabilidad: {}", title)));
        let at = run.composer().heading(
            at,
            heading(title.clone(), HeadingLevel::SubSection, HorizontalAlignment::Left),
        );

        let breakdown = match tally.breakdown() {
            Ok(breakdown) => breakdown,
            Err(reason) => {
                run.skip_table(reason);
                continue;
            }
        };
        debug!(
            "Question '{}': {:.2} of {:.2} points, usability {:.2}%",
            title,
            tally.obtained(),
            tally.max(),
            breakdown.usability_level
        );

        let at = run
            .composer()
            .table(at, usability_table("Heurística", &breakdown));
        let at = run.composer().space(at, BLOCK_SPACING_MM);
        let (labels, values) = breakdown.percentage_series();
        let at = run.pie(at, &labels, &values, HEURISTIC_PIE_TITLE, format_percentage)?;
        let at = run.composer().space(at, BLOCK_SPACING_MM);
        run.risk_gauge(at, breakdown.usability_level)?;
    }
    Ok(())
}

/// Comment table grouping every evaluator's comment under each heuristic of
/// the question.  Evaluators who did not answer get the placeholder.
pub(crate) fn comments_table(
    tally: &QuestionTally,
    evaluators: &[Evaluator<HeuristicResponse>],
) -> Table {
    let mut table = Table::new(vec![Column::new(60.0), Column::new(120.0)])
        .with_head(["Heurística", "Comentario"]);

    for heuristic in tally.heuristics() {
        table.push_row([heuristic.title.as_str(), ""], true);
        for evaluator in evaluators {
            let comment = evaluator
                .responses
                .iter()
                .find(|response| response.question == tally.question)
                .and_then(|response| {
                    response
                        .heuristics
                        .iter()
                        .find(|score| score.code == heuristic.code)
                })
                .and_then(|score| score.comment_text());
            table.push_row(
                [evaluator.username.clone(), comment_or_placeholder(comment)],
                false,
            );
        }
    }
    table
}

pub(super) fn compose_comments(
    run: &mut Compilation<'_>,
    evaluators: &[Evaluator<HeuristicResponse>],
    tallies: &[QuestionTally],
) {
    for tally in tallies {
        let question = &tally.question;
        let at = run
            .composer()
            .start_page(Some(format!("Comentarios: {}", question.title)));
        let at = run
            .composer()
            .table(at, question_fields(&question.title, &question.url_frame));
        let at = run.composer().space(at, BLOCK_SPACING_MM);
        run.composer().table(at, comments_table(tally, evaluators));

        if let Some(screenshot) = run.screenshot(&sanitize_prototype_url(&question.url_frame)) {
            let at = run
                .composer()
                .start_page(Some(format!("Captura: {}", question.title)));
            run.composer().image(at, screenshot);
        }
    }
}
