//! Standard mode: global usability scores and per-question comment pages.

use indexmap::IndexSet;

use super::heuristic::{question_fields, usability_table};
use super::{comment_or_placeholder, heading, Compilation};
use crate::error::ReportError;
use crate::layout::{Cursor, BLOCK_SPACING_MM};
use crate::model::{Column, HeadingLevel, HorizontalAlignment, RichParagraph, Table};
use crate::scores::{format_score, GlobalScores};
use crate::screenshot::scaled_prototype_url;
use crate::survey::{Evaluator, Question, StandardResponse};

/// Heading above the global charts.
pub const GLOBAL_CHARTS_HEADING: &str = "Gráficas de Evaluación - General";

/// Title of the global points pie.
pub const GLOBAL_PIE_TITLE: &str = "Gráfica de Usabilidad - General";

pub(super) fn compose_global(
    run: &mut Compilation<'_>,
    evaluators: &[Evaluator<StandardResponse>],
) -> Result<(), ReportError> {
    let scores = GlobalScores::from_evaluators(evaluators);
    let at = run
        .composer()
        .start_page(Some(GLOBAL_CHARTS_HEADING.to_string()));

    match scores.breakdown() {
        Ok(breakdown) => {
            let at = run
                .composer()
                .table(at, usability_table("Tipo de Respuesta", &breakdown));
            let at = run.composer().space(at, BLOCK_SPACING_MM);
            global_charts(run, at, &scores, breakdown.usability_level)?;
        }
        Err(reason) => {
            let at = run.composer().paragraph(
                at,
                RichParagraph::plain("No hay puntajes registrados para calcular la usabilidad."),
            );
            run.skip_table(reason);
            // Zero points out of a positive maximum still chart the missing points.
            if scores.possible() > 0.0 {
                let at = run.composer().space(at, BLOCK_SPACING_MM);
                global_charts(run, at, &scores, 0.0)?;
            }
        }
    }
    Ok(())
}

fn global_charts(
    run: &mut Compilation<'_>,
    at: Cursor,
    scores: &GlobalScores,
    usability_level: f64,
) -> Result<Cursor, ReportError> {
    let at = run.composer().heading(
        at,
        heading(
            GLOBAL_CHARTS_HEADING,
            HeadingLevel::Section,
            HorizontalAlignment::Left,
        ),
    );
    let (labels, values) = scores.points_series();
    let at = run.pie(at, &labels, &values, GLOBAL_PIE_TITLE, format_score)?;
    let at = run.composer().space(at, BLOCK_SPACING_MM);
    run.risk_gauge(at, usability_level)
}

/// Distinct questions in first-seen order.
pub(crate) fn distinct_questions(evaluators: &[Evaluator<StandardResponse>]) -> Vec<&Question> {
    let questions: IndexSet<&Question> = evaluators
        .iter()
        .flat_map(|evaluator| &evaluator.responses)
        .map(|response| &response.question)
        .collect();
    questions.into_iter().collect()
}

/// Every evaluator's comment on `question`.
pub(crate) fn comments_table(
    question: &Question,
    evaluators: &[Evaluator<StandardResponse>],
) -> Table {
    let mut table = Table::new(vec![Column::new(40.0), Column::new(140.0)])
        .with_head(["Evaluador", "Comentario"]);
    for evaluator in evaluators {
        for response in evaluator
            .responses
            .iter()
            .filter(|response| &response.question == question)
        {
            table.push_row(
                [
                    evaluator.username.clone(),
                    comment_or_placeholder(response.response.comment.as_deref()),
                ],
                false,
            );
        }
    }
    table
}

pub(super) fn compose_questions(
    run: &mut Compilation<'_>,
    evaluators: &[Evaluator<StandardResponse>],
) {
    for question in distinct_questions(evaluators) {
        let url = scaled_prototype_url(&question.url_frame);
        let at = run
            .composer()
            .start_page(Some(format!("Pregunta: {}", question.title)));
        let at = run
            .composer()
            .table(at, question_fields(&question.title, &url));
        let at = run.composer().space(at, BLOCK_SPACING_MM);
        let at = run.composer().table(at, comments_table(question, evaluators));

        if let Some(screenshot) = run.screenshot(&url) {
            let at = run.composer().space(at, BLOCK_SPACING_MM);
            run.composer().image(at, screenshot);
        }
    }
}
