//! One page per evaluator with their raw answers.

use super::Compilation;
use crate::layout::{Cursor, BLOCK_SPACING_MM};
use crate::model::{Column, Table};
use crate::scores::format_score;
use crate::survey::{Evaluator, HeuristicResponse, HeuristicScore, Question, StandardResponse};

fn evaluator_page<R>(run: &mut Compilation<'_>, evaluator: &Evaluator<R>) -> Cursor {
    let at = run
        .composer()
        .start_page(Some(format!("Evaluador: {}", evaluator.username)));
    let identity = Table::new(vec![Column::new(60.0), Column::new(120.0)])
        .with_head(["Nombre del evaluador", "Correo del evaluador"])
        .with_row([evaluator.username.as_str(), evaluator.email.as_str()]);
    let at = run.composer().table(at, identity);
    run.composer().space(at, BLOCK_SPACING_MM)
}

fn question_table(question: &Question) -> Table {
    Table::new(vec![Column::new(40.0), Column::new(140.0)])
        .with_head(["Título", "Descripción"])
        .with_row([question.title.as_str(), question.description.as_str()])
}

/// Subprinciple scores of a heuristic.
pub(crate) fn score_table(heuristic: &HeuristicScore) -> Table {
    let mut table = Table::new(vec![Column::new(160.0), Column::centered(20.0)])
        .with_head([heuristic.title.as_str(), "Puntaje"]);
    for subprinciple in &heuristic.subprinciples {
        table.push_row(
            [
                subprinciple.subtitle.clone(),
                subprinciple.response_value.to_string(),
            ],
            false,
        );
    }
    table
}

/// The `Total de puntajes` row printed under a heuristic's scores.
pub(crate) fn total_table(heuristic: &HeuristicScore) -> Table {
    Table::new(vec![Column::right(160.0), Column::centered(20.0)]).with_row([
        "Total de puntajes".to_string(),
        format_score(heuristic.total()),
    ])
}

/// Response type, value and comment of a standard response.  Skipped fields
/// are left blank.
pub(crate) fn response_table(response: &StandardResponse) -> Table {
    let detail = &response.response;
    Table::new(vec![
        Column::new(27.0),
        Column::centered(19.0),
        Column::new(134.0),
    ])
    .with_head(["Tipo", "Puntaje", "Comentario"])
    .with_row([
        detail.kind.clone().unwrap_or_default(),
        detail.value.map(|value| value.to_string()).unwrap_or_default(),
        detail.comment.clone().unwrap_or_default(),
    ])
}

pub(super) fn compose_heuristic(
    run: &mut Compilation<'_>,
    evaluators: &[Evaluator<HeuristicResponse>],
) {
    for evaluator in evaluators {
        let mut at = evaluator_page(run, evaluator);
        for response in &evaluator.responses {
            at = run.composer().table(at, question_table(&response.question));
            at = run.composer().space(at, BLOCK_SPACING_MM);
            for heuristic in &response.heuristics {
                at = run.composer().table(at, score_table(heuristic));
                at = run.composer().table(at, total_table(heuristic));
                at = run.composer().space(at, BLOCK_SPACING_MM);
            }
        }
    }
}

pub(super) fn compose_standard(
    run: &mut Compilation<'_>,
    evaluators: &[Evaluator<StandardResponse>],
) {
    for evaluator in evaluators {
        let mut at = evaluator_page(run, evaluator);
        for response in &evaluator.responses {
            at = run.composer().table(at, question_table(&response.question));
            at = run.composer().space(at, BLOCK_SPACING_MM);
            at = run.composer().table(at, response_table(response));
            at = run.composer().space(at, BLOCK_SPACING_MM);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::{ResponseDetail, Subprinciple};

    fn heuristic() -> HeuristicScore {
        HeuristicScore {
            code: "H1".to_string(),
            title: "Visibilidad del estado".to_string(),
            comment: None,
            subprinciples: vec![
                Subprinciple {
                    code: None,
                    subtitle: "Estado".to_string(),
                    description: None,
                    response_value: 7.0,
                },
                Subprinciple {
                    code: None,
                    subtitle: "Feedback".to_string(),
                    description: None,
                    response_value: 9.5,
                },
            ],
        }
    }

    #[test]
    fn score_table_lists_subprinciples_under_heuristic_title() {
        let table = score_table(&heuristic());
        assert_eq!(
            table.head(),
            Some(&["Visibilidad del estado".to_string(), "Puntaje".to_string()][..])
        );
        assert_eq!(table.cell(0, 1), Some("7"));
        assert_eq!(table.cell(1, 1), Some("9.5"));
    }

    #[test]
    fn total_row_has_two_decimals() {
        let table = total_table(&heuristic());
        assert_eq!(table.cell(0, 0), Some("Total de puntajes"));
        assert_eq!(table.cell(0, 1), Some("16.50"));
    }

    #[test]
    fn skipped_standard_response_renders_blank_cells() {
        let response = StandardResponse {
            question: Question {
                id: 1,
                title: "Inicio".to_string(),
                description: String::new(),
                url_frame: String::new(),
            },
            response: ResponseDetail {
                kind: None,
                value: None,
                comment: None,
            },
        };
        let table = response_table(&response);
        assert_eq!(table.rows()[0].cells, vec!["", "", ""]);
    }
}
