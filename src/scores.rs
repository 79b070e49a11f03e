//! Usability score aggregation.
//!
//! Everything in this module is a pure function of the survey data: the same
//! evaluators always produce the same tallies, in the same order.  Heuristic
//! tallies keep questions and heuristics in first-seen order; standard tallies
//! always list the three global dimensions in [`ResponseType::ALL`] order.

use indexmap::IndexMap;
use thiserror::Error;

use crate::survey::{Evaluator, HeuristicResponse, Question, ResponseType, StandardResponse};

/// Label of the residual row and chart slice.
pub const USABILITY_GAP_LABEL: &str = "Falta de Usabilidad";

/// Errors raised by aggregate computations.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ScoreError {
    /// A percentage would have been computed over a zero denominator.
    #[error("cannot compute usability for {context}: no score has been recorded")]
    ZeroDenominator { context: String },
}

/// Formats a score with the fixed two decimal places used throughout the report.
pub fn format_score(value: f64) -> String {
    format!("{:.2}", value)
}

/// Formats a percentage with two decimal places and a trailing `%`.
pub fn format_percentage(value: f64) -> String {
    format!("{:.2}%", value)
}

/// One row of a usability breakdown table.
#[derive(Clone, Debug, PartialEq)]
pub struct UsabilityRow {
    pub label: String,
    pub obtained: f64,
    pub max: f64,
    pub percentage: f64,
}

/// Per-dimension usability figures for a question or for the whole test.
#[derive(Clone, Debug, PartialEq)]
pub struct UsabilityBreakdown {
    pub rows: Vec<UsabilityRow>,
    /// Points obtained divided by points possible, as a percentage.
    pub usability_level: f64,
    /// `100 - Σ row percentages`.
    pub gap_percentage: f64,
}

impl UsabilityBreakdown {
    /// Sum of every row percentage, excluding the gap.
    pub fn total_percentage(&self) -> f64 {
        self.rows.iter().map(|row| row.percentage).sum()
    }

    /// Pie series of the row percentages followed by the gap slice.
    pub fn percentage_series(&self) -> (Vec<String>, Vec<f64>) {
        let mut labels: Vec<String> = self.rows.iter().map(|row| row.label.clone()).collect();
        let mut values: Vec<f64> = self.rows.iter().map(|row| row.percentage).collect();
        labels.push(USABILITY_GAP_LABEL.to_string());
        values.push(self.gap_percentage);
        (labels, values)
    }
}

/// Severity band derived from the share of usability a design is missing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    None,
    Cosmetic,
    Minor,
    Major,
}

impl Severity {
    /// Classifies a missing-usability percentage.
    pub fn from_missing_percentage(missing: f64) -> Self {
        if missing < 1.0 {
            Severity::None
        } else if missing <= 10.0 {
            Severity::Cosmetic
        } else if missing <= 50.0 {
            Severity::Minor
        } else {
            Severity::Major
        }
    }

    /// Recommendation printed below the risk meter.
    pub fn recommendation(self) -> &'static str {
        match self {
            Severity::None => "Severidad Baja: No es un problema de usabilidad.",
            Severity::Cosmetic => "Severidad Baja-Media: Problema 'Cosmético'; no necesita ser resuelto a menos que se disponga de tiempo extra en el proyecto.",
            Severity::Minor => "Severidad Media: Problema de usabilidad menor: arreglarlo tiene baja prioridad.",
            Severity::Major => "Severidad Alta: Problema de usabilidad mayor: es importante arreglarlo.",
        }
    }
}

/// Accumulated scores of one heuristic across every evaluator of a question.
#[derive(Clone, Debug, PartialEq)]
pub struct HeuristicTally {
    pub code: String,
    pub title: String,
    pub obtained: f64,
    pub max: f64,
    pub evaluators: usize,
}

/// Heuristic tallies of a single distinct question.
#[derive(Clone, Debug, PartialEq)]
pub struct QuestionTally {
    pub question: Question,
    heuristics: IndexMap<String, HeuristicTally>,
}

impl QuestionTally {
    fn new(question: Question) -> Self {
        Self {
            question,
            heuristics: IndexMap::new(),
        }
    }

    /// Heuristic tallies in first-seen order.
    pub fn heuristics(&self) -> impl Iterator<Item = &HeuristicTally> {
        self.heuristics.values()
    }

    /// Total points obtained across every heuristic.
    pub fn obtained(&self) -> f64 {
        self.heuristics.values().map(|h| h.obtained).sum()
    }

    /// Total points possible across every heuristic.
    pub fn max(&self) -> f64 {
        self.heuristics.values().map(|h| h.max).sum()
    }

    /// Computes the usability breakdown of the question.
    ///
    /// Each heuristic's percentage is its share of the points the question
    /// obtained, not of the points it could have obtained; the overall
    /// [`UsabilityBreakdown::usability_level`] is relative to the maximum.
    pub fn breakdown(&self) -> Result<UsabilityBreakdown, ScoreError> {
        let obtained = self.obtained();
        let max = self.max();
        if max <= 0.0 || obtained <= 0.0 {
            return Err(ScoreError::ZeroDenominator {
                context: format!("question '{}'", self.question.title),
            });
        }

        let rows: Vec<UsabilityRow> = self
            .heuristics
            .values()
            .map(|h| UsabilityRow {
                label: h.title.clone(),
                obtained: h.obtained,
                max: h.max,
                percentage: h.obtained / obtained * 100.0,
            })
            .collect();
        let shares: f64 = rows.iter().map(|row| row.percentage).sum();

        Ok(UsabilityBreakdown {
            rows,
            usability_level: obtained / max * 100.0,
            gap_percentage: 100.0 - shares,
        })
    }
}

/// Groups every heuristic response by distinct question and accumulates the
/// subprinciple scores of all evaluators.
pub fn tally_questions(evaluators: &[Evaluator<HeuristicResponse>]) -> Vec<QuestionTally> {
    let mut questions: IndexMap<Question, QuestionTally> = IndexMap::new();

    for response in evaluators.iter().flat_map(|e| &e.responses) {
        let tally = questions
            .entry(response.question.clone())
            .or_insert_with(|| QuestionTally::new(response.question.clone()));

        for heuristic in &response.heuristics {
            let entry = tally
                .heuristics
                .entry(heuristic.code.clone())
                .or_insert_with(|| HeuristicTally {
                    code: heuristic.code.clone(),
                    title: heuristic.title.clone(),
                    obtained: 0.0,
                    max: 0.0,
                    evaluators: 0,
                });
            entry.obtained += heuristic.total();
            entry.max += crate::survey::MAX_SUBPRINCIPLE_VALUE * heuristic.subprinciples.len() as f64;
            entry.evaluators += 1;
        }
    }

    questions.into_values().collect()
}

/// Accumulated standard responses of one global dimension.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlobalScore {
    pub kind: ResponseType,
    pub total: f64,
    pub count: usize,
}

impl GlobalScore {
    fn empty(kind: ResponseType) -> Self {
        Self {
            kind,
            total: 0.0,
            count: 0,
        }
    }

    /// Points possible for the recorded responses.
    pub fn max(&self) -> f64 {
        self.count as f64 * self.kind.max_value()
    }
}

/// Global scores of a standard-mode design test.
#[derive(Clone, Debug, PartialEq)]
pub struct GlobalScores {
    scores: [GlobalScore; 3],
}

impl Default for GlobalScores {
    fn default() -> Self {
        Self {
            scores: ResponseType::ALL.map(GlobalScore::empty),
        }
    }
}

impl GlobalScores {
    /// Sums the responses of every evaluator.  Responses without a recognised
    /// type are ignored; a missing value counts as zero.
    pub fn from_evaluators(evaluators: &[Evaluator<StandardResponse>]) -> Self {
        let mut scores = Self::default();
        for response in evaluators.iter().flat_map(|e| &e.responses) {
            if let Some(kind) = response.response.response_type() {
                scores.record(kind, response.response.value.unwrap_or(0.0));
            }
        }
        scores
    }

    /// Records a single response.
    pub fn record(&mut self, kind: ResponseType, value: f64) {
        if let Some(score) = self.scores.iter_mut().find(|score| score.kind == kind) {
            score.total += value;
            score.count += 1;
        }
    }

    /// Scores in table order.
    pub fn iter(&self) -> impl Iterator<Item = &GlobalScore> {
        self.scores.iter()
    }

    /// Total points obtained.
    pub fn obtained(&self) -> f64 {
        self.scores.iter().map(|score| score.total).sum()
    }

    /// Total points possible.
    pub fn possible(&self) -> f64 {
        self.scores.iter().map(GlobalScore::max).sum()
    }

    /// Computes the overall usability breakdown.
    pub fn breakdown(&self) -> Result<UsabilityBreakdown, ScoreError> {
        let obtained = self.obtained();
        let possible = self.possible();
        if possible <= 0.0 || obtained <= 0.0 {
            return Err(ScoreError::ZeroDenominator {
                context: "the global scores".to_string(),
            });
        }

        let level = obtained / possible * 100.0;
        let rows = self
            .scores
            .iter()
            .map(|score| UsabilityRow {
                label: score.kind.label().to_string(),
                obtained: score.total,
                max: score.max(),
                percentage: score.total / obtained * level,
            })
            .collect();

        Ok(UsabilityBreakdown {
            rows,
            usability_level: level,
            gap_percentage: 100.0 - level,
        })
    }

    /// Pie series of the raw per-dimension totals followed by the missing points.
    pub fn points_series(&self) -> (Vec<String>, Vec<f64>) {
        let mut labels: Vec<String> = self
            .scores
            .iter()
            .map(|score| score.kind.label().to_string())
            .collect();
        let mut values: Vec<f64> = self.scores.iter().map(|score| score.total).collect();
        labels.push(USABILITY_GAP_LABEL.to_string());
        values.push(self.possible() - self.obtained());
        (labels, values)
    }
}
