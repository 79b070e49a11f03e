//! Survey result model consumed by the report compiler.
//!
//! The backend hands over a single `{design_test, evaluators}` object whose
//! response shape depends on whether the design test was scored with
//! heuristics.  [`ReportInput`] mirrors that loose wire format; [`ReportData`]
//! is the validated form where the response shape has been resolved exactly
//! once into the [`Evaluations`] variant.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Highest value a subprinciple can be scored with.
pub const MAX_SUBPRINCIPLE_VALUE: f64 = 10.0;

/// Errors raised while validating raw survey input.
#[derive(Debug, Error)]
pub enum InputError {
    /// The input carried no `design_test` object.
    #[error("survey data is missing the design test")]
    MissingDesignTest,
    /// The input carried no `evaluators` list.
    #[error("survey data is missing the evaluator list")]
    MissingEvaluators,
    /// The input was not valid JSON or did not match the expected envelope.
    #[error("survey data could not be parsed")]
    Parse(#[source] serde_json::Error),
    /// A response did not match the shape required by the test mode.
    #[error("response {index} of evaluator '{evaluator}' does not match the {mode} response shape")]
    MalformedResponse {
        evaluator: String,
        index: usize,
        mode: &'static str,
        #[source]
        source: serde_json::Error,
    },
    /// A subprinciple score fell outside of `0..=10`.
    #[error("subprinciple '{subprinciple}' of evaluator '{evaluator}' has out of range value {value}")]
    ValueOutOfRange {
        evaluator: String,
        subprinciple: String,
        value: f64,
    },
}

/// Platform a design test targets.  Anything the backend sends other than a
/// mobile marker, including `Tablet`, blank and null, is reported as web.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum TestType {
    #[default]
    Web,
    #[serde(rename = "Movil")]
    Mobile,
}

impl<'de> Deserialize<'de> for TestType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(TestType::from_label).unwrap_or_default())
    }
}

impl TestType {
    /// Parses a backend label, case-insensitively.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "movil" | "móvil" | "mobile" => TestType::Mobile,
            _ => TestType::Web,
        }
    }

    /// Label printed on the cover page.
    pub fn label(self) -> &'static str {
        match self {
            TestType::Web => "Web",
            TestType::Mobile => "Móvil",
        }
    }
}

/// Immutable snapshot of the design test being reported on.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DesignTest {
    #[serde(rename = "test_id", alias = "id", default)]
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(rename = "user_name", alias = "username", default)]
    pub owner_name: Option<String>,
    #[serde(default)]
    pub test_type: TestType,
    pub has_heuristics: bool,
    #[serde(default)]
    pub code: Option<String>,
}

/// Question metadata shared by both response shapes.
///
/// Equality and hashing are structural over every field, which is what the
/// compiler uses to collapse the same question answered by several evaluators.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "question_id")]
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url_frame: String,
}

/// A single scored subprinciple of a heuristic.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Subprinciple {
    #[serde(rename = "subprinciple_code", default)]
    pub code: Option<String>,
    #[serde(rename = "subprinciple_subtitle")]
    pub subtitle: String,
    #[serde(rename = "subprinciple_description", default)]
    pub description: Option<String>,
    pub response_value: f64,
}

/// Scores an evaluator gave to one heuristic of a question.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HeuristicScore {
    #[serde(rename = "heuristic_code")]
    pub code: String,
    #[serde(rename = "heuristic_title")]
    pub title: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub subprinciples: Vec<Subprinciple>,
}

impl HeuristicScore {
    /// Sum of every subprinciple value.
    pub fn total(&self) -> f64 {
        self.subprinciples.iter().map(|s| s.response_value).sum()
    }

    /// Returns the comment when it carries any non-whitespace text.
    pub fn comment_text(&self) -> Option<&str> {
        self.comment
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

/// Response shape used when the design test is scored with heuristics.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HeuristicResponse {
    #[serde(flatten)]
    pub question: Question,
    #[serde(default)]
    pub heuristics: Vec<HeuristicScore>,
}

/// Global dimensions a standard response can be scored on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResponseType {
    Calificacion,
    Coherencia,
    Legibilidad,
}

impl ResponseType {
    /// Every dimension, in the order the summary table lists them.
    pub const ALL: [ResponseType; 3] = [
        ResponseType::Calificacion,
        ResponseType::Coherencia,
        ResponseType::Legibilidad,
    ];

    /// Parses the backend's `response_type`, ignoring case and accents.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "calificacion" | "calificación" => Some(Self::Calificacion),
            "coherencia" => Some(Self::Coherencia),
            "legibilidad" => Some(Self::Legibilidad),
            _ => None,
        }
    }

    /// Maximum score a single response of this type can obtain.
    pub fn max_value(self) -> f64 {
        match self {
            Self::Calificacion | Self::Coherencia => 10.0,
            Self::Legibilidad => 5.0,
        }
    }

    /// Capitalised label used in tables and chart legends.
    pub fn label(self) -> &'static str {
        match self {
            Self::Calificacion => "Calificacion",
            Self::Coherencia => "Coherencia",
            Self::Legibilidad => "Legibilidad",
        }
    }
}

/// The evaluator's answer to a standard question.  Every field may be absent
/// when the evaluator skipped the question.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseDetail {
    #[serde(rename = "response_type", default)]
    pub kind: Option<String>,
    #[serde(rename = "response_value", default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl ResponseDetail {
    /// The parsed response type, if recognised.
    pub fn response_type(&self) -> Option<ResponseType> {
        self.kind.as_deref().and_then(ResponseType::parse)
    }
}

/// Response shape used when the design test has no heuristics.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StandardResponse {
    pub question: Question,
    #[serde(default)]
    pub response: ResponseDetail,
}

/// An evaluator together with their responses of a fixed shape.
#[derive(Clone, Debug, PartialEq)]
pub struct Evaluator<R> {
    pub username: String,
    pub email: String,
    pub responses: Vec<R>,
}

/// Evaluations resolved into exactly one response shape.
#[derive(Clone, Debug, PartialEq)]
pub enum Evaluations {
    Heuristic(Vec<Evaluator<HeuristicResponse>>),
    Standard(Vec<Evaluator<StandardResponse>>),
}

impl Evaluations {
    /// Number of evaluators regardless of mode.
    pub fn evaluator_count(&self) -> usize {
        match self {
            Evaluations::Heuristic(evaluators) => evaluators.len(),
            Evaluations::Standard(evaluators) => evaluators.len(),
        }
    }
}

/// Evaluator as delivered over the wire, before the response shape is known.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawEvaluator {
    #[serde(default)]
    pub evaluator_id: Option<u64>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub responses: Vec<serde_json::Value>,
}

/// Unvalidated report input.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ReportInput {
    #[serde(default)]
    pub design_test: Option<DesignTest>,
    #[serde(default)]
    pub evaluators: Option<Vec<RawEvaluator>>,
}

impl ReportInput {
    /// Parses the backend JSON envelope.
    pub fn from_json(json: &str) -> Result<Self, InputError> {
        serde_json::from_str(json).map_err(InputError::Parse)
    }
}

/// Validated survey data ready for compilation.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportData {
    pub design_test: DesignTest,
    pub evaluations: Evaluations,
}

impl ReportData {
    /// Parses and validates the backend JSON envelope in one step.
    pub fn from_json(json: &str) -> Result<Self, InputError> {
        Self::from_input(ReportInput::from_json(json)?)
    }

    /// Resolves the response shape from `has_heuristics` and validates every response.
    pub fn from_input(input: ReportInput) -> Result<Self, InputError> {
        let design_test = input.design_test.ok_or(InputError::MissingDesignTest)?;
        let evaluators = input.evaluators.ok_or(InputError::MissingEvaluators)?;

        let evaluations = if design_test.has_heuristics {
            let evaluators = evaluators
                .into_iter()
                .map(|raw| resolve_evaluator(raw, "heuristic"))
                .collect::<Result<Vec<Evaluator<HeuristicResponse>>, _>>()?;
            for evaluator in &evaluators {
                validate_heuristic_values(evaluator)?;
            }
            Evaluations::Heuristic(evaluators)
        } else {
            let evaluators = evaluators
                .into_iter()
                .map(|raw| resolve_evaluator(raw, "standard"))
                .collect::<Result<Vec<Evaluator<StandardResponse>>, _>>()?;
            Evaluations::Standard(evaluators)
        };

        Ok(Self {
            design_test,
            evaluations,
        })
    }
}

fn resolve_evaluator<R>(raw: RawEvaluator, mode: &'static str) -> Result<Evaluator<R>, InputError>
where
    R: serde::de::DeserializeOwned,
{
    let RawEvaluator {
        username,
        email,
        responses,
        ..
    } = raw;

    let mut resolved = Vec::with_capacity(responses.len());
    for (index, value) in responses.into_iter().enumerate() {
        let response = serde_json::from_value(value).map_err(|source| {
            InputError::MalformedResponse {
                evaluator: username.clone(),
                index,
                mode,
                source,
            }
        })?;
        resolved.push(response);
    }

    Ok(Evaluator {
        username,
        email,
        responses: resolved,
    })
}

fn validate_heuristic_values(evaluator: &Evaluator<HeuristicResponse>) -> Result<(), InputError> {
    let out_of_range = evaluator
        .responses
        .iter()
        .flat_map(|response| &response.heuristics)
        .flat_map(|heuristic| &heuristic.subprinciples)
        .find(|sub| {
            !sub.response_value.is_finite()
                || !(0.0..=MAX_SUBPRINCIPLE_VALUE).contains(&sub.response_value)
        });

    match out_of_range {
        Some(sub) => Err(InputError::ValueOutOfRange {
            evaluator: evaluator.username.clone(),
            subprinciple: sub.subtitle.clone(),
            value: sub.response_value,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEURISTIC_JSON: &str = r#"{
        "design_test": {
            "test_id": 4, "username": "ana", "name": "Checkout",
            "url": "https://embed.figma.com/proto/abc?node=1&embed-host=share",
            "description": "Flujo de pago", "test_type": "Movil",
            "has_heuristics": true, "created_at": "2024-03-05T10:00:00Z", "code": "XK12"
        },
        "evaluators": [{
            "evaluator_id": 9, "username": "luis", "email": "luis@example.com",
            "responses": [{
                "question_id": 1, "title": "Inicio", "description": "Pantalla inicial",
                "url_frame": "https://embed.figma.com/proto/abc?node=2",
                "heuristics": [{
                    "heuristic_code": "H1", "heuristic_title": "Visibilidad",
                    "comment": "Bien",
                    "subprinciples": [
                        {"subprinciple_code": "H1.1", "subprinciple_subtitle": "Estado", "response_value": 7},
                        {"subprinciple_code": "H1.2", "subprinciple_subtitle": "Feedback", "response_value": 9}
                    ]
                }]
            }]
        }]
    }"#;

    #[test]
    fn heuristic_input_resolves_to_heuristic_variant() {
        let data = ReportData::from_json(HEURISTIC_JSON).expect("valid input");
        assert_eq!(data.design_test.test_type, TestType::Mobile);
        assert_eq!(data.design_test.owner_name.as_deref(), Some("ana"));

        let Evaluations::Heuristic(evaluators) = &data.evaluations else {
            panic!("expected heuristic evaluations");
        };
        let heuristic = &evaluators[0].responses[0].heuristics[0];
        assert_eq!(evaluators[0].responses[0].question.id, 1);
        assert_eq!(heuristic.total(), 16.0);
        assert_eq!(heuristic.comment_text(), Some("Bien"));
    }

    #[test]
    fn standard_input_accepts_null_responses() {
        let json = r#"{
            "design_test": {"test_id": 2, "name": "Landing", "has_heuristics": false},
            "evaluators": [{
                "username": "eva", "email": "eva@example.com",
                "responses": [{
                    "question": {"question_id": 3, "title": "Hero", "description": "", "url_frame": ""},
                    "response": {"response_type": null, "response_value": null, "comment": null}
                }]
            }]
        }"#;
        let data = ReportData::from_json(json).expect("valid input");
        let Evaluations::Standard(evaluators) = &data.evaluations else {
            panic!("expected standard evaluations");
        };
        assert_eq!(evaluators[0].responses[0].response.response_type(), None);
        assert_eq!(data.design_test.test_type, TestType::Web);
    }

    #[test]
    fn missing_sections_are_reported() {
        let err = ReportData::from_json(r#"{"evaluators": []}"#).unwrap_err();
        assert!(matches!(err, InputError::MissingDesignTest));

        let err = ReportData::from_json(
            r#"{"design_test": {"name": "x", "has_heuristics": false}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, InputError::MissingEvaluators));
    }

    #[test]
    fn unknown_and_blank_test_types_fall_back_to_web() {
        for test_type in [r#""Tablet""#, r#""""#, "null", r#""móvil""#] {
            let json = format!(
                r#"{{"design_test": {{"name": "x", "has_heuristics": false, "test_type": {}}}, "evaluators": []}}"#,
                test_type
            );
            let data = ReportData::from_json(&json).expect("valid input");
            let expected = if test_type.contains("vil") {
                TestType::Mobile
            } else {
                TestType::Web
            };
            assert_eq!(data.design_test.test_type, expected, "test_type {}", test_type);
        }
    }

    #[test]
    fn standard_shape_is_rejected_in_heuristic_mode() {
        let json = r#"{
            "design_test": {"name": "x", "has_heuristics": true},
            "evaluators": [{"username": "eva", "email": "e",
                "responses": [{"question": {"question_id": 1, "title": "t"}, "response": {}}]}]
        }"#;
        let err = ReportData::from_json(json).unwrap_err();
        assert!(matches!(
            err,
            InputError::MalformedResponse { index: 0, mode: "heuristic", .. }
        ));
    }

    #[test]
    fn out_of_range_scores_are_rejected() {
        let json = HEURISTIC_JSON.replace("\"response_value\": 9", "\"response_value\": 11");
        let err = ReportData::from_json(&json).unwrap_err();
        assert!(matches!(err, InputError::ValueOutOfRange { value, .. } if value == 11.0));
    }

    #[test]
    fn response_type_parsing_ignores_case_and_accents() {
        assert_eq!(ResponseType::parse("Calificación"), Some(ResponseType::Calificacion));
        assert_eq!(ResponseType::parse(" LEGIBILIDAD "), Some(ResponseType::Legibilidad));
        assert_eq!(ResponseType::parse("otro"), None);
    }
}
