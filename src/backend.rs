//! Blocking HTTP client for the survey backend's best-effort endpoints.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Serialize;
use thiserror::Error;

use crate::screenshot::{CaptureError, ScreenshotService};

/// Errors produced by the question-count lookup.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The request could not be sent or its body not decoded.
    #[error("question lookup request failed")]
    Http(#[from] reqwest::Error),
    /// The backend answered with a non-success status.
    #[error("question lookup answered with status {0}")]
    Status(u16),
    /// No backend is configured.
    #[error("question lookup is disabled")]
    Disabled,
}

/// Looks up how many questions (screens) a design test has.
pub trait QuestionCounter {
    /// Number of design questions registered for `test_id`.
    fn question_count(&self, test_id: u64) -> Result<usize, LookupError>;
}

/// A counter that never answers, used for offline exports.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoQuestionCount;

impl QuestionCounter for NoQuestionCount {
    fn question_count(&self, _test_id: u64) -> Result<usize, LookupError> {
        Err(LookupError::Disabled)
    }
}

#[derive(Serialize)]
struct CaptureRequest<'a> {
    url: &'a str,
}

/// Client for the survey backend REST API.
#[derive(Clone, Debug)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    /// Creates a client for the backend at `base_url` (for example
    /// `http://127.0.0.1:8000`) whose requests give up after `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn questions_url(&self, test_id: u64) -> String {
        format!("{}/api/designtest/{}/designquestions/", self.base_url, test_id)
    }

    fn capture_url(&self) -> String {
        format!("{}/api/capture/", self.base_url)
    }
}

impl QuestionCounter for BackendClient {
    fn question_count(&self, test_id: u64) -> Result<usize, LookupError> {
        let response = self.client.get(self.questions_url(test_id)).send()?;
        if !response.status().is_success() {
            return Err(LookupError::Status(response.status().as_u16()));
        }
        let questions: Vec<serde_json::Value> = response.json()?;
        Ok(questions.len())
    }
}

impl ScreenshotService for BackendClient {
    fn capture(&self, url: &str) -> Result<Vec<u8>, CaptureError> {
        let response = self
            .client
            .post(self.capture_url())
            .json(&CaptureRequest { url })
            .send()?;
        if !response.status().is_success() {
            return Err(CaptureError::Status(response.status().as_u16()));
        }
        Ok(response.bytes()?.to_vec())
    }
}
