//! Client for the content curator, the service that turns a PDF into quiz questions.

use std::time::Duration;

use anyhow::anyhow;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::Value;
use tracing::{Instrument, info, instrument, warn};

use classhero_config::CuratorConfig;
use classhero_core::AppError;

use crate::external_http_span;

const GENERATE_QUIZ_PATH: &str = "/generate-quiz";

/// Quiz produced from a PDF.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedQuiz {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub questions: Vec<GeneratedQuestion>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedQuestion {
    #[serde(rename = "type", default = "default_question_type")]
    pub question_type: String,
    #[serde(default)]
    pub level: Option<String>,
    pub question: String,
    #[serde(default = "empty_array")]
    pub options: Value,
    #[serde(default = "empty_array")]
    pub correct_answers: Value,
    #[serde(default)]
    pub guidance_on_error: Option<String>,
    #[serde(default)]
    pub guidance_on_success: Option<String>,
    #[serde(default)]
    pub times_used: Option<i32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub extra: Option<Value>,
}

impl GeneratedQuestion {
    /// Review status, `draft` unless the curator sent one.
    pub fn status(&self) -> &str {
        self.status.as_deref().unwrap_or("draft")
    }

    pub fn times_used(&self) -> i32 {
        self.times_used.unwrap_or(0)
    }
}

fn default_question_type() -> String {
    "multiple_choice".to_string()
}

fn empty_array() -> Value {
    Value::Array(Vec::new())
}

#[derive(Clone, Debug)]
pub struct CuratorClient {
    client: reqwest::Client,
    base_url: String,
}

impl CuratorClient {
    pub fn new(config: &CuratorConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    /// Uploads a PDF and returns the generated quiz.
    ///
    /// Transport failures, non-success statuses and unreadable bodies all map
    /// to 502 Bad Gateway.
    #[instrument(skip(self, content), fields(size = content.len()))]
    pub async fn generate_quiz(
        &self,
        filename: &str,
        content: Vec<u8>,
    ) -> Result<GeneratedQuiz, AppError> {
        let url = format!("{}{}", self.base_url, GENERATE_QUIZ_PATH);
        let span = external_http_span!("curator", "POST", url.as_str());

        async move {
            let part = Part::bytes(content)
                .file_name(filename.to_string())
                .mime_str("application/pdf")
                .map_err(|e| AppError::internal_error(format!("Invalid upload part: {}", e)))?;
            let form = Form::new().part("file", part);

            let response = self
                .client
                .post(&url)
                .multipart(form)
                .send()
                .await
                .map_err(|e| {
                    crate::utils::tracing::record_error(&e);
                    warn!(error = %e, "Quiz generation request failed");
                    AppError::bad_gateway(anyhow!("Quiz generation service is unavailable"))
                })?;

            let status = response.status();
            tracing::Span::current().record("http.status_code", status.as_u16());

            if !status.is_success() {
                warn!(status = %status.as_u16(), "Quiz generation service returned an error");
                return Err(AppError::bad_gateway(anyhow!(
                    "Quiz generation failed with status {}",
                    status.as_u16()
                )));
            }

            let quiz = response.json::<GeneratedQuiz>().await.map_err(|e| {
                crate::utils::tracing::record_error(&e);
                AppError::bad_gateway(anyhow!(
                    "Quiz generation service returned an invalid response"
                ))
            })?;

            info!(questions = quiz.questions.len(), "Quiz generated");

            Ok(quiz)
        }
        .instrument(span)
        .await
    }
}
