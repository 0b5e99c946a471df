//! Thin adapter over the hosted text-completion service. One prompt in,
//! raw text out, single attempt; everything that can go wrong maps to
//! [`Error::Completion`].

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::Error;

/// Seam between the request pipeline and the completion service. Tests
/// substitute a canned implementation; production uses [`GeminiClient`].
pub trait CompletionBackend {
    fn complete(&self, prompt: &str) -> Result<String, Error>;
}

/// Blocking client for the Google Generative Language `generateContent`
/// endpoint.
pub struct GeminiClient {
    http: reqwest::blocking::Client,
    config: LlmConfig,
}

impl GeminiClient {
    /// Fails with [`Error::Config`] when no API key is configured; the key
    /// comes from the environment or the config file, never from source.
    pub fn new(config: LlmConfig) -> Result<Self, Error> {
        if config.api_key.is_empty() {
            return Err(Error::Config(
                "no API key configured; set GEMINI_API_KEY".to_string(),
            ));
        }
        Ok(Self {
            http: reqwest::blocking::Client::new(),
            config,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl CompletionBackend for GeminiClient {
    fn complete(&self, prompt: &str) -> Result<String, Error> {
        debug!("sending {} byte prompt to {}", prompt.len(), self.config.model);

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .http
            .post(self.endpoint())
            .query(&[("key", self.config.api_key.as_str())])
            .json(&request)
            .send()
            .map_err(|e| {
                warn!("completion transport failure: {e}");
                Error::Completion(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            warn!("completion service returned {status}");
            return Err(Error::Completion(format!(
                "service returned {status}: {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| Error::Completion(format!("malformed response body: {e}")))?;

        let text: String = parsed
            .candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(Error::Completion("model returned no text".to_string()));
        }
        Ok(text)
    }
}
