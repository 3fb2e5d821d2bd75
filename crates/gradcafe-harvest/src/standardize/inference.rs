//! Inference capability: prompt in, free-form text out.

use crate::error::InferenceError;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::LazyLock;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Models tried in order when none is configured.
const PREFERRED_MODELS: &[&str] = &["llama3.2", "llama3.1", "llama3", "mistral", "qwen2.5"];

static JSON_OBJECT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\{.*?\}").unwrap());

const INSTRUCTIONS: &str = "You are a data cleaning assistant. Standardize degree program and \
university names.\n\n\
Rules:\n\
- Input provides a single string under key `program` that may contain BOTH program and university.\n\
- Split into (program name, university name).\n\
- Trim extra spaces and commas.\n\
- Expand obvious abbreviations (e.g., \"McG\" -> \"McGill University\", \"UBC\" -> \"University of British Columbia\").\n\
- Use Title Case for program; use official capitalization for university names (e.g., \"University of X\").\n\
- Ensure correct spelling (e.g., \"McGill\", not \"McGiill\").\n\
- If university cannot be inferred, return \"Unknown\".\n\n\
Return JSON ONLY with keys:\n  standardized_program, standardized_university\n";

const FEW_SHOTS: &[(&str, &str, &str)] = &[
    (
        "Information Studies, McGill University",
        "Information Studies",
        "McGill University",
    ),
    (
        "Information, McG",
        "Information Studies",
        "McGill University",
    ),
    (
        "Mathematics, University Of British Columbia",
        "Mathematics",
        "University of British Columbia",
    ),
];

/// Anything that turns a prompt into text.
#[async_trait]
pub trait Inference: Send + Sync {
    async fn infer(&self, prompt: &str) -> Result<String, InferenceError>;
}

/// Prompt asking for the program/university split of `text`.
pub fn build_prompt(text: &str) -> String {
    let mut prompt = String::from(INSTRUCTIONS);
    for (input, program, university) in FEW_SHOTS {
        prompt.push_str(&format!(
            "\nInput: {}\nOutput: {}\n",
            json!({ "program": input }),
            json!({
                "standardized_program": program,
                "standardized_university": university,
            })
        ));
    }
    prompt.push_str(&format!("\nInput: {}\nOutput:", json!({ "program": text })));
    prompt
}

/// Find the first brace-delimited object in `response` and pull out the two
/// standardized fields. Both must be present as strings.
pub fn scan_response(response: &str) -> Option<(String, String)> {
    let candidate = JSON_OBJECT_RE
        .find(response)
        .map(|m| m.as_str())
        .unwrap_or(response);
    let value: Value = serde_json::from_str(candidate).ok()?;
    let field = |key: &str| value.get(key)?.as_str().map(|s| s.trim().to_string());
    Some((
        field("standardized_program")?,
        field("standardized_university")?,
    ))
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: Value,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    models: Vec<TagModel>,
}

#[derive(Deserialize)]
struct TagModel {
    name: String,
}

/// Ollama-compatible local inference server.
///
/// The model is resolved lazily on the first call and then reused. A server
/// with none of the wanted models is remembered as such for the session.
pub struct OllamaInference {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
    requested_model: Option<String>,
    model: OnceCell<Option<String>>,
}

impl OllamaInference {
    pub fn new(
        base_url: &str,
        model: Option<String>,
        timeout: Duration,
    ) -> Result<Self, InferenceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| InferenceError::Connection(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout,
            requested_model: model,
            model: OnceCell::new(),
        })
    }

    fn map_send_error(&self, e: reqwest::Error) -> InferenceError {
        if e.is_connect() {
            InferenceError::Connection(self.base_url.clone())
        } else if e.is_timeout() {
            InferenceError::Timeout(self.timeout.as_secs())
        } else {
            InferenceError::Response(e.to_string())
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, InferenceError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(InferenceError::Server {
            status: status.as_u16(),
            body,
        })
    }

    /// Names of the models the server has installed.
    pub async fn list_models(&self) -> Result<Vec<String>, InferenceError> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let tags: TagsResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| InferenceError::Response(e.to_string()))?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    async fn find_model(&self) -> Result<String, InferenceError> {
        let available = self.list_models().await?;
        let wanted: Vec<&str> = match &self.requested_model {
            Some(model) => vec![model.as_str()],
            None => PREFERRED_MODELS.to_vec(),
        };
        for preferred in wanted {
            if let Some(found) = available.iter().find(|m| m.starts_with(preferred)) {
                info!("using inference model {found}");
                return Ok(found.clone());
            }
        }
        Err(InferenceError::NoModel(format!(
            "none of the wanted models installed at {} (have: {})",
            self.base_url,
            available.join(", ")
        )))
    }

    /// `None` when the server answered but has no usable model.
    async fn resolve_model(&self) -> Result<Option<String>, InferenceError> {
        match self.find_model().await {
            Ok(model) => Ok(Some(model)),
            Err(InferenceError::NoModel(reason)) => {
                warn!("{reason}; inference disabled for this session");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl Inference for OllamaInference {
    async fn infer(&self, prompt: &str) -> Result<String, InferenceError> {
        let Some(model) = self.model.get_or_try_init(|| self.resolve_model()).await? else {
            return Err(InferenceError::NoModel(format!(
                "no usable model at {}",
                self.base_url
            )));
        };

        let body = GenerateRequest {
            model,
            prompt,
            stream: false,
            options: json!({ "temperature": 0.0 }),
        };
        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let parsed: GenerateResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| InferenceError::Response(e.to_string()))?;
        debug!("inference returned {} bytes", parsed.response.len());
        Ok(parsed.response)
    }
}
