use std::sync::Mutex;
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use crate::tutor::{TextGenerator, TutorError};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const GENERATE_METHOD: &str = "generateContent";
const MAX_ERROR_CHARS: usize = 300;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelList {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelInfo {
    name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Gemini REST client. When no model is configured the first model that
/// supports content generation is discovered once and reused.
pub struct GeminiClient {
    client: reqwest::blocking::Client,
    api_key: String,
    model: Mutex<Option<String>>,
}

impl GeminiClient {
    pub fn new(api_key: String, model: Option<String>) -> Result<Self, TutorError> {
        if api_key.trim().is_empty() {
            return Err(TutorError::MissingApiKey);
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            client,
            api_key,
            model: Mutex::new(model.map(|m| model_path(&m))),
        })
    }

    fn model(&self) -> Result<String, TutorError> {
        let mut cached = self.model.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(model) = cached.as_ref() {
            return Ok(model.clone());
        }
        let model = self.discover_model()?;
        log::info!("using model {}", model);
        *cached = Some(model.clone());
        Ok(model)
    }

    fn discover_model(&self) -> Result<String, TutorError> {
        let response = self
            .client
            .get(format!("{API_BASE}/models"))
            .header("x-goog-api-key", &self.api_key)
            .send()?;
        let list: ModelList = check_status(response)?.json()?;
        pick_model(&list).ok_or(TutorError::NoModel)
    }
}

impl TextGenerator for GeminiClient {
    fn generate(&self, instruction: &str, prompt: &str) -> Result<String, TutorError> {
        let model = self.model()?;
        let body = json!({
            "system_instruction": {
                "parts": [{ "text": instruction }]
            },
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }]
        });

        let response = self
            .client
            .post(format!("{API_BASE}/{model}:{GENERATE_METHOD}"))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()?;
        let parsed: GenerateResponse = check_status(response)?.json()?;
        extract_text(parsed)
    }
}

/// Accepts both "gemini-x" and "models/gemini-x".
fn model_path(name: &str) -> String {
    if name.starts_with("models/") {
        name.to_string()
    } else {
        format!("models/{name}")
    }
}

fn pick_model(list: &ModelList) -> Option<String> {
    list.models
        .iter()
        .find(|m| {
            m.supported_generation_methods
                .iter()
                .any(|method| method == GENERATE_METHOD)
        })
        .map(|m| m.name.clone())
}

fn check_status(
    response: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response, TutorError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(TutorError::Api {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

fn error_message(body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        return envelope.error.message;
    }
    body.chars().take(MAX_ERROR_CHARS).collect()
}

fn extract_text(response: GenerateResponse) -> Result<String, TutorError> {
    if let Some(reason) = response
        .prompt_feedback
        .and_then(|feedback| feedback.block_reason)
    {
        return Err(TutorError::Blocked(reason));
    }

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(TutorError::EmptyResponse);
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_model_path() {
        assert_eq!(model_path("gemini-1.5-flash"), "models/gemini-1.5-flash");
        assert_eq!(model_path("models/gemini-pro"), "models/gemini-pro");
    }

    #[test]
    fn test_pick_first_generating_model() {
        let list: ModelList = serde_json::from_str(
            r#"{"models": [
                {"name": "models/embedding-001", "supportedGenerationMethods": ["embedContent"]},
                {"name": "models/gemini-1.5-flash", "supportedGenerationMethods": ["generateContent", "countTokens"]},
                {"name": "models/gemini-1.5-pro", "supportedGenerationMethods": ["generateContent"]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(pick_model(&list).as_deref(), Some("models/gemini-1.5-flash"));
    }

    #[test]
    fn test_pick_model_none() {
        let list: ModelList = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(pick_model(&list), None);
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"parts": [{"text": "Debit "}, {"text": "the receiver."}], "role": "model"}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(response).unwrap(), "Debit the receiver.");
    }

    #[test]
    fn test_extract_text_blocked() {
        let response: GenerateResponse =
            serde_json::from_str(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#).unwrap();
        assert_matches!(extract_text(response), Err(TutorError::Blocked(reason)) if reason == "SAFETY");
    }

    #[test]
    fn test_extract_text_empty() {
        let response: GenerateResponse =
            serde_json::from_str(r#"{"candidates": [{"finishReason": "MAX_TOKENS"}]}"#).unwrap();
        assert_matches!(extract_text(response), Err(TutorError::EmptyResponse));
    }

    #[test]
    fn test_error_message() {
        assert_eq!(
            error_message(r#"{"error": {"code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT"}}"#),
            "API key not valid."
        );
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn test_blank_api_key_rejected() {
        assert!(matches!(
            GeminiClient::new("  ".to_string(), None),
            Err(TutorError::MissingApiKey)
        ));
    }
}
