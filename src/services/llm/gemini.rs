//! Google Gemini provider
//!
//! Calls `POST /v1beta/models/{model}:generateContent` with a single user
//! turn. Forced JSON maps to `responseMimeType: application/json`.

use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    services::llm::{GenerationOptions, LanguageModel},
};

const JSON_MIME_TYPE: &str = "application/json";

#[derive(Clone)]
pub struct GeminiClient {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String, api_url: String, model: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            model,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_url.trim_end_matches('/'),
            self.model
        )
    }

    fn build_request<'a>(prompt: &'a str, options: GenerationOptions) -> GenerateRequest<'a> {
        GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: options.temperature,
                response_mime_type: options.force_json.then_some(JSON_MIME_TYPE),
            },
        }
    }

    /// Joins the text parts of the first candidate
    fn extract_text(response: GenerateResponse) -> AppResult<String> {
        let candidate = response.candidates.into_iter().next().ok_or_else(|| {
            AppError::LanguageModel("Gemini returned no candidates".to_string())
        })?;

        let text: String = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AppError::LanguageModel(format!(
                "Gemini returned an empty candidate (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        Ok(text)
    }
}

#[async_trait::async_trait]
impl LanguageModel for GeminiClient {
    async fn generate_structured(
        &self,
        prompt: &str,
        options: GenerationOptions,
    ) -> AppResult<String> {
        let request = Self::build_request(prompt, options);

        tracing::debug!(
            model = %self.model,
            prompt_chars = prompt.len(),
            temperature = options.temperature,
            "Calling Gemini"
        );

        let response = self
            .http_client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::LanguageModel(format!(
                "Gemini API returned status {}: {}",
                status, body
            )));
        }

        let response_text = response.text().await?;
        let parsed: GenerateResponse = serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                response = %response_text,
                "Failed to deserialize Gemini response"
            );
            AppError::LanguageModel(format!("Failed to parse Gemini response: {}", e))
        })?;

        let text = Self::extract_text(parsed)?;

        tracing::info!(
            model = %self.model,
            response_chars = text.len(),
            provider = "gemini",
            "Generation completed"
        );

        Ok(text)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_client() -> GeminiClient {
        GeminiClient::new(
            "test_key".to_string(),
            "http://test.local/".to_string(),
            "gemini-3-flash-preview".to_string(),
        )
    }

    #[test]
    fn test_endpoint() {
        let client = create_test_client();
        assert_eq!(
            client.endpoint(),
            "http://test.local/v1beta/models/gemini-3-flash-preview:generateContent"
        );
    }

    #[test]
    fn test_request_serialization_forces_json() {
        let request =
            GeminiClient::build_request("Find niches", GenerationOptions::deterministic_json());
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["contents"][0]["parts"][0]["text"], "Find niches");
        assert_eq!(value["generationConfig"]["temperature"], 0.0);
        assert_eq!(
            value["generationConfig"]["responseMimeType"],
            "application/json"
        );
    }

    #[test]
    fn test_request_serialization_free_text() {
        let options = GenerationOptions {
            temperature: 0.0,
            force_json: false,
        };
        let value = serde_json::to_value(GeminiClient::build_request("hi", options)).unwrap();
        assert!(value["generationConfig"].get("responseMimeType").is_none());
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let json = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "{\"a\":"}, {"text": "1}"}]},
                "finishReason": "STOP"
            }]
        }"#;

        let response: GenerateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(GeminiClient::extract_text(response).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn test_extract_text_no_candidates() {
        let response: GenerateResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(matches!(
            GeminiClient::extract_text(response),
            Err(AppError::LanguageModel(_))
        ));
    }

    #[test]
    fn test_extract_text_blocked_candidate() {
        let json = r#"{"candidates": [{"finishReason": "SAFETY"}]}"#;
        let response: GenerateResponse = serde_json::from_str(json).unwrap();

        let err = GeminiClient::extract_text(response).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }
}
