use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use serde_json::{json, Value};

use super::provider::{ChatPrompt, GenerationProvider};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Google Gemini API client.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: Option<String>,
}

impl GeminiClient {
    pub fn new(api_key: &str) -> Self {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            api_key: api_key.to_string(),
            model: DEFAULT_MODEL.to_string(),
            base_url: None,
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = Some(url.to_string());
        self
    }

    /// Redact the API key from an error body before it reaches logs.
    fn redact_key(&self, body: &str) -> String {
        if self.api_key.len() > 4 {
            body.replace(&self.api_key, &format!("{}...", &self.api_key[..4]))
        } else {
            body.to_string()
        }
    }

    /// NOTE: the Gemini API requires the key as a query parameter.
    /// Do not log URLs built here.
    fn api_url(&self) -> String {
        let base = self.base_url.as_deref().unwrap_or(GEMINI_BASE_URL);
        format!(
            "{}/models/{}:generateContent?key={}",
            base, self.model, self.api_key
        )
    }

    fn build_request_body(&self, prompt: &ChatPrompt) -> Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [{"text": prompt.message}],
            }],
            "systemInstruction": {
                "parts": [{"text": prompt.system_text()}],
            },
            "generationConfig": {
                "temperature": 0.7,
                "maxOutputTokens": 4096,
            },
        })
    }

    fn extract_text(response: &Value) -> String {
        response["candidates"][0]["content"]["parts"]
            .as_array()
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p["text"].as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl GenerationProvider for GeminiClient {
    async fn generate(&self, prompt: &ChatPrompt) -> Result<String> {
        let body = self.build_request_body(prompt);

        let response = self
            .client
            .post(self.api_url())
            .json(&body)
            .send()
            .await
            .context("Gemini request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "Gemini API error ({}): {}",
                status,
                self.redact_key(&body)
            ));
        }

        let parsed: Value = response
            .json()
            .await
            .context("Gemini response is not valid JSON")?;
        Ok(Self::extract_text(&parsed))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
