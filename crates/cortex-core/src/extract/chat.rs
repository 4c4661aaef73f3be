//! OpenAI-compatible chat completions client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::generator::TextGenerator;
use crate::config::SwarmConfig;
use crate::error::{Error, Result};
use crate::text::truncate;

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: String,
}

/// Text generator backed by `POST {url}/v1/chat/completions`.
#[derive(Clone)]
pub struct ChatCompletionsGenerator {
    base_url: String,
    model: String,
    api_key: Option<String>,
    timeout: Duration,
    client: reqwest::Client,
}

impl ChatCompletionsGenerator {
    /// Build from config, reading the API key from the configured env var.
    pub fn new(config: &SwarmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty());

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            timeout: Duration::from_secs(config.timeout_secs),
            client,
        })
    }

    /// One user message; the prompt carries the instructions.
    fn request<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.0,
            stream: false,
        }
    }
}

#[async_trait]
impl TextGenerator for ChatCompletionsGenerator {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = self.request(prompt);

        debug!(model = %self.model, "POST /v1/chat/completions");
        let mut request = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .timeout(self.timeout)
            .json(&body);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let resp = request.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::timeout(self.timeout.as_millis() as u64)
            } else {
                Error::Generator(e.to_string())
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(Error::Generator(format!(
                "status {}: {}",
                status.as_u16(),
                truncate(text.trim(), 200)
            )));
        }

        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| Error::Generator(format!("invalid response: {}", e)))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::Generator("response had no choices".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::generator::{extraction_prompt, EXTRACTION_INSTRUCTIONS};

    #[test]
    fn test_new_trims_url_and_reads_key() {
        let config = SwarmConfig {
            url: "http://127.0.0.1:11434/".into(),
            api_key_env: "CORTEX_TEST_UNSET_KEY_VAR".into(),
            ..Default::default()
        };
        let generator = ChatCompletionsGenerator::new(&config).unwrap();
        assert_eq!(generator.base_url, "http://127.0.0.1:11434");
        assert!(generator.api_key.is_none());
        assert_eq!(generator.name(), "llama3.1");
    }

    #[tokio::test]
    async fn test_unreachable_service_errors() {
        let config = SwarmConfig {
            url: "http://127.0.0.1:1".into(),
            timeout_secs: 2,
            ..Default::default()
        };
        let generator = ChatCompletionsGenerator::new(&config).unwrap();
        assert!(generator.generate("hello").await.is_err());
    }

    #[test]
    fn test_instructions_sent_once() {
        let generator = ChatCompletionsGenerator::new(&SwarmConfig::default()).unwrap();
        let prompt = extraction_prompt("Name: Alice Smith", "USER.md", None);
        let body = serde_json::to_string(&generator.request(&prompt)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["messages"].as_array().unwrap().len(), 1);
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], prompt.as_str());
        assert_eq!(prompt.matches(EXTRACTION_INSTRUCTIONS).count(), 1);
    }

    #[test]
    fn test_response_shape() {
        let parsed: ChatResponse = serde_json::from_str(
            r#"{"choices": [{"index": 0, "message": {"role": "assistant", "content": "[]"}}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.choices[0].message.content, "[]");
    }
}
