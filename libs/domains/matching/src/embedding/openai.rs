use async_trait::async_trait;
use core_config::{ConfigError, env_optional, env_or_default, env_parse};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::EmbeddingProvider;
use crate::error::{MatchError, MatchResult};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "text-embedding-3-small";

#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub dimension: usize,
}

impl OpenAIConfig {
    pub fn new(api_key: String, dimension: usize) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            dimension,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// `None` when `OPENAI_API_KEY` is unset; embedding is then disabled.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(api_key) = env_optional("OPENAI_API_KEY") else {
            return Ok(None);
        };

        Ok(Some(Self {
            api_key,
            base_url: env_or_default("OPENAI_BASE_URL", DEFAULT_BASE_URL),
            model: env_or_default("OPENAI_EMBEDDING_MODEL", DEFAULT_MODEL),
            dimension: env_parse("MATCH_EMBEDDING_DIMENSION", 1536usize)?,
        }))
    }
}

/// Embeddings over the OpenAI-compatible `/embeddings` endpoint.
pub struct OpenAIEmbeddingProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIEmbeddingProvider {
    pub fn new(config: OpenAIConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
    dimensions: usize,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    fn dimension(&self) -> usize {
        self.config.dimension
    }

    async fn embed(&self, text: &str) -> MatchResult<Vec<f32>> {
        let request = EmbeddingRequest {
            model: &self.config.model,
            input: [text],
            dimensions: self.config.dimension,
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.config.base_url.trim_end_matches('/')))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(MatchError::EmbeddingUnavailable(format!(
                "OpenAI API error ({status}): {error_text}"
            )));
        }

        let body: EmbeddingResponse = response.json().await?;
        body.data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| MatchError::EmbeddingUnavailable("No embedding returned".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env_without_key_disables_embedding() {
        temp_env::with_var_unset("OPENAI_API_KEY", || {
            assert!(OpenAIConfig::from_env().unwrap().is_none());
        });
    }

    #[test]
    fn test_from_env_with_overrides() {
        temp_env::with_vars(
            [
                ("OPENAI_API_KEY", Some("sk-test")),
                ("OPENAI_BASE_URL", Some("http://localhost:8089/v1")),
                ("OPENAI_EMBEDDING_MODEL", None),
                ("MATCH_EMBEDDING_DIMENSION", Some("256")),
            ],
            || {
                let config = OpenAIConfig::from_env().unwrap().unwrap();
                assert_eq!(config.base_url, "http://localhost:8089/v1");
                assert_eq!(config.model, DEFAULT_MODEL);
                assert_eq!(config.dimension, 256);
            },
        );
    }

    #[test]
    fn test_request_shape() {
        let request = EmbeddingRequest {
            model: "text-embedding-3-small",
            input: ["hello"],
            dimensions: 8,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["input"][0], "hello");
        assert_eq!(json["dimensions"], 8);
    }
}
