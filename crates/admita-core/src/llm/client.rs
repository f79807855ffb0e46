//! HTTP client for external inference services (vLLM, OpenAI, etc.)

use super::{ChatMessage, ChatModel, Embedder};
use crate::config::LLMServiceConfig;
use crate::error::{AdmitaError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// OpenAI-compatible client implementing both backend capabilities
pub struct HttpClient {
    http_client: reqwest::Client,
    config: LLMServiceConfig,
    embedding_dimensions: usize,
}

impl HttpClient {
    /// Create new client from configuration
    pub fn new(config: LLMServiceConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(AdmitaError::Http)?;

        let embedding_dimensions = config.embedding_dimensions.unwrap_or(384);

        Ok(Self {
            http_client,
            config,
            embedding_dimensions,
        })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(LLMServiceConfig::default())
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(ref api_key) = self.config.api_key {
            req.header("Authorization", format!("Bearer {}", api_key))
        } else {
            req
        }
    }
}

#[async_trait]
impl ChatModel for HttpClient {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String> {
        #[derive(Serialize)]
        struct ChatRequest {
            model: String,
            messages: Vec<ChatMessage>,
            temperature: f32,
            max_tokens: u32,
        }

        #[derive(Deserialize)]
        struct ChatResponse {
            choices: Vec<ChatChoice>,
        }

        #[derive(Deserialize)]
        struct ChatChoice {
            message: ChatMessage,
        }

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages,
            temperature: 0.3,
            max_tokens: 1024,
        };

        let url = format!("{}/v1/chat/completions", self.config.url);
        let req = self.authorize(self.http_client.post(&url).json(&request));

        let response = req.send().await.map_err(AdmitaError::Http)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AdmitaError::ExternalError(format!(
                "LLM service error (HTTP {}): {}",
                status, body
            )));
        }

        let chat_response: ChatResponse = response.json().await.map_err(AdmitaError::Http)?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AdmitaError::Generation("No response from LLM".to_string()))
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl Embedder for HttpClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text.to_string()]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| AdmitaError::Generation("No embedding returned".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        #[derive(Serialize)]
        struct EmbedRequest {
            model: String,
            input: Vec<String>,
        }

        #[derive(Deserialize)]
        struct EmbedResponse {
            data: Vec<EmbedData>,
        }

        #[derive(Deserialize)]
        struct EmbedData {
            embedding: Vec<f32>,
        }

        let request = EmbedRequest {
            model: self.config.embedding_model.clone(),
            input: texts.to_vec(),
        };

        let url = format!("{}/v1/embeddings", self.config.embeddings_url());
        let req = self.authorize(self.http_client.post(&url).json(&request));

        let response = req.send().await.map_err(AdmitaError::Http)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AdmitaError::ExternalError(format!(
                "Embedding service error (HTTP {}): {}",
                status, body
            )));
        }

        let embed_response: EmbedResponse = response.json().await.map_err(AdmitaError::Http)?;

        if embed_response.data.len() != texts.len() {
            return Err(AdmitaError::ExternalError(format!(
                "Embedding service returned {} vectors for {} inputs",
                embed_response.data.len(),
                texts.len()
            )));
        }

        Ok(embed_response.data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.embedding_dimensions
    }

    fn model_name(&self) -> &str {
        &self.config.embedding_model
    }
}
