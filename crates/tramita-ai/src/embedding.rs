//! Gemini embedding provider (text-embedding-004, 768 dimensions).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, info};

use tramita_core::{Error, Result};
use tramita_domain::EmbeddingProvider;

/// Embeddings via the Gemini `embedContent` endpoint.
pub struct GeminiEmbeddings {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiEmbeddings {
    pub fn new(client: Client, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let model = model.into();
        info!("GeminiEmbeddings initialized with model: {}", model);
        Self {
            client,
            api_key: api_key.into(),
            model,
        }
    }

    /// One `embedContent` call. `task_type` steers the model between query
    /// and document embeddings.
    async fn embed(&self, text: &str, task_type: &str) -> Result<Vec<f32>> {
        let url = format!(
            "{}/models/{}:embedContent?key={}",
            crate::API_BASE,
            self.model,
            self.api_key
        );
        let body = json!({
            "model": format!("models/{}", self.model),
            "content": { "parts": [{ "text": text }] },
            "taskType": task_type,
        });

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::EmbeddingGeneration(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::EmbeddingGeneration(format!(
                "API error {status}: {body}"
            )));
        }

        let parsed: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::EmbeddingGeneration(format!("invalid response body: {e}")))?;

        parse_embedding(&parsed)
    }
}

/// Extract the embedding vector from an `embedContent` response.
fn parse_embedding(response: &serde_json::Value) -> Result<Vec<f32>> {
    let values = response["embedding"]["values"]
        .as_array()
        .ok_or_else(|| Error::EmbeddingGeneration("response has no embedding values".into()))?;
    values
        .iter()
        .map(|v| {
            v.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| Error::EmbeddingGeneration("non-numeric embedding value".into()))
        })
        .collect()
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbeddings {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(text, "RETRIEVAL_QUERY").await
    }

    async fn embed_document(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(text, "RETRIEVAL_DOCUMENT").await
    }

    async fn embed_batch(&self, texts: &[String], delay: Duration) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for (i, text) in texts.iter().enumerate() {
            embeddings.push(self.embed_document(text).await?);

            if (i + 1) % 10 == 0 {
                debug!("Generated embeddings: {}/{}", i + 1, texts.len());
            }
            // pace sequential calls to stay under provider rate limits
            if i < texts.len() - 1 {
                tokio::time::sleep(delay).await;
            }
        }
        debug!("Successfully generated {} embeddings", embeddings.len());
        Ok(embeddings)
    }
}
