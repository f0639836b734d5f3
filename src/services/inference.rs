// src/services/inference.rs

//! Cliente do serviço de inferência (Gemini `generateContent`).
//! Todo acesso à IA passa por `InferenceClient`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash-latest";

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Erro HTTP: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Erro da API (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("A IA respondeu sem conteúdo")]
    EmptyContent,

    #[error("Serviço de IA não configurado")]
    NotConfigured,
}

/// Um prompt entra, o texto gerado sai.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, InferenceError>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateResponse {
    // Junta as partes de texto do primeiro candidato
    fn text(self) -> Option<String> {
        let parts = self.candidates.into_iter().next()?.content?.parts;
        let text: String = parts.into_iter().filter_map(|p| p.text).collect();
        if text.is_empty() { None } else { Some(text) }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, base_url: String, timeout: Duration) -> Result<Self, InferenceError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl InferenceClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, InferenceError> {
        if self.api_key.is_empty() {
            return Err(InferenceError::NotConfigured);
        }

        let body = GenerateRequest {
            contents: vec![Content { parts: vec![Part { text: prompt }] }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorEnvelope>(&raw)
                .map(|e| e.error.message)
                .unwrap_or(raw);
            tracing::warn!("Serviço de IA respondeu {}: {}", status, message);
            return Err(InferenceError::Api { status: status.as_u16(), message });
        }

        let parsed: GenerateResponse = response.json().await?;
        let text = parsed.text().ok_or(InferenceError::EmptyContent)?;
        tracing::debug!("IA respondeu com {} caractere(s)", text.chars().count());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn client(base_url: String) -> GeminiClient {
        GeminiClient::new("chave-teste".into(), "modelo-x".into(), base_url, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn posts_prompt_and_reads_first_candidate() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1beta/models/modelo-x:generateContent")
            .match_header("x-goog-api-key", "chave-teste")
            .match_body(Matcher::PartialJson(json!({
                "contents": [{ "parts": [{ "text": "Olá" }] }]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "candidates": [{ "content": { "parts": [{ "text": "{\"nome\": " }, { "text": "\"Alpha\"}" }] } }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let text = client(server.url()).generate("Olá").await.unwrap();
        assert_eq!(text, "{\"nome\": \"Alpha\"}");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn api_errors_carry_status_and_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1beta/models/modelo-x:generateContent")
            .with_status(403)
            .with_body(json!({ "error": { "message": "API key inválida" } }).to_string())
            .create_async()
            .await;

        let err = client(server.url()).generate("Olá").await.unwrap_err();
        match err {
            InferenceError::Api { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "API key inválida");
            }
            other => panic!("erro inesperado: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_candidates_are_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1beta/models/modelo-x:generateContent")
            .with_status(200)
            .with_body(json!({ "candidates": [] }).to_string())
            .create_async()
            .await;

        let err = client(server.url()).generate("Olá").await.unwrap_err();
        assert!(matches!(err, InferenceError::EmptyContent));
    }

    #[tokio::test]
    async fn missing_api_key_never_calls_out() {
        let gemini = GeminiClient::new(String::new(), DEFAULT_MODEL.into(), DEFAULT_BASE_URL.into(), Duration::from_secs(1)).unwrap();
        assert!(matches!(gemini.generate("x").await, Err(InferenceError::NotConfigured)));
    }
}
