//! Client for OpenAI-compatible `/embeddings` and `/chat/completions` endpoints.

use std::fmt;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::{ChatModel, Embedder, ProviderError};
use crate::config::{OPENAI_CHAT_MODEL, OPENAI_EMBED_MODEL};
use crate::transcript::Message;

#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
    embed_model: String,
    chat_model: String,
    temperature: f32,
}

impl fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"<redacted>")
            .field("embed_model", &self.embed_model)
            .field("chat_model", &self.chat_model)
            .field("temperature", &self.temperature)
            .finish()
    }
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: Url::parse(base_url)?,
            api_key: api_key.into(),
            embed_model: OPENAI_EMBED_MODEL.to_string(),
            chat_model: OPENAI_CHAT_MODEL.to_string(),
            temperature: 0.7,
        })
    }

    pub fn with_embed_model(mut self, model: impl Into<String>) -> Self {
        self.embed_model = model.into();
        self
    }

    pub fn with_chat_model(mut self, model: impl Into<String>) -> Self {
        self.chat_model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// `base_url` joined with `path`, keeping any path prefix such as `/v1`.
    fn endpoint(&self, path: &str) -> Result<Url, ProviderError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    async fn post_json<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, ProviderError> {
        let response = self
            .http
            .post(self.endpoint(path)?)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }
        Ok(response.json().await?)
    }
}

/// Pulls `error.message` out of an OpenAI error body, else returns the body as-is.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

fn into_ordered_vectors(mut data: Vec<EmbeddingData>) -> Vec<Vec<f32>> {
    data.sort_by_key(|d| d.index);
    data.into_iter().map(|d| d.embedding).collect()
}

fn into_answer(response: ChatResponse) -> Result<String, ProviderError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|s| s.trim().to_string())
        .ok_or_else(|| ProviderError::InvalidResponse("no message in chat response".into()))
}

#[async_trait]
impl Embedder for OpenAiClient {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!(model = %self.embed_model, inputs = texts.len(), "requesting embeddings");
        let req = EmbeddingsRequest {
            model: &self.embed_model,
            input: texts,
        };
        let res: EmbeddingsResponse = self.post_json("embeddings", &req).await?;
        Ok(into_ordered_vectors(res.data))
    }

    fn embed_model(&self) -> &str {
        &self.embed_model
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, ProviderError> {
        debug!(model = %self.chat_model, messages = messages.len(), "sending chat completion");
        let req = ChatRequest {
            model: &self.chat_model,
            messages,
            temperature: self.temperature,
        };
        let res: ChatResponse = self.post_json("chat/completions", &req).await?;
        into_answer(res)
    }

    fn chat_model(&self) -> &str {
        &self.chat_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_keeps_version_prefix() {
        let c = OpenAiClient::new("https://api.openai.com/v1/", "k").unwrap();
        assert_eq!(
            c.endpoint("chat/completions").unwrap().as_str(),
            "https://api.openai.com/v1/chat/completions"
        );
        let c = OpenAiClient::new("http://localhost:8080/v1", "k").unwrap();
        assert_eq!(
            c.endpoint("embeddings").unwrap().as_str(),
            "http://localhost:8080/v1/embeddings"
        );
    }

    #[test]
    fn debug_output_hides_api_key() {
        let c = OpenAiClient::new("https://api.openai.com/v1", "sk-live-secret").unwrap();
        let shown = format!("{:?}", c);
        assert!(!shown.contains("sk-live-secret"));
        assert!(shown.contains("<redacted>"));
        assert!(shown.contains("api.openai.com"));
    }

    #[test]
    fn chat_request_serializes_roles_lowercase() {
        let messages = [Message::system("ctx"), Message::user("q")];
        let req = ChatRequest {
            model: "gpt-3.5-turbo",
            messages: &messages,
            temperature: 0.0,
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["messages"][0]["role"], "system");
        assert_eq!(v["messages"][1]["role"], "user");
        assert_eq!(v["messages"][1]["content"], "q");
    }

    #[test]
    fn embeddings_are_reordered_by_index() {
        let res: EmbeddingsResponse = serde_json::from_str(
            r#"{"object":"list","data":[
                {"object":"embedding","index":1,"embedding":[0.0,1.0]},
                {"object":"embedding","index":0,"embedding":[1.0,0.0]}
            ],"model":"text-embedding-3-large"}"#,
        )
        .unwrap();
        assert_eq!(into_ordered_vectors(res.data), vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn answer_is_first_choice_trimmed() {
        let res: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"index":0,"message":{"role":"assistant","content":" Paris.\n"}}]}"#,
        )
        .unwrap();
        assert_eq!(into_answer(res).unwrap(), "Paris.");
    }

    #[test]
    fn empty_choices_is_invalid() {
        let res: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(into_answer(res), Err(ProviderError::InvalidResponse(_))));
    }

    #[test]
    fn error_message_prefers_api_error_text() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
        assert_eq!(error_message(body), "Incorrect API key provided");
        assert_eq!(error_message("Bad Gateway\n"), "Bad Gateway");
    }
}
