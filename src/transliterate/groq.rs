//! OpenAI-compatible chat completions client (Groq by default).

use crate::config::CompletionConfig;
use crate::transliterate::{Completer, CompletionRequest};
use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct GroqClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl GroqClient {
    pub fn new(http: reqwest::Client, cfg: &CompletionConfig) -> Self {
        Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
        }
    }
}

#[async_trait]
impl Completer for GroqClient {
    async fn complete(&self, req: &CompletionRequest<'_>) -> anyhow::Result<String> {
        let body = ChatRequest {
            model: req.model,
            temperature: req.temperature,
            max_tokens: req.max_tokens,
            messages: [
                ChatMessage {
                    role: "system",
                    content: req.system,
                },
                ChatMessage {
                    role: "user",
                    content: &req.user,
                },
            ],
        };

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("send completion request")?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorBody>(&text)
                .map(|b| b.error.message)
                .unwrap_or(text);
            anyhow::bail!("completion API error ({status}): {}", detail.trim());
        }

        let parsed: ChatResponse = resp.json().await.context("parse completion json")?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .context("completion returned no content")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        extract::State,
        http::{HeaderMap, StatusCode},
        routing::post,
    };
    use serde_json::{Value, json};
    use std::sync::{Arc, Mutex};

    type Bodies = Arc<Mutex<Vec<Value>>>;

    /// `chat/completions` stand-in; the requested model picks the reply.
    async fn completions(
        State(bodies): State<Bodies>,
        headers: HeaderMap,
        axum::Json(body): axum::Json<Value>,
    ) -> (StatusCode, axum::Json<Value>) {
        let authorized = headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            == Some("Bearer gsk-test");
        bodies.lock().unwrap().push(body.clone());

        if !authorized {
            return (
                StatusCode::UNAUTHORIZED,
                axum::Json(json!({ "error": { "message": "Invalid API Key", "type": "invalid_request_error" } })),
            );
        }
        match body["model"].as_str() {
            Some("empty") => (StatusCode::OK, axum::Json(json!({ "choices": [] }))),
            _ => (
                StatusCode::OK,
                axum::Json(json!({
                    "choices": [{ "index": 0, "message": { "role": "assistant", "content": "Oh-lah moon-doh" } }]
                })),
            ),
        }
    }

    async fn spawn(api_key: &str) -> (GroqClient, Bodies) {
        let bodies = Bodies::default();
        let app = Router::new()
            .route("/openai/v1/chat/completions", post(completions))
            .with_state(bodies.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let cfg = CompletionConfig {
            api_key: api_key.into(),
            base_url: format!("http://{addr}/openai/v1"),
            ..Default::default()
        };
        (GroqClient::new(reqwest::Client::new(), &cfg), bodies)
    }

    fn request(model: &str) -> CompletionRequest<'_> {
        CompletionRequest {
            model,
            system: "sys",
            user: "Transliterate these lyrics:\n\nHola mundo".into(),
            temperature: 0.2,
            max_tokens: 2048,
        }
    }

    #[tokio::test]
    async fn test_complete_posts_chat_request() {
        let (client, bodies) = spawn("gsk-test").await;
        let out = client.complete(&request("llama-3.3-70b-versatile")).await.unwrap();
        assert_eq!(out, "Oh-lah moon-doh");

        let sent = bodies.lock().unwrap()[0].clone();
        assert_eq!(sent["model"], "llama-3.3-70b-versatile");
        assert_eq!(sent["max_tokens"], 2048);
        assert_eq!(sent["messages"][0]["content"], "sys");
        assert_eq!(
            sent["messages"][1]["content"],
            "Transliterate these lyrics:\n\nHola mundo"
        );
    }

    #[tokio::test]
    async fn test_error_body_message_is_surfaced() {
        let (client, _) = spawn("wrong").await;
        let err = client.complete(&request("m")).await.unwrap_err().to_string();
        assert!(err.contains("401"), "{err}");
        assert!(err.ends_with("Invalid API Key"), "{err}");
    }

    #[tokio::test]
    async fn test_no_choices_is_an_error() {
        let (client, _) = spawn("gsk-test").await;
        let err = client.complete(&request("empty")).await.unwrap_err();
        assert!(err.to_string().contains("no content"), "{err}");
    }

    #[test]
    fn test_request_shape() {
        let body = ChatRequest {
            model: "llama-3.3-70b-versatile",
            temperature: 0.2,
            max_tokens: 2048,
            messages: [
                ChatMessage {
                    role: "system",
                    content: "sys",
                },
                ChatMessage {
                    role: "user",
                    content: "usr",
                },
            ],
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["model"], "llama-3.3-70b-versatile");
        assert_eq!(v["max_tokens"], 2048);
        assert_eq!(v["messages"][0]["role"], "system");
        assert_eq!(v["messages"][1]["content"], "usr");
    }

    #[test]
    fn test_response_decoding() {
        let raw = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"Oh-lah moon-doh"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("Oh-lah moon-doh")
        );

        let empty: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(empty.choices.is_empty());
    }
}
