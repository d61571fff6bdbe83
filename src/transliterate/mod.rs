//! Phonetic transliteration of lyrics through a chat-completion model.

pub mod chunk;
pub mod groq;

use crate::config::CompletionConfig;
use anyhow::Context;
use async_trait::async_trait;
use std::sync::Arc;

pub use chunk::chunk_lyrics;
pub use groq::GroqClient;

pub const SYSTEM_PROMPT: &str = "You are a transliteration expert. Convert song lyrics into English \
phonetics so an English speaker can read and pronounce them. \
Rules: 1) Transliterate non-English words phonetically. Do NOT translate. \
2) Leave English words as-is. \
3) Preserve line breaks, section headers like [Verse 1], and structure exactly. \
4) Output ONLY the transliterated lyrics, nothing else.";

#[derive(Debug, Clone)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub system: &'a str,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[async_trait]
pub trait Completer: Send + Sync {
    async fn complete(&self, req: &CompletionRequest<'_>) -> anyhow::Result<String>;
}

#[derive(Clone)]
pub struct Transliterator {
    completer: Arc<dyn Completer>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    chunk_lines: usize,
}

impl Transliterator {
    pub fn new(completer: Arc<dyn Completer>, cfg: &CompletionConfig) -> Self {
        Self {
            completer,
            model: cfg.model.clone(),
            temperature: cfg.temperature,
            max_tokens: cfg.max_tokens,
            chunk_lines: cfg.chunk_lines,
        }
    }

    pub fn completer(&self) -> &Arc<dyn Completer> {
        &self.completer
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Chunks go out one at a time and are joined with a blank line in input
    /// order. Any failed chunk fails the whole call.
    pub async fn transliterate(&self, lyrics: &str) -> anyhow::Result<String> {
        let chunks = chunk_lyrics(lyrics, self.chunk_lines);
        let total = chunks.len();
        let mut results = Vec::with_capacity(total);

        for (i, chunk) in chunks.iter().enumerate() {
            let started = std::time::Instant::now();
            tracing::debug!(chunk = i + 1, total, chars = chunk.len(), "sending chunk");

            let req = self.request(chunk);
            let out = self
                .completer
                .complete(&req)
                .await
                .with_context(|| format!("transliteration failed on chunk {}/{}", i + 1, total))?;

            tracing::debug!(
                chunk = i + 1,
                elapsed_ms = started.elapsed().as_millis() as u64,
                chars = out.len(),
                "chunk done"
            );
            results.push(out);
        }

        Ok(results.join("\n\n"))
    }

    fn request(&self, chunk: &str) -> CompletionRequest<'_> {
        CompletionRequest {
            model: &self.model,
            system: SYSTEM_PROMPT,
            user: format!("Transliterate these lyrics:\n\n{chunk}"),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{EchoCompleter, FailingCompleter};

    fn cfg(chunk_lines: usize) -> CompletionConfig {
        CompletionConfig {
            chunk_lines,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_chunks_sent_in_order_and_joined() {
        let echo = Arc::new(EchoCompleter::default());
        let t = Transliterator::new(echo.clone(), &cfg(2));

        let out = t.transliterate("a\nb\nc\nd\ne").await.unwrap();
        assert_eq!(out, "A\nB\n\nC\nD\n\nE");

        let seen = echo.requests();
        assert_eq!(seen.len(), 3);
        assert!(seen[0].starts_with("Transliterate these lyrics:\n\na\nb"));
        assert!(seen[2].ends_with("e"));
    }

    #[tokio::test]
    async fn test_request_parameters() {
        let echo = Arc::new(EchoCompleter::default());
        let t = Transliterator::new(echo.clone(), &CompletionConfig::default());
        t.transliterate("hola").await.unwrap();

        let params = echo.last_params().unwrap();
        assert_eq!(params.0, "llama-3.3-70b-versatile");
        assert!(params.1 <= 0.3);
        assert_eq!(params.2, 2048);
        assert!(params.3.contains("Do NOT translate"));
    }

    #[tokio::test]
    async fn test_failed_chunk_is_fatal() {
        let t = Transliterator::new(Arc::new(FailingCompleter::after(1)), &cfg(1));
        let err = t.transliterate("one\ntwo\nthree").await.unwrap_err();
        assert!(format!("{err:#}").contains("chunk 2/3"), "{err:#}");
    }
}
