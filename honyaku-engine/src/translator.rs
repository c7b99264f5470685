use crate::error::{EngineError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A shared, re-entrant handle to a translation backend.
pub type SharedTranslator = Arc<dyn Translate + Send + Sync>;

/// Text-in/text-out translation contract.
///
/// Implementations must be safe to call from many concurrent rewrite passes;
/// one handle is built per run and shared behind an [`Arc`].
#[async_trait]
pub trait Translate {
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String>;
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    text: &'a str,
    target_lang: &'a str,
}

#[derive(Deserialize)]
struct TranslateResponse {
    translated_text: String,
}

/// Translation backend reached over HTTP.
///
/// Holds one pooled [`reqwest::Client`] for the whole run.
pub struct HttpTranslator {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpTranslator {
    pub fn new(endpoint: String, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("Honyaku/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .connect_timeout(std::time::Duration::from_secs(10))
            .pool_max_idle_per_host(50)
            .build()
            .map_err(EngineError::HttpError)?;

        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }
}

#[async_trait]
impl Translate for HttpTranslator {
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String> {
        let mut request = self.client.post(&self.endpoint).json(&TranslateRequest {
            text,
            target_lang,
        });
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::TranslationError(format!(
                "backend returned {}",
                status
            )));
        }

        let body: TranslateResponse = response
            .json()
            .await
            .map_err(|e| EngineError::TranslationError(format!("bad response body: {}", e)))?;

        if body.translated_text.is_empty() {
            return Err(EngineError::TranslationError(
                "no translation found".to_string(),
            ));
        }

        Ok(body.translated_text)
    }
}
