use async_trait::async_trait;
use reqwest::Client as HttpClient;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, AUTHORIZATION};
use std::error::Error as StdError;

use super::{post_completion, ChatClient, ChatCompletionRequest, CompletionResponse};
use crate::llm::{Provider, ProviderConfig};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_REFERER: &str = "https://yetsai.replit.app";
pub const DEFAULT_TITLE: &str = "YetSAI";

/// OpenRouter gateway. Every call carries the `HTTP-Referer` and `X-Title`
/// identification headers.
pub struct OpenRouterChatClient {
    http: HttpClient,
    base_url: String,
}

pub(crate) fn identification_headers(
    referer: &str,
    title: &str,
) -> Result<HeaderMap, Box<dyn StdError + Send + Sync>> {
    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static("http-referer"),
        HeaderValue::from_str(referer).map_err(|e| format!("Invalid referer header: {}", e))?
    );
    headers.insert(
        HeaderName::from_static("x-title"),
        HeaderValue::from_str(title).map_err(|e| format!("Invalid title header: {}", e))?
    );
    Ok(headers)
}

impl OpenRouterChatClient {
    pub fn new(
        api_key: &str,
        base_url: Option<String>,
        referer: Option<String>,
        title: Option<String>,
    ) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let api_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let referer = referer.unwrap_or_else(|| DEFAULT_REFERER.to_string());
        let title = title.unwrap_or_else(|| DEFAULT_TITLE.to_string());

        let mut headers = identification_headers(&referer, &title)?;
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| format!("Invalid API key format: {}", e))?
        );

        let http_client = HttpClient::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| Box::new(e) as Box<dyn StdError + Send + Sync>)?;

        Ok(Self {
            http: http_client,
            base_url: api_url,
        })
    }

    pub fn from_config(config: &ProviderConfig) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        if config.provider != Provider::OpenRouter {
            return Err("Invalid config type for OpenRouterChatClient".into());
        }
        Self::new(
            &config.api_key,
            config.base_url.clone(),
            config.referer.clone(),
            config.title.clone(),
        )
    }
}

#[async_trait]
impl ChatClient for OpenRouterChatClient {
    async fn complete(
        &self,
        request: &ChatCompletionRequest
    ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>> {
        post_completion(&self.http, &self.base_url, request).await
    }

    fn provider(&self) -> Provider {
        Provider::OpenRouter
    }

    fn get_base_url(&self) -> String {
        self.base_url.clone()
    }
}
