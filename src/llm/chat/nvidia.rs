use async_trait::async_trait;
use reqwest::{Client as HttpClient, header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION}};
use std::error::Error as StdError;

use super::{post_completion, ChatClient, ChatCompletionRequest, CompletionResponse};
use crate::llm::{Provider, ProviderConfig};

pub const DEFAULT_BASE_URL: &str = "https://integrate.api.nvidia.com/v1";

/// NVIDIA integrate gateway (OpenAI-compatible chat completions).
pub struct NvidiaChatClient {
    http: HttpClient,
    base_url: String,
}

impl NvidiaChatClient {
    pub fn new(
        api_key: &str,
        base_url: Option<String>,
    ) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let api_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| format!("Invalid API key format: {}", e))?
        );

        let http = HttpClient::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| Box::new(e) as Box<dyn StdError + Send + Sync>)?;

        Ok(Self {
            http,
            base_url: api_url,
        })
    }

    pub fn from_config(config: &ProviderConfig) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        if config.provider != Provider::Nvidia {
            return Err("Invalid config type for NvidiaChatClient".into());
        }
        Self::new(&config.api_key, config.base_url.clone())
    }
}

#[async_trait]
impl ChatClient for NvidiaChatClient {
    async fn complete(
        &self,
        request: &ChatCompletionRequest
    ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>> {
        post_completion(&self.http, &self.base_url, request).await
    }

    fn provider(&self) -> Provider {
        Provider::Nvidia
    }

    fn get_base_url(&self) -> String {
        self.base_url.clone()
    }
}
