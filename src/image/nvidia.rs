use async_trait::async_trait;
use reqwest::Client as HttpClient;
use reqwest::header::{ HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE };
use serde_json::Value;
use std::error::Error as StdError;

use super::{ ImageClient, ImagePayload };

pub const DEFAULT_IMAGE_URL: &str = "https://ai.api.nvidia.com/v1/genai/black-forest-labs/flux.1-dev";

/// Single fixed endpoint with one bearer credential.
pub struct NvidiaImageClient {
    http: HttpClient,
    url: String,
}

impl NvidiaImageClient {
    pub fn new(api_key: &str, url: Option<String>) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
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
            url: url.unwrap_or_else(|| DEFAULT_IMAGE_URL.to_string()),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ImageClient for NvidiaImageClient {
    async fn generate(&self, payload: &ImagePayload) -> Result<Value, Box<dyn StdError + Send + Sync>> {
        let body = self.http
            .post(&self.url)
            .json(payload)
            .send().await?
            .error_for_status()?
            .json::<Value>().await?;
        Ok(body)
    }
}
