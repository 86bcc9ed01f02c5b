pub mod chat;
pub mod registry;
pub mod router;
use serde::{ Deserialize, Serialize };
use std::fmt;

/// Upstream text-generation gateways. Closed set: adding one means adding a
/// client and a `ProviderRoute` variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Nvidia,
    OpenRouter,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Nvidia => write!(f, "nvidia"),
            Provider::OpenRouter => write!(f, "openrouter"),
        }
    }
}

/// Connection settings for one gateway.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub provider: Provider,
    pub api_key: String,
    pub base_url: Option<String>,
    /// Identification headers sent on every call (`HTTP-Referer`, `X-Title`).
    pub referer: Option<String>,
    pub title: Option<String>,
}

impl ProviderConfig {
    pub fn new(provider: Provider, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            base_url: None,
            referer: None,
            title: None,
        }
    }
}
