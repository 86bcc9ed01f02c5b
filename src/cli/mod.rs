use clap::Parser;

use crate::llm::{ Provider, ProviderConfig };

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- History Store Args ---
    /// History chat store type (memory, redis)
    #[arg(long, env = "HISTORY_TYPE", default_value = "memory")]
    pub history_type: String,

    /// History chat store host endpoint (e.g., redis://127.0.0.1:6379)
    #[arg(long, env = "HISTORY_HOST", default_value = "redis://127.0.0.1:6379")]
    pub history_host: String,

    /// Prefix for Redis history keys.
    #[arg(long, env = "HISTORY_REDIS_PREFIX", default_value = "yetsai:")]
    pub history_redis_prefix: String,

    // --- Chat Gateway Args ---
    /// API key for the NVIDIA integrate gateway
    #[arg(long, env = "NVIDIA_API_KEY", default_value = "")]
    pub nvidia_api_key: String,

    /// Base URL for the NVIDIA gateway (e.g., https://integrate.api.nvidia.com/v1)
    #[arg(long, env = "NVIDIA_BASE_URL")] // No default, let the client handle it if None
    pub nvidia_base_url: Option<String>,

    /// API key for the OpenRouter gateway
    #[arg(long, env = "OPENROUTER_API_KEY", default_value = "")]
    pub openrouter_api_key: String,

    /// Base URL for the OpenRouter gateway (e.g., https://openrouter.ai/api/v1)
    #[arg(long, env = "OPENROUTER_BASE_URL")]
    pub openrouter_base_url: Option<String>,

    /// Value of the HTTP-Referer header sent to OpenRouter
    #[arg(long, env = "OPENROUTER_REFERER")]
    pub openrouter_referer: Option<String>,

    /// Value of the X-Title header sent to OpenRouter
    #[arg(long, env = "OPENROUTER_TITLE")]
    pub openrouter_title: Option<String>,

    // --- Image Generation Args ---
    /// Bearer credential for the image generation endpoint
    #[arg(long, env = "IMAGE_API_KEY", default_value = "")]
    pub image_api_key: String,

    /// Image generation endpoint
    #[arg(long, env = "IMAGE_URL")]
    pub image_url: Option<String>,

    // --- General App Args ---
    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,

    /// Host address and port for the HTTP server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "0.0.0.0:5000")]
    pub server_addr: String,

    /// Optional path to the TLS certificate file (PEM format). Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format). Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}

impl Args {
    pub fn provider_configs(&self) -> Vec<ProviderConfig> {
        vec![
            ProviderConfig {
                provider: Provider::Nvidia,
                api_key: self.nvidia_api_key.clone(),
                base_url: self.nvidia_base_url.clone(),
                referer: None,
                title: None,
            },
            ProviderConfig {
                provider: Provider::OpenRouter,
                api_key: self.openrouter_api_key.clone(),
                base_url: self.openrouter_base_url.clone(),
                referer: self.openrouter_referer.clone(),
                title: self.openrouter_title.clone(),
            }
        ]
    }
}
