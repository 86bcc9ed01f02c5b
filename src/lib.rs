pub mod agent;
pub mod models;
pub mod server;
pub mod llm;
pub mod cli;
pub mod history;
pub mod image;

use agent::ChatAgent;
use cli::Args;
use log::info;
use server::Server;
use std::error::Error;

fn configured(value: &str) -> &'static str {
    if value.is_empty() { "unset" } else { "set" }
}

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("History Store Type: {}", args.history_type);
    if args.history_type.eq_ignore_ascii_case("redis") {
        info!("History Store Host: {}", args.history_host);
        info!("History Redis Prefix: {}", args.history_redis_prefix);
    }
    info!("NVIDIA API Key: {}", configured(&args.nvidia_api_key));
    info!("NVIDIA Base URL: {}", args.nvidia_base_url.as_deref().unwrap_or("client default"));
    info!("OpenRouter API Key: {}", configured(&args.openrouter_api_key));
    info!("OpenRouter Base URL: {}", args.openrouter_base_url.as_deref().unwrap_or("client default"));
    info!("Image API Key: {}", configured(&args.image_api_key));
    info!("TLS Enabled: {}", args.enable_tls);
    info!("-------------------------");

    let agent = ChatAgent::from_args(&args)?;
    let addr = args.server_addr.clone();
    info!("Starting server on: {}", addr);
    let server = Server::new(addr, agent, args);
    server.run().await?;

    Ok(())
}
