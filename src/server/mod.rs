pub mod api;
pub mod error;

use crate::agent::ChatAgent;
use crate::cli::Args;
use log::info;
use std::error::Error;
use std::net::SocketAddr;

pub struct Server {
    addr: String,
    agent: ChatAgent,
    args: Args,
}

impl Server {
    pub fn new(addr: String, agent: ChatAgent, args: Args) -> Self {
        Self { addr, agent, args }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let addr = self.addr.parse::<SocketAddr>()?;
        let app = api::create_router(self.agent.clone());

        if self.args.enable_tls {
            match (&self.args.tls_cert_path, &self.args.tls_key_path) {
                (Some(cert_path), Some(key_path)) => {
                    info!(
                        "TLS enabled. Loading certificate from '{}' and key from '{}'",
                        cert_path,
                        key_path
                    );
                    let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
                        cert_path,
                        key_path
                    ).await?;
                    info!("HTTPS server listening on: https://{}", addr);
                    axum_server::bind_rustls(addr, tls_config)
                        .serve(app.into_make_service())
                        .await?;
                    return Ok(());
                }
                _ => {
                    return Err("Both --tls-cert-path and --tls-key-path must be provided to enable TLS".into());
                }
            }
        }

        info!("TLS not enabled. Running plain HTTP server.");
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("HTTP server listening on: http://{}", addr);
        axum::serve(listener, app.into_make_service()).await?;
        Ok(())
    }
}
