use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::Config;
use crate::proxy::error::ProxyError;
use crate::proxy::events::TracingSink;
use crate::proxy::rewrite::ModelRewriter;
use crate::proxy::router::{build_router, RouterEngine};
use crate::proxy::shutdown::ShutdownManager;
use crate::proxy::timeout::{RetryConfig, TimeoutConfig};
use crate::proxy::upstream::UpstreamClient;

pub struct ProxyServer {
    pub addr: SocketAddr,
    engine: RouterEngine,
    rewriter: ModelRewriter,
    shutdown: Arc<ShutdownManager>,
}

impl ProxyServer {
    pub fn new(config: &Config) -> Result<Self, ProxyError> {
        let addr = config
            .proxy
            .bind_addr
            .parse()
            .map_err(|e| ProxyError::Internal(format!("Invalid bind address: {}", e)))?;
        let upstream = UpstreamClient::new(
            config.proxy.upstream_base_url.clone(),
            TimeoutConfig::from(&config.proxy),
            RetryConfig::from(&config.proxy),
        )?;
        let rewriter = ModelRewriter::from_config(&config.route, Arc::new(TracingSink));

        Ok(Self {
            addr,
            engine: RouterEngine::new(upstream),
            rewriter,
            shutdown: Arc::new(ShutdownManager::new()),
        })
    }

    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        tracing::info!("Starting proxy server on {}", self.addr);
        let listener = TcpListener::bind(self.addr).await?;
        tracing::info!("Proxy server listening on {}", self.addr);

        let app = build_router(self.engine.clone(), self.rewriter.clone());

        let signal_waiter = self.shutdown.clone();
        tokio::spawn(async move {
            let _ = signal_waiter.wait_for_signal().await;
        });

        let shutdown = self.shutdown.clone();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.wait_for_shutdown().await;
            })
            .await?;

        tracing::info!("Shutting down gracefully");
        Ok(())
    }
}
