use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::proxy::handler::{handle_request, AppState, SharedState};
use crate::youtube::Extractor;

pub struct ApiServer {
    addr: SocketAddr,
    state: SharedState,
}

impl ApiServer {
    pub fn new(config: Config, extractor: Arc<dyn Extractor>) -> Self {
        Self {
            addr: config.listen,
            state: Arc::new(AppState::new(config, extractor)),
        }
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// Accepts connections until Ctrl-C. Each connection runs on its own task.
    pub async fn run(&self) -> io::Result<()> {
        let listener = TcpListener::bind(self.addr).await?;
        let config = &self.state.config;

        info!(
            address = %listener.local_addr()?,
            cache_ttl_secs = config.cache_ttl.as_secs(),
            cache_capacity = config.cache_capacity,
            info_timeout_secs = config.info_timeout.as_secs(),
            demo_fallback = config.demo_fallback,
            "API server listening"
        );

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            let (stream, peer) = tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok(conn) => conn,
                    Err(err) => {
                        warn!(error = %err, "failed to accept connection");
                        continue;
                    }
                },
                _ = &mut shutdown => {
                    info!("shutdown signal received, no longer accepting connections");
                    return Ok(());
                }
            };

            let state = Arc::clone(&self.state);
            tokio::spawn(async move {
                let service = service_fn(move |req| handle_request(req, Arc::clone(&state)));
                if let Err(err) = auto::Builder::new(TokioExecutor::new())
                    .serve_connection(TokioIo::new(stream), service)
                    .await
                {
                    debug!(%peer, error = %err, "connection closed with error");
                }
            });
        }
    }
}
