//! Server lifecycle
//!
//! `ServerHandle` owns one running HTTP server: `start` binds and spawns it,
//! `wait_ready` polls `GET /` until it answers 200, `stop` shuts it down
//! gracefully. Stopping never touches stored messages.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::application::errors::GuestbookError;
use crate::application::render::PageRenderer;
use crate::application::services::GuestbookService;
use crate::infrastructure::client::GuestbookClient;
use crate::infrastructure::config::Config;
use crate::infrastructure::http;
use crate::infrastructure::storage::FileStore;

const READY_POLL_INTERVAL: Duration = Duration::from_millis(50);

pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<std::io::Result<()>>,
}

impl ServerHandle {
    /// Open the configured store and start serving it
    pub async fn start_with_config(config: &Config) -> Result<Self, GuestbookError> {
        let store = FileStore::open(&config.storage.message_dir).await?;
        let mut service = GuestbookService::new(Arc::new(store), PageRenderer::new(&config.page.title));
        if let Some(output) = &config.page.output {
            service = service.with_snapshot(output);
        }

        Self::start(Arc::new(service), config.bind_addr()).await
    }

    /// Bind `addr` (port 0 picks a free port) and serve in the background
    pub async fn start(service: Arc<GuestbookService>, addr: SocketAddr) -> Result<Self, GuestbookError> {
        service.prepare().await?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| GuestbookError::Server(format!("Failed to bind {}: {}", addr, e)))?;
        let addr = listener
            .local_addr()
            .map_err(|e| GuestbookError::Server(e.to_string()))?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let app = http::router(service);

        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        tracing::info!("Guestbook listening on http://{}", addr);

        Ok(Self {
            addr,
            shutdown: Some(shutdown_tx),
            task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Poll `GET /` until it returns 200 or `timeout` elapses
    pub async fn wait_ready(&self, timeout: Duration) -> Result<(), GuestbookError> {
        let client = GuestbookClient::new(self.url())?;

        let probe = async {
            loop {
                match client.fetch_page().await {
                    Ok(page) if page.status.is_success() => return,
                    Ok(page) => tracing::debug!("Not ready yet: {}", page.status),
                    Err(e) => tracing::debug!("Not ready yet: {}", e),
                }
                tokio::time::sleep(READY_POLL_INTERVAL).await;
            }
        };

        tokio::time::timeout(timeout, probe)
            .await
            .map_err(|_| GuestbookError::NotReady(timeout))
    }

    /// Graceful shutdown; waits for in-flight requests to finish
    pub async fn stop(self) -> Result<(), GuestbookError> {
        let Self { addr, shutdown, task } = self;
        if let Some(tx) = shutdown {
            let _ = tx.send(());
        }

        match task.await {
            Ok(result) => result.map_err(|e| GuestbookError::Server(e.to_string()))?,
            Err(e) => return Err(GuestbookError::Server(format!("Server task failed: {}", e))),
        }

        tracing::info!("Guestbook on {} stopped", addr);
        Ok(())
    }
}
