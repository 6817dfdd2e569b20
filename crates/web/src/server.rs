//! Catalog server lifecycle

use std::net::SocketAddr;
use std::path::PathBuf;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use storysweep_common::{Error, Result, DEFAULT_PORT};

use crate::static_files::StaticFiles;

/// Configuration for the local catalog server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Built catalog directory
    pub catalog_dir: PathBuf,

    /// Rule engine script served at `/axe.min.js` (None = expect it in the catalog)
    pub engine_script: Option<PathBuf>,

    /// Port to listen on (0 = pick a free one)
    pub port: u16,
}

impl ServerConfig {
    pub fn new(catalog_dir: impl Into<PathBuf>) -> Self {
        Self {
            catalog_dir: catalog_dir.into(),
            engine_script: None,
            port: DEFAULT_PORT,
        }
    }
}

/// Handle to a running catalog server
pub struct CatalogServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl CatalogServer {
    /// Bind and start serving. The socket is listening when this returns.
    pub async fn start(config: ServerConfig) -> Result<Self> {
        let mut files = StaticFiles::new(&config.catalog_dir)?;
        if let Some(script) = &config.engine_script {
            files = files.with_engine_script(script)?;
        }

        let listener = TcpListener::bind(("127.0.0.1", config.port))
            .await
            .map_err(|e| Error::Server(format!("bind 127.0.0.1:{}: {}", config.port, e)))?;
        let addr = listener.local_addr()?;

        info!(
            "Serving {} on http://{}",
            files.catalog_dir().display(),
            addr
        );

        let (tx, rx) = oneshot::channel::<()>();
        let router = files.router();
        let task = tokio::spawn(async move {
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = rx.await;
                })
                .await;
            if let Err(e) = result {
                warn!("Catalog server exited: {}", e);
            }
        });

        Ok(Self {
            addr,
            shutdown: Some(tx),
            task: Some(task),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base URL with the loopback host the browser should use
    pub fn base_url(&self) -> String {
        format!("http://localhost:{}", self.addr.port())
    }

    /// Stop accepting connections and wait for the server task.
    pub async fn stop(mut self) {
        self.signal_shutdown();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        debug!("Catalog server stopped");
    }

    fn signal_shutdown(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for CatalogServer {
    fn drop(&mut self) {
        self.signal_shutdown();
    }
}
