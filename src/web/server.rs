//! Web server for the trigger-driven deployment.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::config::WebConfig;
use crate::monitor::{Policy, PollCycle, Scheduler};
use crate::{RelayError, Result};

use super::handlers::AppState;
use super::router::create_router;

/// Web server exposing the trigger endpoints, plus an optional timer trigger.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// Timer trigger interval; `None` disables it.
    check_interval: Option<Duration>,
}

impl WebServer {
    /// Create a new web server.
    pub fn new(config: &WebConfig, cycle: Arc<PollCycle>) -> Result<Self> {
        let addr = format!("{}:{}", config.host, config.port)
            .parse()
            .map_err(|e| {
                RelayError::Config(format!(
                    "invalid web address {}:{}: {e}",
                    config.host, config.port
                ))
            })?;

        Ok(Self {
            addr,
            app_state: Arc::new(AppState::new(cycle)),
            check_interval: config.check_interval(),
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn start_timer(&self) -> Option<Scheduler> {
        self.check_interval.map(|interval| {
            tracing::info!(
                interval_secs = interval.as_secs(),
                "Timer trigger enabled"
            );
            Scheduler::start_delayed(self.app_state.cycle.clone(), Policy::StopAtKnown, interval)
        })
    }

    /// Run the web server until `shutdown` resolves.
    ///
    /// The timer trigger is stopped once the server has drained.
    pub async fn run_until<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        let timer = self.start_timer();
        let router = create_router(self.app_state);

        tracing::info!("Web server listening on http://{}", local_addr);

        let result = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await;

        if let Some(timer) = timer {
            timer.stop();
            timer.join().await;
        }
        tracing::info!("Web server stopped");
        result
    }

    /// Run the server in the background and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> std::io::Result<SocketAddr> {
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        let timer = self.start_timer();
        let router = create_router(self.app_state);

        tracing::info!("Web server listening on http://{}", local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("Web server error: {}", e);
            }
            drop(timer);
        });

        Ok(local_addr)
    }
}
