//! Signal handling for graceful shutdown

use tracing::{debug, warn};

/// Handles shutdown requests from the console (Ctrl-C, closing the window)
pub struct ShutdownSignal;

impl ShutdownSignal {
    /// Create a new shutdown signal handler
    pub fn new() -> Self {
        Self
    }

    /// Wait for a shutdown signal
    ///
    /// Never resolves if no handler could be registered.
    pub async fn wait(&self) {
        if let Err(e) = wait_for_signal().await {
            warn!(error = %e, "failed to register shutdown handler");
            std::future::pending::<()>().await;
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_os = "windows")]
async fn wait_for_signal() -> std::io::Result<()> {
    use tokio::signal::windows::{ctrl_c, ctrl_close};

    let mut interrupt = ctrl_c()?;
    let mut close = ctrl_close()?;

    tokio::select! {
        _ = interrupt.recv() => {
            debug!("received Ctrl-C");
        }
        _ = close.recv() => {
            debug!("console window closed");
        }
    }
    Ok(())
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => {
            debug!("received SIGTERM");
        }
        _ = sigint.recv() => {
            debug!("received SIGINT");
        }
    }
    Ok(())
}

#[cfg(not(any(unix, target_os = "windows")))]
async fn wait_for_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await?;
    debug!("received Ctrl-C");
    Ok(())
}
