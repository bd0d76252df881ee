//! switchy: Caps Lock keyboard layout switcher for Windows
//!
//! Installs a low-level keyboard hook and turns:
//! - Caps Lock into a layout switch (Win+Space picker, or Alt+Shift)
//! - Caps Lock + Left Shift into the real Caps Lock
//! - Alt + Caps Lock into an on/off switch for the remapper
//!
//! Pass `nopopup` to force Alt+Shift on systems that have the picker.

#![cfg_attr(not(target_os = "windows"), allow(dead_code, unused_imports))]

mod config;
mod events;
mod hook;
mod lifecycle;
mod platform;
mod remap;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "switchy starting");

    let config = Config::load();
    info!(
        gesture = %config.gesture,
        os_major_version = ?config.os_major_version,
        "configuration loaded"
    );

    run(config).await
}

#[cfg(target_os = "windows")]
async fn run(config: Config) -> Result<()> {
    use anyhow::Context;
    use tokio::sync::mpsc;

    use crate::events::RemapEvent;
    use crate::hook::KeyboardHook;
    use crate::lifecycle::{InstanceGuard, ShutdownSignal};

    let _instance = InstanceGuard::acquire().map_err(fatal)?;

    // Hook thread -> notification pump
    let (event_tx, event_rx) = mpsc::channel::<RemapEvent>(64);

    let hook = KeyboardHook::new(config.gesture);
    hook.start(event_tx)
        .map_err(fatal)
        .context("keyboard hook registration failed")?;

    info!("switchy running, press Ctrl-C to exit");

    let shutdown = ShutdownSignal::new();
    tokio::select! {
        // Ends when the hook thread leaves its message loop
        seen = events::pump(event_rx) => {
            info!(events = seen, "hook message loop ended");
        }

        _ = shutdown.wait() => {
            info!("shutdown signal received");
        }
    }

    info!("shutting down...");
    hook.stop();
    info!("switchy stopped");

    Ok(())
}

#[cfg(not(target_os = "windows"))]
async fn run(_config: Config) -> Result<()> {
    tracing::error!(os = std::env::consts::OS, "switchy only runs on Windows");
    anyhow::bail!("unsupported platform: {}", std::env::consts::OS)
}

/// Log a fatal startup error and show it in a blocking dialog
fn fatal<E>(e: E) -> anyhow::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    tracing::error!(error = %e, "fatal startup error");
    platform::show_error(&e.to_string());
    anyhow::Error::new(e)
}
