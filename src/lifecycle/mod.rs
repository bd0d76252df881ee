//! Process lifecycle: single-instance guard and shutdown signals

mod instance;
mod shutdown;

#[cfg(target_os = "windows")]
pub use instance::InstanceGuard;
pub use shutdown::ShutdownSignal;
