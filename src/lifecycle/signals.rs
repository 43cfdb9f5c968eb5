//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGTERM, SIGINT, SIGHUP)
//! - SIGTERM/SIGINT end `listen`, the caller then triggers shutdown
//! - SIGHUP requests a target refresh and keeps listening

use crate::health::RefreshHandle;

/// Wait for a stop signal, turning SIGHUP into target refreshes meanwhile.
#[cfg(unix)]
pub async fn listen(refresh: RefreshHandle) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    let mut hangup = signal(SignalKind::hangup())?;

    loop {
        tokio::select! {
            res = tokio::signal::ctrl_c() => {
                res?;
                tracing::info!("Interrupt received, shutting down");
                return Ok(());
            }
            _ = terminate.recv() => {
                tracing::info!("SIGTERM received, shutting down");
                return Ok(());
            }
            _ = hangup.recv() => {
                tracing::info!("SIGHUP received, refreshing targets at next round");
                refresh.request();
            }
        }
    }
}

/// Wait for Ctrl+C.
#[cfg(not(unix))]
pub async fn listen(_refresh: RefreshHandle) -> std::io::Result<()> {
    tokio::signal::ctrl_c().await?;
    tracing::info!("Interrupt received, shutting down");
    Ok(())
}
