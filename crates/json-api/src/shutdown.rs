//! Stop signal handling

use std::{io, time::Duration};

use salvo::server::ServerHandle;
use thiserror::Error;
use tokio::signal;
use tracing::info;

#[derive(Debug, Error)]
pub(crate) enum ShutdownSignalError {
    #[error("failed to install Ctrl+C handler: {0}")]
    CtrlC(#[source] io::Error),

    #[cfg(unix)]
    #[error("failed to install SIGTERM handler: {0}")]
    SigTerm(#[source] io::Error),
}

/// Wait for Ctrl+C or SIGTERM, then let in-flight requests drain for up to
/// `grace` before the server stops.
pub(crate) async fn listen(handle: ServerHandle, grace: Duration) -> Result<(), ShutdownSignalError> {
    let signal = wait_for_signal().await?;

    info!(
        signal,
        grace_seconds = grace.as_secs(),
        "stop signal received, draining requests"
    );

    handle.stop_graceful(Some(grace));

    Ok(())
}

async fn wait_for_signal() -> Result<&'static str, ShutdownSignalError> {
    let ctrl_c = async {
        signal::ctrl_c().await.map_err(ShutdownSignalError::CtrlC)?;
        Ok::<_, ShutdownSignalError>("ctrl_c")
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .map_err(ShutdownSignalError::SigTerm)?
            .recv()
            .await;
        Ok::<_, ShutdownSignalError>("sigterm")
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<&'static str, ShutdownSignalError>>();

    tokio::select! {
        received = ctrl_c => received,
        received = terminate => received,
    }
}
