//! Shutdown triggers
//!
//! Orchestrators stop containers with SIGTERM and developers with Ctrl-C;
//! both must run the stop hook. The health endpoint exiting on its own is
//! also a trigger.

use std::future::Future;
use std::io;
use tracing::info;

/// What ended the wait in [`until_shutdown`]
#[derive(Debug, PartialEq, Eq)]
pub enum ShutdownTrigger<T> {
    /// A termination signal arrived
    Signal,
    /// The watched task finished on its own, with its output
    Stopped(T),
}

/// Install SIGTERM and SIGINT handlers and return a future that resolves on
/// the first of them.
///
/// Handlers are registered before this returns, so a signal delivered while
/// the service is still starting up is not lost.
#[cfg(unix)]
pub fn shutdown_signal() -> io::Result<impl Future<Output = ()> + Send + 'static> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = signal(SignalKind::terminate())?;
    let mut interrupt = signal(SignalKind::interrupt())?;

    Ok(async move {
        tokio::select! {
            _ = terminate.recv() => info!("Received SIGTERM"),
            _ = interrupt.recv() => info!("Received SIGINT"),
        }
    })
}

/// Return a future that resolves on Ctrl-C
#[cfg(not(unix))]
pub fn shutdown_signal() -> io::Result<impl Future<Output = ()> + Send + 'static> {
    Ok(async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl-C"),
            Err(e) => {
                tracing::warn!(error = %e, "Ctrl-C handler failed, waiting indefinitely");
                std::future::pending::<()>().await;
            }
        }
    })
}

/// Wait for `signal` or for `task` to finish, whichever comes first.
///
/// A signal wins a tie.
pub async fn until_shutdown<S, F>(signal: S, task: F) -> ShutdownTrigger<F::Output>
where
    S: Future<Output = ()>,
    F: Future,
{
    tokio::select! {
        biased;
        _ = signal => ShutdownTrigger::Signal,
        output = task => ShutdownTrigger::Stopped(output),
    }
}
