use tokio::sync::oneshot;

/// Fires the returned receiver on the first interrupt, SIGTERM or SIGQUIT.
pub fn spawn_shutdown_listener() -> oneshot::Receiver<()> {
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let name = wait_for_shutdown().await;
        tracing::info!("synq-dbt received {name} signal, shutting down");
        let _ = tx.send(());
    });
    rx
}

#[cfg(unix)]
async fn wait_for_shutdown() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut term, mut quit) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::quit()),
    ) {
        (Ok(term), Ok(quit)) => (term, quit),
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "failed to install signal handlers, only Ctrl+C is handled");
            return ctrl_c().await;
        }
    };

    tokio::select! {
        name = ctrl_c() => name,
        _ = term.recv() => "terminated",
        _ = quit.recv() => "quit",
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown() -> &'static str {
    ctrl_c().await
}

async fn ctrl_c() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    "interrupt"
}
