use crate::state::AppState;
use std::sync::Arc;

/// Spawn a background task that drops sessions nobody has touched within the idle window
pub fn spawn_session_sweeper(state: Arc<AppState>) -> tokio::task::JoinHandle<()> {
    let interval = state.config.sweep_interval;
    let idle = state.config.session_idle;
    tracing::info!(?interval, ?idle, "Session sweeper started");

    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;

            let removed = state.sessions.sweep_idle(idle).await;
            if removed > 0 {
                let remaining = state.sessions.len().await;
                tracing::info!(removed, remaining, "Swept idle sessions");
            }
        }
    })
}
