//! Finished-notification background task

use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::state::AppState;

/// Background task that announces every natural expiry.
/// Ends when the finished channel closes.
pub async fn finished_notifier_task(state: Arc<AppState>) {
    info!("Starting finished notifier task");

    let mut finished_rx = state.finished_tx.subscribe();
    drop(state);

    loop {
        match finished_rx.recv().await {
            Ok(event) => {
                info!("Times Up. {}", event.message());
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!("Finished notifier lagged, {} events skipped", skipped);
            }
            Err(RecvError::Closed) => {
                info!("Finished channel closed, stopping notifier");
                break;
            }
        }
    }
}
