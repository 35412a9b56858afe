//! Background worker that folds click events into aggregates.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, info, warn};

use crate::application::services::AnalyticsService;
use crate::domain::click_event::ClickEvent;

/// Drains the click channel until every sender is dropped.
///
/// Each event is recorded on its own detached task under `deadline`, with at
/// most `concurrency` recordings in flight. Outcomes are only logged; nothing
/// reports back to the request that produced the event.
pub async fn run_click_worker(
    mut rx: mpsc::Receiver<ClickEvent>,
    analytics: Arc<AnalyticsService>,
    concurrency: usize,
    deadline: Duration,
) {
    let permits = Arc::new(Semaphore::new(concurrency));

    while let Some(event) = rx.recv().await {
        let Ok(permit) = permits.clone().acquire_owned().await else {
            break;
        };
        let analytics = analytics.clone();

        tokio::spawn(async move {
            let _permit = permit;
            let code = event.code.clone();

            match tokio::time::timeout(deadline, analytics.record_click(event)).await {
                Ok(()) => debug!("Click dispatched for {}", code),
                Err(_) => {
                    metrics::counter!("clicks_failed_total").increment(1);
                    warn!("Click recording for {} exceeded {:?}", code, deadline);
                }
            }
        });
    }

    info!("Click channel closed, worker stopping");
}
