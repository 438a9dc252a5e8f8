//! Notification dispatch
//!
//! Alerts are queued on an unbounded channel and delivered sequentially by a
//! background task, so a slow or failing notifier never holds up polling.
//! Delivery failures are logged and dropped.

use geowatch_adapter_api::Notifier;
use geowatch_api::NotificationRequest;
use geowatch_util::{GeowatchError, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Delivery counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub delivered: u64,
    pub failed: u64,
}

#[derive(Debug, Default)]
struct Counters {
    delivered: AtomicU64,
    failed: AtomicU64,
}

impl Counters {
    fn stats(&self) -> DispatchStats {
        DispatchStats {
            delivered: self.delivered.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
        }
    }
}

/// Cloneable submission side of the dispatcher
#[derive(Debug, Clone)]
pub struct DispatchHandle {
    tx: mpsc::UnboundedSender<NotificationRequest>,
}

impl DispatchHandle {
    /// Queue a request for delivery. Never waits on the notifier.
    pub fn submit(&self, request: NotificationRequest) -> Result<()> {
        self.tx
            .send(request)
            .map_err(|_| GeowatchError::DispatcherClosed)
    }
}

/// Owns the delivery task
pub struct Dispatcher {
    tx: mpsc::UnboundedSender<NotificationRequest>,
    worker: JoinHandle<()>,
    counters: Arc<Counters>,
}

impl Dispatcher {
    /// Start the delivery task. Must be called inside a tokio runtime.
    pub fn spawn(notifier: Arc<dyn Notifier>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let counters = Arc::new(Counters::default());
        let worker = tokio::spawn(deliver(notifier, rx, counters.clone()));

        Self {
            tx,
            worker,
            counters,
        }
    }

    pub fn handle(&self) -> DispatchHandle {
        DispatchHandle {
            tx: self.tx.clone(),
        }
    }

    /// Stop accepting work and wait up to `grace` for queued alerts to go out.
    ///
    /// The queue only drains once every [`DispatchHandle`] has been dropped.
    /// Whatever is still pending when the grace period ends is abandoned.
    pub async fn shutdown(self, grace: Duration) -> DispatchStats {
        let Self {
            tx,
            mut worker,
            counters,
        } = self;
        drop(tx);

        match tokio::time::timeout(grace, &mut worker).await {
            Ok(Ok(())) => debug!("Notification queue drained"),
            Ok(Err(e)) => warn!(error = %e, "Notification worker failed"),
            Err(_) => {
                warn!(
                    grace_secs = grace.as_secs(),
                    "Notification queue not drained in time, abandoning pending alerts"
                );
                worker.abort();
                let _ = worker.await;
            }
        }

        counters.stats()
    }
}

async fn deliver(
    notifier: Arc<dyn Notifier>,
    mut rx: mpsc::UnboundedReceiver<NotificationRequest>,
    counters: Arc<Counters>,
) {
    while let Some(request) = rx.recv().await {
        match notifier.send(&request).await {
            Ok(()) => {
                counters.delivered.fetch_add(1, Ordering::SeqCst);
                info!(
                    notifier = notifier.name(),
                    alert_id = %request.alert_id,
                    entity_id = %request.entity_id,
                    reason = %request.reason,
                    "Notification sent"
                );
            }
            Err(e) => {
                counters.failed.fetch_add(1, Ordering::SeqCst);
                warn!(
                    notifier = notifier.name(),
                    alert_id = %request.alert_id,
                    entity_id = %request.entity_id,
                    reason = %request.reason,
                    error = %e,
                    "Notification delivery failed"
                );
            }
        }
    }
}
