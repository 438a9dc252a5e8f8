//! Log-only notifier

use async_trait::async_trait;
use geowatch_adapter_api::{Notifier, NotifyResult};
use geowatch_api::{AlertKind, NotificationRequest};
use tracing::{info, warn};

/// Writes each alert to the log instead of delivering it anywhere
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, request: &NotificationRequest) -> NotifyResult<()> {
        let subject = request.reason.subject(&request.entity_id);
        match request.reason.kind() {
            AlertKind::Returned => info!(
                alert_id = %request.alert_id,
                entity_id = %request.entity_id,
                reason = %request.reason,
                out_secs = request.reason.duration().map(|d| d.as_secs()),
                "{}",
                subject
            ),
            AlertKind::LeftZone | AlertKind::StillOut => warn!(
                alert_id = %request.alert_id,
                entity_id = %request.entity_id,
                reason = %request.reason,
                out_secs = request.reason.duration().map(|d| d.as_secs()),
                "{}",
                subject
            ),
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geowatch_api::AlertReason;
    use geowatch_util::EntityId;

    #[tokio::test]
    async fn always_succeeds() {
        let notifier = LogNotifier::new();
        let request = NotificationRequest::new(EntityId::new("5"), AlertReason::LeftZone);
        assert!(notifier.send(&request).await.is_ok());
        assert_eq!(notifier.name(), "log");
    }
}
