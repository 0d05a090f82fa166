//! Alarm-to-notification dispatch.
//!
//! [`AlarmNotifier`] subscribes to the event bus and, for each
//! `equipment.alarm`, stores one notification for each distinct contact of
//! the equipment's client. Failures are logged and never propagated.

use equiplog_core::alarm::describe_alarm;
use equiplog_db::repositories::{EquipmentRepo, NotificationRepo};
use equiplog_db::DbPool;
use tokio::sync::broadcast;

use crate::alarm::AlarmRaised;
use crate::bus::PlatformEvent;

pub struct AlarmNotifier {
    pool: DbPool,
}

impl AlarmNotifier {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Run the dispatch loop until the bus is dropped.
    pub async fn run(self, mut receiver: broadcast::Receiver<PlatformEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => self.handle_event(&event).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Alarm notifier lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, alarm notifier shutting down");
                    break;
                }
            }
        }
    }

    async fn handle_event(&self, event: &PlatformEvent) {
        match AlarmRaised::from_event(event) {
            None => {}
            Some(Err(e)) => {
                tracing::error!(error = %e, "Malformed alarm event payload");
            }
            Some(Ok(alarm)) => {
                if let Err(e) = self.notify(&alarm).await {
                    tracing::error!(
                        error = %e,
                        equipment_id = alarm.equipment_id,
                        metric_id = alarm.metric_id,
                        "Failed to create alarm notifications"
                    );
                }
            }
        }
    }

    /// Create the notifications for one alarm, returning how many were stored.
    pub async fn notify(&self, alarm: &AlarmRaised) -> Result<usize, sqlx::Error> {
        let Some(contacts) = EquipmentRepo::find_alarm_contacts(&self.pool, alarm.equipment_id).await?
        else {
            tracing::warn!(equipment_id = alarm.equipment_id, "Alarm for unknown equipment");
            return Ok(0);
        };

        let recipients = contacts.recipients();
        if recipients.is_empty() {
            tracing::debug!(equipment_id = alarm.equipment_id, "No alarm recipients configured");
            return Ok(0);
        }

        let description = describe_alarm(
            alarm.kind,
            &contacts.equipment_name,
            Some(&alarm.metric_name),
            Some(&alarm.metric_unit),
            alarm.value,
            alarm.timestamp,
        );

        let ids = NotificationRepo::create_many(&self.pool, &recipients, &description).await?;
        tracing::info!(
            equipment_id = alarm.equipment_id,
            group_id = alarm.group_id,
            kind = alarm.kind.as_str(),
            recipients = ids.len(),
            "Alarm notifications created"
        );
        Ok(ids.len())
    }
}
