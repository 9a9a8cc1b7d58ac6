use super::ReconciliationServiceConfig;
use crate::{
    dto::NotificationMessage,
    repository::NotificationsRepository,
    service::{
        notifications_producer_service::NotificationsProducerService,
        websockets_service::WebSocketsService,
    },
};
use std::{sync::Arc, time::Duration};
use time::OffsetDateTime;
use tokio::{
    sync::Notify,
    time::{interval, MissedTickBehavior},
};

pub struct ReconciliationWorker {
    interval: Duration,
    publish_grace_period: Duration,

    notifications_repository: Arc<dyn NotificationsRepository>,
    notifications_producer_service: Arc<dyn NotificationsProducerService>,
    websockets_service: Arc<dyn WebSocketsService>,
}

impl ReconciliationWorker {
    pub fn new(
        config: ReconciliationServiceConfig,
        notifications_repository: Arc<dyn NotificationsRepository>,
        notifications_producer_service: Arc<dyn NotificationsProducerService>,
        websockets_service: Arc<dyn WebSocketsService>,
    ) -> Self {
        Self {
            interval: config.interval,
            publish_grace_period: config.publish_grace_period,
            notifications_repository,
            notifications_producer_service,
            websockets_service,
        }
    }

    #[tracing::instrument(name = "Reconciliation", skip_all)]
    pub async fn run(self, close_notify: Arc<Notify>) {
        let mut interval = interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tokio::select! {
            biased;

            // Wait for signal to close
            _ = close_notify.notified() => {},

            // Run reconciliation periodically
            _ = async { loop {
                interval.tick().await;

                tracing::debug!("reconciliation started");
                self.tick().await;
                tracing::debug!("reconciliation finished");
            }} => {}
        }
    }

    async fn tick(&self) {
        self.redrive_in_app().await;
        self.sweep_unpublished().await;
    }

    ///
    /// Re-emits every in-app record still waiting for an acknowledge.
    /// Clients answer with `request-notif`, which transitions the
    /// record to `sent` and stops the re-drive.
    ///
    async fn redrive_in_app(&self) {
        let notifications = match self.notifications_repository.find_in_app_undelivered().await {
            Ok(notifications) => notifications,
            Err(err) => {
                tracing::warn!(%err, "failed to find undelivered in-app records");
                return;
            }
        };

        if !notifications.is_empty() {
            tracing::info!(count = notifications.len(), "re-driving in-app records");
        }

        for notification in &notifications {
            self.websockets_service
                .send_check_in_app(NotificationMessage::from(notification))
                .await;
        }
    }

    ///
    /// Puts records that never made it onto the work queue back on it.
    /// Only records older than the grace period are swept so deliveries
    /// still in flight through intake are left alone.
    ///
    async fn sweep_unpublished(&self) {
        let older_than = OffsetDateTime::now_utc() - self.publish_grace_period;

        let notifications = match self
            .notifications_repository
            .find_unpublished(older_than)
            .await
        {
            Ok(notifications) => notifications,
            Err(err) => {
                tracing::warn!(%err, "failed to find unpublished records");
                return;
            }
        };

        if !notifications.is_empty() {
            tracing::info!(count = notifications.len(), "sweeping unpublished records");
        }

        for notification in &notifications {
            let message = NotificationMessage::from(notification);
            match self.notifications_producer_service.publish(&message).await {
                Ok(()) => {
                    if let Err(err) = self
                        .notifications_repository
                        .mark_published(notification.id)
                        .await
                    {
                        tracing::warn!(
                            id = %notification.id.to_hex(),
                            %err,
                            "failed to mark record published",
                        );
                    }
                }
                Err(err) => {
                    // Broker unavailable, the whole batch waits for the next tick
                    tracing::warn!(%err, "failed to republish record");
                    return;
                }
            }
        }
    }
}
