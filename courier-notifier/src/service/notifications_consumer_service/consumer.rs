use super::delivery_acknowledger::{ChannelDeliveryAcknowledger, DeliveryAcknowledger};
use crate::{
    dto::NotificationMessage,
    service::{
        notifications_dispatch_service::{DispatchOutcome, NotificationsDispatchService},
        notifications_producer_service::NotificationsProducerService,
    },
};
use amqprs::{channel::Channel, consumer::AsyncConsumer, BasicProperties, Deliver};
use axum::async_trait;
use std::sync::Arc;

#[derive(Clone)]
pub struct Consumer {
    notifications_dispatch_service: Arc<dyn NotificationsDispatchService>,
    notifications_producer_service: Arc<dyn NotificationsProducerService>,
}

impl Consumer {
    pub fn new(
        notifications_dispatch_service: Arc<dyn NotificationsDispatchService>,
        notifications_producer_service: Arc<dyn NotificationsProducerService>,
    ) -> Self {
        Self {
            notifications_dispatch_service,
            notifications_producer_service,
        }
    }

    async fn process_delivery(
        &self,
        acknowledger: &dyn DeliveryAcknowledger,
        delivery_tag: u64,
        content: &[u8],
    ) {
        let notification = match serde_json::from_slice::<NotificationMessage>(content) {
            Ok(notification) => notification,
            Err(err) => {
                // Malformed payloads would fail the same way on every
                // redelivery, they are dropped instead of requeued
                tracing::warn!(%err, "invalid notification payload");
                acknowledger.nack(delivery_tag).await;
                return;
            }
        };

        match self
            .notifications_dispatch_service
            .dispatch(notification)
            .await
        {
            DispatchOutcome::Completed => {
                acknowledger.ack(delivery_tag).await;
            }
            DispatchOutcome::Retry(retried) => {
                // Ack releases the prefetch slot before the copy
                // is scheduled on the retry queue
                acknowledger.ack(delivery_tag).await;
                if let Err(err) = self
                    .notifications_producer_service
                    .publish_retry(&retried)
                    .await
                {
                    tracing::error!(
                        id = %retried.id.to_hex(),
                        %err,
                        "failed to schedule retry",
                    );
                }
            }
            DispatchOutcome::Reject => {
                acknowledger.nack(delivery_tag).await;
            }
        }
    }
}

#[async_trait]
impl AsyncConsumer for Consumer {
    #[tracing::instrument(
        name = "Notifications Consumer",
        skip_all,
        fields(
            delivery_tag = deliver.delivery_tag(),
        )
    )]
    async fn consume(
        &mut self,
        channel: &Channel,
        deliver: Deliver,
        _basic_properties: BasicProperties,
        content: Vec<u8>,
    ) {
        tracing::info!("processing delivery");

        let acknowledger = ChannelDeliveryAcknowledger::new(channel);
        self.process_delivery(&acknowledger, deliver.delivery_tag(), &content)
            .await;

        tracing::info!("delivery processed");
    }
}
