use super::{Error, NotificationsProducerService};
use crate::{dto::NotificationMessage, service::queue_topology::QueueTopology};
use amqprs::{
    channel::{BasicPublishArguments, Channel},
    BasicProperties,
};
use axum::async_trait;
use rabbitmq_client::RabbitmqConnection;
use tokio::sync::Mutex;

pub struct RabbitmqNotificationsProducerService {
    topology: QueueTopology,
    rabbitmq_connection: RabbitmqConnection,

    channel: Mutex<Option<Channel>>,
}

impl RabbitmqNotificationsProducerService {
    ///
    /// Creates the producer and declares the topology so the work queue
    /// exists before the first publish.
    ///
    pub async fn new(
        topology: QueueTopology,
        rabbitmq_connection: RabbitmqConnection,
    ) -> anyhow::Result<Self> {
        let service = Self {
            topology,
            rabbitmq_connection,
            channel: Mutex::new(None),
        };

        let mut channel = service.channel.lock().await;
        *channel = Some(service.open_channel().await?);
        drop(channel);

        Ok(service)
    }

    pub async fn close(self) {
        tracing::info!("closing producer");

        if let Some(channel) = self.channel.lock().await.take() {
            match channel.close().await {
                Ok(()) => tracing::info!("channel closed"),
                Err(err) => tracing::warn!(%err, "closing channel failed"),
            }
        }

        tracing::info!("producer closed");
    }

    async fn open_channel(&self) -> Result<Channel, Error> {
        let connection = self
            .rabbitmq_connection
            .connection()
            .borrow()
            .clone()
            .ok_or(Error::BrokerUnavailable)?;

        let channel = connection.open_channel(None).await?;
        self.topology.declare(&channel).await?;

        Ok(channel)
    }

    async fn publish_raw(
        &self,
        exchange: &str,
        routing_key: &str,
        notification: &NotificationMessage,
    ) -> Result<(), Error> {
        let content = serde_json::to_vec(notification)?;

        // Lock held across the publish so a reopened channel
        // is not torn down by a concurrent publisher
        let mut channel_lock = self.channel.lock().await;
        let channel = match channel_lock.as_ref().filter(|channel| channel.is_open()) {
            Some(channel) => channel.clone(),
            None => {
                tracing::info!("reopening producer channel");
                let channel = self.open_channel().await?;
                *channel_lock = Some(channel.clone());
                channel
            }
        };

        // delivery_mode=2 so redeliveries survive a broker restart
        let basic_properties = BasicProperties::default().with_persistence(true).finish();
        let args = BasicPublishArguments::new(exchange, routing_key);
        let publish_result = channel.basic_publish(basic_properties, content, args).await;

        if publish_result.is_err() {
            *channel_lock = None;
        }

        Ok(publish_result?)
    }
}

#[async_trait]
impl NotificationsProducerService for RabbitmqNotificationsProducerService {
    #[tracing::instrument(
        name = "Notifications Producer",
        skip_all,
        fields(id = %notification.id.to_hex())
    )]
    async fn publish(&self, notification: &NotificationMessage) -> Result<(), Error> {
        tracing::info!("publishing notification");

        self.publish_raw(&self.topology.exchange, &self.topology.routing_key, notification)
            .await?;

        tracing::info!("notification published");

        Ok(())
    }

    #[tracing::instrument(
        name = "Notifications Producer",
        skip_all,
        fields(
            id = %notification.id.to_hex(),
            retry_count = notification.retry_count,
        )
    )]
    async fn publish_retry(&self, notification: &NotificationMessage) -> Result<(), Error> {
        tracing::info!("publishing notification to retry queue");

        // Default exchange routes straight to the retry queue by name
        self.publish_raw("", &self.topology.retry_queue, notification)
            .await?;

        tracing::info!("retry scheduled");

        Ok(())
    }
}
