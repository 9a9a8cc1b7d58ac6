use amqprs::channel::{BasicAckArguments, BasicNackArguments, Channel};
use axum::async_trait;

///
/// Acknowledgement surface of a single broker delivery.
///
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeliveryAcknowledger: Send + Sync {
    async fn ack(&self, delivery_tag: u64);

    ///
    /// Negative acknowledgement without requeue. Failed messages travel
    /// through the retry queue or are dropped, never redelivered in place.
    ///
    async fn nack(&self, delivery_tag: u64);
}

pub struct ChannelDeliveryAcknowledger<'a> {
    channel: &'a Channel,
}

impl<'a> ChannelDeliveryAcknowledger<'a> {
    pub fn new(channel: &'a Channel) -> Self {
        Self { channel }
    }
}

#[async_trait]
impl DeliveryAcknowledger for ChannelDeliveryAcknowledger<'_> {
    async fn ack(&self, delivery_tag: u64) {
        tracing::trace!("sending ack");
        let args = BasicAckArguments::new(delivery_tag, false);
        match self.channel.basic_ack(args).await {
            Ok(()) => tracing::trace!("ack sent"),
            Err(err) => tracing::warn!(%err, "failed to ack message"),
        }
    }

    async fn nack(&self, delivery_tag: u64) {
        tracing::trace!("sending nack");
        let args = BasicNackArguments::new(delivery_tag, false, false);
        match self.channel.basic_nack(args).await {
            Ok(()) => tracing::trace!("nack sent"),
            Err(err) => tracing::warn!(%err, "failed to nack message"),
        }
    }
}
