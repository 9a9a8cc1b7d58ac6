use super::{consumer::Consumer, consumer_channel_callback::ConsumerChannelCallback};
use crate::service::queue_topology::QueueTopology;
use amqprs::{
    channel::{BasicCancelArguments, BasicConsumeArguments, BasicQosArguments, Channel},
    connection::Connection,
};
use std::{sync::Arc, time::Duration};
use tokio::sync::{watch, Notify};

///
/// Keeps a single consumer slot subscribed to the work queue.
///
/// Whenever the connection is recreated or the broker cancels the
/// consumer, the channel is torn down and the subscription is restored
/// on the current connection.
///
pub struct ConsumerWorker {
    retry_interval: Duration,
    topology: QueueTopology,
    connection_rx: watch::Receiver<Option<Connection>>,
    consumer: Consumer,

    channel: Option<Channel>,
    consumer_tag: String,
    consumer_cancelled: Arc<Notify>,
}

impl ConsumerWorker {
    pub fn new(
        retry_interval: Duration,
        topology: QueueTopology,
        connection_rx: watch::Receiver<Option<Connection>>,
        consumer: Consumer,
    ) -> Self {
        Self {
            retry_interval,
            topology,
            connection_rx,
            consumer,
            channel: None,
            consumer_tag: String::new(),
            consumer_cancelled: Arc::new(Notify::new()),
        }
    }

    #[tracing::instrument(name = "Notifications Consumer", skip_all)]
    pub async fn run(mut self, close_notify: Arc<Notify>) {
        tracing::info!("worker started");

        tokio::select! {
            biased;

            _ = close_notify.notified() => {}
            _ = self.keep_consuming() => {}
        }

        if let Some(channel) = self.channel.take() {
            tracing::info!("cancelling consumer");
            let args = BasicCancelArguments::new(&self.consumer_tag);
            match channel.basic_cancel(args).await {
                Ok(_) => tracing::info!("consumer cancelled"),
                Err(err) => tracing::warn!(%err, "cancelling consumer failed"),
            }

            tracing::info!("closing channel");
            match channel.close().await {
                Ok(()) => tracing::info!("channel closed"),
                Err(err) => tracing::warn!(%err, "closing channel failed"),
            }
        }

        tracing::info!("worker finished");
    }

    async fn keep_consuming(&mut self) {
        loop {
            let Some(connection) = self.wait_for_connection().await else {
                tracing::info!("connection dropped, stopping worker");
                return;
            };

            match self.start_consuming(&connection).await {
                Ok(()) => tracing::info!("consuming"),
                Err(err) => {
                    tracing::warn!(%err, "failed to start consuming");
                    tokio::time::sleep(self.retry_interval).await;
                    continue;
                }
            }

            let consumer_cancelled = Arc::clone(&self.consumer_cancelled);
            tokio::select! {
                biased;

                _ = self.connection_rx.changed() => {
                    tracing::info!("connection changed");
                }
                _ = consumer_cancelled.notified() => {
                    tracing::warn!("consumer got cancelled");
                }
            }

            self.close_channel().await;
        }
    }

    async fn wait_for_connection(&mut self) -> Option<Connection> {
        loop {
            // Read before waiting, the value may have changed again
            if let Some(connection) = self.connection_rx.borrow_and_update().clone() {
                return Some(connection);
            }

            if self.connection_rx.changed().await.is_err() {
                return None;
            }
        }
    }

    async fn start_consuming(&mut self, connection: &Connection) -> anyhow::Result<()> {
        tracing::info!("opening channel");
        let channel = connection.open_channel(None).await?;

        tracing::info!("registering channel callback");
        self.consumer_cancelled = Arc::new(Notify::new());
        let callback = ConsumerChannelCallback::new(Arc::clone(&self.consumer_cancelled));
        channel.register_callback(callback).await?;

        tracing::info!("declaring topology");
        self.topology.declare(&channel).await?;

        // One unacked delivery at a time, the dispatch slot is sequential
        let qos_args = BasicQosArguments {
            prefetch_size: 0,
            prefetch_count: 1,
            global: false,
        };
        channel.basic_qos(qos_args).await?;

        tracing::info!(queue = %self.topology.queue, "consuming");
        let consume_args = BasicConsumeArguments::new(&self.topology.queue, "")
            .manual_ack(true)
            .finish();
        let consumer_tag = channel.basic_consume(self.consumer.clone(), consume_args).await?;

        self.channel = Some(channel);
        self.consumer_tag = consumer_tag;

        Ok(())
    }

    async fn close_channel(&mut self) {
        if let Some(channel) = self.channel.take() {
            tracing::info!("closing channel");
            match channel.close().await {
                Ok(()) => tracing::info!("channel closed"),
                Err(err) => tracing::warn!(%err, "failed to close channel"),
            }
        }
    }
}
