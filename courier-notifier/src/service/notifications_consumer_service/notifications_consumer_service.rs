use super::{consumer::Consumer, consumer_worker::ConsumerWorker};
use crate::service::{
    notifications_dispatch_service::NotificationsDispatchService,
    notifications_producer_service::NotificationsProducerService, queue_topology::QueueTopology,
};
use rabbitmq_client::RabbitmqConnection;
use std::sync::Arc;
use tokio::{sync::Notify, task::JoinHandle};

pub struct NotificationsConsumerService {
    task_handle: JoinHandle<()>,

    close_notify: Arc<Notify>,
}

impl NotificationsConsumerService {
    pub fn new(
        topology: QueueTopology,
        rabbitmq_connection: RabbitmqConnection,
        notifications_dispatch_service: Arc<dyn NotificationsDispatchService>,
        notifications_producer_service: Arc<dyn NotificationsProducerService>,
    ) -> Self {
        tracing::info!("starting consumer");

        let consumer = Consumer::new(
            notifications_dispatch_service,
            notifications_producer_service,
        );
        let worker = ConsumerWorker::new(
            rabbitmq_connection.config().retry_interval,
            topology,
            rabbitmq_connection.connection(),
            consumer,
        );

        let close_notify = Arc::new(Notify::new());
        let close_notify_clone = Arc::clone(&close_notify);
        let task_handle = tokio::spawn(worker.run(close_notify_clone));

        tracing::info!("consumer started");

        Self {
            task_handle,
            close_notify,
        }
    }

    pub async fn close(self) {
        tracing::info!("closing consumer");

        self.close_notify.notify_one();

        // task cannot fail/panic
        self.task_handle.await.unwrap();

        tracing::info!("consumer closed");
    }
}
