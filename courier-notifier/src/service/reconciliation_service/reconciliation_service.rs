use super::{reconciliation_worker::ReconciliationWorker, ReconciliationServiceConfig};
use crate::{
    repository::NotificationsRepository,
    service::{
        notifications_producer_service::NotificationsProducerService,
        websockets_service::WebSocketsService,
    },
};
use std::sync::Arc;
use tokio::{sync::Notify, task::JoinHandle};

///
/// Periodic task that closes the delivery gaps the queue alone cannot:
/// in-app records nobody acknowledged and records that never reached
/// the work queue.
///
pub struct ReconciliationService {
    task_handle: JoinHandle<()>,

    close_notify: Arc<Notify>,
}

impl ReconciliationService {
    pub fn new(
        config: ReconciliationServiceConfig,
        notifications_repository: Arc<dyn NotificationsRepository>,
        notifications_producer_service: Arc<dyn NotificationsProducerService>,
        websockets_service: Arc<dyn WebSocketsService>,
    ) -> Self {
        tracing::info!("starting reconciliation");

        let worker = ReconciliationWorker::new(
            config,
            notifications_repository,
            notifications_producer_service,
            websockets_service,
        );

        let close_notify = Arc::new(Notify::new());
        let close_notify_clone = Arc::clone(&close_notify);
        let task_handle = tokio::spawn(worker.run(close_notify_clone));

        tracing::info!("reconciliation started");

        Self {
            task_handle,
            close_notify,
        }
    }

    pub async fn close(self) {
        tracing::info!("closing reconciliation");

        self.close_notify.notify_one();

        // task cannot fail/panic
        self.task_handle.await.unwrap();

        tracing::info!("reconciliation closed");
    }
}
