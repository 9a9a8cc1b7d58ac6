use super::{DispatchOutcome, NotificationsDispatchService};
use crate::{
    dto::{NotificationMessage, NotificationType},
    repository::NotificationsRepository,
    service::{channel_sender::ChannelSender, websockets_service::WebSocketsService},
};
use axum::async_trait;
use std::sync::Arc;
use time::OffsetDateTime;

pub struct NotificationsDispatchServiceImpl {
    max_retries: u32,

    email_sender: Arc<dyn ChannelSender>,
    sms_sender: Arc<dyn ChannelSender>,
    notifications_repository: Arc<dyn NotificationsRepository>,
    websockets_service: Arc<dyn WebSocketsService>,
}

impl NotificationsDispatchServiceImpl {
    pub fn new(
        max_retries: u32,
        email_sender: Arc<dyn ChannelSender>,
        sms_sender: Arc<dyn ChannelSender>,
        notifications_repository: Arc<dyn NotificationsRepository>,
        websockets_service: Arc<dyn WebSocketsService>,
    ) -> Self {
        Self {
            max_retries,
            email_sender,
            sms_sender,
            notifications_repository,
            websockets_service,
        }
    }

    async fn dispatch_external(
        &self,
        sender: &dyn ChannelSender,
        notification: NotificationMessage,
    ) -> DispatchOutcome {
        match sender.send(&notification.content).await {
            Ok(()) => self.complete_sent(notification).await,
            Err(err) => {
                tracing::warn!(%err, "sending notification failed");
                self.retry_or_fail(notification).await
            }
        }
    }

    ///
    /// In-app delivery marks the record sent before pushing it, so a
    /// redelivered message whose record is already sent is consumed
    /// without a second push.
    ///
    async fn dispatch_in_app(&self, notification: NotificationMessage) -> DispatchOutcome {
        let mark_sent_result = self
            .notifications_repository
            .mark_sent(notification.id, OffsetDateTime::now_utc())
            .await;

        match mark_sent_result {
            Ok(true) => {
                self.websockets_service
                    .send_notification(&notification.content)
                    .await;
                tracing::info!("notification pushed");
                DispatchOutcome::Completed
            }
            Ok(false) => {
                tracing::debug!("record already sent, push skipped");
                DispatchOutcome::Completed
            }
            Err(err) => {
                tracing::warn!(%err, "marking record sent failed");
                self.retry_or_fail(notification).await
            }
        }
    }

    async fn complete_sent(&self, notification: NotificationMessage) -> DispatchOutcome {
        let mark_sent_result = self
            .notifications_repository
            .mark_sent(notification.id, OffsetDateTime::now_utc())
            .await;

        match mark_sent_result {
            Ok(true) => {
                tracing::info!("notification sent");
                DispatchOutcome::Completed
            }
            Ok(false) => {
                tracing::debug!("record already sent");
                DispatchOutcome::Completed
            }
            Err(err) => {
                // Provider accepted the message but the record still says
                // pending. Retrying is safe since `sent` is absorbing.
                tracing::warn!(%err, "marking record sent failed");
                self.retry_or_fail(notification).await
            }
        }
    }

    async fn retry_or_fail(&self, mut notification: NotificationMessage) -> DispatchOutcome {
        notification.retry_count += 1;

        if notification.retry_count <= self.max_retries {
            tracing::info!(
                retry_count = notification.retry_count,
                max_retries = self.max_retries,
                "scheduling retry"
            );
            return DispatchOutcome::Retry(notification);
        }

        tracing::warn!(
            max_retries = self.max_retries,
            "retries exhausted, marking record failed"
        );

        let mark_failed_result = self
            .notifications_repository
            .mark_failed(notification.id, OffsetDateTime::now_utc())
            .await;

        match mark_failed_result {
            Ok(_) => DispatchOutcome::Completed,
            Err(err) => {
                tracing::error!(%err, "marking record failed failed, rejecting message");
                DispatchOutcome::Reject
            }
        }
    }
}

#[async_trait]
impl NotificationsDispatchService for NotificationsDispatchServiceImpl {
    #[tracing::instrument(
        name = "Dispatch",
        skip_all,
        fields(
            id = %notification.id.to_hex(),
            notification_type = %notification.notification_type,
            retry_count = notification.retry_count,
        )
    )]
    async fn dispatch(&self, notification: NotificationMessage) -> DispatchOutcome {
        match notification.notification_type {
            NotificationType::Email => {
                self.dispatch_external(self.email_sender.as_ref(), notification)
                    .await
            }
            NotificationType::Sms => {
                self.dispatch_external(self.sms_sender.as_ref(), notification)
                    .await
            }
            NotificationType::InApp => self.dispatch_in_app(notification).await,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        dto::NotificationStatus,
        repository::{self, MockNotificationsRepository},
        service::{
            channel_sender::{self, MockChannelSender},
            websockets_service::MockWebSocketsService,
        },
    };
    use bson::oid::ObjectId;
    use reqwest::StatusCode;

    const MAX_RETRIES: u32 = 5;

    #[tokio::test]
    async fn dispatch_email_sent_record_marked_sent() {
        let mut email_sender = MockChannelSender::new();
        email_sender
            .expect_send()
            .once()
            .withf(|content| content == "hello")
            .returning(|_| Ok(()));
        let mut repository = MockNotificationsRepository::new();
        repository
            .expect_mark_sent()
            .once()
            .returning(|_, _| Ok(true));

        let service = create_service(ServiceMocks {
            email_sender,
            repository,
            ..ServiceMocks::default()
        });

        let outcome = service
            .dispatch(create_notification(NotificationType::Email, 0))
            .await;

        assert!(matches!(outcome, DispatchOutcome::Completed));
    }

    #[tokio::test]
    async fn dispatch_sms_routed_to_sms_sender() {
        let mut sms_sender = MockChannelSender::new();
        sms_sender.expect_send().once().returning(|_| Ok(()));
        let mut repository = MockNotificationsRepository::new();
        repository
            .expect_mark_sent()
            .once()
            .returning(|_, _| Ok(true));

        let service = create_service(ServiceMocks {
            sms_sender,
            repository,
            ..ServiceMocks::default()
        });

        let outcome = service
            .dispatch(create_notification(NotificationType::Sms, 0))
            .await;

        assert!(matches!(outcome, DispatchOutcome::Completed));
    }

    #[tokio::test]
    async fn dispatch_sender_failure_retry_scheduled_with_incremented_count() {
        let mut email_sender = MockChannelSender::new();
        email_sender
            .expect_send()
            .once()
            .returning(|_| Err(channel_sender::Error::Rejected(StatusCode::BAD_GATEWAY)));

        let service = create_service(ServiceMocks {
            email_sender,
            ..ServiceMocks::default()
        });

        let outcome = service
            .dispatch(create_notification(NotificationType::Email, 2))
            .await;

        let DispatchOutcome::Retry(retried) = outcome else {
            panic!("invalid outcome");
        };
        assert_eq!(retried.retry_count, 3);
    }

    #[tokio::test]
    async fn dispatch_retries_exhausted_record_marked_failed() {
        let mut email_sender = MockChannelSender::new();
        email_sender
            .expect_send()
            .once()
            .returning(|_| Err(channel_sender::Error::Rejected(StatusCode::BAD_GATEWAY)));
        let mut repository = MockNotificationsRepository::new();
        repository
            .expect_mark_failed()
            .once() // Most important assertion
            .returning(|_, _| Ok(true));

        let service = create_service(ServiceMocks {
            email_sender,
            repository,
            ..ServiceMocks::default()
        });

        let outcome = service
            .dispatch(create_notification(NotificationType::Email, MAX_RETRIES))
            .await;

        assert!(matches!(outcome, DispatchOutcome::Completed));
    }

    #[tokio::test]
    async fn dispatch_mark_failed_store_error_message_rejected() {
        let mut email_sender = MockChannelSender::new();
        email_sender
            .expect_send()
            .once()
            .returning(|_| Err(channel_sender::Error::Rejected(StatusCode::BAD_GATEWAY)));
        let mut repository = MockNotificationsRepository::new();
        repository
            .expect_mark_failed()
            .once()
            .returning(|_, _| Err(repository::Error::NoDocumentUpdated));

        let service = create_service(ServiceMocks {
            email_sender,
            repository,
            ..ServiceMocks::default()
        });

        let outcome = service
            .dispatch(create_notification(NotificationType::Email, MAX_RETRIES))
            .await;

        assert!(matches!(outcome, DispatchOutcome::Reject));
    }

    #[tokio::test]
    async fn dispatch_mark_sent_store_error_retry_scheduled() {
        let mut email_sender = MockChannelSender::new();
        email_sender.expect_send().once().returning(|_| Ok(()));
        let mut repository = MockNotificationsRepository::new();
        repository
            .expect_mark_sent()
            .once()
            .returning(|_, _| Err(repository::Error::NoDocumentUpdated));

        let service = create_service(ServiceMocks {
            email_sender,
            repository,
            ..ServiceMocks::default()
        });

        let outcome = service
            .dispatch(create_notification(NotificationType::Email, 0))
            .await;

        assert!(matches!(outcome, DispatchOutcome::Retry(_)));
    }

    #[tokio::test]
    async fn dispatch_in_app_record_marked_sent_before_push() {
        let mut repository = MockNotificationsRepository::new();
        repository
            .expect_mark_sent()
            .once()
            .returning(|_, _| Ok(true));
        let mut websockets_service = MockWebSocketsService::new();
        websockets_service
            .expect_send_notification()
            .once()
            .withf(|content| content == "hello")
            .returning(|_| ());

        let service = create_service(ServiceMocks {
            repository,
            websockets_service,
            ..ServiceMocks::default()
        });

        let outcome = service
            .dispatch(create_notification(NotificationType::InApp, 0))
            .await;

        assert!(matches!(outcome, DispatchOutcome::Completed));
    }

    #[tokio::test]
    async fn dispatch_in_app_duplicate_delivery_push_skipped() {
        let mut repository = MockNotificationsRepository::new();
        repository
            .expect_mark_sent()
            .once()
            .returning(|_, _| Ok(false));
        let mut websockets_service = MockWebSocketsService::new();
        websockets_service.expect_send_notification().never();

        let service = create_service(ServiceMocks {
            repository,
            websockets_service,
            ..ServiceMocks::default()
        });

        let outcome = service
            .dispatch(create_notification(NotificationType::InApp, 0))
            .await;

        assert!(matches!(outcome, DispatchOutcome::Completed));
    }

    #[tokio::test]
    async fn dispatch_in_app_store_error_retry_scheduled() {
        let mut repository = MockNotificationsRepository::new();
        repository
            .expect_mark_sent()
            .once()
            .returning(|_, _| Err(repository::Error::NoDocumentUpdated));

        let service = create_service(ServiceMocks {
            repository,
            ..ServiceMocks::default()
        });

        let outcome = service
            .dispatch(create_notification(NotificationType::InApp, 1))
            .await;

        let DispatchOutcome::Retry(retried) = outcome else {
            panic!("invalid outcome");
        };
        assert_eq!(retried.retry_count, 2);
    }

    struct ServiceMocks {
        email_sender: MockChannelSender,
        sms_sender: MockChannelSender,
        repository: MockNotificationsRepository,
        websockets_service: MockWebSocketsService,
    }

    impl Default for ServiceMocks {
        fn default() -> Self {
            Self {
                email_sender: MockChannelSender::new(),
                sms_sender: MockChannelSender::new(),
                repository: MockNotificationsRepository::new(),
                websockets_service: MockWebSocketsService::new(),
            }
        }
    }

    fn create_service(mocks: ServiceMocks) -> NotificationsDispatchServiceImpl {
        NotificationsDispatchServiceImpl::new(
            MAX_RETRIES,
            Arc::new(mocks.email_sender),
            Arc::new(mocks.sms_sender),
            Arc::new(mocks.repository),
            Arc::new(mocks.websockets_service),
        )
    }

    fn create_notification(
        notification_type: NotificationType,
        retry_count: u32,
    ) -> NotificationMessage {
        NotificationMessage {
            id: ObjectId::new(),
            user_id: 1,
            notification_type,
            content: "hello".to_string(),
            status: NotificationStatus::Pending,
            timestamp: OffsetDateTime::now_utc(),
            retry_count,
        }
    }
}
