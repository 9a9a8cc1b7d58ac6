use super::NotificationsService;
use crate::{
    dto::{input, output, NotificationMessage, NotificationStatus},
    error::Error,
    repository::NotificationsRepository,
    service::notifications_producer_service::NotificationsProducerService,
};
use axum::async_trait;
use bson::oid::ObjectId;
use std::sync::Arc;
use time::OffsetDateTime;

pub struct NotificationsServiceImpl {
    notifications_repository: Arc<dyn NotificationsRepository>,
    notifications_producer_service: Arc<dyn NotificationsProducerService>,
}

impl NotificationsServiceImpl {
    pub fn new(
        notifications_repository: Arc<dyn NotificationsRepository>,
        notifications_producer_service: Arc<dyn NotificationsProducerService>,
    ) -> Self {
        Self {
            notifications_repository,
            notifications_producer_service,
        }
    }

    fn validate_create_notification(notification: &input::Notification) -> Result<(), Error> {
        if notification.content.trim().is_empty() {
            return Err(Error::Validation("content cannot be empty"));
        }

        Ok(())
    }
}

#[async_trait]
impl NotificationsService for NotificationsServiceImpl {
    async fn create_notification(
        &self,
        notification: input::Notification,
    ) -> Result<output::NotificationCreated, Error> {
        tracing::info!("creating notification");
        tracing::trace!(?notification);

        Self::validate_create_notification(&notification)?;

        let inserted_notification = self
            .notifications_repository
            .insert(
                notification.user_id,
                notification.notification_type,
                &notification.content,
                OffsetDateTime::now_utc(),
            )
            .await?;
        let id = inserted_notification.id;
        tracing::info!(id = %id.to_hex(), "created notification");

        // Record is saved either way. On publish failure the caller
        // learns delivery is delayed and the sweeper takes over
        self.notifications_producer_service
            .publish(&NotificationMessage::from(&inserted_notification))
            .await?;

        if let Err(err) = self.notifications_repository.mark_published(id).await {
            // Sweeper may publish the record again, consumption is
            // idempotent by record id
            tracing::warn!(id = %id.to_hex(), %err, "failed to mark record published");
        }

        Ok(output::NotificationCreated { id: id.to_hex() })
    }

    async fn find_user_notifications(
        &self,
        user_id: i64,
    ) -> Result<Vec<output::Notification>, Error> {
        tracing::info!(user_id, "finding notifications");

        let notifications = self.notifications_repository.find_by_user_id(user_id).await?;
        tracing::info!(count = notifications.len(), "found notifications");

        if notifications.is_empty() {
            return Err(Error::NoNotifications);
        }

        let notifications = notifications
            .iter()
            .map(output::Notification::from)
            .collect();

        Ok(notifications)
    }

    async fn redeliver_notification(&self, id: ObjectId) -> Result<(), Error> {
        tracing::info!(id = %id.to_hex(), "redelivering notification");

        let notification = self
            .notifications_repository
            .find_by_id(id)
            .await?
            .ok_or(Error::NotificationNotExist)?;

        let updated = self
            .notifications_repository
            .mark_pending(id, OffsetDateTime::now_utc())
            .await?;
        if !updated {
            return Err(Error::NotificationNotFailed);
        }

        let mut message = NotificationMessage::from(&notification);
        message.status = NotificationStatus::Pending;

        self.notifications_producer_service.publish(&message).await?;

        tracing::info!(id = %id.to_hex(), "notification redelivered");

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        dto::NotificationType,
        repository::{MockNotificationsRepository, Notification},
        service::notifications_producer_service::{self, MockNotificationsProducerService},
    };
    use mockall::predicate::eq;

    #[tokio::test]
    async fn create_notification_record_inserted_and_published() {
        let record = create_record(NotificationType::Email, NotificationStatus::Pending);
        let id = record.id;
        let mut repository = MockNotificationsRepository::new();
        repository
            .expect_insert()
            .once()
            .return_once(move |_, _, _, _| Ok(record));
        repository
            .expect_mark_published()
            .once()
            .with(eq(id))
            .returning(|_| Ok(()));
        let mut producer_service = MockNotificationsProducerService::new();
        producer_service
            .expect_publish()
            .once()
            .withf(move |message| message.id == id)
            .returning(|_| Ok(()));

        let service = create_service(repository, producer_service);

        let created = service
            .create_notification(create_input(NotificationType::Email, "order shipped"))
            .await
            .unwrap();

        assert_eq!(created.id, id.to_hex());
    }

    #[tokio::test]
    async fn create_notification_empty_content_rejected() {
        let service = create_service(
            MockNotificationsRepository::new(),
            MockNotificationsProducerService::new(),
        );

        let result = service
            .create_notification(create_input(NotificationType::Email, "   "))
            .await;

        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn create_notification_publish_failure_record_stays() {
        let record = create_record(NotificationType::Email, NotificationStatus::Pending);
        let mut repository = MockNotificationsRepository::new();
        repository
            .expect_insert()
            .once()
            .return_once(move |_, _, _, _| Ok(record));
        repository.expect_mark_published().never();
        let mut producer_service = MockNotificationsProducerService::new();
        producer_service
            .expect_publish()
            .once()
            .returning(|_| Err(notifications_producer_service::Error::BrokerUnavailable));

        let service = create_service(repository, producer_service);

        let result = service
            .create_notification(create_input(NotificationType::Email, "order shipped"))
            .await;

        assert!(matches!(result, Err(Error::Publish(_))));
    }

    #[tokio::test]
    async fn find_user_notifications_records_returned() {
        let records = vec![
            create_record(NotificationType::Email, NotificationStatus::Sent),
            create_record(NotificationType::InApp, NotificationStatus::Pending),
        ];
        let mut repository = MockNotificationsRepository::new();
        repository
            .expect_find_by_user_id()
            .once()
            .with(eq(1))
            .return_once(move |_| Ok(records));

        let service = create_service(repository, MockNotificationsProducerService::new());

        let notifications = service.find_user_notifications(1).await.unwrap();

        assert_eq!(notifications.len(), 2);
    }

    #[tokio::test]
    async fn find_user_notifications_no_records_not_found() {
        let mut repository = MockNotificationsRepository::new();
        repository
            .expect_find_by_user_id()
            .once()
            .returning(|_| Ok(vec![]));

        let service = create_service(repository, MockNotificationsProducerService::new());

        let result = service.find_user_notifications(1).await;

        assert!(matches!(result, Err(Error::NoNotifications)));
    }

    #[tokio::test]
    async fn redeliver_notification_fresh_retry_budget_published() {
        let record = create_record(NotificationType::Sms, NotificationStatus::Failed);
        let id = record.id;
        let mut repository = MockNotificationsRepository::new();
        repository
            .expect_find_by_id()
            .once()
            .with(eq(id))
            .return_once(move |_| Ok(Some(record)));
        repository
            .expect_mark_pending()
            .once()
            .returning(|_, _| Ok(true));
        let mut producer_service = MockNotificationsProducerService::new();
        producer_service
            .expect_publish()
            .once()
            .withf(move |message| {
                message.id == id
                    && message.retry_count == 0
                    && message.status == NotificationStatus::Pending
            })
            .returning(|_| Ok(()));

        let service = create_service(repository, producer_service);

        service.redeliver_notification(id).await.unwrap();
    }

    #[tokio::test]
    async fn redeliver_notification_record_not_exist() {
        let mut repository = MockNotificationsRepository::new();
        repository.expect_find_by_id().once().returning(|_| Ok(None));

        let service = create_service(repository, MockNotificationsProducerService::new());

        let result = service.redeliver_notification(ObjectId::new()).await;

        assert!(matches!(result, Err(Error::NotificationNotExist)));
    }

    #[tokio::test]
    async fn redeliver_notification_record_not_failed_conflict() {
        let record = create_record(NotificationType::Sms, NotificationStatus::Sent);
        let mut repository = MockNotificationsRepository::new();
        repository
            .expect_find_by_id()
            .once()
            .return_once(move |_| Ok(Some(record)));
        repository
            .expect_mark_pending()
            .once()
            .returning(|_, _| Ok(false));

        let service = create_service(repository, MockNotificationsProducerService::new());

        let result = service.redeliver_notification(ObjectId::new()).await;

        assert!(matches!(result, Err(Error::NotificationNotFailed)));
    }

    fn create_service(
        repository: MockNotificationsRepository,
        producer_service: MockNotificationsProducerService,
    ) -> NotificationsServiceImpl {
        NotificationsServiceImpl::new(Arc::new(repository), Arc::new(producer_service))
    }

    fn create_input(notification_type: NotificationType, content: &str) -> input::Notification {
        input::Notification {
            user_id: 1,
            notification_type,
            content: content.to_string(),
        }
    }

    fn create_record(
        notification_type: NotificationType,
        status: NotificationStatus,
    ) -> Notification {
        Notification {
            id: ObjectId::new(),
            user_id: 1,
            notification_type,
            content: "order shipped".to_string(),
            status,
            timestamp: OffsetDateTime::now_utc(),
            published: false,
        }
    }
}
