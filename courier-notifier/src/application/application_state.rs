use super::ApplicationEnv;
use crate::{
    repository::NotificationsRepositoryImpl,
    service::{
        channel_sender::{
            MailgunEmailSender, MailgunEmailSenderConfig, TwilioSmsSender, TwilioSmsSenderConfig,
        },
        notifications_consumer_service::NotificationsConsumerService,
        notifications_dispatch_service::NotificationsDispatchServiceImpl,
        notifications_producer_service::RabbitmqNotificationsProducerService,
        notifications_service::{NotificationsService, NotificationsServiceImpl},
        queue_topology::QueueTopology,
        reconciliation_service::{ReconciliationService, ReconciliationServiceConfig},
        websockets_service::{WebSocketsService, WebSocketsServiceConfig, WebSocketsServiceImpl},
    },
};
use amqprs::connection::OpenConnectionArguments;
use axum::extract::FromRef;
use mongodb::{options::ClientOptions, Client};
use rabbitmq_client::{RabbitmqConnection, RabbitmqConnectionConfig};
use std::sync::Arc;

#[derive(Clone, FromRef)]
pub struct ApplicationState {
    pub notifications_service: Arc<dyn NotificationsService>,
    pub websockets_service: Arc<dyn WebSocketsService>,
}

pub struct ApplicationStateToClose {
    pub db_client: Client,
    pub rabbitmq_connection: RabbitmqConnection,
    pub rabbitmq_producer_service: Arc<RabbitmqNotificationsProducerService>,
    pub rabbitmq_consumer_service: NotificationsConsumerService,
    pub reconciliation_service: ReconciliationService,
}

pub async fn create_state(
    env: &ApplicationEnv,
) -> anyhow::Result<(ApplicationState, ApplicationStateToClose)> {
    tracing::info!("connecting to database");
    let db_client_options = ClientOptions::parse(&env.db_connection_string).await?;
    let db_client = Client::with_options(db_client_options)?;
    let db = db_client.database(&env.db_name);

    tracing::info!("creating repositories");
    let notifications_repository = NotificationsRepositoryImpl::new(db).await?;
    let notifications_repository = Arc::new(notifications_repository);

    tracing::info!("creating services");
    let config = RabbitmqConnectionConfig {
        retry_interval: env.rabbitmq_retry_interval,
    };
    let open_connection_args =
        OpenConnectionArguments::try_from(env.rabbitmq_connection_string.as_str())?;
    let rabbitmq_connection = RabbitmqConnection::new(config, open_connection_args).await?;

    let topology = QueueTopology::new(
        env.rabbitmq_notifications_exchange_name.clone(),
        env.rabbitmq_notifications_routing_key.clone(),
        env.rabbitmq_notifications_queue_name.clone(),
        env.retry_ttl,
    )?;

    let rabbitmq_producer_service = RabbitmqNotificationsProducerService::new(
        topology.clone(),
        rabbitmq_connection.clone(),
    )
    .await?;
    let rabbitmq_producer_service = Arc::new(rabbitmq_producer_service);

    let config = WebSocketsServiceConfig {
        connection_buffer_size: env.websocket_connection_buffer_size,
    };
    let websockets_service =
        WebSocketsServiceImpl::new(config, notifications_repository.clone());
    let websockets_service = Arc::new(websockets_service);

    let email_sender = MailgunEmailSender::new(MailgunEmailSenderConfig {
        api_key: env.mailgun_api_key.clone(),
        domain: env.mailgun_domain.clone(),
        recipient: env.mailgun_recipient.clone(),
    });
    let sms_sender = TwilioSmsSender::new(TwilioSmsSenderConfig {
        account_sid: env.twilio_account_sid.clone(),
        auth_token: env.twilio_auth_token.clone(),
        from_number: env.twilio_from_number.clone(),
        recipient: env.twilio_recipient.clone(),
    });

    let dispatch_service = NotificationsDispatchServiceImpl::new(
        env.max_retries,
        Arc::new(email_sender),
        Arc::new(sms_sender),
        notifications_repository.clone(),
        websockets_service.clone(),
    );
    let dispatch_service = Arc::new(dispatch_service);

    let rabbitmq_consumer_service = NotificationsConsumerService::new(
        topology,
        rabbitmq_connection.clone(),
        dispatch_service,
        rabbitmq_producer_service.clone(),
    );

    let config = ReconciliationServiceConfig {
        interval: env.reconciliation_interval,
        publish_grace_period: env.publish_grace_period,
    };
    let reconciliation_service = ReconciliationService::new(
        config,
        notifications_repository.clone(),
        rabbitmq_producer_service.clone(),
        websockets_service.clone(),
    );

    let notifications_service = NotificationsServiceImpl::new(
        notifications_repository,
        rabbitmq_producer_service.clone(),
    );
    let notifications_service = Arc::new(notifications_service);

    Ok((
        ApplicationState {
            notifications_service,
            websockets_service,
        },
        ApplicationStateToClose {
            db_client,
            rabbitmq_connection,
            rabbitmq_producer_service,
            rabbitmq_consumer_service,
            reconciliation_service,
        },
    ))
}
