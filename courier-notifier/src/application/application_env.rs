use anyhow::anyhow;
use std::{net::SocketAddr, time::Duration};

pub struct ApplicationEnv {
    pub log_directory: String,
    pub log_filename: String,

    pub bind_address: SocketAddr,

    pub db_connection_string: String,
    pub db_name: String,

    pub rabbitmq_connection_string: String,
    pub rabbitmq_notifications_exchange_name: String,
    pub rabbitmq_notifications_routing_key: String,
    pub rabbitmq_notifications_queue_name: String,
    pub rabbitmq_retry_interval: Duration,

    /// How long a message sits on the retry queue before redelivery
    pub retry_ttl: Duration,
    pub max_retries: u32,

    pub reconciliation_interval: Duration,
    pub publish_grace_period: Duration,

    pub websocket_connection_buffer_size: usize,

    pub mailgun_api_key: String,
    pub mailgun_domain: String,
    pub mailgun_recipient: String,

    pub twilio_account_sid: String,
    pub twilio_auth_token: String,
    pub twilio_from_number: String,
    pub twilio_recipient: String,
}

impl ApplicationEnv {
    pub fn parse() -> anyhow::Result<Self> {
        let log_directory = Self::env_var("COURIER_NOTIFIER_LOG_DIRECTORY")?;
        let log_filename = Self::env_var("COURIER_NOTIFIER_LOG_FILENAME")?;
        let bind_address = Self::env_var("COURIER_NOTIFIER_BIND_ADDRESS")?.parse()?;
        let db_connection_string = Self::env_var("COURIER_NOTIFIER_DB_CONNECTION_STRING")?;
        let db_name = Self::env_var("COURIER_NOTIFIER_DB_NAME")?;
        let rabbitmq_connection_string =
            Self::env_var("COURIER_NOTIFIER_RABBITMQ_CONNECTION_STRING")?;
        let rabbitmq_notifications_exchange_name =
            Self::env_var("COURIER_NOTIFIER_RABBITMQ_NOTIFICATIONS_EXCHANGE_NAME")?;
        let rabbitmq_notifications_routing_key =
            Self::env_var("COURIER_NOTIFIER_RABBITMQ_NOTIFICATIONS_ROUTING_KEY")?;
        let rabbitmq_notifications_queue_name =
            Self::env_var("COURIER_NOTIFIER_RABBITMQ_NOTIFICATIONS_QUEUE_NAME")?;
        let rabbitmq_retry_interval =
            Self::env_var_or("COURIER_NOTIFIER_RABBITMQ_RETRY_INTERVAL", "5")?.parse()?;
        let rabbitmq_retry_interval = Duration::from_secs(rabbitmq_retry_interval);
        let retry_ttl = Self::env_var_or("COURIER_NOTIFIER_RETRY_TTL_MS", "10000")?.parse()?;
        let retry_ttl = Duration::from_millis(retry_ttl);
        let max_retries = Self::env_var_or("COURIER_NOTIFIER_MAX_RETRIES", "5")?.parse()?;
        let reconciliation_interval =
            Self::env_var_or("COURIER_NOTIFIER_RECONCILIATION_INTERVAL", "10")?.parse()?;
        let reconciliation_interval = Duration::from_secs(reconciliation_interval);
        let publish_grace_period =
            Self::env_var_or("COURIER_NOTIFIER_PUBLISH_GRACE_PERIOD", "30")?.parse()?;
        let publish_grace_period = Duration::from_secs(publish_grace_period);
        let websocket_connection_buffer_size =
            Self::env_var_or("COURIER_NOTIFIER_WEBSOCKET_CONNECTION_BUFFER_SIZE", "16")?.parse()?;
        let mailgun_api_key = Self::env_var("COURIER_NOTIFIER_MAILGUN_API_KEY")?;
        let mailgun_domain = Self::env_var("COURIER_NOTIFIER_MAILGUN_DOMAIN")?;
        let mailgun_recipient = Self::env_var("COURIER_NOTIFIER_MAILGUN_RECIPIENT")?;
        let twilio_account_sid = Self::env_var("COURIER_NOTIFIER_TWILIO_ACCOUNT_SID")?;
        let twilio_auth_token = Self::env_var("COURIER_NOTIFIER_TWILIO_AUTH_TOKEN")?;
        let twilio_from_number = Self::env_var("COURIER_NOTIFIER_TWILIO_FROM_NUMBER")?;
        let twilio_recipient = Self::env_var("COURIER_NOTIFIER_TWILIO_RECIPIENT")?;

        Ok(Self {
            log_directory,
            log_filename,
            bind_address,
            db_connection_string,
            db_name,
            rabbitmq_connection_string,
            rabbitmq_notifications_exchange_name,
            rabbitmq_notifications_routing_key,
            rabbitmq_notifications_queue_name,
            rabbitmq_retry_interval,
            retry_ttl,
            max_retries,
            reconciliation_interval,
            publish_grace_period,
            websocket_connection_buffer_size,
            mailgun_api_key,
            mailgun_domain,
            mailgun_recipient,
            twilio_account_sid,
            twilio_auth_token,
            twilio_from_number,
            twilio_recipient,
        })
    }

    fn env_var(name: &'static str) -> anyhow::Result<String> {
        std::env::var(name).map_err(|_| anyhow!("environment variable {name} not set"))
    }

    fn env_var_or(name: &'static str, default: &str) -> anyhow::Result<String> {
        match std::env::var(name) {
            Ok(value) => Ok(value),
            Err(std::env::VarError::NotPresent) => Ok(default.to_string()),
            Err(err) => Err(anyhow!("environment variable {name} invalid: {err}")),
        }
    }
}
