#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("broker unavailable")]
    BrokerUnavailable,

    #[error("amqp error: {0}")]
    Amqp(#[from] amqprs::error::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
