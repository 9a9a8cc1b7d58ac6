mod error;
mod notifications_producer_service;
mod rabbitmq_notifications_producer_service;

pub use error::*;
pub use notifications_producer_service::*;
pub use rabbitmq_notifications_producer_service::*;
