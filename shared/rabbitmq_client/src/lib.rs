mod rabbitmq_connection;
mod retry;

pub use rabbitmq_connection::{RabbitmqConnection, RabbitmqConnectionConfig};
pub use retry::retry;
