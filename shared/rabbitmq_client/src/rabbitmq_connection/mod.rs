mod dto;
mod rabbitmq_connection;
mod rabbitmq_connection_callback;

pub use dto::RabbitmqConnectionConfig;
pub use rabbitmq_connection::RabbitmqConnection;
