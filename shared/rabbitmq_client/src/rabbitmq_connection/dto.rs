use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RabbitmqConnectionConfig {
    /// Interval between reconnect attempts after the connection breaks
    pub retry_interval: Duration,
}
