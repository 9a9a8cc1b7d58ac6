use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ReconciliationServiceConfig {
    pub interval: Duration,

    ///
    /// How long a `pending` record may stay unpublished before the
    /// sweeper puts it on the work queue itself.
    ///
    pub publish_grace_period: Duration,
}
