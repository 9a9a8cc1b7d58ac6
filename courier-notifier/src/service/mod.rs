pub mod channel_sender;
pub mod notifications_consumer_service;
pub mod notifications_dispatch_service;
pub mod notifications_producer_service;
pub mod notifications_service;
pub mod queue_topology;
pub mod reconciliation_service;
pub mod websockets_service;
