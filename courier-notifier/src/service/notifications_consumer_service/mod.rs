mod consumer;
mod consumer_channel_callback;
mod consumer_worker;
mod delivery_acknowledger;
mod notifications_consumer_service;

pub use notifications_consumer_service::*;
