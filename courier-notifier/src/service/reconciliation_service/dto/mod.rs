mod reconciliation_service_config;

pub use reconciliation_service_config::*;
