mod dto;
mod reconciliation_service;
mod reconciliation_worker;

pub use dto::ReconciliationServiceConfig;
pub use reconciliation_service::*;
