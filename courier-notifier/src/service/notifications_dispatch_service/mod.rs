mod notifications_dispatch_service;
mod notifications_dispatch_service_impl;

pub use notifications_dispatch_service::*;
pub use notifications_dispatch_service_impl::*;
