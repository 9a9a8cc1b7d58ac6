mod dto;
mod error;
mod websocket_connection;
mod websockets_service;
mod websockets_service_impl;

pub use dto::WebSocketsServiceConfig;
pub use websockets_service::*;
pub use websockets_service_impl::*;
