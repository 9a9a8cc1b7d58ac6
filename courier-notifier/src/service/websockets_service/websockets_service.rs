use crate::dto::NotificationMessage;
use axum::{async_trait, extract::ws::WebSocket};
use std::net::SocketAddr;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WebSocketsService: Send + Sync {
    ///
    /// Runs the connection until the client disconnects
    /// or falls too far behind.
    ///
    async fn handle_client(&self, address: SocketAddr, websocket: WebSocket);

    ///
    /// Pushes in-app notification content to every connected client.
    ///
    async fn send_notification(&self, content: &str);

    ///
    /// Re-emits a record stuck in `pending`/`failed` so clients can
    /// acknowledge it with a `request-notif` frame.
    ///
    async fn send_check_in_app(&self, notification: NotificationMessage);
}
