use super::{websocket_connection::WebSocketConnection, WebSocketsService, WebSocketsServiceConfig};
use crate::{
    dto::{output::WsServerEvent, NotificationMessage},
    repository::NotificationsRepository,
};
use axum::{async_trait, extract::ws::WebSocket};
use futures::StreamExt;
use std::{net::SocketAddr, sync::Arc};
use tokio::sync::broadcast;

pub struct WebSocketsServiceImpl {
    events_tx: broadcast::Sender<Arc<WsServerEvent>>,

    notifications_repository: Arc<dyn NotificationsRepository>,
}

impl WebSocketsServiceImpl {
    pub fn new(
        config: WebSocketsServiceConfig,
        notifications_repository: Arc<dyn NotificationsRepository>,
    ) -> Self {
        let (events_tx, _) = broadcast::channel(config.connection_buffer_size);

        Self {
            events_tx,
            notifications_repository,
        }
    }

    fn send_event(&self, event: WsServerEvent) {
        let event = Arc::new(event);
        let receivers = self.events_tx.send(event).unwrap_or(0);

        tracing::info!(receivers, "queued event to be sent");
    }
}

#[async_trait]
impl WebSocketsService for WebSocketsServiceImpl {
    async fn handle_client(&self, address: SocketAddr, websocket: WebSocket) {
        let events_rx = self.events_tx.subscribe();
        let (ws_tx, ws_rx) = websocket.split();

        let connection = WebSocketConnection::new(
            address,
            events_rx,
            ws_tx,
            ws_rx,
            Arc::clone(&self.notifications_repository),
        );

        connection.run().await;
    }

    async fn send_notification(&self, content: &str) {
        self.send_event(WsServerEvent::Notification {
            message: content.to_string(),
        });
    }

    async fn send_check_in_app(&self, notification: NotificationMessage) {
        self.send_event(WsServerEvent::CheckInApp(notification));
    }
}
