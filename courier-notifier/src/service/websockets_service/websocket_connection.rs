use super::error::Error;
use crate::{
    dto::{input::WsClientEvent, output::WsServerEvent, NotificationMessage},
    repository::NotificationsRepository,
};
use anyhow::anyhow;
use axum::extract::ws::Message;
use futures::{Sink, SinkExt, Stream, StreamExt};
use std::{fmt::Display, net::SocketAddr, sync::Arc};
use time::OffsetDateTime;
use tokio::sync::broadcast;

pub struct WebSocketConnection<WebSocketSink, WebSocketStream> {
    user_address: SocketAddr,

    events_rx: broadcast::Receiver<Arc<WsServerEvent>>,
    ws_tx: WebSocketSink,
    ws_rx: WebSocketStream,

    notifications_repository: Arc<dyn NotificationsRepository>,
}

impl<WebSocketSink, WebSocketStream, SinkError, StreamError>
    WebSocketConnection<WebSocketSink, WebSocketStream>
where
    WebSocketSink: Sink<Message, Error = SinkError> + Unpin,
    WebSocketStream: Stream<Item = Result<Message, StreamError>> + Unpin,
    SinkError: Display,
    StreamError: Display,
{
    pub fn new(
        user_address: SocketAddr,
        events_rx: broadcast::Receiver<Arc<WsServerEvent>>,
        ws_tx: WebSocketSink,
        ws_rx: WebSocketStream,
        notifications_repository: Arc<dyn NotificationsRepository>,
    ) -> Self {
        Self {
            user_address,
            events_rx,
            ws_tx,
            ws_rx,
            notifications_repository,
        }
    }

    #[tracing::instrument(
        name = "WebSocket",
        skip_all,
        fields(address = %self.user_address)
    )]
    pub async fn run(mut self) {
        match self.try_run().await {
            Ok(()) => (),
            Err(Error::Close(message)) => {
                tracing::info!("closing connection: {message}");
            }
            Err(Error::Anyhow(err)) => {
                tracing::warn!("{err}");
            }
        }

        tracing::info!("closing websocket");
        match self.ws_tx.close().await {
            Ok(()) => tracing::info!("websocket closed"),
            Err(err) => tracing::warn!(%err, "failed to close websocket"),
        }
    }

    async fn try_run(&mut self) -> Result<(), Error> {
        self.send_event(&WsServerEvent::Connect {
            message: "connected".to_string(),
        })
        .await?;

        loop {
            tokio::select! {
                biased;

                // Wait for frame from the user
                message = self.ws_rx.next() => {
                    self.process_incoming_message(message).await?;
                }

                // Wait for new event to push
                event = self.events_rx.recv() => {
                    self.process_event(event).await?;
                }
            }
        }
    }

    async fn process_incoming_message(
        &mut self,
        message: Option<Result<Message, StreamError>>,
    ) -> Result<(), Error> {
        match message {
            Some(Ok(Message::Text(payload))) => {
                tracing::debug!("processing client frame");
                self.process_incoming_text_message(&payload).await?;
                tracing::debug!("processed client frame");
            }
            Some(Ok(Message::Binary(_))) => {
                return Err(Error::Anyhow(anyhow!("received binary message")));
            }
            Some(Ok(Message::Ping(_))) => tracing::trace!("processed ping message"),
            Some(Ok(Message::Pong(_))) => tracing::trace!("processed pong message"),
            Some(Ok(Message::Close(_))) => {
                return Err(Error::Close("received close message"));
            }
            Some(Err(err)) => {
                return Err(Error::Anyhow(anyhow!(
                    "failed to read incoming message: {err}"
                )));
            }
            None => return Err(Error::Anyhow(anyhow!("incoming messages stream closed"))),
        }

        Ok(())
    }

    async fn process_incoming_text_message(&mut self, payload: &str) -> Result<(), Error> {
        let event = match serde_json::from_str::<WsClientEvent>(payload) {
            Ok(event) => event,
            Err(err) => {
                // Unknown frames from a client don't kill the connection
                tracing::debug!(%err, "ignoring malformed client frame");
                return Ok(());
            }
        };

        match event {
            WsClientEvent::RequestNotif(notification) => {
                self.process_request_notif(notification).await?;
            }
        }

        Ok(())
    }

    ///
    /// Client acknowledged a `check-in-app` record. Marking it sent is
    /// guarded, so a record acknowledged by another client is skipped
    /// instead of pushed twice.
    ///
    async fn process_request_notif(
        &mut self,
        notification: NotificationMessage,
    ) -> Result<(), Error> {
        let id = notification.id;
        let mark_sent_result = self
            .notifications_repository
            .mark_sent(id, OffsetDateTime::now_utc())
            .await;

        match mark_sent_result {
            Ok(true) => {
                tracing::info!(id = %id.to_hex(), "record acknowledged");
                self.send_event(&WsServerEvent::Notification {
                    message: notification.content,
                })
                .await?;
            }
            Ok(false) => {
                tracing::debug!(id = %id.to_hex(), "record already sent");
            }
            Err(err) => {
                tracing::warn!(id = %id.to_hex(), %err, "marking record sent failed");
                if let Err(err) = self
                    .notifications_repository
                    .mark_failed(id, OffsetDateTime::now_utc())
                    .await
                {
                    tracing::warn!(id = %id.to_hex(), %err, "marking record failed failed");
                }
            }
        }

        Ok(())
    }

    async fn process_event(
        &mut self,
        event: Result<Arc<WsServerEvent>, broadcast::error::RecvError>,
    ) -> Result<(), Error> {
        match event {
            Err(broadcast::error::RecvError::Lagged(count)) => Err(Error::Anyhow(anyhow!(
                "connection lagged. skipped events: {count}"
            ))),
            Err(broadcast::error::RecvError::Closed) => {
                Err(Error::Close("connection forcefully closed"))
            }
            Ok(event) => {
                tracing::info!("sending event");
                self.send_event(event.as_ref()).await?;
                tracing::info!("sent event");

                Ok(())
            }
        }
    }

    async fn send_event(&mut self, event: &WsServerEvent) -> Result<(), Error> {
        let payload = serde_json::to_string(event)
            .map_err(|err| anyhow!("failed to serialize event: {err}"))?;

        self.ws_tx
            .send(Message::Text(payload))
            .await
            .map_err(|err| anyhow!("sending event failed: {err}"))?;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        dto::{NotificationStatus, NotificationType},
        repository::{self, MockNotificationsRepository},
    };
    use bson::oid::ObjectId;
    use mockall::predicate::eq;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn connect_greeting_sent_on_attach() {
        let repository = MockNotificationsRepository::new();
        let (_handle, _ws_tx, mut ws_rx, _events_tx) = start_test_connection(repository);

        let message = timeout(Duration::from_secs(1), ws_rx.next())
            .await
            .unwrap() // timeout
            .unwrap(); // message
        let Message::Text(payload) = message else {
            panic!("invalid message type");
        };

        let json = serde_json::from_str::<serde_json::Value>(&payload).unwrap();
        assert_eq!(json["event"], "connect");
    }

    #[tokio::test]
    async fn event_pushed_to_the_client() {
        let repository = MockNotificationsRepository::new();
        let (_handle, _ws_tx, mut ws_rx, events_tx) = start_test_connection(repository);

        skip_greeting(&mut ws_rx).await;

        let event = Arc::new(WsServerEvent::Notification {
            message: "fresh content".to_string(),
        });
        let _ = events_tx.send(event);

        let message = timeout(Duration::from_secs(1), ws_rx.next())
            .await
            .unwrap()
            .unwrap();
        let Message::Text(payload) = message else {
            panic!("invalid message type");
        };

        let json = serde_json::from_str::<serde_json::Value>(&payload).unwrap();
        assert_eq!(json["event"], "notification");
        assert_eq!(json["data"]["message"], "fresh content");
    }

    #[tokio::test]
    async fn request_notif_record_marked_sent_and_content_pushed() {
        let id = ObjectId::new();
        let mut repository = MockNotificationsRepository::new();
        repository
            .expect_mark_sent()
            .once()
            .with(eq(id), mockall::predicate::always())
            .returning(|_, _| Ok(true));

        let (_handle, mut ws_tx, mut ws_rx, _events_tx) = start_test_connection(repository);

        skip_greeting(&mut ws_rx).await;

        ws_tx
            .send(Ok(Message::Text(request_notif_frame(id))))
            .await
            .unwrap();

        let message = timeout(Duration::from_secs(1), ws_rx.next())
            .await
            .unwrap()
            .unwrap();
        let Message::Text(payload) = message else {
            panic!("invalid message type");
        };

        let json = serde_json::from_str::<serde_json::Value>(&payload).unwrap();
        assert_eq!(json["event"], "notification");
        assert_eq!(json["data"]["message"], "in-app content");
    }

    #[tokio::test]
    async fn request_notif_duplicate_acknowledge_skipped() {
        let id = ObjectId::new();
        let mut repository = MockNotificationsRepository::new();
        repository
            .expect_mark_sent()
            .once()
            .returning(|_, _| Ok(false));

        let (_handle, mut ws_tx, mut ws_rx, _events_tx) = start_test_connection(repository);

        skip_greeting(&mut ws_rx).await;

        ws_tx
            .send(Ok(Message::Text(request_notif_frame(id))))
            .await
            .unwrap();

        // no reply should follow an already sent record
        let timeout_result = timeout(Duration::from_millis(300), ws_rx.next()).await;
        assert!(timeout_result.is_err());
    }

    #[tokio::test]
    async fn request_notif_store_failure_record_marked_failed() {
        let id = ObjectId::new();
        let mut repository = MockNotificationsRepository::new();
        repository
            .expect_mark_sent()
            .once()
            .returning(|_, _| Err(repository::Error::NoDocumentUpdated));
        repository
            .expect_mark_failed()
            .once() // Most important assertion
            .with(eq(id), mockall::predicate::always())
            .returning(|_, _| Ok(true));

        let (handle, mut ws_tx, _ws_rx, _events_tx) = start_test_connection(repository);

        ws_tx
            .send(Ok(Message::Text(request_notif_frame(id))))
            .await
            .unwrap();

        // drop channel to finish connection so mock assertions run
        drop(ws_tx);

        timeout(Duration::from_secs(1), handle)
            .await
            .unwrap() // timeout
            .unwrap(); // task - mock assertions happen here
    }

    #[tokio::test]
    async fn malformed_frame_connection_stays_alive() {
        let repository = MockNotificationsRepository::new();
        let (_handle, mut ws_tx, mut ws_rx, events_tx) = start_test_connection(repository);

        skip_greeting(&mut ws_rx).await;

        ws_tx
            .send(Ok(Message::Text("{not json".to_string())))
            .await
            .unwrap();

        let event = Arc::new(WsServerEvent::Notification {
            message: "still here".to_string(),
        });
        let _ = events_tx.send(event);

        let message = timeout(Duration::from_secs(1), ws_rx.next())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(message, Message::Text(_)));
    }

    #[tokio::test]
    async fn close_message_finishes_connection() {
        let repository = MockNotificationsRepository::new();
        let (handle, mut ws_tx, _ws_rx, _events_tx) = start_test_connection(repository);

        ws_tx.send(Ok(Message::Close(None))).await.unwrap();

        timeout(Duration::from_secs(1), handle)
            .await
            .unwrap() // timeout
            .unwrap();
    }

    #[tokio::test]
    async fn websocket_dropped_finishes_connection() {
        let repository = MockNotificationsRepository::new();
        let (handle, _ws_tx, ws_rx, _events_tx) = start_test_connection(repository);

        drop(ws_rx);

        timeout(Duration::from_secs(1), handle)
            .await
            .unwrap() // timeout
            .unwrap();
    }

    #[tokio::test]
    async fn events_channel_closed_finishes_connection() {
        let repository = MockNotificationsRepository::new();
        let (handle, _ws_tx, _ws_rx, events_tx) = start_test_connection(repository);

        drop(events_tx);

        timeout(Duration::from_secs(1), handle)
            .await
            .unwrap() // timeout
            .unwrap();
    }

    fn request_notif_frame(id: ObjectId) -> String {
        let notification = NotificationMessage {
            id,
            user_id: 4,
            notification_type: NotificationType::InApp,
            content: "in-app content".to_string(),
            status: NotificationStatus::Pending,
            timestamp: OffsetDateTime::now_utc(),
            retry_count: 0,
        };
        let data = serde_json::to_string(&notification).unwrap();

        format!(r#"{{"event":"request-notif","data":{data}}}"#)
    }

    async fn skip_greeting(
        ws_rx: &mut futures::channel::mpsc::UnboundedReceiver<Message>,
    ) {
        let message = timeout(Duration::from_secs(1), ws_rx.next())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(message, Message::Text(_)));
    }

    ///
    /// Starts task with connection.
    ///
    /// ### returns
    /// - task handle
    /// - ws_client_tx - client side send channel
    /// - ws_client_rx - client side read channel
    /// - events_tx - channel to pass new events to the connection
    ///
    fn start_test_connection(
        repository: MockNotificationsRepository,
    ) -> (
        tokio::task::JoinHandle<()>,
        futures::channel::mpsc::UnboundedSender<Result<Message, axum::Error>>,
        futures::channel::mpsc::UnboundedReceiver<Message>,
        broadcast::Sender<Arc<WsServerEvent>>,
    ) {
        let (ws_server_tx, ws_client_rx) = futures::channel::mpsc::unbounded();
        let (ws_client_tx, ws_server_rx) = futures::channel::mpsc::unbounded();
        let (events_tx, events_rx) = broadcast::channel(4);

        let ws_connection = WebSocketConnection::new(
            "0.0.0.0:1234".parse().unwrap(),
            events_rx,
            ws_server_tx,
            ws_server_rx,
            Arc::new(repository),
        );

        let handle = tokio::spawn(ws_connection.run());

        (handle, ws_client_tx, ws_client_rx, events_tx)
    }
}
