use crate::dto::NotificationMessage;
use serde::Serialize;

///
/// Events pushed to websocket clients.
///
#[derive(Debug, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum WsServerEvent {
    /// Handshake sent right after the connection is established
    Connect { message: String },
    /// Content of an in-app notification delivered in real time
    Notification { message: String },
    /// Reconciliation re-drive of a record stuck in `pending`/`failed`
    CheckInApp(NotificationMessage),
}
