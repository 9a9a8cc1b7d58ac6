use crate::dto::NotificationMessage;
use serde::Deserialize;

///
/// Events received from websocket clients.
///
/// `request-notif` acknowledges a `check-in-app` re-drive: the client sends
/// the record back and the server marks it sent.
///
#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum WsClientEvent {
    RequestNotif(NotificationMessage),
}
