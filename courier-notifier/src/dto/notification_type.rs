use serde::{Deserialize, Serialize};

///
/// Delivery channel of a notification.
/// Selects the sender used by the dispatcher.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum NotificationType {
    Email,
    Sms,
    InApp,
}
