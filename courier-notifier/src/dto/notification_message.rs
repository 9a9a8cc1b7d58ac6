use super::{NotificationStatus, NotificationType};
use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

///
/// Queue wire shape of a notification.
///
/// Published to the work queue on creation and republished to the retry
/// queue with an incremented `retry_count` after a failed delivery.
/// The same shape is pushed to websocket clients on reconciliation.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationMessage {
    #[serde(rename = "_id", with = "object_id_hex")]
    pub id: ObjectId,
    pub user_id: i64,
    pub notification_type: NotificationType,
    pub content: String,
    pub status: NotificationStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Failed delivery attempts so far; absent on first delivery
    #[serde(default)]
    pub retry_count: u32,
}

mod object_id_hex {
    //!
    //! Serializes ObjectId as its hex string so the queue message
    //! round-trips against the id stored in the database
    //!

    use bson::oid::ObjectId;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(id: &ObjectId, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&id.to_hex())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<ObjectId, D::Error> {
        let hex = String::deserialize(d)?;
        let id = ObjectId::parse_str(&hex).map_err(serde::de::Error::custom)?;

        Ok(id)
    }
}
