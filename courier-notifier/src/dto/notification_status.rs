use serde::{Deserialize, Serialize};

///
/// Delivery state of a notification record.
///
/// `Sent` and `Failed` are terminal for the dispatch loop;
/// only the reconciliation path (in-app) and the explicit redeliver
/// operation may move a record out of `Failed`.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NotificationStatus {
    Pending,
    Sent,
    Failed,
}
