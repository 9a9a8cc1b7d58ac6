use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct NotificationCreated {
    pub id: String,
}
