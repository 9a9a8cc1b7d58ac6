use crate::dto::NotificationType;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Notification {
    pub user_id: i64,
    pub notification_type: NotificationType,
    pub content: String,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn notification_json_deserialize_ok() {
        let json = r#"{
            "user_id": 42,
            "notification_type": "email",
            "content": "order shipped"
        }"#;

        let notification = serde_json::from_str::<Notification>(json).unwrap();

        assert_eq!(notification.user_id, 42);
        assert_eq!(notification.notification_type, NotificationType::Email);
        assert_eq!(notification.content, "order shipped");
    }

    #[test]
    fn notification_json_deserialize_unknown_type() {
        let json = r#"{
            "user_id": 42,
            "notification_type": "carrier-pigeon",
            "content": "order shipped"
        }"#;

        let notification = serde_json::from_str::<Notification>(json);

        assert!(notification.is_err());
    }
}
