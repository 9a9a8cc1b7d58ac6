use crate::{repository, service::notifications_producer_service};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("notification not exist")]
    NotificationNotExist,

    #[error("user has no notifications")]
    NoNotifications,

    #[error("validation error: {0}")]
    Validation(&'static str),

    #[error("notification not failed")]
    NotificationNotFailed,

    #[error("publish error: {0}")]
    Publish(#[from] notifications_producer_service::Error),

    #[error("database error: {0}")]
    Database(#[from] repository::Error),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        tracing::warn!(err = %self);

        match self {
            Error::NotificationNotExist | Error::NoNotifications => StatusCode::NOT_FOUND,
            Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::NotificationNotFailed => StatusCode::CONFLICT,
            Error::Publish(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
        .into_response()
    }
}
