use crate::{
    application::ApplicationState,
    dto::{input, output},
    error::Error,
    service::{notifications_service::NotificationsService, websockets_service::WebSocketsService},
};
use axum::{
    extract::{ConnectInfo, Path, State, WebSocketUpgrade},
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use bson::oid::ObjectId;
use std::{net::SocketAddr, sync::Arc};

pub fn routing() -> Router<ApplicationState> {
    Router::new()
        .route("/api/v1/notifications", post(create_notification))
        .route(
            "/api/v1/notifications/:id/redeliver",
            post(redeliver_notification),
        )
        .route(
            "/api/v1/users/:user_id/notifications",
            get(find_user_notifications),
        )
        .route("/ws/v1", get(websocket_upgrade))
}

async fn create_notification(
    State(notifications_service): State<Arc<dyn NotificationsService>>,
    Json(notification): Json<input::Notification>,
) -> Result<(StatusCode, Json<output::NotificationCreated>), Error> {
    let created = notifications_service
        .create_notification(notification)
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

async fn find_user_notifications(
    State(notifications_service): State<Arc<dyn NotificationsService>>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<output::Notification>>, Error> {
    let notifications = notifications_service
        .find_user_notifications(user_id)
        .await?;

    Ok(Json(notifications))
}

async fn redeliver_notification(
    State(notifications_service): State<Arc<dyn NotificationsService>>,
    Path(id): Path<String>,
) -> Result<StatusCode, Error> {
    let id = ObjectId::parse_str(&id).map_err(|_| Error::Validation("invalid notification id"))?;

    notifications_service.redeliver_notification(id).await?;

    Ok(StatusCode::ACCEPTED)
}

async fn websocket_upgrade(
    State(websockets_service): State<Arc<dyn WebSocketsService>>,
    ConnectInfo(address): ConnectInfo<SocketAddr>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |websocket| async move {
        websockets_service.handle_client(address, websocket).await;
    })
}
