use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::Deserialize;

use crate::error::AppError;

use super::domain::{StartupContact, StartupNotification};
use super::mailer::{MailTransport, StartupMailer};

#[derive(Debug, Deserialize)]
pub(crate) struct NotificationRequest {
    pub(crate) startup: StartupContact,
    pub(crate) notification: StartupNotification,
}

/// Router builder exposing the founder notification trigger.
pub fn notification_router<T>(mailer: Arc<StartupMailer<T>>) -> Router
where
    T: MailTransport + 'static,
{
    Router::new()
        .route("/api/v1/notifications/startup", post(notify_handler::<T>))
        .with_state(mailer)
}

pub(crate) async fn notify_handler<T>(
    State(mailer): State<Arc<StartupMailer<T>>>,
    axum::Json(request): axum::Json<NotificationRequest>,
) -> Response
where
    T: MailTransport + 'static,
{
    match mailer.deliver(&request.startup, &request.notification) {
        Ok(email) => (StatusCode::ACCEPTED, axum::Json(email)).into_response(),
        Err(error) => AppError::from(error).into_response(),
    }
}
