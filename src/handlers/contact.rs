use std::sync::Arc;

use axum::{response::IntoResponse, routing::post, Extension, Json, Router};
use validator::Validate;

use crate::{
    mail::mails::send_contact_email,
    models::{contact::ContactMessageDto, response::Response},
    AppState, Error, Result,
};

pub fn contact_handler() -> Router {
    Router::new().route("/contact", post(send_message))
}

async fn send_message(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(message): Json<ContactMessageDto>,
) -> Result<impl IntoResponse> {
    let message = message.trimmed();
    message.validate()?;

    let mailer = app_state.mailer.as_deref().ok_or_else(|| {
        tracing::warn!("Contact message received but no mail relay is configured");
        Error::UpstreamFailure("Contact form is unavailable".to_string())
    })?;

    send_contact_email(mailer, &message).await?;

    Ok(Json(Response::success(
        "Thanks for your message! I'll get back to you soon.",
    )))
}
