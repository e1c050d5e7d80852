use lettre::message::Mailbox;

use crate::{
    models::contact::ContactMessageDto,
    render::{escape_html, fill_placeholders, nl2br},
    Error, Result,
};

use super::sendmail::Mailer;

const CONTACT_TEMPLATE: &str = include_str!("templates/Contact-email.html");

pub fn contact_email_body(message: &ContactMessageDto) -> String {
    fill_placeholders(
        CONTACT_TEMPLATE,
        &[
            ("{{from_name}}", &escape_html(&message.name)),
            ("{{from_email}}", &escape_html(&message.email)),
            ("{{message}}", &nl2br(&message.message)),
        ],
    )
}

pub async fn send_contact_email(mailer: &Mailer, message: &ContactMessageDto) -> Result<()> {
    let reply_to = format!("{} <{}>", message.name, message.email)
        .parse::<Mailbox>()
        .or_else(|_| message.email.parse::<Mailbox>())
        .map_err(|_| Error::BadRequest("Email is invalid".to_string()))?;

    let subject = format!("Portfolio contact from {}", message.name);
    mailer
        .send_email(reply_to, &subject, contact_email_body(message))
        .await
}
