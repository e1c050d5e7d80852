use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::{config::SmtpConfig, Error, Result};

/// Outbound SMTP relay for contact-form messages.
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl Mailer {
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let from = config
            .username
            .parse::<Mailbox>()
            .map_err(|err| Error::UpstreamFailure(format!("Invalid SMTP_USERNAME: {err}")))?;
        let to = config
            .contact_to
            .parse::<Mailbox>()
            .map_err(|err| Error::UpstreamFailure(format!("Invalid CONTACT_TO: {err}")))?;

        let creds = Credentials::new(config.username.clone(), config.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.server)
            .map_err(|err| Error::UpstreamFailure(format!("Invalid SMTP relay: {err}")))?
            .credentials(creds)
            .port(config.port)
            .build();

        Ok(Self { transport, from, to })
    }

    pub async fn send_email(&self, reply_to: Mailbox, subject: &str, html: String) -> Result<()> {
        let email = Message::builder()
            .from(self.from.clone())
            .reply_to(reply_to)
            .to(self.to.clone())
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html)
            .map_err(|err| Error::BadRequest(format!("Could not build email: {err}")))?;

        match self.transport.send(email).await {
            Ok(_) => {
                tracing::info!("Email sent successfully");
                Ok(())
            }
            Err(err) => {
                tracing::error!("Failed to send email: {:?}", err);
                Err(Error::UpstreamFailure("Failed to send message".to_string()))
            }
        }
    }
}
