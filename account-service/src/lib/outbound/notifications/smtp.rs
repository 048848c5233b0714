use std::str::FromStr;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::AsyncSmtpTransport;
use lettre::AsyncTransport;
use lettre::Message;
use lettre::Tokio1Executor;

use crate::account::errors::NotifierError;
use crate::account::ports::Notifier;
use crate::config::EmailConfig;

/// SMTP-backed notifier for reset-token delivery.
///
/// When email is disabled in configuration no transport is built and every
/// delivery reports `NotEnabled`; the reset flow then falls back to returning
/// the token in the HTTP response.
pub struct SmtpNotifier {
    mailer: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: String,
}

impl SmtpNotifier {
    pub fn new(config: &EmailConfig) -> anyhow::Result<Self> {
        if !config.enabled {
            return Ok(Self {
                mailer: None,
                from: config.from.clone(),
            });
        }

        let credentials =
            Credentials::new(config.username.clone(), config.password.clone());

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
            .port(config.port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer: Some(mailer),
            from: config.from.clone(),
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn deliver(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), NotifierError> {
        let Some(mailer) = &self.mailer else {
            return Err(NotifierError::NotEnabled);
        };

        let from = Mailbox::from_str(&self.from)
            .map_err(|e| NotifierError::InvalidMessage(format!("invalid sender: {e}")))?;
        let to = Mailbox::from_str(recipient)
            .map_err(|e| NotifierError::InvalidMessage(format!("invalid recipient: {e}")))?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| NotifierError::InvalidMessage(e.to_string()))?;

        mailer
            .send(message)
            .await
            .map_err(|e| NotifierError::DeliveryFailed(e.to_string()))?;

        tracing::info!(to = %recipient, subject = %subject, "Email sent");

        Ok(())
    }
}
