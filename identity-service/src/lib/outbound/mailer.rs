use async_trait::async_trait;
use serde::Serialize;

use crate::account::errors::MailerError;
use crate::account::models::EmailAddress;
use crate::account::ports::Mailer;

#[derive(Debug, Serialize)]
struct OutboundMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    body: &'a str,
}

/// Mailer backed by an HTTP relay endpoint. The relay owns SMTP concerns;
/// this adapter just posts the message and maps transport or non-2xx
/// outcomes to a dispatch failure.
pub struct HttpMailer {
    client: reqwest::Client,
    endpoint: String,
    sender: String,
}

impl HttpMailer {
    pub fn new(endpoint: String, sender: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            sender,
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(
        &self,
        to: &EmailAddress,
        subject: &str,
        body: &str,
    ) -> Result<(), MailerError> {
        let message = OutboundMessage {
            from: &self.sender,
            to: to.as_str(),
            subject,
            body,
        };

        self.client
            .post(&self.endpoint)
            .json(&message)
            .send()
            .await
            .map_err(|e| MailerError::DispatchFailed(e.to_string()))?
            .error_for_status()
            .map_err(|e| MailerError::DispatchFailed(e.to_string()))?;

        Ok(())
    }
}
