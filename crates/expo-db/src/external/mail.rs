//! Outbound e-mail of access links to newly created users.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use expo_config::MailConfig;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail relay unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("mail relay rejected the message with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("mail is not configured")]
    NotConfigured,
}

/// Sends the access-link e-mail a user receives on account creation.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_access_link(
        &self,
        recipient: &str,
        display_name: &str,
        access_url: &str,
    ) -> Result<(), MailError>;
}

/// JSON body posted to the relay.
#[derive(Debug, Serialize)]
struct RelayMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'static str,
    text: String,
}

/// [`Mailer`] that POSTs each message as JSON to an HTTP mail relay.
pub struct HttpMailer {
    client: reqwest::Client,
    relay_url: String,
    sender: String,
}

impl HttpMailer {
    pub fn new(relay_url: impl Into<String>, sender: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            relay_url: relay_url.into(),
            sender: sender.into(),
        }
    }

    /// # Errors
    ///
    /// Returns `MailError::NotConfigured` if the relay URL or sender is missing.
    pub fn from_config(config: &MailConfig) -> Result<Self, MailError> {
        if config.relay_url.is_empty() || config.sender.is_empty() {
            return Err(MailError::NotConfigured);
        }
        Ok(Self::new(config.relay_url.clone(), config.sender.clone()))
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send_access_link(
        &self,
        recipient: &str,
        display_name: &str,
        access_url: &str,
    ) -> Result<(), MailError> {
        let message = RelayMessage {
            from: &self.sender,
            to: recipient,
            subject: "Your exhibition access link",
            text: format!("Hello {display_name},\n\nUse this link to access the exhibition:\n{access_url}\n"),
        };
        let response = self.client.post(&self.relay_url).json(&message).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        tracing::info!(recipient, "access link sent");
        Ok(())
    }
}

/// [`Mailer`] for deployments without a relay: logs the link and succeeds.
pub struct LogOnlyMailer;

#[async_trait]
impl Mailer for LogOnlyMailer {
    async fn send_access_link(
        &self,
        recipient: &str,
        _display_name: &str,
        access_url: &str,
    ) -> Result<(), MailError> {
        tracing::info!(recipient, access_url, "mail relay not configured, access link logged only");
        Ok(())
    }
}
