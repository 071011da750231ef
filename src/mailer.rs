use std::fmt;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Email {
    pub from: String,
    pub to: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    pub subject: String,
    pub body: String,
}

#[derive(Debug)]
pub enum MailError {
    Http(reqwest::Error),
    Rejected { status: u16, body: String },
}

impl fmt::Display for MailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MailError::Http(e) => write!(f, "HTTP error: {e}"),
            MailError::Rejected { status, body } => {
                write!(f, "mail relay returned {status}: {body}")
            }
        }
    }
}

impl std::error::Error for MailError {}

impl From<reqwest::Error> for MailError {
    fn from(e: reqwest::Error) -> Self {
        MailError::Http(e)
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn deliver(&self, email: &Email) -> Result<(), MailError>;
}

/// Writes outgoing mail to the log instead of sending it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn deliver(&self, email: &Email) -> Result<(), MailError> {
        tracing::info!(
            to = ?email.to,
            subject = %email.subject,
            "mail delivery disabled, message follows\n{}",
            email.body
        );
        Ok(())
    }
}

/// Hands mail to an HTTP relay that accepts the [`Email`] JSON document.
pub struct RelayMailer {
    client: Client,
    url: String,
    auth_token: Option<String>,
}

impl RelayMailer {
    pub fn new(url: String) -> Self {
        Self {
            client: Client::new(),
            url,
            auth_token: None,
        }
    }

    pub fn with_auth_token(mut self, token: String) -> Self {
        self.auth_token = Some(token);
        self
    }
}

#[async_trait]
impl Mailer for RelayMailer {
    async fn deliver(&self, email: &Email) -> Result<(), MailError> {
        let mut builder = self
            .client
            .post(&self.url)
            .timeout(std::time::Duration::from_secs(10))
            .json(email);
        if let Some(ref token) = self.auth_token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }

        let resp = builder.send().await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(MailError::Rejected { status, body });
        }

        tracing::debug!(to = ?email.to, subject = %email.subject, "mail handed to relay");
        Ok(())
    }
}
