//! Outgoing mail for cloudbox.
//!
//! Only verification codes are ever sent. Without a webhook configured the
//! code is written to the log, which is enough for local development.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::MailConfig;
use crate::{CloudboxError, Result};

/// Subject line of verification mails.
pub const VERIFICATION_SUBJECT: &str = "cloudbox - registration code";

/// User agent for webhook requests.
const USER_AGENT: &str = "cloudbox/1.0 (mailer)";

/// JSON body posted to the mail webhook.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
}

/// Mail delivery backend.
#[derive(Debug, Clone)]
pub enum Mailer {
    /// Write mails to the log only.
    Log,
    /// POST mails as JSON to an HTTP endpoint.
    Webhook {
        client: Client,
        url: String,
        from: String,
    },
}

impl Mailer {
    /// Build a mailer from configuration.
    pub fn from_config(config: &MailConfig) -> Result<Self> {
        let Some(url) = config.webhook_url.as_deref().filter(|u| !u.trim().is_empty()) else {
            return Ok(Mailer::Log);
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| CloudboxError::Mail(format!("failed to create HTTP client: {e}")))?;

        Ok(Mailer::Webhook {
            client,
            url: url.trim().to_string(),
            from: config.from.clone(),
        })
    }

    /// Check whether mails are actually delivered.
    pub fn delivers(&self) -> bool {
        matches!(self, Mailer::Webhook { .. })
    }

    /// Send a registration verification code.
    pub async fn send_verification_code(&self, email: &str, code: &str) -> Result<()> {
        match self {
            Mailer::Log => {
                info!(email = %email, code = %code, "Verification code (mail delivery disabled)");
                Ok(())
            }
            Mailer::Webhook { client, url, from } => {
                let message = verification_message(from, email, code);
                let response = client
                    .post(url)
                    .json(&message)
                    .send()
                    .await
                    .map_err(|e| CloudboxError::Mail(format!("failed to send mail: {e}")))?;

                if !response.status().is_success() {
                    warn!(status = %response.status(), "Mail webhook rejected message");
                    return Err(CloudboxError::Mail(format!(
                        "mail webhook returned {}",
                        response.status()
                    )));
                }
                info!(email = %email, "Verification code sent");
                Ok(())
            }
        }
    }
}

/// Build the verification mail.
pub fn verification_message(from: &str, to: &str, code: &str) -> MailMessage {
    MailMessage {
        from: from.to_string(),
        to: to.to_string(),
        subject: VERIFICATION_SUBJECT.to_string(),
        text: format!(
            "Your verification code is {code}.\n\n\
             The code is valid for 10 minutes. If you did not request it, ignore this mail."
        ),
    }
}
