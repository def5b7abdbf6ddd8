//! Mail transports behind the [`Notifier`] capability.
//!
//! Production posts to an HTTP mail API; development logs the full message
//! so the activation and reset links are a copy-paste away.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use tracing::info;

use stratus_core::{MailMessage, Notifier};

/// Sends through a JSON mail API (`POST {api_url}` with a bearer key).
pub struct HttpNotifier {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl HttpNotifier {
    pub fn new(api_url: String, api_key: String, from: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            api_key,
            from,
        }
    }
}

fn mail_payload(from: &str, mail: &MailMessage) -> serde_json::Value {
    serde_json::json!({
        "from": from,
        "to": mail.to,
        "subject": mail.subject,
        "html": mail.html,
    })
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn send(&self, mail: &MailMessage) -> Result<()> {
        let resp = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&mail_payload(&self.from, mail))
            .send()
            .await
            .context("posting to mail API")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("mail API returned {status}: {body}");
        }
        Ok(())
    }
}

/// Logs the message instead of delivering it. The default transport when no
/// mail API is configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, mail: &MailMessage) -> Result<()> {
        info!(to = %mail.to, subject = %mail.subject, "mail (log transport): {}", mail.html);
        Ok(())
    }
}
