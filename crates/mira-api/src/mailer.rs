use std::time::Duration;

use anyhow::Context;
use serde::Serialize;
use tracing::{debug, info};

#[derive(Serialize)]
struct MailRequest<'a> {
    to: &'a str,
    subject: &'a str,
    text: String,
}

/// Delivers account emails by POSTing them to a webhook. Without one the
/// message is written to the log instead.
#[derive(Clone)]
pub struct Mailer {
    client: reqwest::Client,
    webhook: Option<String>,
}

impl Mailer {
    pub fn new(webhook: Option<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            webhook: webhook.filter(|w| !w.trim().is_empty()),
        })
    }

    pub async fn send_reset_link(&self, to: &str, link: &str) -> anyhow::Result<()> {
        let Some(webhook) = &self.webhook else {
            info!("No mail webhook configured; reset link for {}: {}", to, link);
            return Ok(());
        };

        let mail = MailRequest {
            to,
            subject: "Reset your MIRA password",
            text: format!(
                "Someone asked to reset the password for your MIRA account.\n\n\
                 Open this link within the next hour to choose a new one:\n{link}\n\n\
                 If it wasn't you, you can ignore this email."
            ),
        };

        self.client
            .post(webhook)
            .json(&mail)
            .send()
            .await
            .context("mail webhook unreachable")?
            .error_for_status()
            .context("mail webhook rejected message")?;

        debug!("Reset email handed to webhook");
        Ok(())
    }
}
