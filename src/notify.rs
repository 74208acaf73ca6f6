//! Discord webhook notifications for scans.
//!
//! Delivery is fire-and-forget: it runs on a spawned task, failures are
//! logged and never reach the scan response.

use chrono::{DateTime, Local, Utc};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::model::attendance::ScanStatus;

const COLOR_CHECK_IN: u32 = 0x2ecc71;
const COLOR_CHECK_OUT: u32 = 0xe74c3c;

/// What happened at the scanner.
#[derive(Debug, Clone)]
pub struct ScanEvent {
    pub uid: String,
    pub name: String,
    pub at: DateTime<Utc>,
    pub status: ScanStatus,
}

#[derive(Debug, Serialize)]
pub struct WebhookMessage {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Serialize)]
pub struct Embed {
    pub title: String,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl EmbedField {
    fn new(name: &str, value: impl Into<String>, inline: bool) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
            inline,
        }
    }
}

#[derive(Clone)]
pub struct Notifier {
    client: Client,
    webhook_url: Option<String>,
    username: String,
    avatar_url: Option<String>,
}

impl Notifier {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.webhook_timeout_secs))
            .user_agent(format!("attendance/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        if config.webhook_url.is_none() {
            info!("DISCORD_WEBHOOK_URL not set, scan notifications disabled");
        }

        Ok(Self {
            client,
            webhook_url: config.webhook_url.clone(),
            username: config.webhook_username.clone(),
            avatar_url: config.webhook_avatar_url.clone(),
        })
    }

    pub fn message_for(&self, event: &ScanEvent) -> WebhookMessage {
        let (title, color) = match event.status {
            ScanStatus::CheckedIn => ("🔵 Checked In", COLOR_CHECK_IN),
            ScanStatus::CheckedOut => ("🔴 Checked Out", COLOR_CHECK_OUT),
        };
        let local_time = event.at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S");

        WebhookMessage {
            username: self.username.clone(),
            avatar_url: self.avatar_url.clone(),
            embeds: vec![Embed {
                title: title.to_string(),
                color,
                fields: vec![
                    EmbedField::new("Name", event.name.as_str(), true),
                    EmbedField::new("UID", event.uid.as_str(), true),
                    EmbedField::new("Time", local_time.to_string(), false),
                ],
                timestamp: event.at.to_rfc3339(),
            }],
        }
    }

    /// Spawns delivery of `event` and returns immediately.
    pub fn notify(&self, event: ScanEvent) {
        let Some(url) = self.webhook_url.clone() else {
            debug!(uid = %event.uid, "Webhook not configured, skipping notification");
            return;
        };
        let message = self.message_for(&event);
        let client = self.client.clone();

        actix_web::rt::spawn(async move {
            let result = client
                .post(&url)
                .json(&message)
                .send()
                .await
                .and_then(|resp| resp.error_for_status());

            match result {
                Ok(_) => debug!(uid = %event.uid, status = %event.status, "Scan notification sent"),
                Err(e) => warn!(error = %e, uid = %event.uid, "Failed to send scan notification"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event(status: ScanStatus) -> ScanEvent {
        ScanEvent {
            uid: "04A1B2C3".into(),
            name: "John Doe".into(),
            at: Utc.with_ymd_and_hms(2026, 1, 2, 8, 30, 0).unwrap(),
            status,
        }
    }

    fn notifier() -> Notifier {
        Notifier::from_config(&Config::default()).unwrap()
    }

    #[test]
    fn check_in_is_green() {
        let msg = notifier().message_for(&event(ScanStatus::CheckedIn));
        let embed = &msg.embeds[0];
        assert_eq!(embed.color, 0x2ecc71);
        assert_eq!(embed.title, "🔵 Checked In");
        assert_eq!(embed.fields[0].value, "John Doe");
        assert_eq!(embed.fields[1].value, "04A1B2C3");
        assert_eq!(embed.timestamp, "2026-01-02T08:30:00+00:00");
    }

    #[test]
    fn check_out_is_red() {
        let msg = notifier().message_for(&event(ScanStatus::CheckedOut));
        assert_eq!(msg.embeds[0].color, 0xe74c3c);
        assert_eq!(msg.embeds[0].title, "🔴 Checked Out");
    }

    #[test]
    fn payload_matches_discord_shape() {
        let msg = notifier().message_for(&event(ScanStatus::CheckedIn));
        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["username"], "Attendance Bot");
        assert!(json.get("avatar_url").is_none());
        assert_eq!(json["embeds"][0]["fields"][2]["name"], "Time");
        assert_eq!(json["embeds"][0]["fields"][2]["inline"], false);
    }

    #[actix_web::test]
    async fn notify_without_webhook_is_a_no_op() {
        notifier().notify(event(ScanStatus::CheckedIn));
    }
}
