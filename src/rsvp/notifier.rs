use log::{error, info};
use serde_json::{Value, json};

use crate::content::Slack;
use crate::rsvp::RsvpError;
use crate::rsvp::form::RsvpSubmission;

/// Posts RSVPs to a Slack incoming webhook.
#[derive(Clone, Debug)]
pub struct SlackNotifier {
    client: reqwest::Client,
    webhook_url: String,
    channel: String,
    compact: bool,
}

fn yes_no(value: bool) -> &'static str {
    if value { "Yes" } else { "No" }
}

impl SlackNotifier {
    pub fn new(slack: &Slack) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url: slack.webhook_url.trim().to_string(),
            channel: slack.channel.clone(),
            compact: slack.compact_message,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.webhook_url.is_empty()
    }

    fn summary(submission: &RsvpSubmission) -> String {
        let mut summary = format!(
            "💌 RSVP | {} ({}) | ",
            submission.name,
            submission.side.label()
        );
        if submission.is_attending {
            let guests = if submission.guest_count == 1 {
                "1 guest".to_string()
            } else {
                format!("{} guests", submission.guest_count)
            };
            summary.push_str(&format!("Attending, {}", guests));
            if let Some(has_meal) = submission.has_meal {
                summary.push_str(&format!(", meal: {}", yes_no(has_meal).to_lowercase()));
            }
        } else {
            summary.push_str("Not attending");
        }
        summary
    }

    /// Webhook payload for one submission.
    pub fn message(&self, submission: &RsvpSubmission) -> Value {
        let text = Self::summary(submission);
        let mut payload = if self.compact {
            json!({ "text": text })
        } else {
            let meal = submission.has_meal.map(yes_no).unwrap_or("-");
            json!({
                "text": text,
                "blocks": [
                    {
                        "type": "header",
                        "text": { "type": "plain_text", "text": "New RSVP" }
                    },
                    {
                        "type": "section",
                        "fields": [
                            { "type": "mrkdwn", "text": format!("*Name*\n{}", submission.name) },
                            { "type": "mrkdwn", "text": format!("*Side*\n{}", submission.side.label()) },
                            { "type": "mrkdwn", "text": format!("*Attending*\n{}", yes_no(submission.is_attending)) },
                            { "type": "mrkdwn", "text": format!("*Guests*\n{}", submission.guest_count) },
                            { "type": "mrkdwn", "text": format!("*Meal*\n{}", meal) }
                        ]
                    },
                    {
                        "type": "context",
                        "elements": [
                            {
                                "type": "mrkdwn",
                                "text": format!(
                                    "Submitted {} · {}",
                                    submission.timestamp.format("%Y-%m-%d %H:%M UTC"),
                                    submission.id
                                )
                            }
                        ]
                    }
                ]
            })
        };

        if !self.channel.is_empty() {
            payload["channel"] = Value::String(self.channel.clone());
        }
        payload
    }

    pub async fn notify(&self, submission: &RsvpSubmission) -> Result<(), RsvpError> {
        if !self.is_configured() {
            error!("RSVP {} received but no webhook is configured", submission.id);
            return Err(RsvpError::NotConfigured);
        }

        self.client
            .post(&self.webhook_url)
            .json(&self.message(submission))
            .send()
            .await?
            .error_for_status()?;

        info!("RSVP {} delivered", submission.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rsvp::form::Side;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn slack(webhook_url: &str, compact: bool) -> Slack {
        Slack {
            webhook_url: webhook_url.to_string(),
            channel: "#wedding-response".to_string(),
            compact_message: compact,
        }
    }

    fn submission(is_attending: bool) -> RsvpSubmission {
        RsvpSubmission {
            id: Uuid::nil(),
            name: "Jiwoo".to_string(),
            side: Side::Groom,
            is_attending,
            guest_count: if is_attending { 2 } else { 0 },
            has_meal: Some(is_attending),
            timestamp: Utc
                .with_ymd_and_hms(2026, 5, 1, 9, 30, 0)
                .single()
                .expect("timestamp should be valid"),
        }
    }

    #[test]
    fn compact_message_is_one_line() {
        let notifier = SlackNotifier::new(&slack("https://hooks.example/1", true));
        let message = notifier.message(&submission(true));
        assert_eq!(
            message["text"],
            "💌 RSVP | Jiwoo (Groom's side) | Attending, 2 guests, meal: yes"
        );
        assert_eq!(message["channel"], "#wedding-response");
        assert!(message.get("blocks").is_none());

        let message = notifier.message(&submission(false));
        assert_eq!(message["text"], "💌 RSVP | Jiwoo (Groom's side) | Not attending");
    }

    #[test]
    fn full_message_has_fields() {
        let notifier = SlackNotifier::new(&slack("https://hooks.example/1", false));
        let message = notifier.message(&submission(true));
        let fields = message["blocks"][1]["fields"]
            .as_array()
            .expect("fields should be an array");
        assert_eq!(fields.len(), 5);
        assert_eq!(fields[3]["text"], "*Guests*\n2");
        let context = message["blocks"][2]["elements"][0]["text"]
            .as_str()
            .expect("context should be text");
        assert!(context.starts_with("Submitted 2026-05-01 09:30 UTC"));
    }

    #[test]
    fn empty_channel_is_left_out() {
        let mut config = slack("https://hooks.example/1", true);
        config.channel.clear();
        let notifier = SlackNotifier::new(&config);
        assert!(notifier.message(&submission(true)).get("channel").is_none());
    }

    #[tokio::test]
    async fn unconfigured_webhook_is_reported() {
        let notifier = SlackNotifier::new(&slack("  ", true));
        assert!(!notifier.is_configured());
        let err = notifier
            .notify(&submission(true))
            .await
            .expect_err("delivery should fail");
        assert!(matches!(err, RsvpError::NotConfigured));
    }

    #[tokio::test]
    async fn unreachable_webhook_is_a_delivery_failure() {
        let notifier = SlackNotifier::new(&slack("http://127.0.0.1:9/hook", true));
        let err = notifier
            .notify(&submission(true))
            .await
            .expect_err("delivery should fail");
        assert!(matches!(err, RsvpError::Webhook(_)));
    }
}
