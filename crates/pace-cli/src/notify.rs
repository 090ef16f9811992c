use anyhow::Context;
use pace_core::notify::MessagePayload;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(15);
const SLACK_API: &str = "https://slack.com/api";

/// Delivers report messages to Slack.
pub struct SlackNotifier {
    agent: ureq::Agent,
    api_base: String,
}

impl Default for SlackNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SlackNotifier {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(TIMEOUT))
            .build()
            .new_agent();
        Self {
            agent,
            api_base: SLACK_API.to_string(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Post to an incoming-webhook URL.
    pub fn post_webhook(&self, url: &str, payload: &MessagePayload) -> anyhow::Result<()> {
        self.agent
            .post(url)
            .header("Content-Type", "application/json")
            .send(payload.to_json().to_string())
            .context("slack webhook request failed")?;
        tracing::info!("posted report to slack webhook");
        Ok(())
    }

    /// Send a direct message through `chat.postMessage`.
    pub fn send_direct_message(
        &self,
        bot_token: &str,
        user_id: &str,
        payload: &MessagePayload,
    ) -> anyhow::Result<()> {
        let url = format!("{}/chat.postMessage", self.api_base.trim_end_matches('/'));
        let mut resp = self
            .agent
            .post(&url)
            .header("Content-Type", "application/json; charset=utf-8")
            .header("Authorization", &format!("Bearer {bot_token}"))
            .send(payload.to_json_for(user_id).to_string())
            .context("slack chat.postMessage request failed")?;
        let body = resp
            .body_mut()
            .read_to_string()
            .context("failed to read slack response")?;
        let value: serde_json::Value =
            serde_json::from_str(&body).context("slack returned invalid JSON")?;
        if value.get("ok").and_then(|v| v.as_bool()) != Some(true) {
            let reason = value
                .get("error")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown error");
            anyhow::bail!("slack rejected direct message: {reason}");
        }
        tracing::info!(user = user_id, "sent report as slack direct message");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use mockito::Matcher;

    fn payload() -> MessagePayload {
        let ts = NaiveDate::from_ymd_opt(2025, 8, 18)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        MessagePayload::new("Tickets done: 4 / 10", ts)
    }

    #[test]
    fn webhook_posts_text_json() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/hook")
            .match_header("content-type", "application/json")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "text": payload().text
            })))
            .with_status(200)
            .with_body("ok")
            .create();

        SlackNotifier::new()
            .post_webhook(&format!("{}/hook", server.url()), &payload())
            .unwrap();
        mock.assert();
    }

    #[test]
    fn webhook_failure_status_is_error() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/hook")
            .with_status(404)
            .with_body("no_service")
            .create();

        let err = SlackNotifier::new()
            .post_webhook(&format!("{}/hook", server.url()), &payload())
            .unwrap_err();
        assert!(format!("{err:#}").contains("slack webhook request failed"));
    }

    #[test]
    fn direct_message_uses_bot_token() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/chat.postMessage")
            .match_header("authorization", "Bearer xoxb-test")
            .match_body(Matcher::PartialJson(serde_json::json!({"channel": "U42"})))
            .with_status(200)
            .with_body(r#"{"ok": true, "ts": "1.2"}"#)
            .create();

        SlackNotifier::new()
            .with_api_base(server.url())
            .send_direct_message("xoxb-test", "U42", &payload())
            .unwrap();
        mock.assert();
    }

    #[test]
    fn direct_message_not_ok_is_error() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/chat.postMessage")
            .with_status(200)
            .with_body(r#"{"ok": false, "error": "channel_not_found"}"#)
            .create();

        let err = SlackNotifier::new()
            .with_api_base(server.url())
            .send_direct_message("xoxb-test", "U42", &payload())
            .unwrap_err();
        assert!(err.to_string().contains("channel_not_found"));
    }
}
