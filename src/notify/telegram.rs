use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::Notifier;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Bot API sender for a single chat. No retries here; callers wrap it.
#[derive(Clone)]
pub struct TelegramNotifier {
    api_base: String,
    token: String,
    chat_id: String,
    client: Client,
    timeout: Duration,
}

impl TelegramNotifier {
    pub fn new(token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            token: token.into(),
            chat_id: chat_id.into(),
            client: Client::new(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    async fn call<P: Serialize + ?Sized>(&self, method: &str, payload: &P) -> Result<()> {
        // The token is part of the URL; keep it out of error chains.
        let rsp = self
            .client
            .post(self.method_url(method))
            .timeout(self.timeout)
            .json(payload)
            .send()
            .await
            .map_err(|e| anyhow!("telegram {method} request failed: {}", e.without_url()))?;

        let status = rsp.status();
        let body: ApiResponse = rsp
            .json()
            .await
            .map_err(|e| anyhow!("telegram {method} returned unreadable body ({status}): {}", e.without_url()))?;

        if !status.is_success() || !body.ok {
            return Err(anyhow!(
                "telegram {method} failed ({status}): {}",
                body.description.as_deref().unwrap_or("no description")
            ));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    async fn send_text(&self, html: &str, link_preview: bool) -> Result<()> {
        let payload = SendMessage {
            chat_id: &self.chat_id,
            text: html,
            parse_mode: "HTML",
            link_preview_options: LinkPreviewOptions {
                is_disabled: !link_preview,
            },
        };
        self.call("sendMessage", &payload)
            .await
            .context("send text message")
    }

    async fn send_photo(&self, photo_url: &str, caption_html: &str) -> Result<()> {
        let payload = SendPhoto {
            chat_id: &self.chat_id,
            photo: photo_url,
            caption: caption_html,
            parse_mode: "HTML",
        };
        self.call("sendPhoto", &payload).await.context("send photo")
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
    link_preview_options: LinkPreviewOptions,
}

#[derive(Serialize)]
struct LinkPreviewOptions {
    is_disabled: bool,
}

#[derive(Serialize)]
struct SendPhoto<'a> {
    chat_id: &'a str,
    photo: &'a str,
    caption: &'a str,
    parse_mode: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}
