use crate::traits::Announcer;
use crate::types::{BlogPost, GeneratorError, Result, Subscriber};
use async_trait::async_trait;
use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

const TELEGRAM_API: &str = "https://api.telegram.org";

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

#[derive(Debug, Clone)]
pub struct AnnouncerConfig {
    pub bot_token: String,
    pub channel_id: String,
    pub site_url: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
}

/// Posts new-article messages to a Telegram channel and to each subscriber chat.
pub struct TelegramAnnouncer {
    client: Client,
    config: AnnouncerConfig,
    api_base: String,
}

impl TelegramAnnouncer {
    pub fn new(config: AnnouncerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            config,
            api_base: TELEGRAM_API.to_string(),
        })
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    async fn send_message(&self, chat_id: &str, text: &str) -> Result<()> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.config.bot_token);
        let body = SendMessage {
            chat_id,
            text,
            parse_mode: "HTML",
        };

        let mut backoff: ExponentialBackoff<backoff::SystemClock> = ExponentialBackoff {
            current_interval: Duration::from_secs(self.config.retry_delay_seconds),
            initial_interval: Duration::from_secs(self.config.retry_delay_seconds),
            max_interval: Duration::from_secs(self.config.retry_delay_seconds * 8),
            multiplier: 2.0,
            max_elapsed_time: Some(Duration::from_secs(self.config.retry_delay_seconds * 30)),
            ..Default::default()
        };

        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            let outcome = match self.client.post(&url).json(&body).send().await {
                Ok(response) if response.status().is_success() => {
                    debug!("Delivered announcement to {}", chat_id);
                    return Ok(());
                }
                Ok(response) => GeneratorError::General(format!(
                    "Telegram rejected message to {}: HTTP {}",
                    chat_id,
                    response.status()
                )),
                // the request URL embeds the bot token
                Err(e) => GeneratorError::Http(e.without_url()),
            };
            last_error = Some(outcome);

            if attempt < self.config.max_retries {
                if let Some(delay) = backoff.next_backoff() {
                    warn!("Announcement attempt {} to {} failed, retrying in {:?}", attempt + 1, chat_id, delay);
                    tokio::time::sleep(delay).await;
                    continue;
                }
            }
            break;
        }

        Err(last_error.unwrap_or_else(|| GeneratorError::General("announcement not sent".to_string())))
    }
}

#[async_trait]
impl Announcer for TelegramAnnouncer {
    fn channel_name(&self) -> String {
        format!("telegram:{}", self.config.channel_id)
    }

    async fn announce(&self, post: &BlogPost, subscribers: &[Subscriber]) -> Result<()> {
        let message = format_announcement(post, &self.config.site_url);

        self.send_message(&self.config.channel_id, &message).await?;
        info!("Announced '{}' on {}", post.content.title, self.channel_name());

        let mut failed = 0;
        for subscriber in subscribers {
            if let Err(e) = self.send_message(&subscriber.chat_id, &message).await {
                warn!("Could not notify subscriber {}: {}", subscriber.chat_id, e);
                failed += 1;
            }
        }

        if failed > 0 {
            return Err(GeneratorError::General(format!(
                "{} of {} subscriber notifications failed",
                failed,
                subscribers.len()
            )));
        }
        Ok(())
    }
}

/// HTML message announcing `post`, linking to its page under `site_url`.
pub fn format_announcement(post: &BlogPost, site_url: &str) -> String {
    let link = format!("{}/blog/{}", site_url.trim_end_matches('/'), post.slug);
    format!(
        "<b>{}</b>\n\n{}\n\n{}",
        escape_html(&post.content.title),
        escape_html(&post.content.excerpt),
        link
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
