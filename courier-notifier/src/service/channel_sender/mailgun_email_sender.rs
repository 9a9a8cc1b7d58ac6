use super::{ChannelSender, Error};
use axum::async_trait;

pub struct MailgunEmailSenderConfig {
    pub api_key: String,
    pub domain: String,
    /// Address every email notification is delivered to
    pub recipient: String,
}

pub struct MailgunEmailSender {
    config: MailgunEmailSenderConfig,
    client: reqwest::Client,
}

impl MailgunEmailSender {
    pub fn new(config: MailgunEmailSenderConfig) -> Self {
        let client = reqwest::Client::new();

        Self { config, client }
    }
}

#[async_trait]
impl ChannelSender for MailgunEmailSender {
    #[tracing::instrument(name = "Email Sender", skip_all)]
    async fn send(&self, content: &str) -> Result<(), Error> {
        let url = format!(
            "https://api.mailgun.net/v3/{}/messages",
            self.config.domain
        );
        let from = format!("Courier Notifier <postmaster@{}>", self.config.domain);
        let form = [
            ("from", from.as_str()),
            ("to", self.config.recipient.as_str()),
            ("subject", "notification"),
            ("text", content),
        ];

        let response = self
            .client
            .post(url)
            .basic_auth("api", Some(&self.config.api_key))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        match status.is_success() {
            true => {
                tracing::debug!("email accepted by provider");
                Ok(())
            }
            false => Err(Error::Rejected(status)),
        }
    }
}
