use super::{ChannelSender, Error};
use axum::async_trait;

pub struct TwilioSmsSenderConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
    /// Number every SMS notification is delivered to
    pub recipient: String,
}

pub struct TwilioSmsSender {
    config: TwilioSmsSenderConfig,
    client: reqwest::Client,
}

impl TwilioSmsSender {
    pub fn new(config: TwilioSmsSenderConfig) -> Self {
        let client = reqwest::Client::new();

        Self { config, client }
    }
}

#[async_trait]
impl ChannelSender for TwilioSmsSender {
    #[tracing::instrument(name = "SMS Sender", skip_all)]
    async fn send(&self, content: &str) -> Result<(), Error> {
        let url = format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.config.account_sid
        );
        let form = [
            ("From", self.config.from_number.as_str()),
            ("To", self.config.recipient.as_str()),
            ("Body", content),
        ];

        let response = self
            .client
            .post(url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        match status.is_success() {
            true => {
                tracing::debug!("sms accepted by provider");
                Ok(())
            }
            false => Err(Error::Rejected(status)),
        }
    }
}
