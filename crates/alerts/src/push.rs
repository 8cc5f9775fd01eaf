//! REST push gateway provider.
//!
//! Talks to a topic-style HTTP gateway: channels are created by name,
//! endpoints subscribe to a channel, messages are published to it. Create
//! and subscribe treat HTTP 409 as success so provisioning stays idempotent
//! under concurrent passes.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::json;
use tracing::debug;

use crate::channel::{ChannelHandle, ChannelProvider, NotifyError};

/// Channel provider backed by a REST push gateway.
#[derive(Clone)]
pub struct HttpPushProvider {
    http: Client,
    base_url: String,
}

impl HttpPushProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ChannelProvider for HttpPushProvider {
    async fn ensure_channel(&self, owner_key: &str) -> Result<ChannelHandle, NotifyError> {
        let url = format!("{}/v1/channels", self.base_url);
        let res = self
            .http
            .post(&url)
            .json(&json!({ "name": owner_key }))
            .send()
            .await
            .map_err(|e| NotifyError::Provision(e.to_string()))?;

        match res.status() {
            status if status.is_success() => {
                debug!(channel = owner_key, "channel created");
                Ok(ChannelHandle::new(owner_key))
            }
            // Already provisioned by an earlier pass or a concurrent one.
            StatusCode::CONFLICT => Ok(ChannelHandle::new(owner_key)),
            status => {
                let text = res.text().await.unwrap_or_default();
                Err(NotifyError::Provision(format!("{status}: {text}")))
            }
        }
    }

    async fn subscribe(&self, channel: &ChannelHandle, endpoint: &str) -> Result<(), NotifyError> {
        let url = format!(
            "{}/v1/channels/{}/subscriptions",
            self.base_url,
            channel.as_str()
        );
        let res = self
            .http
            .post(&url)
            .json(&json!({ "protocol": "email", "endpoint": endpoint }))
            .send()
            .await
            .map_err(|e| NotifyError::Subscribe(e.to_string()))?;

        match res.status() {
            status if status.is_success() => Ok(()),
            StatusCode::CONFLICT => Ok(()),
            status => {
                let text = res.text().await.unwrap_or_default();
                Err(NotifyError::Subscribe(format!("{status}: {text}")))
            }
        }
    }

    async fn publish(
        &self,
        channel: &ChannelHandle,
        subject: &str,
        body: &str,
    ) -> Result<(), NotifyError> {
        let url = format!(
            "{}/v1/channels/{}/messages",
            self.base_url,
            channel.as_str()
        );
        let res = self
            .http
            .post(&url)
            .json(&json!({ "subject": subject, "body": body }))
            .send()
            .await
            .map_err(|e| NotifyError::Publish(e.to_string()))?;

        if res.status().is_success() {
            Ok(())
        } else {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            Err(NotifyError::Publish(format!("{status}: {text}")))
        }
    }
}
