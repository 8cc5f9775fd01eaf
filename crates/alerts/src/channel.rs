//! Per-user notification channels.

use async_trait::async_trait;
use thiserror::Error;

/// A notification delivery problem.
///
/// Never aborts an evaluation pass; the affected trigger is undelivered and
/// the pass moves on.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("channel provisioning failed: {0}")]
    Provision(String),

    #[error("subscription failed: {0}")]
    Subscribe(String),

    #[error("publish failed: {0}")]
    Publish(String),
}

/// Opaque handle to a provisioned channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelHandle(String);

impl ChannelHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Pub/sub style notification destination.
///
/// `ensure_channel` and `subscribe` are idempotent: an "already exists"
/// outcome is success, so concurrent provisioning of the same owner cannot
/// race into duplicates or errors.
#[async_trait]
pub trait ChannelProvider: Send + Sync {
    async fn ensure_channel(&self, owner_key: &str) -> Result<ChannelHandle, NotifyError>;

    async fn subscribe(&self, channel: &ChannelHandle, endpoint: &str) -> Result<(), NotifyError>;

    async fn publish(
        &self,
        channel: &ChannelHandle,
        subject: &str,
        body: &str,
    ) -> Result<(), NotifyError>;
}

/// Stable channel key for a user, derived from the e-mail local part.
///
/// Lowercased; anything outside `[a-z0-9_-]` becomes `-`.
pub fn owner_key_for_email(email: &str) -> String {
    let local = email.split('@').next().unwrap_or_default();
    let mut key: String = local
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect();
    if key.is_empty() {
        key.push_str("user");
    }
    format!("alerts-{key}")
}
