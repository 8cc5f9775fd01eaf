//! Operator failure reporting around an evaluation pass.

use std::future::Future;

use async_trait::async_trait;
use chrono::Utc;
use tracing::error;

use crate::channel::{ChannelHandle, ChannelProvider, NotifyError};

/// Fixed destination for operator-facing failure reports.
#[async_trait]
pub trait OperatorChannel: Send + Sync {
    async fn publish(&self, subject: &str, body: &str) -> Result<(), NotifyError>;
}

/// Operator channel backed by one provisioned provider channel.
pub struct OperatorTopic<P> {
    provider: P,
    channel: ChannelHandle,
}

impl<P: ChannelProvider> OperatorTopic<P> {
    /// Provision the fixed operator channel up front.
    pub async fn create(provider: P, name: &str) -> Result<Self, NotifyError> {
        let channel = provider.ensure_channel(name).await?;
        Ok(Self { provider, channel })
    }
}

#[async_trait]
impl<P: ChannelProvider> OperatorChannel for OperatorTopic<P> {
    async fn publish(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        self.provider.publish(&self.channel, subject, body).await
    }
}

/// Wraps one pass invocation; a failed pass produces exactly one operator
/// notification and the original error goes back to the scheduler.
pub struct FailureReporter<O> {
    operator: O,
    origin: String,
}

impl<O: OperatorChannel> FailureReporter<O> {
    pub fn new(operator: O, origin: impl Into<String>) -> Self {
        Self {
            operator,
            origin: origin.into(),
        }
    }

    pub async fn run<T, E, F>(&self, pass: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        match pass.await {
            Ok(value) => Ok(value),
            Err(err) => {
                let subject = format!("Evaluation pass failed on {}", self.origin);
                let body = format!(
                    "Error occurred at {}\n\nError details: {err}",
                    Utc::now().to_rfc3339()
                );
                if let Err(publish_err) = self.operator.publish(&subject, &body).await {
                    // The original failure still propagates.
                    error!(error = %publish_err, "failed to publish operator failure report");
                }
                Err(err)
            }
        }
    }
}
