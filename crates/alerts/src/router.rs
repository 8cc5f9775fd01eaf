//! Routes fired triggers to their owner's notification channel.

use dashmap::DashMap;
use pricewatch_core::TriggerResult;
use tracing::{debug, info};

use crate::channel::{owner_key_for_email, ChannelHandle, ChannelProvider, NotifyError};

/// Per-user dispatch of fired alerts.
///
/// Channels are provisioned lazily and remembered, so each owner key is
/// ensured at most once per process lifetime.
pub struct NotificationRouter<P> {
    provider: P,
    ensured: DashMap<String, ChannelHandle>,
}

impl<P: ChannelProvider> NotificationRouter<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            ensured: DashMap::new(),
        }
    }

    /// Resolve the owner's channel and publish the trigger message.
    pub async fn dispatch(&self, trigger: &TriggerResult, email: &str) -> Result<(), NotifyError> {
        let owner_key = owner_key_for_email(email);

        let channel = match self.ensured.get(&owner_key) {
            Some(handle) => handle.clone(),
            None => {
                let handle = self.provider.ensure_channel(&owner_key).await?;
                self.provider.subscribe(&handle, email).await?;
                self.ensured.insert(owner_key.clone(), handle.clone());
                debug!(channel = %owner_key, "notification channel provisioned");
                handle
            }
        };

        let subject = format!("Crypto alert for {}", trigger.symbol);
        self.provider
            .publish(&channel, &subject, &trigger.message)
            .await?;

        info!(
            alert_id = %trigger.alert_id,
            symbol = %trigger.symbol,
            channel = %owner_key,
            "alert notification published"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingProvider {
        ensures: Arc<AtomicUsize>,
        subscribes: Arc<AtomicUsize>,
        published: Arc<Mutex<Vec<(String, String, String)>>>,
        fail_publish: bool,
    }

    #[async_trait]
    impl ChannelProvider for RecordingProvider {
        async fn ensure_channel(&self, owner_key: &str) -> Result<ChannelHandle, NotifyError> {
            self.ensures.fetch_add(1, Ordering::SeqCst);
            Ok(ChannelHandle::new(owner_key))
        }

        async fn subscribe(
            &self,
            _channel: &ChannelHandle,
            _endpoint: &str,
        ) -> Result<(), NotifyError> {
            self.subscribes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn publish(
            &self,
            channel: &ChannelHandle,
            subject: &str,
            body: &str,
        ) -> Result<(), NotifyError> {
            if self.fail_publish {
                return Err(NotifyError::Publish("gateway unavailable".to_string()));
            }
            self.published.lock().unwrap().push((
                channel.as_str().to_string(),
                subject.to_string(),
                body.to_string(),
            ));
            Ok(())
        }
    }

    fn trigger(alert_id: &str) -> TriggerResult {
        TriggerResult {
            user_id: "user-1".to_string(),
            alert_id: alert_id.to_string(),
            symbol: "btc".to_string(),
            message: "btc crossed up".to_string(),
        }
    }

    #[tokio::test]
    async fn channel_is_provisioned_once_per_owner() {
        let provider = RecordingProvider::default();
        let router = NotificationRouter::new(provider.clone());

        router
            .dispatch(&trigger("a1"), "jane@example.com")
            .await
            .unwrap();
        router
            .dispatch(&trigger("a2"), "jane@example.com")
            .await
            .unwrap();

        assert_eq!(provider.ensures.load(Ordering::SeqCst), 1);
        assert_eq!(provider.subscribes.load(Ordering::SeqCst), 1);
        assert_eq!(provider.published.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn distinct_owners_get_distinct_channels() {
        let provider = RecordingProvider::default();
        let router = NotificationRouter::new(provider.clone());

        router
            .dispatch(&trigger("a1"), "jane@example.com")
            .await
            .unwrap();
        router
            .dispatch(&trigger("a2"), "john@example.com")
            .await
            .unwrap();

        assert_eq!(provider.ensures.load(Ordering::SeqCst), 2);
        let published = provider.published.lock().unwrap();
        assert_eq!(published[0].0, "alerts-jane");
        assert_eq!(published[1].0, "alerts-john");
    }

    #[tokio::test]
    async fn publish_failure_surfaces_to_the_caller() {
        let provider = RecordingProvider {
            fail_publish: true,
            ..Default::default()
        };
        let router = NotificationRouter::new(provider);

        let err = router
            .dispatch(&trigger("a1"), "jane@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::Publish(_)));
    }

    #[tokio::test]
    async fn subject_and_body_carry_the_trigger() {
        let provider = RecordingProvider::default();
        let router = NotificationRouter::new(provider.clone());

        router
            .dispatch(&trigger("a1"), "jane@example.com")
            .await
            .unwrap();

        let published = provider.published.lock().unwrap();
        let (_, subject, body) = &published[0];
        assert_eq!(subject, "Crypto alert for btc");
        assert_eq!(body, "btc crossed up");
    }
}
