//! Notification channels, trigger routing and operator failure reports.

pub mod channel;
pub mod failure;
pub mod push;
pub mod router;

pub use channel::{owner_key_for_email, ChannelHandle, ChannelProvider, NotifyError};
pub use failure::{FailureReporter, OperatorChannel, OperatorTopic};
pub use push::HttpPushProvider;
pub use router::NotificationRouter;
