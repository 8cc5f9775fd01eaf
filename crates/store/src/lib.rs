//! Persistence for alert configurations and price baselines.

pub mod db;

pub use db::{Database, StoreError};

use async_trait::async_trait;
use pricewatch_core::{AlertConfig, PriceBaseline};

/// Read/write access to user alert configurations.
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Every alert configuration, across all users.
    async fn list_all(&self) -> Result<Vec<AlertConfig>, StoreError>;

    async fn get(&self, user_id: &str, alert_id: &str) -> Result<Option<AlertConfig>, StoreError>;

    /// A user's alerts, newest first.
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<AlertConfig>, StoreError>;

    async fn put(&self, alert: &AlertConfig) -> Result<(), StoreError>;

    /// Returns false when no matching record existed.
    async fn delete(&self, user_id: &str, alert_id: &str) -> Result<bool, StoreError>;
}

/// Last observed price per symbol.
///
/// Written only at the end of a completed pass; an aborted pass must leave
/// every row untouched.
#[async_trait]
pub trait BaselineStore: Send + Sync {
    async fn list_all(&self) -> Result<Vec<PriceBaseline>, StoreError>;

    /// Upsert one row per symbol.
    async fn put_many(&self, baselines: &[PriceBaseline]) -> Result<(), StoreError>;
}
