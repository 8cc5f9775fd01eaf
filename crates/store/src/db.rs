//! SQLite store for alert configurations and price baselines.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pricewatch_core::{AlertConfig, Condition, PriceBaseline};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

use crate::{AlertStore, BaselineStore};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Raw alert row: thresholds stay nullable columns in storage and are only
/// assembled into a typed [`Condition`] on read.
type AlertRow = (
    String,          // user_id
    String,          // alert_id
    String,          // symbol
    String,          // condition kind
    Option<f64>,     // price
    Option<f64>,     // upper_bound
    Option<f64>,     // lower_bound
    String,          // email
    DateTime<Utc>,   // created_at
);

const ALERT_COLUMNS: &str =
    "user_id, alert_id, symbol, condition, price, upper_bound, lower_bound, email, created_at";

/// Database connection for alert configs and baselines.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to SQLite at the given URL, creating and migrating as needed.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS alert_config (
                user_id TEXT NOT NULL,
                alert_id TEXT NOT NULL,
                symbol TEXT NOT NULL,
                condition TEXT NOT NULL,
                price REAL,
                upper_bound REAL,
                lower_bound REAL,
                email TEXT NOT NULL,
                created_at TEXT NOT NULL,
                PRIMARY KEY (user_id, alert_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS price_baseline (
                symbol TEXT PRIMARY KEY,
                last_price REAL NOT NULL,
                last_updated TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_alert_user
            ON alert_config(user_id, created_at)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Write a raw alert row, bypassing condition validation.
    #[cfg(test)]
    async fn insert_raw_alert(
        &self,
        user_id: &str,
        alert_id: &str,
        symbol: &str,
        kind: &str,
        price: Option<f64>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO alert_config (user_id, alert_id, symbol, condition, price, email, created_at)
            VALUES (?, ?, ?, ?, ?, 'nobody@example.com', ?)
            "#,
        )
        .bind(user_id)
        .bind(alert_id)
        .bind(symbol)
        .bind(kind)
        .bind(price)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Decode one row, skipping records whose condition no longer parses.
fn decode_alert(row: AlertRow) -> Option<AlertConfig> {
    let (user_id, alert_id, symbol, kind, price, upper_bound, lower_bound, email, created_at) = row;
    match Condition::from_parts(&kind, price, upper_bound, lower_bound) {
        Ok(condition) => Some(AlertConfig {
            user_id,
            alert_id,
            symbol,
            condition,
            email,
            created_at,
        }),
        Err(err) => {
            warn!(
                user_id = %user_id,
                alert_id = %alert_id,
                error = %err,
                "skipping malformed alert config"
            );
            None
        }
    }
}

#[async_trait]
impl AlertStore for Database {
    async fn list_all(&self) -> Result<Vec<AlertConfig>, StoreError> {
        let rows = sqlx::query_as::<_, AlertRow>(&format!(
            "SELECT {ALERT_COLUMNS} FROM alert_config"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().filter_map(decode_alert).collect())
    }

    async fn get(&self, user_id: &str, alert_id: &str) -> Result<Option<AlertConfig>, StoreError> {
        let row = sqlx::query_as::<_, AlertRow>(&format!(
            "SELECT {ALERT_COLUMNS} FROM alert_config WHERE user_id = ? AND alert_id = ?"
        ))
        .bind(user_id)
        .bind(alert_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.and_then(decode_alert))
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<AlertConfig>, StoreError> {
        let rows = sqlx::query_as::<_, AlertRow>(&format!(
            "SELECT {ALERT_COLUMNS} FROM alert_config WHERE user_id = ? ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().filter_map(decode_alert).collect())
    }

    async fn put(&self, alert: &AlertConfig) -> Result<(), StoreError> {
        let bounds = alert.condition.bounds();
        sqlx::query(
            r#"
            INSERT INTO alert_config
                (user_id, alert_id, symbol, condition, price, upper_bound, lower_bound, email, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id, alert_id) DO UPDATE SET
                symbol = excluded.symbol,
                condition = excluded.condition,
                price = excluded.price,
                upper_bound = excluded.upper_bound,
                lower_bound = excluded.lower_bound,
                email = excluded.email
            "#,
        )
        .bind(&alert.user_id)
        .bind(&alert.alert_id)
        .bind(&alert.symbol)
        .bind(alert.condition.kind())
        .bind(alert.condition.threshold_price())
        .bind(bounds.map(|(upper, _)| upper))
        .bind(bounds.map(|(_, lower)| lower))
        .bind(&alert.email)
        .bind(alert.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, user_id: &str, alert_id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM alert_config WHERE user_id = ? AND alert_id = ?")
            .bind(user_id)
            .bind(alert_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl BaselineStore for Database {
    async fn list_all(&self) -> Result<Vec<PriceBaseline>, StoreError> {
        let rows = sqlx::query_as::<_, (String, f64, DateTime<Utc>)>(
            "SELECT symbol, last_price, last_updated FROM price_baseline",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(symbol, last_price, last_updated)| PriceBaseline {
                symbol,
                last_price,
                last_updated,
            })
            .collect())
    }

    async fn put_many(&self, baselines: &[PriceBaseline]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        for baseline in baselines {
            sqlx::query(
                r#"
                INSERT INTO price_baseline (symbol, last_price, last_updated)
                VALUES (?, ?, ?)
                ON CONFLICT(symbol) DO UPDATE SET
                    last_price = excluded.last_price,
                    last_updated = excluded.last_updated
                "#,
            )
            .bind(&baseline.symbol)
            .bind(baseline.last_price)
            .bind(baseline.last_updated)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    async fn memory_db() -> Database {
        Database::connect("sqlite::memory:").await.unwrap()
    }

    fn sample_alert(alert_id: &str, condition: Condition) -> AlertConfig {
        AlertConfig::new("user-1", alert_id, "BTC", condition, "user@example.com")
    }

    #[tokio::test]
    async fn alert_round_trip() {
        let db = memory_db().await;
        let alert = sample_alert("a1", Condition::CrossUp { price: 100.0 });

        db.put(&alert).await.unwrap();
        let loaded = db.get("user-1", "a1").await.unwrap().unwrap();
        assert_eq!(loaded, alert);

        let all = AlertStore::list_all(&db).await.unwrap();
        assert_eq!(all, vec![alert]);
    }

    #[tokio::test]
    async fn channel_bounds_round_trip() {
        let db = memory_db().await;
        let alert = sample_alert(
            "a2",
            Condition::EnterChannel {
                upper_bound: 20.0,
                lower_bound: 10.0,
            },
        );

        db.put(&alert).await.unwrap();
        let loaded = db.get("user-1", "a2").await.unwrap().unwrap();
        assert_eq!(loaded.condition, alert.condition);
    }

    #[tokio::test]
    async fn delete_reports_whether_a_record_existed() {
        let db = memory_db().await;
        db.put(&sample_alert("a1", Condition::Cross { price: 5.0 }))
            .await
            .unwrap();

        assert!(db.delete("user-1", "a1").await.unwrap());
        assert!(!db.delete("user-1", "a1").await.unwrap());
        assert_eq!(db.get("user-1", "a1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn list_for_user_filters_and_sorts_newest_first() {
        let db = memory_db().await;

        let mut older = sample_alert("old", Condition::Cross { price: 1.0 });
        older.created_at = Utc::now() - chrono::Duration::hours(1);
        db.put(&older).await.unwrap();
        db.put(&sample_alert("new", Condition::Cross { price: 2.0 }))
            .await
            .unwrap();

        let other = AlertConfig::new(
            "user-2",
            "b1",
            "eth",
            Condition::Cross { price: 3.0 },
            "other@example.com",
        );
        db.put(&other).await.unwrap();

        let mine = db.list_for_user("user-1").await.unwrap();
        let ids: Vec<&str> = mine.iter().map(|a| a.alert_id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old"]);
    }

    #[tokio::test]
    async fn malformed_condition_rows_are_skipped_not_fatal() {
        let db = memory_db().await;
        db.put(&sample_alert("good", Condition::CrossUp { price: 1.0 }))
            .await
            .unwrap();
        db.insert_raw_alert("user-1", "bad-kind", "btc", "crossSideways", Some(1.0))
            .await
            .unwrap();
        db.insert_raw_alert("user-1", "bad-threshold", "btc", "crossUp", None)
            .await
            .unwrap();

        let all = AlertStore::list_all(&db).await.unwrap();
        let ids: Vec<&str> = all.iter().map(|a| a.alert_id.as_str()).collect();
        assert_eq!(ids, vec!["good"]);
    }

    #[tokio::test]
    async fn put_many_upserts_one_row_per_symbol() {
        let db = memory_db().await;
        let now = Utc::now();

        db.put_many(&[
            PriceBaseline {
                symbol: "btc".to_string(),
                last_price: 100.0,
                last_updated: now,
            },
            PriceBaseline {
                symbol: "eth".to_string(),
                last_price: 10.0,
                last_updated: now,
            },
        ])
        .await
        .unwrap();

        let later = now + chrono::Duration::minutes(5);
        db.put_many(&[PriceBaseline {
            symbol: "btc".to_string(),
            last_price: 101.0,
            last_updated: later,
        }])
        .await
        .unwrap();

        let mut all = BaselineStore::list_all(&db).await.unwrap();
        all.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].symbol, "btc");
        assert_eq!(all[0].last_price, 101.0);
        assert_eq!(all[1].symbol, "eth");
        assert_eq!(all[1].last_price, 10.0);
    }
}
