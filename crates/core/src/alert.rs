//! User alert configurations and their condition kinds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures turning raw condition fields into a [`Condition`].
///
/// Raised when decoding a stored record or validating an incoming request;
/// a record that fails here is a configuration error, not a pass failure.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConditionError {
    #[error("unknown condition kind: {0}")]
    UnknownKind(String),

    #[error("condition {kind} requires a threshold price")]
    MissingPrice { kind: String },

    #[error("condition {kind} requires both upperBound and lowerBound")]
    MissingBounds { kind: String },

    #[error("upperBound {upper} must be greater than lowerBound {lower}")]
    InvalidBounds { upper: f64, lower: f64 },

    #[error("threshold for condition {kind} is not a finite number")]
    NonFinite { kind: String },
}

/// What a single alert watches for.
///
/// One variant per condition kind, carrying exactly the thresholds that kind
/// uses. Wire names (`crossUp`, `exCh`, `24_High`, ...) are kept for
/// stored records and the HTTP API.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "condition")]
pub enum Condition {
    /// Fires when the price moves from below the threshold to at-or-above it.
    #[serde(rename = "crossUp")]
    CrossUp { price: f64 },

    /// Fires when the price moves from above the threshold to at-or-below it.
    #[serde(rename = "crossDown")]
    CrossDown { price: f64 },

    /// Fires on a crossing in either direction.
    #[serde(rename = "cross")]
    Cross { price: f64 },

    /// Fires when the price leaves the `[lowerBound, upperBound]` channel.
    #[serde(rename = "exCh")]
    ExitChannel {
        #[serde(rename = "upperBound")]
        upper_bound: f64,
        #[serde(rename = "lowerBound")]
        lower_bound: f64,
    },

    /// Fires when the price enters the `[lowerBound, upperBound]` channel.
    #[serde(rename = "entCh")]
    EnterChannel {
        #[serde(rename = "upperBound")]
        upper_bound: f64,
        #[serde(rename = "lowerBound")]
        lower_bound: f64,
    },

    /// Fires while the 24h high sits above the threshold.
    #[serde(rename = "24_High")]
    High24h { price: f64 },

    /// Fires while the 24h low sits below the threshold.
    #[serde(rename = "24_Low")]
    Low24h { price: f64 },

    /// Fires while the 24h price change sits below the threshold.
    #[serde(rename = "priceChange_24")]
    Change24h { price: f64 },
}

impl Condition {
    /// Build a condition from raw stored or submitted fields.
    ///
    /// Single-threshold kinds require `price`; channel kinds require both
    /// bounds with `upper_bound > lower_bound`.
    pub fn from_parts(
        kind: &str,
        price: Option<f64>,
        upper_bound: Option<f64>,
        lower_bound: Option<f64>,
    ) -> Result<Self, ConditionError> {
        match kind {
            "crossUp" => Ok(Self::CrossUp {
                price: require_price(kind, price)?,
            }),
            "crossDown" => Ok(Self::CrossDown {
                price: require_price(kind, price)?,
            }),
            "cross" => Ok(Self::Cross {
                price: require_price(kind, price)?,
            }),
            "exCh" => {
                let (upper_bound, lower_bound) = require_bounds(kind, upper_bound, lower_bound)?;
                Ok(Self::ExitChannel {
                    upper_bound,
                    lower_bound,
                })
            }
            "entCh" => {
                let (upper_bound, lower_bound) = require_bounds(kind, upper_bound, lower_bound)?;
                Ok(Self::EnterChannel {
                    upper_bound,
                    lower_bound,
                })
            }
            "24_High" => Ok(Self::High24h {
                price: require_price(kind, price)?,
            }),
            "24_Low" => Ok(Self::Low24h {
                price: require_price(kind, price)?,
            }),
            "priceChange_24" => Ok(Self::Change24h {
                price: require_price(kind, price)?,
            }),
            other => Err(ConditionError::UnknownKind(other.to_string())),
        }
    }

    /// Wire name of this condition kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CrossUp { .. } => "crossUp",
            Self::CrossDown { .. } => "crossDown",
            Self::Cross { .. } => "cross",
            Self::ExitChannel { .. } => "exCh",
            Self::EnterChannel { .. } => "entCh",
            Self::High24h { .. } => "24_High",
            Self::Low24h { .. } => "24_Low",
            Self::Change24h { .. } => "priceChange_24",
        }
    }

    /// The single threshold price, for kinds that have one.
    pub fn threshold_price(&self) -> Option<f64> {
        match self {
            Self::CrossUp { price }
            | Self::CrossDown { price }
            | Self::Cross { price }
            | Self::High24h { price }
            | Self::Low24h { price }
            | Self::Change24h { price } => Some(*price),
            Self::ExitChannel { .. } | Self::EnterChannel { .. } => None,
        }
    }

    /// `(upper_bound, lower_bound)` for channel kinds.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        match self {
            Self::ExitChannel {
                upper_bound,
                lower_bound,
            }
            | Self::EnterChannel {
                upper_bound,
                lower_bound,
            } => Some((*upper_bound, *lower_bound)),
            _ => None,
        }
    }
}

fn require_price(kind: &str, price: Option<f64>) -> Result<f64, ConditionError> {
    let price = price.ok_or_else(|| ConditionError::MissingPrice {
        kind: kind.to_string(),
    })?;
    if !price.is_finite() {
        return Err(ConditionError::NonFinite {
            kind: kind.to_string(),
        });
    }
    Ok(price)
}

fn require_bounds(
    kind: &str,
    upper_bound: Option<f64>,
    lower_bound: Option<f64>,
) -> Result<(f64, f64), ConditionError> {
    let (upper, lower) = match (upper_bound, lower_bound) {
        (Some(upper), Some(lower)) => (upper, lower),
        _ => {
            return Err(ConditionError::MissingBounds {
                kind: kind.to_string(),
            })
        }
    };
    if !upper.is_finite() || !lower.is_finite() {
        return Err(ConditionError::NonFinite {
            kind: kind.to_string(),
        });
    }
    if upper <= lower {
        return Err(ConditionError::InvalidBounds { upper, lower });
    }
    Ok((upper, lower))
}

/// One user-defined watch on a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertConfig {
    #[serde(rename = "userID")]
    pub user_id: String,

    /// Unique within the owning user.
    #[serde(rename = "alertID")]
    pub alert_id: String,

    /// Exchange ticker, normalized to lowercase.
    pub symbol: String,

    #[serde(flatten)]
    pub condition: Condition,

    /// Notification destination.
    pub email: String,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl AlertConfig {
    /// Create an alert, normalizing the symbol.
    pub fn new(
        user_id: impl Into<String>,
        alert_id: impl Into<String>,
        symbol: &str,
        condition: Condition,
        email: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            alert_id: alert_id.into(),
            symbol: normalize_symbol(symbol),
            condition,
            email: email.into(),
            created_at: Utc::now(),
        }
    }
}

/// Canonical symbol form used across stores, fetches and evaluation.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_lowercase()
}
