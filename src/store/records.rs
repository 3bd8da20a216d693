/// Persisted record types for the code store
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A guest named on a purchase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guest {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Card details kept for the operator's records (never the full number)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentSummary {
    pub last4: String,
    pub card_type: String,
}

/// A purchase: the payment event that one or more access codes hang off.
///
/// Created once, never mutated, only removed via bulk clear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: String,
    /// Purchase kind, e.g. "day_pass" or "stay"
    pub kind: String,
    pub selected_dates: Vec<NaiveDate>,
    pub adults: Vec<Guest>,
    pub children: u32,
    pub total_days: u32,
    pub total_adults: u32,
    pub total_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentSummary>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// An issued access code.
///
/// Immutable once created except for deletion (revocation). `starts_at` is
/// always the intended, customer-facing window start; if the gateway needed
/// a later start for a same-day booking, that bump is not recorded here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessCode {
    pub id: String,
    /// Back-reference to the owning purchase (lookup only, not ownership)
    pub purchase_id: String,
    pub device_id: String,
    /// Handle returned by the lock gateway, or a `local_` placeholder if
    /// the gateway call failed
    pub provider_code_id: String,
    pub pin_code: String,
    pub code_name: String,
    pub customer_name: String,
    pub customer_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    /// Calendar day the code is "for", used for day-pass grouping;
    /// independent of the precise instant window
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
