// src/domain/commission.rs

use crate::domain::property::TransactionType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 100% expressed in basis points.
pub const FULL_RATE_BPS: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommissionStatus {
    Pending,
    Paid,
    Cancelled,
}

text_enum!(CommissionStatus {
    Pending => "pending",
    Paid => "paid",
    Cancelled => "cancelled",
});

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Commission {
    pub id: i64,
    pub property_id: i64,
    pub agent_id: i64,
    pub transaction_type: TransactionType,
    pub transaction_amount: i64,
    /// Frozen at creation; later changes to the property's rate do not apply.
    pub commission_rate: u32,
    pub commission_amount: i64,
    pub status: CommissionStatus,
    pub payment_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `floor(amount * rate / 10000)` in integer arithmetic.
///
/// The product is widened to i128 so no representable amount can overflow.
/// Callers pass a positive amount; for those, integer division is the floor.
pub fn commission_amount(transaction_amount: i64, rate_bps: u32) -> i64 {
    let product = i128::from(transaction_amount) * i128::from(rate_bps);
    let amount = product / i128::from(FULL_RATE_BPS);
    // amount <= transaction_amount because rate_bps <= 10000
    amount as i64
}

/// Percentage text for a basis-point rate with trailing zeros trimmed:
/// 800 -> "8%", 650 -> "6.5%", 1234 -> "12.34%".
pub fn format_rate(rate_bps: u32) -> String {
    let whole = rate_bps / 100;
    let frac = rate_bps % 100;
    if frac == 0 {
        format!("{whole}%")
    } else if frac % 10 == 0 {
        format!("{whole}.{}%", frac / 10)
    } else {
        format!("{whole}.{frac:02}%")
    }
}

/// Label used in audit descriptions, e.g. "8% (default)" or "6.5% (custom)".
pub fn rate_label(rate_bps: u32, is_custom: bool) -> String {
    let source = if is_custom { "custom" } else { "default" };
    format!("{} ({source})", format_rate(rate_bps))
}

/// Two-decimal rendering of a minor-unit amount for human descriptions.
pub fn format_money(minor_units: i64) -> String {
    let sign = if minor_units < 0 { "-" } else { "" };
    let abs = minor_units.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}
