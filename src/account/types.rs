//! Account type definitions

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Main account structure
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Account {
    // Identity
    pub id: u64,
    pub account_number: String,
    pub customer_id: u64,
    pub account_type: AccountType,

    // State
    pub status: AccountStatus,
    pub balance: Decimal,
    pub overdraft_limit: Decimal,
    pub currency: String,

    // Audit
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product category of an account. Fixed at creation.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    Current,
    Savings,
    Professional,
    Joint,
}

/// Lifecycle state. `Closed` is terminal.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    Active,
    Suspended,
    Closed,
}

impl Account {
    pub fn is_closed(&self) -> bool {
        self.status == AccountStatus::Closed
    }

    /// Lowest balance this account may reach.
    pub fn min_allowed_balance(&self) -> Decimal {
        -self.overdraft_limit
    }
}

/// Normalize a monetary amount to the fixed 2-digit scale.
pub fn to_money(value: Decimal) -> Decimal {
    let mut value = value.round_dp(2);
    value.rescale(2);
    value
}
