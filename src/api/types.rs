// Wire types for the account HTTP API
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::account::{Account, AccountChanges, AccountStatus, AccountType, NewAccount};
use crate::error::ServiceError;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    pub customer_id: Option<u64>,
    pub account_type: Option<AccountType>,
    pub initial_deposit: Option<Decimal>,
    pub overdraft_limit: Option<Decimal>,
    pub currency: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    pub overdraft_limit: Option<Decimal>,
    pub currency: Option<String>,
}

impl CreateAccountRequest {
    pub fn validate(&self) -> Result<NewAccount, ServiceError> {
        let mut details = HashMap::new();
        if self.customer_id.is_none() {
            details.insert("customerId".to_string(), "Customer ID is required".to_string());
        }
        if self.account_type.is_none() {
            details.insert("accountType".to_string(), "Account type is required".to_string());
        }
        if let Some(deposit) = self.initial_deposit {
            if deposit <= Decimal::ZERO {
                details.insert(
                    "initialDeposit".to_string(),
                    "Initial deposit must be positive".to_string(),
                );
            }
        }
        if let Some(limit) = self.overdraft_limit {
            if limit < Decimal::ZERO {
                details.insert(
                    "overdraftLimit".to_string(),
                    "Overdraft limit must be non-negative".to_string(),
                );
            }
        }
        if let Some(currency) = &self.currency {
            if !is_currency_code(currency) {
                details.insert(
                    "currency".to_string(),
                    "Currency must be a valid 3-letter code".to_string(),
                );
            }
        }

        match (self.customer_id, self.account_type) {
            (Some(customer_id), Some(account_type)) if details.is_empty() => Ok(NewAccount {
                customer_id,
                account_type,
                initial_deposit: self.initial_deposit,
                overdraft_limit: self.overdraft_limit,
                currency: self.currency.clone(),
            }),
            _ => Err(ServiceError::Validation(details)),
        }
    }
}

impl UpdateAccountRequest {
    pub fn validate(&self) -> Result<AccountChanges, ServiceError> {
        let mut details = HashMap::new();
        if let Some(limit) = self.overdraft_limit {
            if limit < Decimal::ZERO {
                details.insert(
                    "overdraftLimit".to_string(),
                    "Overdraft limit must be non-negative".to_string(),
                );
            }
        }
        if let Some(currency) = &self.currency {
            if !is_currency_code(currency) {
                details.insert(
                    "currency".to_string(),
                    "Currency must be a valid 3-letter code".to_string(),
                );
            }
        }

        if details.is_empty() {
            Ok(AccountChanges {
                overdraft_limit: self.overdraft_limit,
                currency: self.currency.clone(),
            })
        } else {
            Err(ServiceError::Validation(details))
        }
    }
}

fn is_currency_code(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase())
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: u64,
    pub account_number: String,
    pub customer_id: u64,
    pub account_type: AccountType,
    pub status: AccountStatus,
    pub balance: Decimal,
    pub overdraft_limit: Decimal,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            account_number: account.account_number,
            customer_id: account.customer_id,
            account_type: account.account_type,
            status: account.status,
            balance: account.balance,
            overdraft_limit: account.overdraft_limit,
            currency: account.currency,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    pub content: Vec<T>,
    pub page: usize,
    pub size: usize,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl<T> PageResponse<T> {
    pub fn new(content: Vec<T>, page: usize, size: usize, total_elements: u64) -> Self {
        let total_pages = if size == 0 {
            0
        } else {
            total_elements.div_ceil(size as u64)
        };
        Self {
            content,
            page,
            size,
            total_elements,
            total_pages,
        }
    }
}

/// Optional pagination parameters; a bare request returns the full list.
#[derive(Deserialize, Debug, Default)]
pub struct PageQuery {
    pub page: Option<usize>,
    pub size: Option<usize>,
}

#[derive(Deserialize, Debug)]
pub struct BalanceQuery {
    #[serde(rename = "newBalance")]
    pub new_balance: String,
}

/// Error body emitted on every 4xx/5xx.
#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorBody {
    pub timestamp: DateTime<Utc>,
    pub status: u16,
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, String>>,
}

impl ErrorBody {
    pub fn new(
        status: u16,
        error: &str,
        message: &str,
        details: Option<HashMap<String, String>>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            status,
            error: error.to_string(),
            message: message.to_string(),
            details,
        }
    }

    pub fn unauthorized(error: &str, message: &str) -> Self {
        Self::new(401, error, message, None)
    }
}
