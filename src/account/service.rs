//! Account lifecycle and balance rules.
//!
//! Every mutating operation runs as a single store transaction. Status
//! moves Active <-> Suspended freely, reaches Closed only at zero
//! balance, and never leaves Closed.

use rust_decimal::Decimal;
use tracing::{info, warn};

use super::number::AccountNumberGenerator;
use super::store::AccountStore;
use super::types::{to_money, Account, AccountStatus, AccountType};
use crate::config::AccountConfig;
use crate::error::ServiceError;

/// Creation parameters. Absent fields fall back to configured defaults.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub customer_id: u64,
    pub account_type: AccountType,
    pub initial_deposit: Option<Decimal>,
    pub overdraft_limit: Option<Decimal>,
    pub currency: Option<String>,
}

/// Partial update; only present fields are applied.
#[derive(Debug, Clone, Default)]
pub struct AccountChanges {
    pub overdraft_limit: Option<Decimal>,
    pub currency: Option<String>,
}

#[derive(Clone)]
pub struct AccountService {
    store: AccountStore,
    numbers: AccountNumberGenerator,
    config: AccountConfig,
}

impl AccountService {
    pub fn new(store: AccountStore, config: AccountConfig) -> Self {
        let numbers = AccountNumberGenerator::new(store.clone());
        Self {
            store,
            numbers,
            config,
        }
    }

    pub fn create(&self, new: NewAccount) -> Result<Account, ServiceError> {
        let overdraft_limit =
            to_money(new.overdraft_limit.unwrap_or(self.config.default_overdraft_limit));
        let currency = new
            .currency
            .unwrap_or_else(|| self.config.default_currency.clone());
        let balance = match new.initial_deposit {
            Some(deposit) if deposit > Decimal::ZERO => to_money(deposit),
            _ => to_money(Decimal::ZERO),
        };

        // A generated number can be claimed by a racing creation between
        // the uniqueness probe and the insert; the store reports the
        // collision and we draw again.
        loop {
            let number = self.numbers.generate()?;
            let now = chrono::Utc::now();
            let account = Account {
                id: self.store.next_id()?,
                account_number: number,
                customer_id: new.customer_id,
                account_type: new.account_type,
                status: AccountStatus::Active,
                balance,
                overdraft_limit,
                currency: currency.clone(),
                created_at: now,
                updated_at: now,
            };

            match self.store.try_insert(&account)? {
                Some(saved) => {
                    info!(
                        "Account {} created for customer {}",
                        saved.account_number, saved.customer_id
                    );
                    return Ok(saved);
                }
                None => {
                    warn!(
                        "Account number {} already taken, drawing a new one",
                        account.account_number
                    );
                }
            }
        }
    }

    pub fn get_by_id(&self, id: u64) -> Result<Account, ServiceError> {
        self.store
            .get(id)?
            .ok_or_else(|| ServiceError::not_found_by_id(id))
    }

    pub fn get_by_number(&self, number: &str) -> Result<Account, ServiceError> {
        self.store
            .get_by_number(number)?
            .ok_or_else(|| ServiceError::not_found_by_number(number))
    }

    pub fn list_by_customer(&self, customer_id: u64) -> Result<Vec<Account>, ServiceError> {
        self.store.list_by_customer(customer_id)
    }

    pub fn list_by_customer_paged(
        &self,
        customer_id: u64,
        page: usize,
        size: usize,
    ) -> Result<(Vec<Account>, u64), ServiceError> {
        self.store.list_by_customer_paged(customer_id, page, size)
    }

    pub fn update(&self, id: u64, changes: AccountChanges) -> Result<Account, ServiceError> {
        self.store.update(id, |account| {
            if account.is_closed() {
                return Err(ServiceError::InvalidOperation(
                    "Cannot update a closed account".to_string(),
                ));
            }
            if let Some(limit) = changes.overdraft_limit {
                account.overdraft_limit = to_money(limit);
            }
            if let Some(currency) = &changes.currency {
                account.currency = currency.clone();
            }
            Ok(())
        })
    }

    pub fn close(&self, id: u64) -> Result<(), ServiceError> {
        let account = self.store.update(id, |account| {
            if account.is_closed() {
                return Err(ServiceError::InvalidOperation(
                    "Account is already closed".to_string(),
                ));
            }
            if !account.balance.is_zero() {
                return Err(ServiceError::InvalidOperation(
                    "Cannot close account with non-zero balance".to_string(),
                ));
            }
            account.status = AccountStatus::Closed;
            Ok(())
        })?;
        info!("Account {} closed", account.account_number);
        Ok(())
    }

    pub fn suspend(&self, id: u64) -> Result<(), ServiceError> {
        self.store.update(id, |account| {
            if account.is_closed() {
                return Err(ServiceError::InvalidOperation(
                    "Cannot suspend a closed account".to_string(),
                ));
            }
            account.status = AccountStatus::Suspended;
            Ok(())
        })?;
        Ok(())
    }

    pub fn activate(&self, id: u64) -> Result<(), ServiceError> {
        self.store.update(id, |account| {
            if account.is_closed() {
                return Err(ServiceError::InvalidOperation(
                    "Cannot activate a closed account".to_string(),
                ));
            }
            account.status = AccountStatus::Active;
            Ok(())
        })?;
        Ok(())
    }

    pub fn get_balance(&self, id: u64) -> Result<Decimal, ServiceError> {
        Ok(self.get_by_id(id)?.balance)
    }

    /// Set the balance to an absolute amount, bounded below by the
    /// overdraft limit. The bound is checked inside the store
    /// transaction, against the balance the write will replace.
    pub fn update_balance(&self, id: u64, new_balance: Decimal) -> Result<Decimal, ServiceError> {
        let new_balance = to_money(new_balance);
        let account = self.store.update(id, |account| {
            if account.is_closed() {
                return Err(ServiceError::InvalidOperation(
                    "Cannot update the balance of a closed account".to_string(),
                ));
            }
            if new_balance < account.min_allowed_balance() {
                return Err(ServiceError::InsufficientFunds(
                    "Insufficient funds. Balance would exceed overdraft limit".to_string(),
                ));
            }
            account.balance = new_balance;
            Ok(())
        })?;
        Ok(account.balance)
    }
}
