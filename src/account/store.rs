//! Account persistence over the durable storage layer.
//!
//! Two trees back the store: `accounts` (id -> account) and
//! `account_numbers` (number -> id). The number index is written in the
//! same transaction as the account row, so account-number uniqueness is
//! decided at persist time even when two creations race the same
//! candidate number.

use chrono::Utc;
use rust_decimal::Decimal;
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::Transactional;

use super::types::{Account, AccountStatus, AccountType};
use crate::error::ServiceError;
use crate::storage::Storage;

#[derive(Clone)]
pub struct AccountStore {
    db: sled::Db,
    accounts: sled::Tree,
    numbers: sled::Tree,
}

impl AccountStore {
    pub fn new(storage: &Storage) -> Result<Self, ServiceError> {
        Ok(Self {
            db: storage.handle(),
            accounts: storage.open_tree("accounts")?,
            numbers: storage.open_tree("account_numbers")?,
        })
    }

    /// Store-assigned identifier for a new account row.
    pub fn next_id(&self) -> Result<u64, ServiceError> {
        Ok(self.db.generate_id()?)
    }

    /// Persist a new account, claiming its account number in the same
    /// transaction. Returns `None` when the number is already taken; the
    /// caller draws a fresh candidate and retries.
    pub fn try_insert(&self, account: &Account) -> Result<Option<Account>, ServiceError> {
        let key = account.id.to_be_bytes();
        let value = Storage::encode(account)?;
        let number = account.account_number.clone();

        let inserted = (&self.accounts, &self.numbers)
            .transaction(|(accounts, numbers)| {
                if numbers.get(number.as_bytes())?.is_some() {
                    return Ok(false);
                }
                numbers.insert(number.as_bytes(), &key[..])?;
                accounts.insert(&key[..], value.clone())?;
                Ok(true)
            })
            .map_err(|e: TransactionError<()>| match e {
                TransactionError::Abort(()) => ServiceError::Internal("insert aborted".to_string()),
                TransactionError::Storage(err) => ServiceError::Storage(err.to_string()),
            })?;

        if inserted {
            Ok(Some(account.clone()))
        } else {
            Ok(None)
        }
    }

    pub fn get(&self, id: u64) -> Result<Option<Account>, ServiceError> {
        match self.accounts.get(id.to_be_bytes())? {
            Some(bytes) => Ok(Some(Storage::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn get_by_number(&self, number: &str) -> Result<Option<Account>, ServiceError> {
        match self.numbers.get(number.as_bytes())? {
            Some(id_bytes) => match self.accounts.get(&id_bytes)? {
                Some(bytes) => Ok(Some(Storage::decode(&bytes)?)),
                None => Ok(None),
            },
            None => Ok(None),
        }
    }

    pub fn exists_by_number(&self, number: &str) -> Result<bool, ServiceError> {
        Ok(self.numbers.contains_key(number.as_bytes())?)
    }

    /// Read-modify-write a single account as one serialized transaction.
    /// Two overlapping updates of the same account never both read the
    /// pre-update row. `updated_at` is refreshed on every committed write.
    pub fn update<F>(&self, id: u64, apply: F) -> Result<Account, ServiceError>
    where
        F: Fn(&mut Account) -> Result<(), ServiceError>,
    {
        let key = id.to_be_bytes();
        let result = self.accounts.transaction(|tx| {
            let bytes = tx.get(&key[..])?.ok_or_else(|| {
                ConflictableTransactionError::Abort(ServiceError::not_found_by_id(id))
            })?;
            let mut account: Account =
                Storage::decode(&bytes).map_err(ConflictableTransactionError::Abort)?;
            apply(&mut account).map_err(ConflictableTransactionError::Abort)?;
            account.updated_at = Utc::now();
            let encoded =
                Storage::encode(&account).map_err(ConflictableTransactionError::Abort)?;
            tx.insert(&key[..], encoded)?;
            Ok(account)
        });

        result.map_err(|e| match e {
            TransactionError::Abort(err) => err,
            TransactionError::Storage(err) => ServiceError::Storage(err.to_string()),
        })
    }

    /// All accounts of a customer in natural (id) order.
    pub fn list_by_customer(&self, customer_id: u64) -> Result<Vec<Account>, ServiceError> {
        self.scan(|a| a.customer_id == customer_id)
    }

    /// One page of a customer's accounts plus the total match count.
    pub fn list_by_customer_paged(
        &self,
        customer_id: u64,
        page: usize,
        size: usize,
    ) -> Result<(Vec<Account>, u64), ServiceError> {
        let all = self.list_by_customer(customer_id)?;
        let total = all.len() as u64;
        let content = all.into_iter().skip(page.saturating_mul(size)).take(size).collect();
        Ok((content, total))
    }

    pub fn find_by_status(&self, status: AccountStatus) -> Result<Vec<Account>, ServiceError> {
        self.scan(|a| a.status == status)
    }

    pub fn find_by_type(&self, account_type: AccountType) -> Result<Vec<Account>, ServiceError> {
        self.scan(|a| a.account_type == account_type)
    }

    pub fn find_by_customer_and_status(
        &self,
        customer_id: u64,
        status: AccountStatus,
    ) -> Result<Vec<Account>, ServiceError> {
        self.scan(|a| a.customer_id == customer_id && a.status == status)
    }

    pub fn find_with_low_balance(&self, threshold: Decimal) -> Result<Vec<Account>, ServiceError> {
        self.scan(|a| a.balance < threshold)
    }

    pub fn count_by_customer(&self, customer_id: u64) -> Result<u64, ServiceError> {
        Ok(self.list_by_customer(customer_id)?.len() as u64)
    }

    /// Sum of balances over the customer's active accounts.
    pub fn total_balance_by_customer(&self, customer_id: u64) -> Result<Decimal, ServiceError> {
        let active = self.find_by_customer_and_status(customer_id, AccountStatus::Active)?;
        Ok(active.iter().map(|a| a.balance).sum())
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    fn scan(&self, pred: impl Fn(&Account) -> bool) -> Result<Vec<Account>, ServiceError> {
        let mut out = Vec::new();
        for entry in self.accounts.iter() {
            let (_, value) = entry?;
            let account: Account = Storage::decode(&value)?;
            if pred(&account) {
                out.push(account);
            }
        }
        Ok(out)
    }
}
