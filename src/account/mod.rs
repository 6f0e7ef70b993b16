//! Account domain module
//!
//! This module implements the account aggregate and its rules:
//! - Unique, permanent account numbers
//! - Overdraft-bounded balance updates
//! - Active / Suspended / Closed lifecycle with Closed terminal

pub mod number;
pub mod service;
pub mod store;
pub mod types;

pub use number::AccountNumberGenerator;
pub use service::{AccountChanges, AccountService, NewAccount};
pub use store::AccountStore;
pub use types::{Account, AccountStatus, AccountType};
