//! Account number generation
//!
//! Numbers are 16 random digits grouped in blocks of 4
//! (`DDDD-DDDD-DDDD-DDDD`), drawn from the OS random source. A candidate
//! is re-drawn while the store already knows it; the store's number index
//! remains the final arbiter at persist time.

use rand::{rngs::OsRng, Rng};

use super::store::AccountStore;
use crate::error::ServiceError;

#[derive(Clone)]
pub struct AccountNumberGenerator {
    store: AccountStore,
}

impl AccountNumberGenerator {
    pub fn new(store: AccountStore) -> Self {
        Self { store }
    }

    /// Draw a candidate number that is unused at the moment of generation.
    pub fn generate(&self) -> Result<String, ServiceError> {
        loop {
            let number = random_account_number();
            if !self.store.exists_by_number(&number)? {
                return Ok(number);
            }
        }
    }
}

fn random_account_number() -> String {
    let mut rng = OsRng;
    let mut number = String::with_capacity(19);
    for i in 0..16 {
        if i > 0 && i % 4 == 0 {
            number.push('-');
        }
        let digit: u8 = rng.gen_range(0..10);
        number.push(char::from(b'0' + digit));
    }
    number
}
