use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

/// Durable key-value storage backing the account trees.
pub struct Storage {
    db: sled::Db,
}

impl Storage {
    pub fn open(path: &str) -> Result<Self, ServiceError> {
        let db = sled::open(path)?;
        Ok(Storage { db })
    }

    /// In-memory database that is discarded on drop. Used by tests.
    pub fn temporary() -> Result<Self, ServiceError> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Storage { db })
    }

    pub fn open_tree(&self, name: &str) -> Result<sled::Tree, ServiceError> {
        Ok(self.db.open_tree(name)?)
    }

    /// Cheap cloneable handle on the underlying database.
    pub fn handle(&self) -> sled::Db {
        self.db.clone()
    }

    /// Monotonic identifier, unique for the lifetime of the database.
    pub fn next_id(&self) -> Result<u64, ServiceError> {
        Ok(self.db.generate_id()?)
    }

    // Generic Helper: Encode
    pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, ServiceError> {
        Ok(bincode::serialize(value)?)
    }

    // Generic Helper: Decode
    pub fn decode<T: for<'a> Deserialize<'a>>(bytes: &[u8]) -> Result<T, ServiceError> {
        Ok(bincode::deserialize(bytes)?)
    }
}
