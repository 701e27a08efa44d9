mod memory;

pub use memory::MemoryKeyStore;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::key::{Key, KeyAlgorithm, Ski};

/// Key metadata stored alongside the key material
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMetadata {
    pub ski: Ski,
    pub algorithm: KeyAlgorithm,
    pub private: bool,
    pub created_at: std::time::SystemTime,
}

impl KeyMetadata {
    pub fn for_key(key: &dyn Key) -> Self {
        Self {
            ski: key.ski(),
            algorithm: key.algorithm(),
            private: key.is_private(),
            created_at: std::time::SystemTime::now(),
        }
    }
}

/// Trait for key storage backends (synchronous)
///
/// Implementations must allow concurrent calls for distinct SKIs, and a
/// `get_key` that starts after a completed `store_key` must observe it.
/// Each implementation documents what storing an existing SKI does.
pub trait KeyStore: Send + Sync {
    /// Persist a key under its SKI
    fn store_key(&self, key: &dyn Key) -> Result<()>;

    /// Retrieve a key by its SKI
    fn get_key(&self, ski: &Ski) -> Result<Box<dyn Key>>;

    fn delete_key(&self, ski: &Ski) -> Result<()>;

    /// List all SKIs, sorted
    fn list_keys(&self) -> Result<Vec<Ski>>;

    fn exists(&self, ski: &Ski) -> Result<bool>;

    /// Get metadata without the key material
    fn get_metadata(&self, ski: &Ski) -> Result<KeyMetadata>;
}
