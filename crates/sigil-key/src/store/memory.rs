use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use zeroize::Zeroizing;

use super::{KeyMetadata, KeyStore};
use crate::error::{Error, Result};
use crate::key::{decode_key, Key, Ski};

/// Type alias for the key storage map
type KeyStorage = Arc<RwLock<HashMap<Ski, (KeyMetadata, Zeroizing<Vec<u8>>)>>>;

/// In-memory key store
///
/// Storing an SKI that is already present fails with
/// [`StorageError::KeyExists`](crate::error::StorageError::KeyExists) and
/// leaves the stored key untouched.
#[derive(Clone, Default)]
pub struct MemoryKeyStore {
    keys: KeyStorage,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyStore for MemoryKeyStore {
    fn store_key(&self, key: &dyn Key) -> Result<()> {
        let metadata = KeyMetadata::for_key(key);
        let der = Zeroizing::new(key.to_der()?);

        let mut keys = self
            .keys
            .write()
            .map_err(|_| Error::lock_error("failed to acquire write lock"))?;

        if keys.contains_key(&metadata.ski) {
            return Err(Error::key_exists(&metadata.ski));
        }

        tracing::debug!(
            ski = %metadata.ski,
            algorithm = %metadata.algorithm,
            private = metadata.private,
            "stored key"
        );
        keys.insert(metadata.ski, (metadata, der));
        Ok(())
    }

    fn get_key(&self, ski: &Ski) -> Result<Box<dyn Key>> {
        let keys = self
            .keys
            .read()
            .map_err(|_| Error::lock_error("failed to acquire read lock"))?;

        let (metadata, der) = keys.get(ski).ok_or_else(|| Error::key_not_found(ski))?;
        decode_key(metadata.algorithm, metadata.private, der)
    }

    fn delete_key(&self, ski: &Ski) -> Result<()> {
        let mut keys = self
            .keys
            .write()
            .map_err(|_| Error::lock_error("failed to acquire write lock"))?;

        keys.remove(ski)
            .ok_or_else(|| Error::key_not_found(ski))
            .map(|_| ())
    }

    fn list_keys(&self) -> Result<Vec<Ski>> {
        let keys = self
            .keys
            .read()
            .map_err(|_| Error::lock_error("failed to acquire read lock"))?;

        let mut skis: Vec<Ski> = keys.keys().copied().collect();
        skis.sort();
        Ok(skis)
    }

    fn exists(&self, ski: &Ski) -> Result<bool> {
        let keys = self
            .keys
            .read()
            .map_err(|_| Error::lock_error("failed to acquire read lock"))?;

        Ok(keys.contains_key(ski))
    }

    fn get_metadata(&self, ski: &Ski) -> Result<KeyMetadata> {
        let keys = self
            .keys
            .read()
            .map_err(|_| Error::lock_error("failed to acquire read lock"))?;

        keys.get(ski)
            .map(|(metadata, _)| metadata.clone())
            .ok_or_else(|| Error::key_not_found(ski))
    }
}
