//! Generate, store, then bind a signer
//!
//! The three steps always run in that order. Generation has no rollback: if
//! the store rejects the key, the error is returned, no signer is built and
//! the generated key is dropped. Ephemeral requests are stored like any
//! other; the flag is only reported.

use crate::error::Result;
use crate::key::{Key, KeyGenOpts};
use crate::keygen::key_gen;
use crate::signer::{KeySigner, SignerRegistry};
use crate::store::KeyStore;

/// [`request_key_with`] using the default signer registry
pub fn request_key(store: &dyn KeyStore, opts: KeyGenOpts) -> Result<(Box<dyn Key>, KeySigner)> {
    request_key_with(&SignerRegistry::default(), store, opts)
}

/// Generate a key, persist it in `store` and build its signer
pub fn request_key_with(
    registry: &SignerRegistry,
    store: &dyn KeyStore,
    opts: KeyGenOpts,
) -> Result<(Box<dyn Key>, KeySigner)> {
    let key = key_gen(opts)?;

    if let Err(err) = store.store_key(key.as_ref()) {
        tracing::warn!(
            ski = %key.ski(),
            algorithm = %key.algorithm(),
            error = %err,
            "key generated but not stored, discarding"
        );
        return Err(err);
    }

    let signer = registry.build_signer(key.as_ref())?;
    Ok((key, signer))
}
