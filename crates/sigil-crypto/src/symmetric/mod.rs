//! Symmetric encryption

pub mod cbc;

pub use self::cbc::{AesCbcPkcs7Opts, IvSource};
