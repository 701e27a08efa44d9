//! Key material encodings

pub mod pem;

pub use self::pem::{load, load_private_key, to_pem, KeyCurve, KeyMaterial, MaterialKind, PemLabel};
