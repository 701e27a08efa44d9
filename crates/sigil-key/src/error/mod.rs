mod store;

use thiserror::Error;

/// 密钥存储错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// 密钥未找到
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// 密钥已存在
    #[error("Key already exists: {0}")]
    KeyExists(String),

    /// 锁错误
    #[error("Lock error: {0}")]
    Lock(String),

    /// 存储后端错误
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Key模块的错误类型
#[derive(Error, Debug)]
pub enum Error {
    /// 密钥相关错误
    #[error("Key error: {0}")]
    KeyError(String),

    /// 算法不支持（无生成器、签名器或加密器）
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// 编码/解码错误
    #[error("Encoding error: {0}")]
    EncodingError(String),

    /// 存储错误
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Crypto error: {0}")]
    CryptoError(#[from] sigil_crypto::Error),
}

macro_rules! from_crypto_error {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Error {
                fn from(err: $ty) -> Self {
                    Error::CryptoError(err.into())
                }
            }
        )*
    };
}

from_crypto_error!(
    sigil_crypto::CipherError,
    sigil_crypto::ConstructionError,
    sigil_crypto::KeyLoadError,
    sigil_crypto::PkeError,
    sigil_crypto::SignError,
    sigil_crypto::VerifyError,
);

/// Result类型别名
pub type Result<T> = std::result::Result<T, Error>;
