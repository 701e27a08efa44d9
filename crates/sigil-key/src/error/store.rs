use super::{Error, StorageError};
use crate::key::Ski;

/// 存储相关的错误扩展
impl Error {
    /// 密钥未找到错误
    pub fn key_not_found(ski: &Ski) -> Self {
        Error::Storage(StorageError::KeyNotFound(ski.to_hex()))
    }

    /// 密钥已存在错误
    pub fn key_exists(ski: &Ski) -> Self {
        Error::Storage(StorageError::KeyExists(ski.to_hex()))
    }

    /// 锁错误
    pub fn lock_error(msg: impl std::fmt::Display) -> Self {
        Error::Storage(StorageError::Lock(msg.to_string()))
    }

    /// 存储后端错误
    pub fn backend(msg: impl std::fmt::Display) -> Self {
        Error::Storage(StorageError::Backend(msg.to_string()))
    }

    /// 是否为存储错误
    pub fn is_storage(&self) -> bool {
        matches!(self, Error::Storage(_))
    }
}
