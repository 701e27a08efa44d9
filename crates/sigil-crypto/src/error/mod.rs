use thiserror::Error;

// ============================================================================
// Key material loading
// ============================================================================

/// PEM 解析与分类错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// 输入中没有可解码的 PEM 块
    #[error("input does not contain a decodable PEM block: {0}")]
    NotPem(String),

    /// PEM 块的类型标签不被支持
    #[error("unsupported PEM block type: {0}")]
    UnsupportedBlockType(String),

    /// 证书 DER 解析失败
    #[error("certificate parse error: {0}")]
    Certificate(String),
}

/// 公钥或私钥解码错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyLoadError {
    /// 私钥解码失败
    #[error("private key decode failed: {0}")]
    PrivateKey(String),

    /// 公钥解码失败
    #[error("public key decode failed: {0}")]
    PublicKey(String),

    /// 密钥的曲线不被支持
    #[error("unsupported key algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

/// 加载过程中任一步骤的错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Key(#[from] KeyLoadError),
}

// ============================================================================
// Handles
// ============================================================================

/// 句柄构造错误，不会返回部分构造的句柄
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConstructionError {
    #[error("failed to load private key: {0}")]
    PrivateKey(#[source] LoadError),

    #[error("failed to load public key: {0}")]
    PublicKey(#[source] LoadError),

    /// 配置无效（例如 SM2 用户标识过长）
    #[error("invalid handle configuration: {0}")]
    Config(String),
}

/// 签名错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignError {
    /// 句柄只绑定了公钥
    #[error("handle has no private key")]
    MissingPrivateKey,

    /// 摘要长度不被算法接受
    #[error("malformed digest: {0}")]
    MalformedDigest(String),

    /// 底层签名运算失败
    #[error("signing failed: {0}")]
    Signing(String),

    /// 签名值编码失败
    #[error("signature encoding failed: {0}")]
    Encoding(String),
}

/// 签名结构无法解析；密码学上的验证失败不属于此错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("malformed signature: {0}")]
    MalformedSignature(String),
}

/// SM2 公钥加密错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PkeError {
    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("decryption failed: {0}")]
    Decryption(String),

    /// 句柄只绑定了公钥
    #[error("handle has no private key")]
    MissingPrivateKey,
}

// ============================================================================
// Symmetric
// ============================================================================

/// 对称加密错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CipherError {
    #[error("invalid key length: {0} (expected 16, 24 or 32)")]
    InvalidKeyLength(usize),

    #[error("invalid IV length: expected {expected}, got {actual}")]
    InvalidIv { expected: usize, actual: usize },

    /// 随机源读取失败或长度不足
    #[error("randomness source failed: {0}")]
    Randomness(String),

    /// 同时指定了 IV 与随机源
    #[error("IV and randomness source are mutually exclusive")]
    ConflictingOptions,

    #[error("options not recognized by this encryptor: {0}")]
    UnrecognizedOptions(String),

    #[error("invalid ciphertext: {0}")]
    InvalidCiphertext(String),

    #[error("invalid padding")]
    InvalidPadding,
}

// ============================================================================
// Crate-level error
// ============================================================================

/// Crypto模块的错误类型
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    KeyLoad(#[from] KeyLoadError),

    #[error(transparent)]
    Construction(#[from] ConstructionError),

    #[error(transparent)]
    Sign(#[from] SignError),

    #[error(transparent)]
    Verify(#[from] VerifyError),

    #[error(transparent)]
    Pke(#[from] PkeError),

    #[error(transparent)]
    Cipher(#[from] CipherError),

    /// 密钥导出编码错误
    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Getrandom error: {0}")]
    GetrandomError(String),
}

impl From<LoadError> for Error {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::Parse(e) => Error::Parse(e),
            LoadError::Key(e) => Error::KeyLoad(e),
        }
    }
}

/// Result类型别名
pub type Result<T> = std::result::Result<T, Error>;
