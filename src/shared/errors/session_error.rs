use thiserror::Error;

/// 세션 원장 에러
/// Session ledger (storage) errors
#[derive(Error, Debug)]
pub enum LedgerError {
    /// refresh id 중복 (재생성 후 재시도)
    /// Refresh id collision on insert; caller regenerates and retries
    #[error("Refresh id already exists")]
    Conflict,

    /// 트랜잭션/연결 에러
    /// Transaction or connection failure
    #[error("Storage failure: {0}")]
    Storage(String),
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        LedgerError::Storage(err.to_string())
    }
}

/// 토큰 코덱 에러 (내부 로깅용으로만 구분)
/// Token codec errors. Distinguished for logging only; callers collapse
/// them into a single invalid-token outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("token is structurally malformed: {0}")]
    Malformed(String),

    #[error("token signature mismatch")]
    BadSignature,

    #[error("token kind mismatch")]
    WrongKind,

    #[error("token expired")]
    Expired,

    #[error("token not yet valid")]
    NotYetValid,

    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// 세션 회전 프로토콜 에러
/// Rotation protocol outcome taxonomy
#[derive(Error, Debug)]
pub enum SessionError {
    /// 위조/손상/알 수 없음/재사용 토큰 (클라이언트에는 동일하게 보임)
    /// Malformed, unsigned, unknown or reused token
    #[error("Invalid token")]
    Invalid,

    /// 자연 만료
    /// Natural TTL lapse
    #[error("Refresh token expired")]
    Expired,

    /// refresh id 재생성 시도 초과
    /// Refresh id collisions exhausted the retry budget
    #[error("Refresh id conflict")]
    Conflict,

    /// 저장소 에러 (원장 변경 없음)
    /// Storage failure; no ledger mutation was committed
    #[error("Storage failure: {0}")]
    StorageFailure(String),

    /// 토큰 서명 실패 (원장 변경 없음)
    /// Signing failed before commit; nothing was persisted
    #[error("Token signing failed: {0}")]
    TokenSigning(String),

    /// 세션 수명 계산 범위 초과 (원장 변경 없음)
    /// Session lifetime does not fit the clock range
    #[error("Session lifetime out of range: {0}s")]
    LifetimeOutOfRange(i64),
}

impl From<LedgerError> for SessionError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Conflict => SessionError::Conflict,
            LedgerError::Storage(msg) => SessionError::StorageFailure(msg),
        }
    }
}
