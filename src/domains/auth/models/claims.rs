use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// 토큰 종류 (Access/Refresh 구분용 클레임)
/// Distinguishing claim so a refresh token is never accepted as an access
/// token and vice versa
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Access Token Claims (DB 조회 없이 검증 가능)
/// Access token claims, self-contained
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccessClaims {
    /// 계정 이메일
    /// Account identity
    pub sub: String,

    pub typ: TokenKind,

    /// 발급 시간 (Unix timestamp)
    pub iat: i64,

    /// 유효 시작 시간 (Unix timestamp)
    pub nbf: i64,

    /// 만료 시간 (Unix timestamp)
    pub exp: i64,

    /// 토큰 고유 ID
    /// Per-token unique id
    pub jti: String,
}

/// Refresh Token Claims (원장 항목이 있어야 의미 있음)
/// Refresh token claims; meaningless without a matching ledger entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RefreshClaims {
    pub sub: String,

    pub typ: TokenKind,

    /// 토큰 패밀리 ID
    /// Family correlator
    pub sid: String,

    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,

    /// refresh id (원장 키)
    /// The ledger's refresh id
    pub jti: String,
}

/// 코덱이 공통으로 다루는 클레임 인터페이스
/// Temporal and kind accessors shared by both claim shapes
pub trait TokenClaims: Serialize + DeserializeOwned {
    const KIND: TokenKind;

    fn kind(&self) -> TokenKind;
    fn not_before(&self) -> i64;
    fn expires_at(&self) -> i64;
}

impl TokenClaims for AccessClaims {
    const KIND: TokenKind = TokenKind::Access;

    fn kind(&self) -> TokenKind {
        self.typ
    }

    fn not_before(&self) -> i64 {
        self.nbf
    }

    fn expires_at(&self) -> i64 {
        self.exp
    }
}

impl TokenClaims for RefreshClaims {
    const KIND: TokenKind = TokenKind::Refresh;

    fn kind(&self) -> TokenKind {
        self.typ
    }

    fn not_before(&self) -> i64 {
        self.nbf
    }

    fn expires_at(&self) -> i64 {
        self.exp
    }
}
