use chrono::{DateTime, Utc};

/// Refresh 세션 원장 항목
/// One ledger row per issued refresh token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEntry {
    pub owner: String,
    pub refresh_id: String,
    /// 같은 로그인에서 파생된 모든 토큰이 공유
    /// Shared by every entry descended from one login
    pub family_id: String,
    pub consumed: bool,
    pub expires_at: DateTime<Utc>,
}

impl SessionEntry {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// 미사용 + 미만료
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        !self.consumed && !self.is_expired(now)
    }
}

/// 새 원장 항목 (insert용)
/// Data for a new ledger entry; always starts unconsumed
#[derive(Debug, Clone)]
pub struct NewSessionEntry {
    pub owner: String,
    pub refresh_id: String,
    pub family_id: String,
    pub expires_at: DateTime<Utc>,
}

impl From<NewSessionEntry> for SessionEntry {
    fn from(entry: NewSessionEntry) -> Self {
        Self {
            owner: entry.owner,
            refresh_id: entry.refresh_id,
            family_id: entry.family_id,
            consumed: false,
            expires_at: entry.expires_at,
        }
    }
}

/// 서명된 토큰과 만료 시각
/// A signed token and its expiry
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// 발급된 Access/Refresh 토큰 쌍
/// Access/refresh pair returned by login and rotation
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: IssuedToken,
    pub refresh: IssuedToken,
    pub family_id: String,
}
