use std::future::Future;
use std::sync::Arc;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};
use crate::domains::auth::models::{NewSessionEntry, TokenPair};
use crate::domains::auth::services::TokenCodec;
use crate::shared::database::{LedgerTransaction, SessionLedger};
use crate::shared::errors::{CodecError, LedgerError, SessionError};
use crate::shared::utils::{new_family_id, new_refresh_id};

/// refresh id 충돌 시 재생성 횟수
const MAX_INSERT_ATTEMPTS: u32 = 3;

/// 세션 수명 정책
/// Session lifetime policy
#[derive(Debug, Clone, Copy)]
pub struct SessionPolicy {
    /// Access Token 수명 (분 단위 권장)
    pub access_ttl: Duration,
    /// Refresh Token / 원장 항목 수명
    pub session_ttl: Duration,
}

/// 세션 회전 프로토콜
/// Session Rotation Protocol
///
/// 상태 (패밀리 단위):
/// - ACTIVE: 미사용 항목이 정확히 1개
/// - ROTATING: 트랜잭션 안에서 old -> new 교환 중
/// - REVOKED: 패밀리 삭제됨 (종료 상태)
///
/// 사용된 refresh token이 다시 제시되면 패밀리 전체를 폐기 (fail-closed)
#[derive(Clone)]
pub struct SessionService {
    ledger: Arc<dyn SessionLedger>,
    codec: TokenCodec,
    policy: SessionPolicy,
}

impl SessionService {
    pub fn new(ledger: Arc<dyn SessionLedger>, codec: TokenCodec, policy: SessionPolicy) -> Self {
        Self { ledger, codec, policy }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn policy(&self) -> SessionPolicy {
        self.policy
    }

    /// 로그인 성공 -> 새 패밀리 생성
    /// Open a new family after a successful login
    pub async fn open(&self, owner: &str) -> Result<TokenPair, SessionError> {
        self.open_at(owner, Utc::now()).await
    }

    pub async fn open_at(&self, owner: &str, now: DateTime<Utc>) -> Result<TokenPair, SessionError> {
        // 새 패밀리 생성은 재시도해도 안전 (매번 새 ID)
        let pair = retry_once("open", move || self.try_open(owner, now)).await?;
        info!(owner, family_id = %short(&pair.family_id), "session family opened");
        Ok(pair)
    }

    async fn try_open(&self, owner: &str, now: DateTime<Utc>) -> Result<TokenPair, SessionError> {
        let family_id = new_family_id();

        let mut tx = self.ledger.begin().await?;
        let refresh_id = self.insert_child(tx.as_mut(), owner, &family_id, now).await?;
        let pair = self.issue_pair(owner, &family_id, &refresh_id, now)?;
        tx.commit().await?;

        Ok(pair)
    }

    /// Refresh Token 회전
    /// Exchange a refresh token for a new pair
    ///
    /// 재시도하지 않음: commit 결과가 불확실한 상태에서 재시도하면
    /// 정상 클라이언트도 재사용으로 판정될 수 있음
    pub async fn rotate(&self, refresh_token: &str) -> Result<TokenPair, SessionError> {
        self.rotate_at(refresh_token, Utc::now()).await
    }

    pub async fn rotate_at(&self, refresh_token: &str, now: DateTime<Utc>) -> Result<TokenPair, SessionError> {
        // 1. 클레임 수준 검증
        let claims = match self.codec.decode_refresh(refresh_token, now) {
            Ok(claims) => claims,
            Err(CodecError::Expired) => {
                debug!("refresh token rejected: expired");
                return Err(SessionError::Expired);
            }
            Err(e) => {
                debug!(reason = %e, "refresh token rejected");
                return Err(SessionError::Invalid);
            }
        };
        let owner = claims.sub.as_str();

        // 2. 원장 조회 (행 잠금)
        let mut tx = self.ledger.begin().await?;
        let entry = match tx.get(owner, &claims.jti).await? {
            Some(entry) => entry,
            None => {
                debug!(owner, "refresh token rejected: no ledger entry");
                return Err(SessionError::Invalid);
            }
        };

        if entry.family_id != claims.sid {
            warn!(owner, "refresh token family does not match ledger entry");
            return Err(SessionError::Invalid);
        }

        // 자연 만료는 탈취 증거가 아님 -> 패밀리 유지
        if entry.is_expired(now) {
            debug!(owner, family_id = %short(&entry.family_id), "refresh token rejected: ledger entry expired");
            return Err(SessionError::Expired);
        }

        if entry.consumed {
            let revoked = tx.revoke_family(owner, &entry.family_id).await?;
            tx.commit().await?;
            warn!(
                owner,
                family_id = %short(&entry.family_id),
                revoked,
                "refresh token reuse detected, family revoked"
            );
            return Err(SessionError::Invalid);
        }

        // 3. old -> new 교환 (하나의 트랜잭션)
        tx.mark_consumed(owner, &entry.refresh_id).await?;
        let refresh_id = self.insert_child(tx.as_mut(), owner, &entry.family_id, now).await?;
        // 서명 실패 시 commit 전이므로 rollback됨
        let pair = self.issue_pair(owner, &entry.family_id, &refresh_id, now)?;
        tx.commit().await?;

        debug!(owner, family_id = %short(&entry.family_id), "refresh token rotated");
        Ok(pair)
    }

    /// 로그아웃 / 명시적 폐기
    /// Revoke the family of a refresh token. Already-revoked families are a
    /// no-op success.
    pub async fn revoke(&self, refresh_token: &str) -> Result<(), SessionError> {
        // 만료된 토큰으로도 로그아웃 가능
        let claims = self.codec.inspect_refresh(refresh_token).map_err(|e| {
            debug!(reason = %e, "logout rejected");
            SessionError::Invalid
        })?;

        let (owner, family_id) = (claims.sub.as_str(), claims.sid.as_str());
        let revoked = retry_once("revoke", move || self.try_revoke(owner, family_id)).await?;
        info!(owner, family_id = %short(family_id), revoked, "session family revoked");
        Ok(())
    }

    async fn try_revoke(&self, owner: &str, family_id: &str) -> Result<u64, SessionError> {
        let mut tx = self.ledger.begin().await?;
        let revoked = tx.revoke_family(owner, family_id).await?;
        tx.commit().await?;
        Ok(revoked)
    }

    /// 만료 항목 정리
    /// Housekeeping sweep
    pub async fn sweep_expired(&self) -> Result<u64, SessionError> {
        self.sweep_expired_at(Utc::now()).await
    }

    pub async fn sweep_expired_at(&self, now: DateTime<Utc>) -> Result<u64, SessionError> {
        retry_once("sweep", move || async move {
            self.ledger.sweep_expired(now).await.map_err(SessionError::from)
        })
        .await
    }

    /// 새 미사용 항목 저장 (충돌 시 refresh id 재생성)
    async fn insert_child(
        &self,
        tx: &mut dyn LedgerTransaction,
        owner: &str,
        family_id: &str,
        now: DateTime<Utc>,
    ) -> Result<String, SessionError> {
        let expires_at = now
            .checked_add_signed(self.policy.session_ttl)
            .ok_or(SessionError::LifetimeOutOfRange(self.policy.session_ttl.num_seconds()))?;

        for attempt in 1..=MAX_INSERT_ATTEMPTS {
            let entry = NewSessionEntry {
                owner: owner.to_string(),
                refresh_id: new_refresh_id(),
                family_id: family_id.to_string(),
                expires_at,
            };

            match tx.insert(&entry).await {
                Ok(()) => return Ok(entry.refresh_id),
                Err(LedgerError::Conflict) => {
                    warn!(owner, attempt, "refresh id collision, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(SessionError::Conflict)
    }

    fn issue_pair(
        &self,
        owner: &str,
        family_id: &str,
        refresh_id: &str,
        now: DateTime<Utc>,
    ) -> Result<TokenPair, SessionError> {
        let access = self
            .codec
            .issue_access(owner, self.policy.access_ttl, now)
            .map_err(|e| SessionError::TokenSigning(e.to_string()))?;
        let refresh = self
            .codec
            .issue_refresh(owner, family_id, refresh_id, self.policy.session_ttl, now)
            .map_err(|e| SessionError::TokenSigning(e.to_string()))?;

        Ok(TokenPair {
            access,
            refresh,
            family_id: family_id.to_string(),
        })
    }
}

/// 멱등 연산 재시도 (저장소 에러 1회)
/// Retry an idempotent operation once on storage failure
async fn retry_once<T, F, Fut>(op: &'static str, mut f: F) -> Result<T, SessionError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SessionError>>,
{
    match f().await {
        Err(SessionError::StorageFailure(msg)) => {
            warn!(op, error = %msg, "storage failure, retrying once");
            f().await
        }
        other => other,
    }
}

/// 로그용 ID 축약
fn short(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}
