// src/domains/auth/services/token_codec.rs
use crate::domains::auth::models::{AccessClaims, IssuedToken, RefreshClaims, TokenClaims, TokenKind};
use crate::shared::errors::CodecError;
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

/// 토큰 코덱
/// Token Codec: signs and verifies access/refresh tokens (HS256)
///
/// 역할:
/// - Access Token 발급 (원장 조회 없이 검증 가능)
/// - Refresh Token 발급 (family id, refresh id 포함)
/// - 서명/구조/시간 검증 (원장은 모름)
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    /// 시계 오차 허용 범위 (초)
    /// Clock skew tolerance in seconds
    leeway_secs: i64,
}

impl TokenCodec {
    /// 코덱 생성
    /// Create codec from a shared secret
    pub fn new(secret: &str, leeway_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            leeway_secs: leeway_secs.max(0),
        }
    }

    /// Access Token 발급 (짧은 수명)
    /// Issue an access token
    pub fn issue_access(
        &self,
        subject: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, CodecError> {
        let expires_at = expiry(now, ttl)?;
        let claims = AccessClaims {
            sub: subject.to_string(),
            typ: TokenKind::Access,
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        self.sign(&claims, expires_at)
    }

    /// Refresh Token 발급 (refresh id가 jti)
    /// Issue a refresh token bound to a ledger entry
    pub fn issue_refresh(
        &self,
        subject: &str,
        family_id: &str,
        refresh_id: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, CodecError> {
        let expires_at = expiry(now, ttl)?;
        let claims = RefreshClaims {
            sub: subject.to_string(),
            typ: TokenKind::Refresh,
            sid: family_id.to_string(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: refresh_id.to_string(),
        };

        self.sign(&claims, expires_at)
    }

    /// Access Token 검증
    /// Verify an access token (signature, shape, kind, time)
    pub fn decode_access(&self, token: &str, now: DateTime<Utc>) -> Result<AccessClaims, CodecError> {
        self.decode_at(token, now)
    }

    /// Refresh Token 검증
    /// Verify a refresh token (signature, shape, kind, time)
    pub fn decode_refresh(&self, token: &str, now: DateTime<Utc>) -> Result<RefreshClaims, CodecError> {
        self.decode_at(token, now)
    }

    /// Refresh Token 서명/구조만 검증 (시간 무시)
    /// Signature and shape only; used by logout so an expired token can
    /// still end its family
    pub fn inspect_refresh(&self, token: &str) -> Result<RefreshClaims, CodecError> {
        self.verify::<RefreshClaims>(token)
    }

    fn sign<C: TokenClaims>(&self, claims: &C, expires_at: DateTime<Utc>) -> Result<IssuedToken, CodecError> {
        let token = encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| CodecError::Signing(e.to_string()))?;

        // 초 단위로 잘린 만료 시각을 돌려줌 (토큰의 exp와 일치)
        let expires_at = Utc
            .timestamp_opt(expires_at.timestamp(), 0)
            .single()
            .unwrap_or(expires_at);

        Ok(IssuedToken { token, expires_at })
    }

    fn decode_at<C: TokenClaims>(&self, token: &str, now: DateTime<Utc>) -> Result<C, CodecError> {
        let claims = self.verify::<C>(token)?;
        let now = now.timestamp();

        if claims.not_before() > now.saturating_add(self.leeway_secs) {
            return Err(CodecError::NotYetValid);
        }
        if claims.expires_at().saturating_add(self.leeway_secs) <= now {
            return Err(CodecError::Expired);
        }

        Ok(claims)
    }

    fn verify<C: TokenClaims>(&self, token: &str) -> Result<C, CodecError> {
        // 시간 검증은 decode_at에서 주입된 now로 직접 수행
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.required_spec_claims.clear();

        let data = decode::<C>(token, &self.decoding_key, &validation).map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature => CodecError::BadSignature,
            ErrorKind::InvalidAlgorithm => CodecError::BadSignature,
            _ => CodecError::Malformed(e.to_string()),
        })?;

        if data.claims.kind() != C::KIND {
            return Err(CodecError::WrongKind);
        }

        Ok(data.claims)
    }
}

/// 만료 시각 계산 (chrono 범위 초과 시 에러)
fn expiry(now: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>, CodecError> {
    now.checked_add_signed(ttl)
        .ok_or_else(|| CodecError::Signing(format!("token lifetime out of range: {}s", ttl.num_seconds())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    fn codec() -> TokenCodec {
        TokenCodec::new("test-secret", 0)
    }

    #[test]
    fn test_access_token_round_trip() {
        let now = Utc::now();
        let issued = codec().issue_access("reader@example.com", Duration::minutes(15), now).unwrap();

        let claims = codec().decode_access(&issued.token, now).unwrap();
        assert_eq!(claims.sub, "reader@example.com");
        assert_eq!(claims.typ, TokenKind::Access);
        assert_eq!(claims.iat, now.timestamp());
        assert_eq!(claims.exp, issued.expires_at.timestamp());
    }

    #[test]
    fn test_access_tokens_get_fresh_ids() {
        let now = Utc::now();
        let a = codec().issue_access("a@example.com", Duration::minutes(5), now).unwrap();
        let b = codec().issue_access("a@example.com", Duration::minutes(5), now).unwrap();
        assert_ne!(a.token, b.token);

        let ca = codec().decode_access(&a.token, now).unwrap();
        let cb = codec().decode_access(&b.token, now).unwrap();
        assert_ne!(ca.jti, cb.jti);
    }

    #[test]
    fn test_refresh_token_carries_family_and_refresh_id() {
        let now = Utc::now();
        let issued = codec()
            .issue_refresh("a@example.com", "family-1", "refresh-1", Duration::days(7), now)
            .unwrap();

        let claims = codec().decode_refresh(&issued.token, now).unwrap();
        assert_eq!(claims.sid, "family-1");
        assert_eq!(claims.jti, "refresh-1");
        assert_eq!(claims.typ, TokenKind::Refresh);
    }

    #[test]
    fn test_kinds_are_not_interchangeable() {
        let now = Utc::now();
        let access = codec().issue_access("a@example.com", Duration::minutes(5), now).unwrap();
        let refresh = codec()
            .issue_refresh("a@example.com", "f", "r", Duration::days(1), now)
            .unwrap();

        assert!(codec().decode_refresh(&access.token, now).is_err());
        assert!(codec().decode_access(&refresh.token, now).is_err());
    }

    #[test]
    fn test_kind_claim_is_enforced() {
        // Refresh 구조에 access 종류를 넣은 토큰
        let now = Utc::now();
        let forged = RefreshClaims {
            sub: "a@example.com".to_string(),
            typ: TokenKind::Access,
            sid: "f".to_string(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: now.timestamp() + 60,
            jti: "r".to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &forged,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert_eq!(codec().decode_refresh(&token, now), Err(CodecError::WrongKind));
    }

    #[test]
    fn test_wrong_secret_is_bad_signature() {
        let now = Utc::now();
        let issued = TokenCodec::new("other-secret", 0)
            .issue_access("a@example.com", Duration::minutes(5), now)
            .unwrap();

        assert_eq!(codec().decode_access(&issued.token, now), Err(CodecError::BadSignature));
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let now = Utc::now();
        let issued = codec().issue_access("a@example.com", Duration::minutes(5), now).unwrap();
        let mut parts: Vec<String> = issued.token.split('.').map(str::to_string).collect();
        let other = codec().issue_access("mallory@example.com", Duration::minutes(5), now).unwrap();
        parts[1] = other.token.split('.').nth(1).unwrap().to_string();

        assert!(codec().decode_access(&parts.join("."), now).is_err());
    }

    #[test]
    fn test_garbage_is_malformed() {
        let result = codec().decode_access("not-a-token", Utc::now());
        assert!(matches!(result, Err(CodecError::Malformed(_))));
    }

    #[test]
    fn test_out_of_range_lifetime_is_an_error() {
        let now = Utc::now();
        let ttl = Duration::seconds(10_000_000_000_000);

        assert!(matches!(
            codec().issue_access("a@example.com", ttl, now),
            Err(CodecError::Signing(_))
        ));
        assert!(matches!(
            codec().issue_refresh("a@example.com", "fam", "rid", ttl, now),
            Err(CodecError::Signing(_))
        ));
    }

    #[test]
    fn test_expired_token() {
        let now = Utc::now();
        let issued = codec().issue_access("a@example.com", Duration::minutes(5), now).unwrap();

        let later = now + Duration::minutes(6);
        assert_eq!(codec().decode_access(&issued.token, later), Err(CodecError::Expired));
    }

    #[test]
    fn test_leeway_tolerates_clock_skew() {
        let codec = TokenCodec::new("test-secret", 30);
        let now = Utc::now();
        let issued = codec.issue_access("a@example.com", Duration::seconds(60), now).unwrap();

        // 만료 10초 후에도 허용 범위 내
        assert!(codec.decode_access(&issued.token, now + Duration::seconds(70)).is_ok());
        assert_eq!(
            codec.decode_access(&issued.token, now + Duration::seconds(120)),
            Err(CodecError::Expired)
        );
        // 발급 직전 시계 (20초 느림)
        assert!(codec.decode_access(&issued.token, now - Duration::seconds(20)).is_ok());
    }

    #[test]
    fn test_not_yet_valid() {
        let now = Utc::now();
        let issued = codec().issue_access("a@example.com", Duration::minutes(5), now).unwrap();

        assert_eq!(
            codec().decode_access(&issued.token, now - Duration::minutes(1)),
            Err(CodecError::NotYetValid)
        );
    }

    #[derive(Serialize)]
    struct ExtraField {
        sub: String,
        typ: TokenKind,
        iat: i64,
        nbf: i64,
        exp: i64,
        jti: String,
        admin: bool,
    }

    #[derive(Serialize)]
    struct MissingJti {
        sub: String,
        typ: TokenKind,
        iat: i64,
        nbf: i64,
        exp: i64,
    }

    #[test]
    fn test_unknown_and_missing_fields_are_rejected() {
        let now = Utc::now().timestamp();
        let key = EncodingKey::from_secret(b"test-secret");

        let extra = ExtraField {
            sub: "a@example.com".to_string(),
            typ: TokenKind::Access,
            iat: now,
            nbf: now,
            exp: now + 60,
            jti: "id".to_string(),
            admin: true,
        };
        let token = encode(&Header::new(Algorithm::HS256), &extra, &key).unwrap();
        assert!(matches!(codec().decode_access(&token, Utc::now()), Err(CodecError::Malformed(_))));

        let missing = MissingJti {
            sub: "a@example.com".to_string(),
            typ: TokenKind::Access,
            iat: now,
            nbf: now,
            exp: now + 60,
        };
        let token = encode(&Header::new(Algorithm::HS256), &missing, &key).unwrap();
        assert!(matches!(codec().decode_access(&token, Utc::now()), Err(CodecError::Malformed(_))));
    }

    #[test]
    fn test_inspect_refresh_ignores_expiry_but_not_signature() {
        let now = Utc::now();
        let issued = codec()
            .issue_refresh("a@example.com", "f", "r", Duration::seconds(1), now - Duration::days(30))
            .unwrap();

        let claims = codec().inspect_refresh(&issued.token).unwrap();
        assert_eq!(claims.sid, "f");

        let forged = TokenCodec::new("other", 0)
            .issue_refresh("a@example.com", "f", "r", Duration::days(1), now)
            .unwrap();
        assert_eq!(codec().inspect_refresh(&forged.token), Err(CodecError::BadSignature));
    }
}
