use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use crate::shared::errors::AuthError;

/// Google tokeninfo 엔드포인트
const GOOGLE_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// 검증된 외부 계정 정보
/// Identity asserted by a verified federated ID token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederatedIdentity {
    pub email: String,
    /// 제공자 측 계정 ID (Google `sub`)
    pub subject: String,
}

/// 외부 ID 토큰 검증기
/// Verifies federated ID tokens
#[async_trait]
pub trait FederatedVerifier: Send + Sync {
    async fn verify(&self, id_token: &str) -> Result<FederatedIdentity, AuthError>;
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: String,
    sub: String,
    email: Option<String>,
    email_verified: Option<String>,
}

/// Google ID 토큰 검증기
/// Google ID token verifier backed by the tokeninfo endpoint
pub struct GoogleTokenVerifier {
    client: reqwest::Client,
    client_id: String,
    endpoint: String,
}

impl GoogleTokenVerifier {
    pub fn new(client_id: String) -> Self {
        Self::with_endpoint(client_id, GOOGLE_TOKENINFO_URL.to_string())
    }

    pub fn with_endpoint(client_id: String, endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            client_id,
            endpoint,
        }
    }

    fn check(&self, info: TokenInfo) -> Result<FederatedIdentity, AuthError> {
        if info.aud != self.client_id {
            debug!("google id token audience mismatch");
            return Err(AuthError::FederatedIdentityRejected);
        }
        if info.email_verified.as_deref() != Some("true") {
            debug!("google id token email not verified");
            return Err(AuthError::FederatedIdentityRejected);
        }
        let email = info.email.ok_or(AuthError::FederatedIdentityRejected)?;

        Ok(FederatedIdentity {
            email,
            subject: info.sub,
        })
    }
}

#[async_trait]
impl FederatedVerifier for GoogleTokenVerifier {
    async fn verify(&self, id_token: &str) -> Result<FederatedIdentity, AuthError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|e| AuthError::Internal(format!("Google tokeninfo request failed: {}", e)))?;

        // 4xx: 토큰 자체가 잘못됨
        if response.status().is_client_error() {
            return Err(AuthError::FederatedIdentityRejected);
        }
        let info: TokenInfo = response
            .error_for_status()
            .map_err(|e| AuthError::Internal(format!("Google tokeninfo error: {}", e)))?
            .json()
            .await
            .map_err(|e| AuthError::Internal(format!("Google tokeninfo response malformed: {}", e)))?;

        self.check(info)
    }
}
