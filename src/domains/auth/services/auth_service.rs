use std::sync::Arc;
use crate::shared::database::CredentialStore;
use crate::domains::auth::models::{
    Account, GoogleRegisterRequest, NewAccount, RegisterRequest, SigninRequest, TokenPair,
};
use crate::domains::auth::services::{ActivationNotifier, FederatedVerifier, SessionService};
use crate::shared::errors::AuthError;
use crate::shared::utils::{hash_identifier, new_activation_token};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use argon2::password_hash::{rand_core::OsRng, SaltString};
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

// 인증 서비스
// AuthService: account registration, activation and login flows.
// 로그인 성공 시 세션 패밀리 생성은 SessionService에 위임
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    sessions: SessionService,
    verifier: Arc<dyn FederatedVerifier>,
    notifier: Arc<dyn ActivationNotifier>,
    activation_ttl: Duration,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        sessions: SessionService,
        verifier: Arc<dyn FederatedVerifier>,
        notifier: Arc<dyn ActivationNotifier>,
        activation_ttl: Duration,
    ) -> Self {
        Self {
            store,
            sessions,
            verifier,
            notifier,
            activation_ttl,
        }
    }

    pub fn sessions(&self) -> &SessionService {
        &self.sessions
    }

    // 회원가입 (비즈니스 로직)
    // Returns: (Account, activation link expiry)
    pub async fn register(&self, request: RegisterRequest) -> Result<(Account, DateTime<Utc>), AuthError> {
        // 1. 이메일 중복 확인
        self.ensure_email_free(&request.email).await?;

        // 2. 비밀번호 해싱
        let password_hash = Self::hash_password(&request.password)?;

        // 3. 계정 생성 (확인 이후 동시 가입에 선점된 경우도 중복)
        let account = self
            .create_account(NewAccount {
                email: request.email,
                password_hash: Some(password_hash),
                google_id: None,
                name: request.name,
            })
            .await?;

        // 4. 활성화 토큰 발급
        let valid_until = self.issue_activation(&account.email).await?;
        info!(email = %account.email, "account registered");

        Ok((account, valid_until))
    }

    // Google 계정으로 회원가입
    pub async fn register_google(
        &self,
        request: GoogleRegisterRequest,
    ) -> Result<(Account, DateTime<Utc>), AuthError> {
        let identity = self.verifier.verify(&request.id_token).await?;

        self.ensure_email_free(&identity.email).await?;

        let account = self
            .create_account(NewAccount {
                email: identity.email,
                password_hash: None,
                google_id: Some(identity.subject),
                name: request.name,
            })
            .await?;

        let valid_until = self.issue_activation(&account.email).await?;
        info!(email = %account.email, "federated account registered");

        Ok((account, valid_until))
    }

    /// 계정 활성화
    /// Activate an account with the token from its activation link
    pub async fn activate(&self, email: &str, token: &str) -> Result<Account, AuthError> {
        let account = self.find_account(email).await?;

        if account.activated {
            return Err(AuthError::AccountAlreadyActivated);
        }

        let valid = match (&account.activation_token_hash, account.activation_expires_at) {
            (Some(expected), Some(expires_at)) => {
                *expected == hash_identifier(token) && Utc::now() < expires_at
            }
            _ => false,
        };
        if !valid {
            debug!(email, "activation token rejected");
            return Err(AuthError::ActivationFailed);
        }

        self.store
            .activate(email)
            .await
            .map_err(|e| AuthError::DatabaseError(format!("Failed to activate account: {}", e)))?;
        info!(email, "account activated");

        Ok(Account {
            activated: true,
            activation_token_hash: None,
            activation_expires_at: None,
            ..account
        })
    }

    /// 활성화 링크 재발급
    /// Re-issue the activation link of a not yet activated account
    pub async fn resend_activation(&self, email: &str) -> Result<DateTime<Utc>, AuthError> {
        let account = self.find_account(email).await?;

        if account.activated {
            return Err(AuthError::AccountAlreadyActivated);
        }

        self.issue_activation(email).await
    }

    // 로그인 (비즈니스 로직)
    // Returns: (Account, tokens of a freshly opened session family)
    pub async fn signin(&self, request: SigninRequest) -> Result<(Account, TokenPair), AuthError> {
        // 1. 이메일로 계정 조회
        let account = self
            .store
            .find_by_email(&request.email)
            .await
            .map_err(|e| AuthError::DatabaseError(format!("Failed to fetch account: {}", e)))?
            .ok_or(AuthError::InvalidCredentials)?;

        // 2. 비밀번호 검증 (Google 전용 계정은 비밀번호 없음)
        let password_hash = account
            .password_hash
            .as_deref()
            .ok_or(AuthError::InvalidCredentials)?;
        Self::verify_password(&request.password, password_hash)?;

        // 3. 활성화 확인
        if !account.activated {
            return Err(AuthError::AccountNotActivated);
        }

        // 4. 새 세션 패밀리
        let tokens = self.sessions.open(&account.email).await?;
        Ok((account, tokens))
    }

    // Google 로그인
    pub async fn signin_google(&self, id_token: &str) -> Result<(Account, TokenPair), AuthError> {
        let identity = self.verifier.verify(id_token).await?;

        let account = self
            .store
            .find_by_email(&identity.email)
            .await
            .map_err(|e| AuthError::DatabaseError(format!("Failed to fetch account: {}", e)))?
            .ok_or(AuthError::InvalidCredentials)?;

        if account.google_id.as_deref() != Some(identity.subject.as_str()) {
            debug!(email = %identity.email, "federated id does not match account");
            return Err(AuthError::InvalidCredentials);
        }

        if !account.activated {
            return Err(AuthError::AccountNotActivated);
        }

        let tokens = self.sessions.open(&account.email).await?;
        Ok((account, tokens))
    }

    /// Refresh Token 회전
    /// Rotate a refresh token
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        Ok(self.sessions.rotate(refresh_token).await?)
    }

    /// 로그아웃 - 세션 패밀리 폐기
    /// Logout - revoke the session family
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        Ok(self.sessions.revoke(refresh_token).await?)
    }

    pub async fn get_account(&self, email: &str) -> Result<Account, AuthError> {
        self.store
            .find_by_email(email)
            .await
            .map_err(|e| AuthError::DatabaseError(format!("Failed to fetch account: {}", e)))?
            .ok_or(AuthError::InvalidToken) // 계정이 없으면 InvalidToken 에러
    }

    async fn find_account(&self, email: &str) -> Result<Account, AuthError> {
        self.store
            .find_by_email(email)
            .await
            .map_err(|e| AuthError::DatabaseError(format!("Failed to fetch account: {}", e)))?
            .ok_or_else(|| AuthError::AccountNotFound { email: email.to_string() })
    }

    async fn create_account(&self, account: NewAccount) -> Result<Account, AuthError> {
        let email = account.email.clone();
        self.store
            .create_account(account)
            .await
            .map_err(|e| AuthError::DatabaseError(format!("Failed to create account: {}", e)))?
            .ok_or(AuthError::EmailAlreadyExists { email })
    }

    async fn ensure_email_free(&self, email: &str) -> Result<(), AuthError> {
        let existing = self
            .store
            .find_by_email(email)
            .await
            .map_err(|e| AuthError::DatabaseError(format!("Failed to check email existence: {}", e)))?;

        if existing.is_some() {
            return Err(AuthError::EmailAlreadyExists { email: email.to_string() });
        }
        Ok(())
    }

    async fn issue_activation(&self, email: &str) -> Result<DateTime<Utc>, AuthError> {
        let token = new_activation_token();
        let valid_until = Utc::now()
            .checked_add_signed(self.activation_ttl)
            .ok_or_else(|| AuthError::Internal("activation lifetime out of range".to_string()))?;

        // 원문은 안내 메일로만 전달, 저장소에는 해시만
        self.store
            .set_activation(email, &hash_identifier(&token), valid_until)
            .await
            .map_err(|e| AuthError::DatabaseError(format!("Failed to store activation token: {}", e)))?;

        self.notifier.send_activation(email, &token, valid_until);
        Ok(valid_until)
    }

    fn hash_password(password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::PasswordHashingFailed(format!("Failed to hash password: {}", e)))?
            .to_string();

        Ok(password_hash)
    }

    fn verify_password(password: &str, password_hash: &str) -> Result<(), AuthError> {
        let parsed_hash = PasswordHash::new(password_hash)
            .map_err(|e| AuthError::Internal(format!("Invalid password hash: {}", e)))?;

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| AuthError::InvalidCredentials)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::auth::services::{FederatedIdentity, SessionPolicy, TokenCodec};
    use crate::shared::database::{MemoryAccountStore, MemorySessionLedger};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    struct FakeVerifier;

    #[async_trait]
    impl FederatedVerifier for FakeVerifier {
        async fn verify(&self, id_token: &str) -> Result<FederatedIdentity, AuthError> {
            // "email|subject" 형식
            let (email, subject) = id_token
                .split_once('|')
                .ok_or(AuthError::FederatedIdentityRejected)?;
            Ok(FederatedIdentity {
                email: email.to_string(),
                subject: subject.to_string(),
            })
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<(String, String)>>,
    }

    impl RecordingNotifier {
        fn last_token(&self, email: &str) -> String {
            self.sent
                .lock()
                .iter()
                .rev()
                .find(|(e, _)| e == email)
                .map(|(_, t)| t.clone())
                .unwrap()
        }
    }

    impl ActivationNotifier for RecordingNotifier {
        fn send_activation(&self, email: &str, token: &str, _valid_until: DateTime<Utc>) {
            self.sent.lock().push((email.to_string(), token.to_string()));
        }
    }

    fn service(notifier: Arc<RecordingNotifier>) -> AuthService {
        service_with_store(notifier, Arc::new(MemoryAccountStore::new()))
    }

    fn service_with_store(notifier: Arc<RecordingNotifier>, store: Arc<dyn CredentialStore>) -> AuthService {
        let sessions = SessionService::new(
            Arc::new(MemorySessionLedger::new()),
            TokenCodec::new("test-secret", 0),
            SessionPolicy {
                access_ttl: Duration::minutes(15),
                session_ttl: Duration::days(7),
            },
        );
        AuthService::new(
            store,
            sessions,
            Arc::new(FakeVerifier),
            notifier,
            Duration::minutes(15),
        )
    }

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: "Password123!".to_string(),
            name: "Jane Reader".to_string(),
        }
    }

    fn signin_request(email: &str, password: &str) -> SigninRequest {
        SigninRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_activate_signin() {
        let notifier = Arc::new(RecordingNotifier::default());
        let auth = service(notifier.clone());

        let (account, _) = auth.register(register_request("reader@example.com")).await.unwrap();
        assert!(!account.activated);

        // 활성화 전 로그인 불가
        let err = auth
            .signin(signin_request("reader@example.com", "Password123!"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AccountNotActivated));

        let token = notifier.last_token("reader@example.com");
        let account = auth.activate("reader@example.com", &token).await.unwrap();
        assert!(account.activated);

        let (account, tokens) = auth
            .signin(signin_request("reader@example.com", "Password123!"))
            .await
            .unwrap();
        assert_eq!(account.email, "reader@example.com");

        let claims = auth
            .sessions()
            .codec()
            .decode_access(&tokens.access.token, Utc::now())
            .unwrap();
        assert_eq!(claims.sub, "reader@example.com");
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let auth = service(Arc::new(RecordingNotifier::default()));
        auth.register(register_request("reader@example.com")).await.unwrap();

        let err = auth.register(register_request("reader@example.com")).await.unwrap_err();
        assert!(matches!(err, AuthError::EmailAlreadyExists { .. }));
    }

    /// 중복 확인 시점에는 아직 다른 가입이 커밋되지 않은 상태를 재현
    struct LateCommitStore {
        inner: MemoryAccountStore,
    }

    #[async_trait]
    impl CredentialStore for LateCommitStore {
        async fn create_account(&self, account: NewAccount) -> anyhow::Result<Option<Account>> {
            self.inner.create_account(account).await
        }

        async fn find_by_email(&self, _email: &str) -> anyhow::Result<Option<Account>> {
            Ok(None)
        }

        async fn set_activation(
            &self,
            email: &str,
            token_hash: &str,
            expires_at: DateTime<Utc>,
        ) -> anyhow::Result<()> {
            self.inner.set_activation(email, token_hash, expires_at).await
        }

        async fn activate(&self, email: &str) -> anyhow::Result<()> {
            self.inner.activate(email).await
        }
    }

    #[tokio::test]
    async fn test_registration_race_reports_duplicate() {
        let store = Arc::new(LateCommitStore {
            inner: MemoryAccountStore::new(),
        });
        let auth = service_with_store(Arc::new(RecordingNotifier::default()), store);

        auth.register(register_request("reader@example.com")).await.unwrap();

        // 중복 확인은 통과하지만 저장 단계에서 거부 -> 500이 아닌 409
        let err = auth.register(register_request("reader@example.com")).await.unwrap_err();
        assert!(matches!(err, AuthError::EmailAlreadyExists { .. }));

        let err = auth
            .register_google(GoogleRegisterRequest {
                id_token: "reader@example.com|google-sub-1".to_string(),
                name: "Jane Reader".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailAlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_activation_token_is_stored_hashed() {
        let notifier = Arc::new(RecordingNotifier::default());
        let store = Arc::new(MemoryAccountStore::new());
        let auth = service_with_store(notifier.clone(), store.clone());
        auth.register(register_request("reader@example.com")).await.unwrap();

        let token = notifier.last_token("reader@example.com");
        let stored = store
            .find_by_email("reader@example.com")
            .await
            .unwrap()
            .and_then(|account| account.activation_token_hash)
            .unwrap();
        assert_ne!(stored, token);
        assert_eq!(stored, hash_identifier(&token));

        // 저장된 해시 자체로는 활성화 불가
        let err = auth.activate("reader@example.com", &stored).await.unwrap_err();
        assert!(matches!(err, AuthError::ActivationFailed));

        auth.activate("reader@example.com", &token).await.unwrap();
        let account = store.find_by_email("reader@example.com").await.unwrap().unwrap();
        assert!(account.activated);
        assert!(account.activation_token_hash.is_none());
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_account_look_the_same() {
        let notifier = Arc::new(RecordingNotifier::default());
        let auth = service(notifier.clone());
        auth.register(register_request("reader@example.com")).await.unwrap();
        auth.activate("reader@example.com", &notifier.last_token("reader@example.com"))
            .await
            .unwrap();

        let wrong = auth
            .signin(signin_request("reader@example.com", "nope"))
            .await
            .unwrap_err();
        let unknown = auth
            .signin(signin_request("ghost@example.com", "Password123!"))
            .await
            .unwrap_err();

        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn test_activation_rules() {
        let notifier = Arc::new(RecordingNotifier::default());
        let auth = service(notifier.clone());

        let err = auth.activate("ghost@example.com", "x").await.unwrap_err();
        assert!(matches!(err, AuthError::AccountNotFound { .. }));

        auth.register(register_request("reader@example.com")).await.unwrap();
        let err = auth.activate("reader@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, AuthError::ActivationFailed));

        // 재발급 후 이전 토큰은 무효
        let old = notifier.last_token("reader@example.com");
        auth.resend_activation("reader@example.com").await.unwrap();
        let err = auth.activate("reader@example.com", &old).await.unwrap_err();
        assert!(matches!(err, AuthError::ActivationFailed));

        let new = notifier.last_token("reader@example.com");
        auth.activate("reader@example.com", &new).await.unwrap();

        let err = auth.activate("reader@example.com", &new).await.unwrap_err();
        assert!(matches!(err, AuthError::AccountAlreadyActivated));
        let err = auth.resend_activation("reader@example.com").await.unwrap_err();
        assert!(matches!(err, AuthError::AccountAlreadyActivated));
    }

    #[tokio::test]
    async fn test_google_register_and_signin() {
        let notifier = Arc::new(RecordingNotifier::default());
        let auth = service(notifier.clone());

        let (account, _) = auth
            .register_google(GoogleRegisterRequest {
                id_token: "g@example.com|google-sub-1".to_string(),
                name: "G Reader".to_string(),
            })
            .await
            .unwrap();
        assert!(account.password_hash.is_none());

        auth.activate("g@example.com", &notifier.last_token("g@example.com"))
            .await
            .unwrap();

        let (account, _) = auth.signin_google("g@example.com|google-sub-1").await.unwrap();
        assert_eq!(account.email, "g@example.com");

        // 다른 Google 계정 ID
        let err = auth.signin_google("g@example.com|google-sub-2").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));

        // Google 전용 계정은 비밀번호 로그인 불가
        let err = auth
            .signin(signin_request("g@example.com", "anything"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }
}
