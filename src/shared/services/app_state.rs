use std::sync::Arc;
use crate::config::Config;
use crate::shared::database::{
    AccountRepository, CredentialStore, Database, MemoryAccountStore, MemorySessionLedger,
    PgSessionLedger, SessionLedger,
};
use crate::domains::auth::services::state::AuthState;
use crate::domains::auth::services::{
    ActivationNotifier, AuthService, GoogleTokenVerifier, LogActivationNotifier, SessionService,
    SessionSweepScheduler, TokenCodec,
};
use crate::shared::utils::random_id;
use tracing::warn;

/// Application state (combines all domain states)
/// 애플리케이션 상태 (모든 도메인 상태를 조합)
///
/// 저장소 구현(Postgres / 메모리)은 생성 시점에만 결정되고
/// 핸들러는 trait object만 바라봄
#[derive(Clone)]
pub struct AppState {
    pub auth_state: AuthState,
}

impl AppState {
    /// Create AppState backed by PostgreSQL
    pub fn new(db: &Database, config: &Config) -> Self {
        let store = Arc::new(AccountRepository::new(db.pool().clone()));
        let ledger = Arc::new(PgSessionLedger::new(db.pool().clone()));
        let notifier = Arc::new(LogActivationNotifier::new(config.server.public_url.clone()));

        Self::with_backends(config, store, ledger, notifier)
    }

    /// Create AppState with in-memory stores (개발/테스트용, 재시작 시 데이터 소실)
    pub fn in_memory(config: &Config) -> Self {
        let notifier = Arc::new(LogActivationNotifier::new(config.server.public_url.clone()));

        Self::with_backends(
            config,
            Arc::new(MemoryAccountStore::new()),
            Arc::new(MemorySessionLedger::new()),
            notifier,
        )
    }

    /// 저장소와 알림 구현을 직접 주입
    pub fn with_backends(
        config: &Config,
        store: Arc<dyn CredentialStore>,
        ledger: Arc<dyn SessionLedger>,
        notifier: Arc<dyn ActivationNotifier>,
    ) -> Self {
        // 1. 토큰 코덱
        let secret = config.auth.jwt_secret.clone().unwrap_or_else(|| {
            // validate()가 DB 모드에서는 비밀키를 강제하므로 여기는 메모리 모드뿐
            warn!("JWT_SECRET not set, using a random secret; tokens will not survive a restart");
            random_id()
        });
        let codec = TokenCodec::new(&secret, config.auth.clock_leeway_secs);

        // 2. 세션 프로토콜 + 자격 증명 흐름
        let sessions = SessionService::new(ledger, codec, config.session_policy());
        let verifier = Arc::new(GoogleTokenVerifier::new(
            config.auth.google_client_id.clone().unwrap_or_default(),
        ));
        let auth_service = AuthService::new(
            store,
            sessions.clone(),
            verifier,
            notifier,
            config.activation_ttl(),
        );

        // 3. 만료 세션 정리 스케줄러 (시작은 main에서)
        let sweep_scheduler = SessionSweepScheduler::new(
            sessions,
            tokio::time::Duration::from_secs(config.sweep.interval_secs),
        );
        sweep_scheduler.set_enabled(config.sweep.enabled);

        Self {
            auth_state: AuthState::new(auth_service, sweep_scheduler),
        }
    }
}
