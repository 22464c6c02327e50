// Auth domain state
// 인증 도메인 상태
use crate::domains::auth::services::{AuthService, SessionSweepScheduler, TokenCodec};

/// Auth domain state
/// 인증 도메인에서 필요한 서비스들을 포함하는 상태
#[derive(Clone)]
pub struct AuthState {
    pub auth_service: AuthService,
    /// Authentication Gate가 사용하는 코덱 (원장 없이 검증)
    pub token_codec: TokenCodec,
    pub sweep_scheduler: SessionSweepScheduler,
}

impl AuthState {
    pub fn new(auth_service: AuthService, sweep_scheduler: SessionSweepScheduler) -> Self {
        let token_codec = auth_service.sessions().codec().clone();

        Self {
            auth_service,
            token_codec,
            sweep_scheduler,
        }
    }
}
