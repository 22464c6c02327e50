use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error};
use crate::domains::auth::services::SessionService;

/// 만료 세션 정리 스케줄러
/// Expired session sweep scheduler
///
/// 역할:
/// - 주기적으로 만료된 원장 항목 삭제
/// - 요청 경로의 상태 머신과 무관한 정리 작업
///
/// 처리 흐름:
/// 1. 스케줄러 시작 시 백그라운드 태스크 실행
/// 2. interval마다 sweep_expired 호출
/// 3. 활성화 상태에 따라 실행 여부 결정
#[derive(Clone)]
pub struct SessionSweepScheduler {
    sessions: SessionService,
    period: Duration,
    enabled: Arc<AtomicBool>,
}

impl SessionSweepScheduler {
    pub fn new(sessions: SessionService, period: Duration) -> Self {
        Self {
            sessions,
            period,
            enabled: Arc::new(AtomicBool::new(true)), // 기본값: 활성화
        }
    }

    /// 스케줄러 시작
    /// Start scheduler
    pub fn start(&self) -> JoinHandle<()> {
        let scheduler = self.clone();

        tokio::spawn(async move {
            let mut ticker = interval(scheduler.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;

                if !scheduler.is_enabled() {
                    continue;
                }
                scheduler.run_once().await;
            }
        })
    }

    /// 1회 정리 실행
    /// Run one sweep; returns the number of deleted entries
    pub async fn run_once(&self) -> u64 {
        match self.sessions.sweep_expired().await {
            Ok(count) => {
                if count > 0 {
                    debug!(sessions_swept = count, "expired sessions swept");
                }
                count
            }
            Err(e) => {
                error!(error = %e, "failed to sweep expired sessions");
                0
            }
        }
    }

    /// 실행 중인 태스크에도 다음 tick부터 반영
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }
}
