// =====================================================
// 통합 테스트 공통 헬퍼
// =====================================================
// 목적: 메모리 저장소 기반 셋업 (DB 불필요)
//
// 사용법:
// ```rust
// mod common;
// use common::*;
//
// #[tokio::test]
// async fn test_something() {
//     let (sessions, ledger) = setup_sessions();
//     // 테스트 코드...
// }
// ```
// =====================================================
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use catalog_api::config::Config;
use catalog_api::domains::auth::services::{SessionPolicy, SessionService, TokenCodec};
use catalog_api::domains::auth::models::{NewSessionEntry, SessionEntry};
use catalog_api::shared::database::{LedgerTransaction, MemorySessionLedger, SessionLedger};
use catalog_api::shared::errors::LedgerError;

// 테스트용 상수
pub const TEST_SECRET: &str = "integration-test-secret";
pub const TEST_OWNER: &str = "reader@example.com";

pub fn test_policy() -> SessionPolicy {
    SessionPolicy {
        access_ttl: Duration::minutes(15),
        session_ttl: Duration::days(7),
    }
}

/// 세션 서비스 + 원장 핸들 (원장 상태 검사용)
pub fn setup_sessions() -> (SessionService, MemorySessionLedger) {
    let ledger = MemorySessionLedger::new();
    let sessions = SessionService::new(
        Arc::new(ledger.clone()),
        TokenCodec::new(TEST_SECRET, 0),
        test_policy(),
    );
    (sessions, ledger)
}

/// 테스트용 설정 (메모리 모드, 고정 비밀키)
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.auth.jwt_secret = Some(TEST_SECRET.to_string());
    config
}

/// 초 단위로 잘린 현재 시각 (JWT iat/exp와 비교하기 쉽게)
pub fn now() -> DateTime<Utc> {
    DateTime::from_timestamp(Utc::now().timestamp(), 0).unwrap_or_else(Utc::now)
}

pub fn live_entries(entries: &[SessionEntry], at: DateTime<Utc>) -> usize {
    entries.iter().filter(|e| e.is_live(at)).count()
}

pub fn unconsumed_entries(entries: &[SessionEntry]) -> usize {
    entries.iter().filter(|e| !e.consumed).count()
}

/// 남은 횟수가 있으면 1 차감하고 true
fn take(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

/// 장애 주입 원장
///
/// 메모리 원장을 감싸고 지정한 횟수만큼
/// - begin / sweep_expired 에서 Storage 에러
/// - insert 에서 Conflict
/// 를 돌려줌. 그 외 동작은 그대로 위임.
#[derive(Default)]
pub struct FaultyLedger {
    inner: MemorySessionLedger,
    begin_failures: AtomicU32,
    sweep_failures: AtomicU32,
    insert_conflicts: Arc<AtomicU32>,
    begins: AtomicU32,
}

impl FaultyLedger {
    pub fn new(inner: MemorySessionLedger) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    pub fn fail_next_begins(&self, n: u32) {
        self.begin_failures.store(n, Ordering::SeqCst);
    }

    pub fn fail_next_sweeps(&self, n: u32) {
        self.sweep_failures.store(n, Ordering::SeqCst);
    }

    pub fn conflict_next_inserts(&self, n: u32) {
        self.insert_conflicts.store(n, Ordering::SeqCst);
    }

    /// 지금까지 시작된 트랜잭션 수 (실패 포함)
    pub fn begins(&self) -> u32 {
        self.begins.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionLedger for FaultyLedger {
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>, LedgerError> {
        self.begins.fetch_add(1, Ordering::SeqCst);
        if take(&self.begin_failures) {
            return Err(LedgerError::Storage("connection reset".into()));
        }
        let inner = self.inner.begin().await?;
        Ok(Box::new(FaultyTransaction {
            inner,
            conflicts: self.insert_conflicts.clone(),
        }))
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<u64, LedgerError> {
        if take(&self.sweep_failures) {
            return Err(LedgerError::Storage("connection reset".into()));
        }
        self.inner.sweep_expired(now).await
    }
}

struct FaultyTransaction {
    inner: Box<dyn LedgerTransaction>,
    conflicts: Arc<AtomicU32>,
}

#[async_trait]
impl LedgerTransaction for FaultyTransaction {
    async fn get(&mut self, owner: &str, refresh_id: &str) -> Result<Option<SessionEntry>, LedgerError> {
        self.inner.get(owner, refresh_id).await
    }

    async fn insert(&mut self, entry: &NewSessionEntry) -> Result<(), LedgerError> {
        if take(&self.conflicts) {
            return Err(LedgerError::Conflict);
        }
        self.inner.insert(entry).await
    }

    async fn mark_consumed(&mut self, owner: &str, refresh_id: &str) -> Result<(), LedgerError> {
        self.inner.mark_consumed(owner, refresh_id).await
    }

    async fn revoke_family(&mut self, owner: &str, family_id: &str) -> Result<u64, LedgerError> {
        self.inner.revoke_family(owner, family_id).await
    }

    async fn commit(self: Box<Self>) -> Result<(), LedgerError> {
        self.inner.commit().await
    }
}

/// 장애 주입 원장 위의 세션 서비스 + 내부 원장 핸들
pub fn setup_faulty_sessions() -> (SessionService, Arc<FaultyLedger>, MemorySessionLedger) {
    let ledger = MemorySessionLedger::new();
    let faulty = Arc::new(FaultyLedger::new(ledger.clone()));
    let sessions = SessionService::new(faulty.clone(), TokenCodec::new(TEST_SECRET, 0), test_policy());
    (sessions, faulty, ledger)
}
