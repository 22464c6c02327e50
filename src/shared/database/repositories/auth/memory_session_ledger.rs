use std::collections::HashMap;
use std::sync::Arc;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};
use crate::domains::auth::models::{NewSessionEntry, SessionEntry};
use crate::shared::database::repositories::auth::{LedgerTransaction, SessionLedger};
use crate::shared::errors::LedgerError;

type Rows = HashMap<String, SessionEntry>;

/// 메모리 원장 (개발 모드, 테스트용)
/// In-memory ledger for development mode and tests
///
/// 트랜잭션은 전체 원장 잠금을 보유하고 복사본에 변경을 쌓은 뒤
/// commit 시 한 번에 반영. commit 없이 drop되면 변경 폐기 (rollback)
/// Transactions serialize on one lock, so unlike Postgres, rotations of
/// different tokens also queue behind each other here.
#[derive(Clone, Default)]
pub struct MemorySessionLedger {
    rows: Arc<Mutex<Rows>>,
}

impl MemorySessionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// 현재 저장된 모든 항목 (진단용)
    /// Snapshot of committed entries
    pub async fn snapshot(&self) -> Vec<SessionEntry> {
        self.rows.lock().await.values().cloned().collect()
    }

    /// 특정 패밀리의 항목
    /// Committed entries of one family
    pub async fn family(&self, family_id: &str) -> Vec<SessionEntry> {
        self.rows
            .lock()
            .await
            .values()
            .filter(|e| e.family_id == family_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl SessionLedger for MemorySessionLedger {
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>, LedgerError> {
        let guard = self.rows.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryLedgerTransaction { guard, staged }))
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<u64, LedgerError> {
        let mut rows = self.rows.lock().await;
        let before = rows.len();
        rows.retain(|_, entry| !entry.is_expired(now));
        Ok((before - rows.len()) as u64)
    }
}

struct MemoryLedgerTransaction {
    guard: OwnedMutexGuard<Rows>,
    staged: Rows,
}

#[async_trait]
impl LedgerTransaction for MemoryLedgerTransaction {
    async fn get(&mut self, owner: &str, refresh_id: &str) -> Result<Option<SessionEntry>, LedgerError> {
        Ok(self
            .staged
            .get(refresh_id)
            .filter(|e| e.owner == owner)
            .cloned())
    }

    async fn insert(&mut self, entry: &NewSessionEntry) -> Result<(), LedgerError> {
        if self.staged.contains_key(&entry.refresh_id) {
            return Err(LedgerError::Conflict);
        }
        self.staged
            .insert(entry.refresh_id.clone(), SessionEntry::from(entry.clone()));
        Ok(())
    }

    async fn mark_consumed(&mut self, owner: &str, refresh_id: &str) -> Result<(), LedgerError> {
        if let Some(entry) = self.staged.get_mut(refresh_id) {
            if entry.owner == owner {
                entry.consumed = true;
            }
        }
        Ok(())
    }

    async fn revoke_family(&mut self, owner: &str, family_id: &str) -> Result<u64, LedgerError> {
        let before = self.staged.len();
        self.staged
            .retain(|_, e| !(e.owner == owner && e.family_id == family_id));
        Ok((before - self.staged.len()) as u64)
    }

    async fn commit(self: Box<Self>) -> Result<(), LedgerError> {
        let MemoryLedgerTransaction { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }
}
