use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction};
use crate::domains::auth::models::{NewSessionEntry, SessionEntry};
use crate::shared::errors::LedgerError;
use crate::shared::utils::hash_identifier;

/// 세션 원장
/// Session Ledger: authoritative record of outstanding refresh tokens
///
/// 모든 변경은 트랜잭션 안에서 수행
/// Every mutation on the request path happens inside a `LedgerTransaction`
#[async_trait]
pub trait SessionLedger: Send + Sync {
    /// 트랜잭션 시작
    /// Begin a transaction
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>, LedgerError>;

    /// 만료 항목 삭제 (expires_at <= now)
    /// Delete every entry with `expires_at <= now`; returns the count
    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<u64, LedgerError>;
}

/// 원장 트랜잭션
/// A ledger transaction. Dropping it without `commit` rolls back.
#[async_trait]
pub trait LedgerTransaction: Send {
    /// 항목 조회 + 행 잠금 (트랜잭션 종료까지)
    /// Fetch an entry and lock its row until the transaction ends
    async fn get(&mut self, owner: &str, refresh_id: &str) -> Result<Option<SessionEntry>, LedgerError>;

    /// 새 항목 저장 (중복 refresh id는 Conflict)
    /// Insert a new unconsumed entry; `Conflict` on duplicate refresh id
    async fn insert(&mut self, entry: &NewSessionEntry) -> Result<(), LedgerError>;

    /// 사용 처리 (멱등)
    /// Set `consumed = true`; idempotent
    async fn mark_consumed(&mut self, owner: &str, refresh_id: &str) -> Result<(), LedgerError>;

    /// 패밀리 전체 삭제
    /// Delete every entry of the family; returns the count
    async fn revoke_family(&mut self, owner: &str, family_id: &str) -> Result<u64, LedgerError>;

    async fn commit(self: Box<Self>) -> Result<(), LedgerError>;
}

/// PostgreSQL 원장
/// Postgres-backed ledger; row locks via `SELECT ... FOR UPDATE`
///
/// refresh id는 SHA-256 해시로만 저장
#[derive(Clone)]
pub struct PgSessionLedger {
    pool: PgPool,
}

impl PgSessionLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionLedger for PgSessionLedger {
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>, LedgerError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgLedgerTransaction { tx }))
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<u64, LedgerError> {
        let result = sqlx::query(
            r#"
            DELETE FROM refresh_sessions
            WHERE expires_at <= $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

struct PgLedgerTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerTransaction for PgLedgerTransaction {
    async fn get(&mut self, owner: &str, refresh_id: &str) -> Result<Option<SessionEntry>, LedgerError> {
        let row = sqlx::query(
            r#"
            SELECT family_id, consumed, expires_at
            FROM refresh_sessions
            WHERE owner = $1 AND refresh_hash = $2
            FOR UPDATE
            "#,
        )
        .bind(owner)
        .bind(hash_identifier(refresh_id))
        .fetch_optional(&mut self.tx)
        .await?;

        Ok(row.map(|row| SessionEntry {
            owner: owner.to_string(),
            refresh_id: refresh_id.to_string(),
            family_id: row.get("family_id"),
            consumed: row.get("consumed"),
            expires_at: row.get("expires_at"),
        }))
    }

    async fn insert(&mut self, entry: &NewSessionEntry) -> Result<(), LedgerError> {
        // ON CONFLICT DO NOTHING: 충돌 시 트랜잭션을 중단시키지 않음
        let result = sqlx::query(
            r#"
            INSERT INTO refresh_sessions (refresh_hash, owner, family_id, consumed, expires_at, created_at)
            VALUES ($1, $2, $3, FALSE, $4, NOW())
            ON CONFLICT (refresh_hash) DO NOTHING
            "#,
        )
        .bind(hash_identifier(&entry.refresh_id))
        .bind(&entry.owner)
        .bind(&entry.family_id)
        .bind(entry.expires_at)
        .execute(&mut self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::Conflict);
        }
        Ok(())
    }

    async fn mark_consumed(&mut self, owner: &str, refresh_id: &str) -> Result<(), LedgerError> {
        sqlx::query(
            r#"
            UPDATE refresh_sessions
            SET consumed = TRUE
            WHERE owner = $1 AND refresh_hash = $2
            "#,
        )
        .bind(owner)
        .bind(hash_identifier(refresh_id))
        .execute(&mut self.tx)
        .await?;

        Ok(())
    }

    async fn revoke_family(&mut self, owner: &str, family_id: &str) -> Result<u64, LedgerError> {
        let result = sqlx::query(
            r#"
            DELETE FROM refresh_sessions
            WHERE owner = $1 AND family_id = $2
            "#,
        )
        .bind(owner)
        .bind(family_id)
        .execute(&mut self.tx)
        .await?;

        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> Result<(), LedgerError> {
        self.tx.commit().await?;
        Ok(())
    }
}
