use std::collections::HashMap;
use std::sync::Arc;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use sqlx::{postgres::PgRow, PgPool, Row};
use crate::domains::auth::models::{Account, NewAccount};

/// 계정 저장소 (Credential Store)
/// Credential store consumed by the credential flows
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// 계정 생성 (이메일이 이미 있으면 None)
    /// Create an account; `None` when the email is already taken
    async fn create_account(&self, account: NewAccount) -> Result<Option<Account>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>>;

    /// 활성화 토큰 해시 갱신
    /// Replace the activation token hash and its expiry
    async fn set_activation(&self, email: &str, token_hash: &str, expires_at: DateTime<Utc>) -> Result<()>;

    /// 계정 활성화 (토큰 제거)
    /// Mark activated and clear the activation token
    async fn activate(&self, email: &str) -> Result<()>;
}

pub struct AccountRepository {
    pool: PgPool,
}

impl AccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn from_row(row: &PgRow) -> Account {
        Account {
            email: row.get("email"),
            password_hash: row.get("password_hash"),
            google_id: row.get("google_id"),
            name: row.get("name"),
            activated: row.get("activated"),
            activation_token_hash: row.get("activation_token_hash"),
            activation_expires_at: row.get("activation_expires_at"),
            created_at: row.get("created_at"),
        }
    }
}

#[async_trait]
impl CredentialStore for AccountRepository {
    async fn create_account(&self, account: NewAccount) -> Result<Option<Account>> {
        // 동시 가입: 먼저 커밋된 쪽만 행을 돌려받음
        let row = sqlx::query(
            r#"
            INSERT INTO accounts (email, password_hash, google_id, name, activated, created_at, updated_at)
            VALUES ($1, $2, $3, $4, FALSE, NOW(), NOW())
            ON CONFLICT (email) DO NOTHING
            RETURNING email, password_hash, google_id, name, activated,
                      activation_token_hash, activation_expires_at, created_at
            "#,
        )
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.google_id)
        .bind(&account.name)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to create account")?;

        Ok(row.as_ref().map(Self::from_row))
    }

    // 이메일로 계정 조회 (로그인용)
    // Get account by email (for login)
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let row = sqlx::query(
            r#"
            SELECT email, password_hash, google_id, name, activated,
                   activation_token_hash, activation_expires_at, created_at
            FROM accounts
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch account by email")?;

        Ok(row.as_ref().map(Self::from_row))
    }

    async fn set_activation(&self, email: &str, token_hash: &str, expires_at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE accounts
            SET activation_token_hash = $1, activation_expires_at = $2, updated_at = NOW()
            WHERE email = $3
            "#,
        )
        .bind(token_hash)
        .bind(expires_at)
        .bind(email)
        .execute(&self.pool)
        .await
        .context("Failed to refresh activation token")?;

        Ok(())
    }

    async fn activate(&self, email: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE accounts
            SET activated = TRUE, activation_token_hash = NULL, activation_expires_at = NULL, updated_at = NOW()
            WHERE email = $1
            "#,
        )
        .bind(email)
        .execute(&self.pool)
        .await
        .context("Failed to activate account")?;

        Ok(())
    }
}

/// 메모리 계정 저장소 (개발 모드, 테스트용)
/// In-memory credential store for development mode and tests
#[derive(Clone, Default)]
pub struct MemoryAccountStore {
    accounts: Arc<Mutex<HashMap<String, Account>>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryAccountStore {
    async fn create_account(&self, account: NewAccount) -> Result<Option<Account>> {
        let mut accounts = self.accounts.lock();
        if accounts.contains_key(&account.email) {
            return Ok(None);
        }

        let created = Account {
            email: account.email.clone(),
            password_hash: account.password_hash,
            google_id: account.google_id,
            name: account.name,
            activated: false,
            activation_token_hash: None,
            activation_expires_at: None,
            created_at: Utc::now(),
        };
        accounts.insert(account.email, created.clone());
        Ok(Some(created))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        Ok(self.accounts.lock().get(email).cloned())
    }

    async fn set_activation(&self, email: &str, token_hash: &str, expires_at: DateTime<Utc>) -> Result<()> {
        if let Some(account) = self.accounts.lock().get_mut(email) {
            account.activation_token_hash = Some(token_hash.to_string());
            account.activation_expires_at = Some(expires_at);
        }
        Ok(())
    }

    async fn activate(&self, email: &str) -> Result<()> {
        if let Some(account) = self.accounts.lock().get_mut(email) {
            account.activated = true;
            account.activation_token_hash = None;
            account.activation_expires_at = None;
        }
        Ok(())
    }
}
