//! PostgreSQL 저장소.
//!
//! `accounts`, `roles`, `account_roles` 테이블을 사용합니다.
//! 스키마는 `migrations/` 디렉토리에 있으며 [`PgStore::migrate`]로 적용합니다.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgExecutor, PgPoolOptions};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{CredentialStore, StoreError, StoreResult, StoreTransaction};
use crate::domain::{Account, NewAccount, Page, PageRequest, Role};

const ACCOUNT_COLUMNS: &str =
    "id, username, email, password_hash, enabled, created_at, updated_at";

/// PostgreSQL unique_violation SQLSTATE
const UNIQUE_VIOLATION: &str = "23505";

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                StoreError::Conflict(db.constraint().unwrap_or("unique").to_string())
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(err.to_string())
            }
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

/// 계정 행
#[derive(Debug, FromRow)]
struct AccountRow {
    id: String,
    username: String,
    email: String,
    password_hash: String,
    enabled: bool,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl AccountRow {
    fn into_account(self, roles: Vec<Role>) -> Account {
        Account {
            id: self.id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            enabled: self.enabled,
            created_at: self.created_at,
            updated_at: self.updated_at,
            roles,
        }
    }
}

/// 계정 행들에 역할 관계를 한 번의 쿼리로 붙입니다.
async fn attach_roles<'c, E>(executor: E, rows: Vec<AccountRow>) -> Result<Vec<Account>, sqlx::Error>
where
    E: PgExecutor<'c>,
{
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
    let relations = sqlx::query_as::<_, (String, i64, String)>(
        r#"
        SELECT ar.account_id, r.id, r.name
        FROM account_roles ar
        JOIN roles r ON r.id = ar.role_id
        WHERE ar.account_id = ANY($1)
        ORDER BY r.id
        "#,
    )
    .bind(&ids)
    .fetch_all(executor)
    .await?;

    let mut by_account: HashMap<String, Vec<Role>> = HashMap::new();
    for (account_id, role_id, name) in relations {
        by_account
            .entry(account_id)
            .or_default()
            .push(Role::new(role_id, name));
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let roles = by_account.remove(&row.id).unwrap_or_default();
            row.into_account(roles)
        })
        .collect())
}

/// 계정의 역할 관계를 주어진 목록으로 교체합니다.
async fn replace_roles(
    tx: &mut Transaction<'static, Postgres>,
    account_id: &str,
    roles: &[Role],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM account_roles WHERE account_id = $1")
        .bind(account_id)
        .execute(&mut **tx)
        .await?;

    let role_ids: Vec<i64> = roles.iter().map(|r| r.id).collect();
    if !role_ids.is_empty() {
        sqlx::query(
            r#"
            INSERT INTO account_roles (account_id, role_id)
            SELECT $1, UNNEST($2::BIGINT[])
            "#,
        )
        .bind(account_id)
        .bind(&role_ids)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

/// PostgreSQL 계정 저장소.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// 기존 연결 풀로 생성.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 연결 URL로 풀을 만들어 생성.
    pub async fn connect(url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        Ok(Self::new(pool))
    }

    /// 스키마 마이그레이션 적용.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    /// 연결 풀 참조.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn find_one(&self, column: &str, value: &str) -> StoreResult<Option<Account>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE {column} = $1");
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        let accounts = attach_roles(&self.pool, row.into_iter().collect()).await?;
        Ok(accounts.into_iter().next())
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn find_account_by_id(&self, id: &str) -> StoreResult<Option<Account>> {
        self.find_one("id", id).await
    }

    async fn find_account_by_username(&self, username: &str) -> StoreResult<Option<Account>> {
        self.find_one("username", username).await
    }

    async fn find_account_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        self.find_one("email", email).await
    }

    async fn list_accounts(&self) -> StoreResult<Vec<Account>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY created_at, id");
        let rows = sqlx::query_as::<_, AccountRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(attach_roles(&self.pool, rows).await?)
    }

    async fn page_accounts(&self, request: PageRequest) -> StoreResult<Page<Account>> {
        let total = self.count_accounts().await?;

        let sql = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY created_at, id LIMIT $1 OFFSET $2"
        );
        let rows = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(i64::from(request.size))
            .bind(i64::try_from(request.offset()).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;

        let items = attach_roles(&self.pool, rows).await?;
        Ok(Page::new(request, items, total))
    }

    async fn count_accounts(&self) -> StoreResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts")
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn delete_account(&self, id: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_all_accounts(&self) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM accounts")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn find_role(&self, name: &str) -> StoreResult<Option<Role>> {
        let role = sqlx::query_as::<_, Role>("SELECT id, name FROM roles WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(role)
    }

    async fn list_roles(&self) -> StoreResult<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>("SELECT id, name FROM roles ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(roles)
    }

    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTransaction { tx }))
    }
}

/// PostgreSQL 트랜잭션.
///
/// 계정 조회는 `FOR UPDATE`로 행을 잠가 동시 수정이 직렬화되도록 합니다.
struct PgTransaction {
    tx: Transaction<'static, Postgres>,
}

impl PgTransaction {
    async fn find_one_for_update(&mut self, column: &str, value: &str) -> StoreResult<Option<Account>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE {column} = $1 FOR UPDATE");
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(value)
            .fetch_optional(&mut *self.tx)
            .await?;

        let accounts = attach_roles(&mut *self.tx, row.into_iter().collect()).await?;
        Ok(accounts.into_iter().next())
    }
}

#[async_trait]
impl StoreTransaction for PgTransaction {
    async fn find_account_by_id(&mut self, id: &str) -> StoreResult<Option<Account>> {
        self.find_one_for_update("id", id).await
    }

    async fn find_account_by_username(&mut self, username: &str) -> StoreResult<Option<Account>> {
        self.find_one_for_update("username", username).await
    }

    async fn username_exists(&mut self, username: &str) -> StoreResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM accounts WHERE username = $1)")
                .bind(username)
                .fetch_one(&mut *self.tx)
                .await?;
        Ok(exists)
    }

    async fn email_exists(&mut self, email: &str) -> StoreResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM accounts WHERE email = $1)")
                .bind(email)
                .fetch_one(&mut *self.tx)
                .await?;
        Ok(exists)
    }

    async fn find_role(&mut self, name: &str) -> StoreResult<Option<Role>> {
        let role = sqlx::query_as::<_, Role>("SELECT id, name FROM roles WHERE name = $1")
            .bind(name)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(role)
    }

    async fn insert_role(&mut self, name: &str) -> StoreResult<Role> {
        let role =
            sqlx::query_as::<_, Role>("INSERT INTO roles (name) VALUES ($1) RETURNING id, name")
                .bind(name)
                .fetch_one(&mut *self.tx)
                .await?;
        Ok(role)
    }

    async fn insert_account(&mut self, account: NewAccount) -> StoreResult<Account> {
        let sql = format!(
            r#"
            INSERT INTO accounts (id, username, email, password_hash, enabled, created_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            RETURNING {ACCOUNT_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(Uuid::new_v4().to_string())
            .bind(&account.username)
            .bind(&account.email)
            .bind(&account.password_hash)
            .bind(account.enabled)
            .fetch_one(&mut *self.tx)
            .await?;

        replace_roles(&mut self.tx, &row.id, &account.roles).await?;
        Ok(row.into_account(account.roles))
    }

    async fn save_account(&mut self, account: &Account) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET username = $2, email = $3, password_hash = $4, enabled = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(&account.id)
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(account.enabled)
        .bind(account.updated_at)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Backend(format!(
                "account '{}' is gone",
                account.id
            )));
        }

        replace_roles(&mut self.tx, &account.id, &account.roles).await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
