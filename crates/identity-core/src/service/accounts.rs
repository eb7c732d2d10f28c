//! 계정 서비스.
//!
//! 생성/수정/조회/삭제를 담당합니다. 고유성 검사는 쓰기 전에 같은 트랜잭션 안에서
//! 수행되므로, 충돌 시에는 어떤 쓰기도 일어나지 않습니다.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info};

use super::conflict_from_store;
use crate::domain::{Account, NewAccount, Page, PageRequest, USER};
use crate::error::{IdentityError, IdentityResult};
use crate::password::PasswordHasher;
use crate::store::CredentialStore;

/// 계정 생성/수정 요청.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl AccountRequest {
    /// 새 요청 생성.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    fn validate(&self) -> IdentityResult<()> {
        if self.username.trim().is_empty() {
            return Err(IdentityError::InvalidInput("username is blank".to_string()));
        }
        if self.email.trim().is_empty() {
            return Err(IdentityError::InvalidInput("email is blank".to_string()));
        }
        if self.password.is_empty() {
            return Err(IdentityError::InvalidInput("password is blank".to_string()));
        }
        Ok(())
    }
}

/// 계정 서비스.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn CredentialStore>,
    hasher: Arc<dyn PasswordHasher>,
}

impl AccountService {
    /// 새 서비스 생성.
    pub fn new(store: Arc<dyn CredentialStore>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { store, hasher }
    }

    /// 계정 생성.
    ///
    /// 새 계정은 활성화 상태이며 `USER` 역할 하나만 가집니다.
    /// `USER` 역할이 아직 없으면 같은 트랜잭션 안에서 만듭니다.
    pub async fn create(&self, request: AccountRequest) -> IdentityResult<Account> {
        request.validate()?;
        let password_hash = self.hasher.hash(&request.password)?;

        let mut tx = self.store.begin().await?;

        if tx.username_exists(&request.username).await? {
            debug!(username = %request.username, "username already in use");
            return Err(IdentityError::UsernameTaken);
        }
        if tx.email_exists(&request.email).await? {
            debug!(email = %request.email, "email already in use");
            return Err(IdentityError::EmailTaken);
        }

        let user_role = match tx.find_role(USER).await? {
            Some(role) => role,
            None => tx.insert_role(USER).await?,
        };

        let account = tx
            .insert_account(NewAccount {
                username: request.username,
                email: request.email,
                password_hash,
                enabled: true,
                roles: vec![user_role],
            })
            .await
            .map_err(conflict_from_store)?;

        tx.commit().await?;

        info!(account_id = %account.id, username = %account.username, "account created");
        Ok(account)
    }

    /// 계정 수정.
    ///
    /// 사용자 이름/이메일이 바뀌는 경우에만 다른 계정과의 중복을 검사합니다.
    /// 비밀번호는 항상 다시 해싱되고 수정 시간이 기록됩니다. 역할은 바뀌지 않습니다.
    pub async fn update(&self, id: &str, request: AccountRequest) -> IdentityResult<Account> {
        request.validate()?;
        let password_hash = self.hasher.hash(&request.password)?;

        let mut tx = self.store.begin().await?;

        let mut account = tx
            .find_account_by_id(id)
            .await?
            .ok_or_else(|| IdentityError::AccountNotFound(id.to_string()))?;

        if account.username != request.username && tx.username_exists(&request.username).await? {
            return Err(IdentityError::UsernameTaken);
        }
        if account.email != request.email && tx.email_exists(&request.email).await? {
            return Err(IdentityError::EmailTaken);
        }

        account.username = request.username;
        account.email = request.email;
        account.password_hash = password_hash;
        account.updated_at = Some(Utc::now());

        tx.save_account(&account)
            .await
            .map_err(conflict_from_store)?;
        tx.commit().await?;

        info!(account_id = %account.id, "account updated");
        Ok(account)
    }

    /// ID로 계정 조회.
    pub async fn find_by_id(&self, id: &str) -> IdentityResult<Account> {
        self.store
            .find_account_by_id(id)
            .await?
            .ok_or_else(|| IdentityError::AccountNotFound(id.to_string()))
    }

    /// 사용자 이름으로 계정 조회.
    pub async fn find_by_username(&self, username: &str) -> IdentityResult<Account> {
        self.store
            .find_account_by_username(username)
            .await?
            .ok_or_else(|| IdentityError::AccountNotFound(username.to_string()))
    }

    /// 전체 계정 조회.
    pub async fn find_all(&self) -> IdentityResult<Vec<Account>> {
        let accounts = self.store.list_accounts().await?;
        debug!(count = accounts.len(), "accounts listed");
        Ok(accounts)
    }

    /// 페이지 단위 계정 조회 (0부터 시작).
    pub async fn find_page(&self, page: u32, size: u32) -> IdentityResult<Page<Account>> {
        if size == 0 {
            return Err(IdentityError::InvalidInput(
                "page size must be at least 1".to_string(),
            ));
        }

        let page = self.store.page_accounts(PageRequest::new(page, size)).await?;
        debug!(
            page = page.page,
            returned = page.items.len(),
            total_pages = page.total_pages,
            "account page listed"
        );
        Ok(page)
    }

    /// 계정 삭제. 존재하지 않는 ID는 에러 없이 false를 반환합니다.
    pub async fn delete_by_id(&self, id: &str) -> IdentityResult<bool> {
        let deleted = self.store.delete_account(id).await?;
        info!(account_id = %id, deleted, "account delete requested");
        Ok(deleted)
    }

    /// 전체 계정 삭제.
    pub async fn delete_all(&self) -> IdentityResult<u64> {
        let removed = self.store.delete_all_accounts().await?;
        info!(removed, "all accounts deleted");
        Ok(removed)
    }
}
