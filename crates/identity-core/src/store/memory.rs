//! 인메모리 저장소.
//!
//! 데이터베이스 없이 서비스를 실행하거나 테스트할 때 사용합니다.
//! 트랜잭션은 전체 상태에 대한 비동기 뮤텍스를 잡고 사본에 쓰기를 쌓아 두었다가
//! 커밋 시 한 번에 교체하므로, 트랜잭션끼리는 직렬화되고 부분 반영이 없습니다.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{
    CredentialStore, StoreError, StoreResult, StoreTransaction, UNIQUE_ACCOUNT_EMAIL,
    UNIQUE_ACCOUNT_USERNAME, UNIQUE_ROLE_NAME,
};
use crate::domain::{Account, NewAccount, Page, PageRequest, Role};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    /// 생성 순서대로 보관
    accounts: Vec<Account>,
    roles: Vec<Role>,
    last_role_id: i64,
}

impl MemoryState {
    fn account_by_id(&self, id: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == id)
    }

    fn account_by_username(&self, username: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.username == username)
    }

    fn account_by_email(&self, email: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.email == email)
    }

    fn role(&self, name: &str) -> Option<&Role> {
        self.roles.iter().find(|r| r.name == name)
    }

    /// `except_id`를 제외한 계정과 사용자 이름/이메일이 겹치는지 확인.
    fn check_unique(&self, username: &str, email: &str, except_id: Option<&str>) -> StoreResult<()> {
        let others = self
            .accounts
            .iter()
            .filter(|a| Some(a.id.as_str()) != except_id);

        for other in others {
            if other.username == username {
                return Err(StoreError::Conflict(UNIQUE_ACCOUNT_USERNAME.to_string()));
            }
            if other.email == email {
                return Err(StoreError::Conflict(UNIQUE_ACCOUNT_EMAIL.to_string()));
            }
        }
        Ok(())
    }
}

/// 인메모리 계정 저장소.
///
/// 복제본은 같은 상태를 공유합니다.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    fail_next_commit: Arc<AtomicBool>,
}

impl MemoryStore {
    /// 빈 저장소 생성.
    pub fn new() -> Self {
        Self::default()
    }

    /// 다음 트랜잭션의 커밋을 실패시킵니다 (테스트용).
    ///
    /// 플래그는 다음 `begin` 호출에서 소비됩니다.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_account_by_id(&self, id: &str) -> StoreResult<Option<Account>> {
        Ok(self.state.lock().await.account_by_id(id).cloned())
    }

    async fn find_account_by_username(&self, username: &str) -> StoreResult<Option<Account>> {
        Ok(self.state.lock().await.account_by_username(username).cloned())
    }

    async fn find_account_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        Ok(self.state.lock().await.account_by_email(email).cloned())
    }

    async fn list_accounts(&self) -> StoreResult<Vec<Account>> {
        Ok(self.state.lock().await.accounts.clone())
    }

    async fn page_accounts(&self, request: PageRequest) -> StoreResult<Page<Account>> {
        let state = self.state.lock().await;
        let total = state.accounts.len() as u64;
        let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);

        let items = state
            .accounts
            .iter()
            .skip(offset)
            .take(request.size as usize)
            .cloned()
            .collect();

        Ok(Page::new(request, items, total))
    }

    async fn count_accounts(&self) -> StoreResult<u64> {
        Ok(self.state.lock().await.accounts.len() as u64)
    }

    async fn delete_account(&self, id: &str) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        let before = state.accounts.len();
        state.accounts.retain(|a| a.id != id);
        Ok(state.accounts.len() != before)
    }

    async fn delete_all_accounts(&self) -> StoreResult<u64> {
        let mut state = self.state.lock().await;
        let removed = state.accounts.len() as u64;
        state.accounts.clear();
        Ok(removed)
    }

    async fn find_role(&self, name: &str) -> StoreResult<Option<Role>> {
        Ok(self.state.lock().await.role(name).cloned())
    }

    async fn list_roles(&self) -> StoreResult<Vec<Role>> {
        Ok(self.state.lock().await.roles.clone())
    }

    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let staged = guard.clone();
        let fail_commit = self.fail_next_commit.swap(false, Ordering::SeqCst);

        Ok(Box::new(MemoryTransaction {
            guard,
            staged,
            fail_commit,
        }))
    }
}

/// 인메모리 트랜잭션.
struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
    fail_commit: bool,
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn find_account_by_id(&mut self, id: &str) -> StoreResult<Option<Account>> {
        Ok(self.staged.account_by_id(id).cloned())
    }

    async fn find_account_by_username(&mut self, username: &str) -> StoreResult<Option<Account>> {
        Ok(self.staged.account_by_username(username).cloned())
    }

    async fn username_exists(&mut self, username: &str) -> StoreResult<bool> {
        Ok(self.staged.account_by_username(username).is_some())
    }

    async fn email_exists(&mut self, email: &str) -> StoreResult<bool> {
        Ok(self.staged.account_by_email(email).is_some())
    }

    async fn find_role(&mut self, name: &str) -> StoreResult<Option<Role>> {
        Ok(self.staged.role(name).cloned())
    }

    async fn insert_role(&mut self, name: &str) -> StoreResult<Role> {
        if self.staged.role(name).is_some() {
            return Err(StoreError::Conflict(UNIQUE_ROLE_NAME.to_string()));
        }

        self.staged.last_role_id += 1;
        let role = Role::new(self.staged.last_role_id, name);
        self.staged.roles.push(role.clone());
        Ok(role)
    }

    async fn insert_account(&mut self, account: NewAccount) -> StoreResult<Account> {
        self.staged
            .check_unique(&account.username, &account.email, None)?;

        let account = Account {
            id: Uuid::new_v4().to_string(),
            username: account.username,
            email: account.email,
            password_hash: account.password_hash,
            enabled: account.enabled,
            created_at: Utc::now(),
            updated_at: None,
            roles: account.roles,
        };
        self.staged.accounts.push(account.clone());
        Ok(account)
    }

    async fn save_account(&mut self, account: &Account) -> StoreResult<()> {
        self.staged
            .check_unique(&account.username, &account.email, Some(&account.id))?;

        let slot = self
            .staged
            .accounts
            .iter_mut()
            .find(|a| a.id == account.id)
            .ok_or_else(|| StoreError::Backend(format!("account '{}' is gone", account.id)))?;
        *slot = account.clone();
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryTransaction {
            mut guard,
            staged,
            fail_commit,
        } = *self;

        if fail_commit {
            return Err(StoreError::Backend("injected commit failure".to_string()));
        }

        *guard = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_account(username: &str, email: &str) -> NewAccount {
        NewAccount {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            enabled: true,
            roles: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_commit_makes_writes_visible() {
        let store = MemoryStore::new();

        let mut tx = store.begin().await.unwrap();
        let role = tx.insert_role("USER").await.unwrap();
        let mut account = tx.insert_account(new_account("alice", "alice@x.com")).await.unwrap();
        account.grant(role);
        tx.save_account(&account).await.unwrap();
        tx.commit().await.unwrap();

        let found = store.find_account_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found.id, account.id);
        assert!(found.has_role("USER"));
        assert_eq!(store.list_roles().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_dropped_transaction_discards_writes() {
        let store = MemoryStore::new();

        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_role("USER").await.unwrap();
            tx.insert_account(new_account("alice", "alice@x.com")).await.unwrap();
        }

        assert_eq!(store.count_accounts().await.unwrap(), 0);
        assert!(store.find_role("USER").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_commit_discards_writes() {
        let store = MemoryStore::new();
        store.fail_next_commit();

        let mut tx = store.begin().await.unwrap();
        tx.insert_account(new_account("alice", "alice@x.com")).await.unwrap();
        assert!(tx.commit().await.is_err());

        assert_eq!(store.count_accounts().await.unwrap(), 0);

        // 플래그는 한 번만 적용됨
        let mut tx = store.begin().await.unwrap();
        tx.insert_account(new_account("alice", "alice@x.com")).await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(store.count_accounts().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unique_constraints() {
        let store = MemoryStore::new();

        let mut tx = store.begin().await.unwrap();
        tx.insert_account(new_account("alice", "alice@x.com")).await.unwrap();
        let dup_name = tx.insert_account(new_account("alice", "other@x.com")).await;
        let dup_mail = tx.insert_account(new_account("bob", "alice@x.com")).await;
        assert!(matches!(dup_name, Err(StoreError::Conflict(c)) if c == UNIQUE_ACCOUNT_USERNAME));
        assert!(matches!(dup_mail, Err(StoreError::Conflict(c)) if c == UNIQUE_ACCOUNT_EMAIL));
        assert!(matches!(tx.insert_role("USER").await, Ok(_)));
        assert!(matches!(
            tx.insert_role("USER").await,
            Err(StoreError::Conflict(c)) if c == UNIQUE_ROLE_NAME
        ));
    }

    #[tokio::test]
    async fn test_page_accounts() {
        let store = MemoryStore::new();

        let mut tx = store.begin().await.unwrap();
        for i in 0..5 {
            tx.insert_account(new_account(&format!("user{}", i), &format!("user{}@x.com", i)))
                .await
                .unwrap();
        }
        tx.commit().await.unwrap();

        let first = store.page_accounts(PageRequest::new(0, 2)).await.unwrap();
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.items[0].username, "user0");

        let last = store.page_accounts(PageRequest::new(2, 2)).await.unwrap();
        assert_eq!(last.items.len(), 1);
        assert_eq!(last.items[0].username, "user4");

        let beyond = store.page_accounts(PageRequest::new(7, 2)).await.unwrap();
        assert!(beyond.items.is_empty());
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryStore::new();

        let mut tx = store.begin().await.unwrap();
        let alice = tx.insert_account(new_account("alice", "alice@x.com")).await.unwrap();
        tx.insert_account(new_account("bob", "bob@x.com")).await.unwrap();
        tx.commit().await.unwrap();

        assert!(store.delete_account(&alice.id).await.unwrap());
        assert!(!store.delete_account(&alice.id).await.unwrap());
        assert_eq!(store.delete_all_accounts().await.unwrap(), 1);
        assert_eq!(store.count_accounts().await.unwrap(), 0);
    }
}
