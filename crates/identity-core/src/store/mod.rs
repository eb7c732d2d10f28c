//! 계정/역할 저장소 계약.
//!
//! 서비스 계층은 이 트레이트만 알고 있으며, 실제 저장소는
//! 인메모리([`MemoryStore`]) 또는 PostgreSQL(`PgStore`, `postgres` feature)입니다.
//!
//! 읽기-수정-쓰기 작업은 반드시 [`CredentialStore::begin`]으로 연 트랜잭션 안에서
//! 수행합니다. 트랜잭션 안의 쓰기는 `commit` 전까지 다른 읽기에 보이지 않고,
//! 커밋 없이 drop되면 모두 폐기됩니다.

use async_trait::async_trait;

use crate::domain::{Account, NewAccount, Page, PageRequest, Role};

mod memory;
#[cfg(feature = "postgres")]
mod postgres;

pub use memory::MemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::PgStore;

/// 계정 사용자 이름 고유 제약
pub const UNIQUE_ACCOUNT_USERNAME: &str = "unique_account_username";
/// 계정 이메일 고유 제약
pub const UNIQUE_ACCOUNT_EMAIL: &str = "unique_account_email";
/// 역할 이름 고유 제약
pub const UNIQUE_ROLE_NAME: &str = "unique_role_name";

/// 저장소 에러.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// 고유 제약 위반 (동시 삽입 경쟁 등). 위반한 제약 이름을 담습니다.
    #[error("고유 제약 위반: {0}")]
    Conflict(String),
    /// 백엔드 에러
    #[error("저장소 에러: {0}")]
    Backend(String),
    /// 저장소를 사용할 수 없음
    #[error("저장소를 사용할 수 없습니다: {0}")]
    Unavailable(String),
}

/// 저장소 작업을 위한 Result 타입.
pub type StoreResult<T> = Result<T, StoreError>;

/// 계정/역할 저장소.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// ID로 계정 조회.
    async fn find_account_by_id(&self, id: &str) -> StoreResult<Option<Account>>;

    /// 사용자 이름으로 계정 조회.
    async fn find_account_by_username(&self, username: &str) -> StoreResult<Option<Account>>;

    /// 이메일로 계정 조회.
    async fn find_account_by_email(&self, email: &str) -> StoreResult<Option<Account>>;

    /// 전체 계정 조회 (생성 순서).
    async fn list_accounts(&self) -> StoreResult<Vec<Account>>;

    /// 페이지 단위 계정 조회 (생성 순서).
    async fn page_accounts(&self, request: PageRequest) -> StoreResult<Page<Account>>;

    /// 계정 수.
    async fn count_accounts(&self) -> StoreResult<u64>;

    /// 계정 삭제. 삭제된 행이 있으면 true.
    async fn delete_account(&self, id: &str) -> StoreResult<bool>;

    /// 전체 계정 삭제. 삭제된 계정 수를 반환합니다.
    async fn delete_all_accounts(&self) -> StoreResult<u64>;

    /// 이름으로 역할 조회.
    async fn find_role(&self, name: &str) -> StoreResult<Option<Role>>;

    /// 전체 역할 조회.
    async fn list_roles(&self) -> StoreResult<Vec<Role>>;

    /// 트랜잭션 시작.
    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>>;
}

/// 저장소 트랜잭션.
///
/// 트랜잭션 안에서 읽은 계정은 커밋/롤백 전까지 다른 트랜잭션이 수정할 수 없습니다.
#[async_trait]
pub trait StoreTransaction: Send {
    /// ID로 계정 조회 (수정용 잠금).
    async fn find_account_by_id(&mut self, id: &str) -> StoreResult<Option<Account>>;

    /// 사용자 이름으로 계정 조회 (수정용 잠금).
    async fn find_account_by_username(&mut self, username: &str) -> StoreResult<Option<Account>>;

    /// 사용자 이름 사용 여부.
    async fn username_exists(&mut self, username: &str) -> StoreResult<bool>;

    /// 이메일 사용 여부.
    async fn email_exists(&mut self, email: &str) -> StoreResult<bool>;

    /// 이름으로 역할 조회.
    async fn find_role(&mut self, name: &str) -> StoreResult<Option<Role>>;

    /// 역할 생성.
    async fn insert_role(&mut self, name: &str) -> StoreResult<Role>;

    /// 계정 생성. 식별자와 생성 시간이 할당된 계정을 반환합니다.
    async fn insert_account(&mut self, account: NewAccount) -> StoreResult<Account>;

    /// 계정 필드와 역할 관계를 통째로 저장합니다.
    async fn save_account(&mut self, account: &Account) -> StoreResult<()>;

    /// 커밋.
    async fn commit(self: Box<Self>) -> StoreResult<()>;

    /// 롤백.
    async fn rollback(self: Box<Self>) -> StoreResult<()>;
}
