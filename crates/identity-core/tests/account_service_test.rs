//! 계정 서비스 통합 테스트
//!
//! 인메모리 저장소 위에서 생성/수정/조회/삭제 흐름을 검증합니다.

use std::sync::Arc;

use identity_core::{
    AccountRequest, AccountService, Argon2Hasher, CredentialStore, IdentityError, MemoryStore,
    PasswordHasher, USER,
};

fn setup() -> (MemoryStore, AccountService, Arc<Argon2Hasher>) {
    let store = MemoryStore::new();
    let hasher = Arc::new(Argon2Hasher::low_cost());
    let service = AccountService::new(Arc::new(store.clone()), hasher.clone());
    (store, service, hasher)
}

#[tokio::test]
async fn test_create_assigns_user_role_and_hashes_password() {
    let (store, accounts, hasher) = setup();

    let alice = accounts
        .create(AccountRequest::new("alice", "a@x.com", "pw1"))
        .await
        .unwrap();

    assert!(alice.enabled);
    assert!(alice.updated_at.is_none());
    assert_eq!(alice.role_names().into_iter().collect::<Vec<_>>(), vec![USER]);
    assert_ne!(alice.password_hash, "pw1");
    assert!(hasher.verify("pw1", &alice.password_hash));

    // USER 역할은 처음 필요할 때 한 번만 만들어짐
    accounts
        .create(AccountRequest::new("bob", "b@x.com", "pw2"))
        .await
        .unwrap();
    let roles = store.list_roles().await.unwrap();
    assert_eq!(roles.len(), 1);
    assert_eq!(roles[0].name, USER);
}

#[tokio::test]
async fn test_create_conflict_writes_nothing() {
    let (store, accounts, _) = setup();

    accounts
        .create(AccountRequest::new("alice", "a@x.com", "pw1"))
        .await
        .unwrap();

    let same_name = accounts
        .create(AccountRequest::new("alice", "other@x.com", "pw"))
        .await;
    assert!(matches!(same_name, Err(IdentityError::UsernameTaken)));

    let same_email = accounts
        .create(AccountRequest::new("carol", "a@x.com", "pw"))
        .await;
    assert!(matches!(same_email, Err(IdentityError::EmailTaken)));

    assert_eq!(store.count_accounts().await.unwrap(), 1);
    assert_eq!(store.list_roles().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_delete_all_keeps_roles() {
    let (store, accounts, _) = setup();

    accounts
        .create(AccountRequest::new("alice", "a@x.com", "pw1"))
        .await
        .unwrap();
    accounts.delete_all().await.unwrap();

    // 계정은 모두 지워졌지만 역할은 남아 있음
    assert_eq!(store.list_roles().await.unwrap().len(), 1);
    assert_eq!(store.count_accounts().await.unwrap(), 0);
}

#[tokio::test]
async fn test_update_changes_fields_and_rehashes() {
    let (_, accounts, hasher) = setup();

    let alice = accounts
        .create(AccountRequest::new("alice", "a@x.com", "pw1"))
        .await
        .unwrap();

    let updated = accounts
        .update(&alice.id, AccountRequest::new("alice2", "a2@x.com", "pw2"))
        .await
        .unwrap();

    assert_eq!(updated.id, alice.id);
    assert_eq!(updated.username, "alice2");
    assert_eq!(updated.email, "a2@x.com");
    assert!(updated.updated_at.is_some());
    assert!(hasher.verify("pw2", &updated.password_hash));
    assert!(!hasher.verify("pw1", &updated.password_hash));
    assert_eq!(updated.role_names(), alice.role_names());

    let reloaded = accounts.find_by_id(&alice.id).await.unwrap();
    assert_eq!(reloaded.username, "alice2");
}

#[tokio::test]
async fn test_update_keeping_own_username_is_allowed() {
    let (_, accounts, _) = setup();

    let alice = accounts
        .create(AccountRequest::new("alice", "a@x.com", "pw1"))
        .await
        .unwrap();

    let updated = accounts
        .update(&alice.id, AccountRequest::new("alice", "a@x.com", "pw2"))
        .await
        .unwrap();
    assert_eq!(updated.username, "alice");
}

#[tokio::test]
async fn test_update_conflicts_with_other_accounts() {
    let (_, accounts, _) = setup();

    let alice = accounts
        .create(AccountRequest::new("alice", "a@x.com", "pw1"))
        .await
        .unwrap();
    accounts
        .create(AccountRequest::new("bob", "b@x.com", "pw2"))
        .await
        .unwrap();

    let result = accounts
        .update(&alice.id, AccountRequest::new("bob", "a@x.com", "pw"))
        .await;
    assert!(matches!(result, Err(IdentityError::UsernameTaken)));

    let result = accounts
        .update(&alice.id, AccountRequest::new("alice", "b@x.com", "pw"))
        .await;
    assert!(matches!(result, Err(IdentityError::EmailTaken)));

    let unchanged = accounts.find_by_id(&alice.id).await.unwrap();
    assert_eq!(unchanged.username, "alice");
    assert_eq!(unchanged.email, "a@x.com");
    assert!(unchanged.updated_at.is_none());
}

#[tokio::test]
async fn test_missing_account() {
    let (_, accounts, _) = setup();

    let result = accounts.find_by_id("missing").await;
    assert!(matches!(result, Err(IdentityError::AccountNotFound(_))));

    let result = accounts
        .update("missing", AccountRequest::new("x", "x@x.com", "pw"))
        .await;
    assert!(matches!(result, Err(IdentityError::AccountNotFound(_))));

    assert!(!accounts.delete_by_id("missing").await.unwrap());
}

#[tokio::test]
async fn test_find_page() {
    let (_, accounts, _) = setup();

    for i in 0..5 {
        accounts
            .create(AccountRequest::new(
                format!("user{}", i),
                format!("user{}@x.com", i),
                "pw",
            ))
            .await
            .unwrap();
    }

    let first = accounts.find_page(0, 2).await.unwrap();
    assert_eq!(first.total_pages, 3);
    assert_eq!(first.total, 5);
    assert_eq!(first.page, 0);
    assert_eq!(first.size, 2);
    assert_eq!(first.items.len(), 2);

    let last = accounts.find_page(2, 2).await.unwrap();
    assert_eq!(last.items.len(), 1);

    let all = accounts.find_all().await.unwrap();
    assert_eq!(all.len(), 5);
}

#[tokio::test]
async fn test_delete() {
    let (_, accounts, _) = setup();

    let alice = accounts
        .create(AccountRequest::new("alice", "a@x.com", "pw1"))
        .await
        .unwrap();
    accounts
        .create(AccountRequest::new("bob", "b@x.com", "pw2"))
        .await
        .unwrap();

    assert!(accounts.delete_by_id(&alice.id).await.unwrap());
    assert!(matches!(
        accounts.find_by_id(&alice.id).await,
        Err(IdentityError::AccountNotFound(_))
    ));
    assert_eq!(accounts.delete_all().await.unwrap(), 1);
    assert!(accounts.find_all().await.unwrap().is_empty());
}
