//! 역할 부여/회수 서비스.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{IdentityError, IdentityResult};
use crate::store::CredentialStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoleChange {
    Grant,
    Revoke,
}

impl RoleChange {
    fn as_str(self) -> &'static str {
        match self {
            RoleChange::Grant => "grant",
            RoleChange::Revoke => "revoke",
        }
    }
}

/// 역할 부여/회수 서비스.
///
/// 계정과 역할을 모두 확인한 뒤, 역할 집합 변경과 저장을 하나의 트랜잭션으로 수행합니다.
///
/// 계정/역할이 없으면 에러를 반환하지만, 저장 또는 커밋이 실패하면 에러 대신
/// `Ok(false)`를 반환합니다. 이 경우 변경은 롤백되어 이후 조회에 보이지 않습니다.
/// 이미 가진 역할의 부여와 없는 역할의 회수는 집합 수준에서 변화가 없는 성공입니다.
#[derive(Clone)]
pub struct RoleAssignmentService {
    store: Arc<dyn CredentialStore>,
}

impl RoleAssignmentService {
    /// 새 서비스 생성.
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// 계정에 역할 부여.
    pub async fn grant(&self, username: &str, role_name: &str) -> IdentityResult<bool> {
        self.apply(username, role_name, RoleChange::Grant).await
    }

    /// 계정에서 역할 회수.
    pub async fn revoke(&self, username: &str, role_name: &str) -> IdentityResult<bool> {
        self.apply(username, role_name, RoleChange::Revoke).await
    }

    async fn apply(
        &self,
        username: &str,
        role_name: &str,
        change: RoleChange,
    ) -> IdentityResult<bool> {
        let mut tx = self.store.begin().await?;

        let mut account = tx
            .find_account_by_username(username)
            .await?
            .ok_or_else(|| IdentityError::AccountNotFound(username.to_string()))?;

        let role = tx
            .find_role(role_name)
            .await?
            .ok_or_else(|| IdentityError::RoleNotFound(role_name.to_string()))?;

        let changed = match change {
            RoleChange::Grant => account.grant(role),
            RoleChange::Revoke => account.revoke(&role),
        };

        if let Err(e) = tx.save_account(&account).await {
            warn!(
                username,
                role = role_name,
                op = change.as_str(),
                error = %e,
                "role change not applied"
            );
            if let Err(rollback) = tx.rollback().await {
                warn!(error = %rollback, "rollback failed");
            }
            return Ok(false);
        }

        if let Err(e) = tx.commit().await {
            warn!(
                username,
                role = role_name,
                op = change.as_str(),
                error = %e,
                "role change not committed"
            );
            return Ok(false);
        }

        info!(
            username,
            role = role_name,
            op = change.as_str(),
            changed,
            "role change applied"
        );
        Ok(true)
    }
}
