//! 계정 엔티티.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use super::Role;

/// 계정.
///
/// 도메인 서비스와 인가 계층이 함께 사용하는 단일 구조체입니다.
/// 역할 목록은 계정이 소유하며 집합으로 취급됩니다 (같은 역할이 두 번 들어가지 않음).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// 생성 시 할당되는 불변 식별자 (재사용되지 않음)
    pub id: String,
    /// 사용자 이름 (고유)
    pub username: String,
    /// 이메일 (고유)
    pub email: String,
    /// PHC 형식 비밀번호 해시
    pub password_hash: String,
    /// 활성화 여부
    pub enabled: bool,
    /// 생성 시간
    pub created_at: DateTime<Utc>,
    /// 마지막 수정 시간 (첫 수정 전에는 None)
    pub updated_at: Option<DateTime<Utc>>,
    /// 부여된 역할
    pub roles: Vec<Role>,
}

impl Account {
    /// 역할 이름 집합 (읽기 전용 투영).
    ///
    /// 역할이 없으면 빈 집합을 반환합니다.
    pub fn role_names(&self) -> BTreeSet<String> {
        self.roles.iter().map(|r| r.name.clone()).collect()
    }

    /// 역할 보유 여부.
    pub fn has_role(&self, name: &str) -> bool {
        self.roles.iter().any(|r| r.name == name)
    }

    /// 역할 부여. 이미 보유한 역할이면 변경 없이 false를 반환합니다.
    pub fn grant(&mut self, role: Role) -> bool {
        if self.roles.iter().any(|r| r.id == role.id) {
            return false;
        }
        self.roles.push(role);
        true
    }

    /// 역할 회수. 보유하지 않은 역할이면 변경 없이 false를 반환합니다.
    pub fn revoke(&mut self, role: &Role) -> bool {
        let before = self.roles.len();
        self.roles.retain(|r| r.id != role.id);
        self.roles.len() != before
    }
}

/// 저장소에 삽입할 새 계정.
///
/// 식별자와 생성 시간은 저장소가 할당합니다.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub enabled: bool,
    pub roles: Vec<Role>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> Account {
        Account {
            id: "a-1".to_string(),
            username: "alice".to_string(),
            email: "alice@x.com".to_string(),
            password_hash: "$argon2id$...".to_string(),
            enabled: true,
            created_at: Utc::now(),
            updated_at: None,
            roles: vec![Role::new(1, "USER")],
        }
    }

    #[test]
    fn test_grant_is_set_semantics() {
        let mut account = account();

        assert!(account.grant(Role::new(2, "ADMIN")));
        assert!(!account.grant(Role::new(2, "ADMIN")));
        assert_eq!(account.roles.len(), 2);
        assert!(account.has_role("ADMIN"));
    }

    #[test]
    fn test_revoke_absent_role_is_noop() {
        let mut account = account();

        assert!(!account.revoke(&Role::new(3, "SUPER_ADMIN")));
        assert_eq!(account.roles.len(), 1);

        assert!(account.revoke(&Role::new(1, "USER")));
        assert!(account.roles.is_empty());
        assert!(account.role_names().is_empty());
    }

    #[test]
    fn test_role_names() {
        let mut account = account();
        account.grant(Role::new(2, "ADMIN"));

        let names: Vec<_> = account.role_names().into_iter().collect();
        assert_eq!(names, vec!["ADMIN".to_string(), "USER".to_string()]);
    }
}
