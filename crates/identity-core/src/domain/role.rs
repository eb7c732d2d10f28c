//! 역할 참조 데이터.

use serde::{Deserialize, Serialize};

/// 일반 사용자 역할 이름. 새 계정은 항상 이 역할로 시작합니다.
pub const USER: &str = "USER";

/// 관리자 역할 이름.
pub const ADMIN: &str = "ADMIN";

/// 최고 관리자 역할 이름.
pub const SUPER_ADMIN: &str = "SUPER_ADMIN";

/// 부트스트랩 시 생성되는 기본 역할 목록.
pub const DEFAULT_ROLES: [&str; 3] = [USER, ADMIN, SUPER_ADMIN];

/// 역할.
///
/// 식별자는 저장소가 할당하며, 이름은 전체 역할 중 고유합니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Role {
    /// 저장소가 할당한 숫자 식별자
    pub id: i64,
    /// 고유 이름 (예: "USER", "ADMIN")
    pub name: String,
}

impl Role {
    /// 새 역할 값 생성.
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}
