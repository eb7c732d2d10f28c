//! 요청 범위 신원.
//!
//! 인가 게이트가 요청 extensions에 넣고, 이후 접근 정책과 핸들러가 읽습니다.
//! 요청마다 새로 만들어지며 요청 사이에 공유되지 않습니다.

use std::collections::BTreeSet;
use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

/// 검증된 토큰의 주체.
///
/// 필드는 생성 후 바꿀 수 없습니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    username: String,
    roles: BTreeSet<String>,
}

impl Principal {
    pub(crate) fn new(username: String, roles: BTreeSet<String>) -> Self {
        Self { username, roles }
    }

    /// 사용자 이름 (토큰의 `sub`).
    pub fn username(&self) -> &str {
        &self.username
    }

    /// 역할 이름 집합.
    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    /// 역할 보유 여부.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

/// 요청의 호출자 신원.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Identity {
    /// 토큰이 없거나 검증에 실패한 요청
    #[default]
    Anonymous,
    /// 유효한 토큰을 제시한 요청
    Authenticated(Principal),
}

impl Identity {
    /// 인증된 주체 (익명이면 None).
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Identity::Anonymous => None,
            Identity::Authenticated(principal) => Some(principal),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.principal().is_some()
    }
}

/// 핸들러용 추출기. 게이트를 거치지 않은 요청은 익명입니다.
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Identity>()
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_principal_roles() {
        let principal = Principal::new(
            "alice".to_string(),
            ["USER", "ADMIN"].iter().map(|s| s.to_string()).collect(),
        );
        assert_eq!(principal.username(), "alice");
        assert!(principal.has_role("ADMIN"));
        assert!(!principal.has_role("SUPER_ADMIN"));

        let identity = Identity::Authenticated(principal);
        assert!(identity.is_authenticated());
        assert!(!Identity::default().is_authenticated());
    }
}
