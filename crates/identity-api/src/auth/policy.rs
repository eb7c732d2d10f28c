//! 경로 기반 접근 정책.
//!
//! (경로 패턴, 필요 역할, 매칭 방식) 규칙을 선언 순서대로 평가하며
//! 처음 일치한 규칙이 결정합니다. 어떤 규칙과도 일치하지 않는 경로는 거부됩니다.
//!
//! 패턴 문법:
//! - `*`: 정확히 한 세그먼트
//! - 마지막 위치의 `**`: 0개 이상의 세그먼트 (다른 위치에서는 `*`와 같음)
//! - 빈 세그먼트(끝의 `/` 등)는 무시

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use identity_core::{ADMIN, SUPER_ADMIN, USER};
use tracing::debug;

use super::Identity;
use crate::error::ApiErrorResponse;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    One,
    Rest,
}

/// 경로 패턴.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    pub fn new(pattern: &str) -> Self {
        let parts: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
        let last = parts.len().saturating_sub(1);

        let segments = parts
            .iter()
            .enumerate()
            .map(|(i, part)| match *part {
                "**" if i == last => Segment::Rest,
                "*" | "**" => Segment::One,
                literal => Segment::Literal(literal.to_string()),
            })
            .collect();

        Self {
            raw: pattern.to_string(),
            segments,
        }
    }

    /// 패턴 원문.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// 요청 경로와 일치하는지 확인.
    pub fn matches(&self, path: &str) -> bool {
        let mut parts = path.split('/').filter(|s| !s.is_empty());

        for segment in &self.segments {
            match segment {
                Segment::Rest => return true,
                Segment::One => {
                    if parts.next().is_none() {
                        return false;
                    }
                }
                Segment::Literal(expected) => {
                    if parts.next() != Some(expected.as_str()) {
                        return false;
                    }
                }
            }
        }

        parts.next().is_none()
    }
}

/// 역할 매칭 방식.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// 나열된 역할 중 하나 이상
    Any,
    /// 나열된 역할 전부
    All,
}

/// 규칙의 접근 조건.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// 누구나 접근 가능
    Public,
    /// 인증 + 역할 조건
    Roles {
        roles: BTreeSet<String>,
        mode: MatchMode,
    },
}

/// 접근 규칙.
#[derive(Debug, Clone)]
pub struct AccessRule {
    pub pattern: RoutePattern,
    pub access: Access,
}

impl AccessRule {
    pub fn public(pattern: &str) -> Self {
        Self {
            pattern: RoutePattern::new(pattern),
            access: Access::Public,
        }
    }

    pub fn any_of(pattern: &str, roles: &[&str]) -> Self {
        Self::with_roles(pattern, roles, MatchMode::Any)
    }

    pub fn all_of(pattern: &str, roles: &[&str]) -> Self {
        Self::with_roles(pattern, roles, MatchMode::All)
    }

    fn with_roles(pattern: &str, roles: &[&str], mode: MatchMode) -> Self {
        Self {
            pattern: RoutePattern::new(pattern),
            access: Access::Roles {
                roles: roles.iter().map(|r| r.to_string()).collect(),
                mode,
            },
        }
    }
}

/// 접근 거부 사유.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AccessDenied {
    /// 인증되지 않은 호출자
    #[error("인증이 필요합니다")]
    Unauthenticated,
    /// 인증되었지만 역할이 부족함
    #[error("권한이 부족합니다")]
    Forbidden,
}

impl IntoResponse for AccessDenied {
    fn into_response(self) -> Response {
        let (status, code) = match self {
            AccessDenied::Unauthenticated => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
            AccessDenied::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
        };

        (status, Json(ApiErrorResponse::new(code, self.to_string()))).into_response()
    }
}

/// 접근 정책.
///
/// 시작 시 한 번 만들어지며 이후 읽기 전용입니다.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    rules: Vec<AccessRule>,
}

impl AccessPolicy {
    pub fn new(rules: Vec<AccessRule>) -> Self {
        Self { rules }
    }

    /// 서비스의 기본 라우트 테이블.
    pub fn standard() -> Self {
        let readers = [USER, ADMIN, SUPER_ADMIN];
        let managers = [ADMIN, SUPER_ADMIN];

        Self::new(vec![
            AccessRule::public("/authentication/login"),
            AccessRule::public("/health/**"),
            AccessRule::public("/metrics"),
            AccessRule::any_of("/users/create", &managers),
            AccessRule::any_of("/users/update/**", &managers),
            AccessRule::all_of("/users/add-role", &[SUPER_ADMIN]),
            AccessRule::all_of("/users/remove-role", &[SUPER_ADMIN]),
            AccessRule::all_of("/users/delete/**", &[SUPER_ADMIN]),
            AccessRule::all_of("/users/delete-all", &[SUPER_ADMIN]),
            AccessRule::any_of("/users/get/**", &readers),
            AccessRule::any_of("/users/find/**", &readers),
            AccessRule::any_of("/users/all", &readers),
            AccessRule::any_of("/users/list/**", &readers),
        ])
    }

    pub fn rules(&self) -> &[AccessRule] {
        &self.rules
    }

    /// 경로와 신원으로 접근 여부 결정.
    pub fn authorize(&self, path: &str, identity: &Identity) -> Result<(), AccessDenied> {
        let Some(rule) = self.rules.iter().find(|r| r.pattern.matches(path)) else {
            return Err(deny(identity));
        };

        let (roles, mode) = match &rule.access {
            Access::Public => return Ok(()),
            Access::Roles { roles, mode } => (roles, *mode),
        };

        let principal = identity.principal().ok_or(AccessDenied::Unauthenticated)?;
        let allowed = match mode {
            MatchMode::Any => roles.iter().any(|r| principal.has_role(r)),
            MatchMode::All => roles.iter().all(|r| principal.has_role(r)),
        };

        if allowed {
            Ok(())
        } else {
            Err(AccessDenied::Forbidden)
        }
    }
}

fn deny(identity: &Identity) -> AccessDenied {
    if identity.is_authenticated() {
        AccessDenied::Forbidden
    } else {
        AccessDenied::Unauthenticated
    }
}

/// 접근 정책 미들웨어.
///
/// 인가 게이트 안쪽에 위치해야 합니다. 게이트가 설정한 신원이 없으면 익명으로 취급합니다.
pub async fn enforce_access_policy(
    State(policy): State<Arc<AccessPolicy>>,
    request: Request,
    next: Next,
) -> Response {
    let identity = request
        .extensions()
        .get::<Identity>()
        .cloned()
        .unwrap_or_default();

    match policy.authorize(request.uri().path(), &identity) {
        Ok(()) => next.run(request).await,
        Err(denied) => {
            debug!(
                path = %request.uri().path(),
                user = identity.principal().map(|p| p.username()).unwrap_or("-"),
                reason = %denied,
                "access denied"
            );
            denied.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Principal;

    fn user(roles: &[&str]) -> Identity {
        Identity::Authenticated(Principal::new(
            "tester".to_string(),
            roles.iter().map(|r| r.to_string()).collect(),
        ))
    }

    #[test]
    fn test_pattern_matching() {
        let exact = RoutePattern::new("/users/all");
        assert!(exact.matches("/users/all"));
        assert!(exact.matches("/users/all/"));
        assert!(!exact.matches("/users/all/extra"));
        assert!(!exact.matches("/users"));

        let single = RoutePattern::new("/users/get/*");
        assert!(single.matches("/users/get/42"));
        assert!(!single.matches("/users/get"));
        assert!(!single.matches("/users/get/42/more"));

        let rest = RoutePattern::new("/users/list/**");
        assert!(rest.matches("/users/list"));
        assert!(rest.matches("/users/list/0/10"));
        assert!(!rest.matches("/users/lister"));
    }

    #[test]
    fn test_public_routes() {
        let policy = AccessPolicy::standard();
        assert!(policy
            .authorize("/authentication/login", &Identity::Anonymous)
            .is_ok());
        assert!(policy.authorize("/health", &Identity::Anonymous).is_ok());
        assert!(policy.authorize("/health/ready", &Identity::Anonymous).is_ok());
    }

    #[test]
    fn test_anonymous_vs_forbidden() {
        let policy = AccessPolicy::standard();

        assert_eq!(
            policy.authorize("/users/all", &Identity::Anonymous),
            Err(AccessDenied::Unauthenticated)
        );
        assert_eq!(
            policy.authorize("/users/delete-all", &user(&[USER, ADMIN])),
            Err(AccessDenied::Forbidden)
        );
    }

    #[test]
    fn test_standard_table() {
        let policy = AccessPolicy::standard();
        let plain = user(&[USER]);
        let admin = user(&[ADMIN]);
        let root = user(&[SUPER_ADMIN]);

        for path in ["/users/all", "/users/get/1", "/users/list/0/2", "/users/find/alice"] {
            assert!(policy.authorize(path, &plain).is_ok(), "{}", path);
        }

        assert!(policy.authorize("/users/create", &plain).is_err());
        assert!(policy.authorize("/users/create", &admin).is_ok());
        assert!(policy.authorize("/users/update/1", &root).is_ok());

        for path in ["/users/add-role", "/users/remove-role", "/users/delete/1", "/users/delete-all"] {
            assert_eq!(policy.authorize(path, &admin), Err(AccessDenied::Forbidden));
            assert!(policy.authorize(path, &root).is_ok(), "{}", path);
        }
    }

    #[test]
    fn test_unmatched_route_denied() {
        let policy = AccessPolicy::standard();
        assert_eq!(
            policy.authorize("/nowhere", &Identity::Anonymous),
            Err(AccessDenied::Unauthenticated)
        );
        assert_eq!(
            policy.authorize("/nowhere", &user(&[SUPER_ADMIN])),
            Err(AccessDenied::Forbidden)
        );
    }

    #[test]
    fn test_first_match_wins_and_all_mode() {
        let policy = AccessPolicy::new(vec![
            AccessRule::public("/open/**"),
            AccessRule::all_of("/open/secret", &[ADMIN]),
            AccessRule::all_of("/both", &[ADMIN, SUPER_ADMIN]),
        ]);

        assert!(policy.authorize("/open/secret", &Identity::Anonymous).is_ok());
        assert_eq!(
            policy.authorize("/both", &user(&[ADMIN])),
            Err(AccessDenied::Forbidden)
        );
        assert!(policy.authorize("/both", &user(&[ADMIN, SUPER_ADMIN])).is_ok());
    }
}
