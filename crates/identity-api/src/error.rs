//! API 에러 응답 타입.
//!
//! 모든 엔드포인트는 같은 형식의 에러 본문을 반환합니다.
//!
//! ```json
//! {
//!   "code": "ACCOUNT_NOT_FOUND",
//!   "message": "계정을 찾을 수 없습니다: 42",
//!   "timestamp": 1738300800
//! }
//! ```

use axum::{http::StatusCode, Json};
use identity_core::IdentityError;
use serde::{Deserialize, Serialize};
use tracing::error;
use validator::ValidationErrors;

use crate::auth::LoginError;

/// API 에러 응답.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "INVALID_INPUT", "FORBIDDEN")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 에러 발생 타임스탬프 (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ApiErrorResponse {
    /// 타임스탬프 포함 에러 생성.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            timestamp: Some(chrono::Utc::now().timestamp()),
        }
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiErrorResponse {}

/// API 핸들러 Result 타입 별칭.
pub type ApiResult<T> = Result<T, (StatusCode, Json<ApiErrorResponse>)>;

fn reply(status: StatusCode, code: &str, message: impl Into<String>) -> (StatusCode, Json<ApiErrorResponse>) {
    (status, Json(ApiErrorResponse::new(code, message)))
}

/// 도메인 에러를 HTTP 응답으로 변환.
pub fn identity_error(err: IdentityError) -> (StatusCode, Json<ApiErrorResponse>) {
    match &err {
        IdentityError::AccountNotFound(_) => {
            reply(StatusCode::NOT_FOUND, "ACCOUNT_NOT_FOUND", err.to_string())
        }
        IdentityError::RoleNotFound(_) => {
            reply(StatusCode::NOT_FOUND, "ROLE_NOT_FOUND", err.to_string())
        }
        IdentityError::UsernameTaken => reply(StatusCode::CONFLICT, "USERNAME_TAKEN", err.to_string()),
        IdentityError::EmailTaken => reply(StatusCode::CONFLICT, "EMAIL_TAKEN", err.to_string()),
        IdentityError::InvalidCredentials => invalid_credentials(),
        IdentityError::InvalidInput(_) => {
            reply(StatusCode::BAD_REQUEST, "INVALID_INPUT", err.to_string())
        }
        IdentityError::Password(_) | IdentityError::Store(_) => {
            error!(error = %err, "request failed");
            internal_error()
        }
    }
}

/// 로그인 에러를 HTTP 응답으로 변환.
///
/// 자격 증명 실패는 원인과 관계없이 같은 응답입니다.
pub fn login_error(err: LoginError) -> (StatusCode, Json<ApiErrorResponse>) {
    match err {
        LoginError::InvalidCredentials => invalid_credentials(),
        LoginError::Store(_) | LoginError::Token(_) => {
            error!(error = %err, "login failed");
            internal_error()
        }
    }
}

/// 요청 본문 검증 실패를 HTTP 응답으로 변환.
pub fn validation_error(errors: ValidationErrors) -> (StatusCode, Json<ApiErrorResponse>) {
    let message = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{}: 유효하지 않은 값", field))
            })
        })
        .collect::<Vec<_>>()
        .join("; ");

    reply(StatusCode::BAD_REQUEST, "INVALID_INPUT", message)
}

fn invalid_credentials() -> (StatusCode, Json<ApiErrorResponse>) {
    reply(
        StatusCode::UNAUTHORIZED,
        "INVALID_CREDENTIALS",
        IdentityError::InvalidCredentials.to_string(),
    )
}

fn internal_error() -> (StatusCode, Json<ApiErrorResponse>) {
    reply(
        StatusCode::INTERNAL_SERVER_ERROR,
        "STORE_ERROR",
        "요청을 처리하는 중 저장소 오류가 발생했습니다",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use identity_core::StoreError;

    #[test]
    fn test_identity_error_mapping() {
        let cases = vec![
            (IdentityError::AccountNotFound("1".into()), StatusCode::NOT_FOUND, "ACCOUNT_NOT_FOUND"),
            (IdentityError::RoleNotFound("X".into()), StatusCode::NOT_FOUND, "ROLE_NOT_FOUND"),
            (IdentityError::UsernameTaken, StatusCode::CONFLICT, "USERNAME_TAKEN"),
            (IdentityError::EmailTaken, StatusCode::CONFLICT, "EMAIL_TAKEN"),
            (IdentityError::InvalidInput("x".into()), StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            (
                IdentityError::Store(StoreError::Backend("down".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORE_ERROR",
            ),
        ];

        for (err, status, code) in cases {
            let (actual_status, Json(body)) = identity_error(err);
            assert_eq!(actual_status, status);
            assert_eq!(body.code, code);
        }
    }

    #[test]
    fn test_store_details_not_exposed() {
        let (_, Json(body)) =
            identity_error(IdentityError::Store(StoreError::Backend("password=secret".into())));
        assert!(!body.message.contains("secret"));
    }

    #[test]
    fn test_error_serialization() {
        let json = serde_json::to_value(ApiErrorResponse::new("FORBIDDEN", "no")).unwrap();
        assert_eq!(json["code"], "FORBIDDEN");
        assert!(json["timestamp"].is_i64());

        let without_timestamp = ApiErrorResponse {
            timestamp: None,
            ..ApiErrorResponse::new("FORBIDDEN", "no")
        };
        let json = serde_json::to_value(without_timestamp).unwrap();
        assert!(json.get("timestamp").is_none());
    }
}
