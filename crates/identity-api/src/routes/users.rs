//! 계정 관리 endpoint.
//!
//! 모든 라우트는 접근 정책이 먼저 검사하므로 핸들러는 역할을 다시 확인하지 않습니다.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use identity_core::{Account, AccountRequest, IdentityError, Page};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::auth::Identity;
use crate::error::{identity_error, validation_error, ApiResult};
use crate::extract::{ApiJson, ApiPath};
use crate::metrics::record_role_mutation;
use crate::state::AppState;

// ==================== 요청/응답 타입 ====================

/// 계정 생성/수정 요청.
#[derive(Debug, Deserialize, Validate)]
pub struct AccountPayload {
    #[validate(length(min = 1, max = 64, message = "사용자 이름은 1-64자여야 합니다"))]
    pub username: String,
    #[validate(email(message = "올바른 이메일 형식이 아닙니다"))]
    pub email: String,
    #[validate(length(min = 1, max = 256, message = "비밀번호는 1-256자여야 합니다"))]
    pub password: String,
}

impl From<AccountPayload> for AccountRequest {
    fn from(payload: AccountPayload) -> Self {
        AccountRequest::new(payload.username, payload.email, payload.password)
    }
}

/// 역할 부여/회수 요청.
#[derive(Debug, Deserialize, Validate)]
pub struct RoleChangeRequest {
    #[validate(length(min = 1, message = "사용자 이름이 필요합니다"))]
    pub username: String,
    #[serde(rename = "roleName", alias = "role_name")]
    #[validate(length(min = 1, message = "역할 이름이 필요합니다"))]
    pub role_name: String,
}

/// 계정 응답 (비밀번호 해시 제외).
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub roles: Vec<String>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        let roles = account.role_names().into_iter().collect();
        Self {
            id: account.id,
            username: account.username,
            email: account.email,
            enabled: account.enabled,
            created_at: account.created_at,
            updated_at: account.updated_at,
            roles,
        }
    }
}

/// 페이지 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountPageResponse {
    pub total_pages: u32,
    pub page: u32,
    pub size: u32,
    pub total: u64,
    pub users: Vec<AccountResponse>,
}

impl From<Page<Account>> for AccountPageResponse {
    fn from(page: Page<Account>) -> Self {
        Self {
            total_pages: page.total_pages,
            page: page.page,
            size: page.size,
            total: page.total,
            users: page.items.into_iter().map(AccountResponse::from).collect(),
        }
    }
}

/// 전체 삭제 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteAllResponse {
    pub deleted: u64,
}

// ==================== 핸들러 ====================

/// 계정 생성.
///
/// POST /users/create
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<AccountPayload>,
) -> ApiResult<(StatusCode, Json<AccountResponse>)> {
    payload.validate().map_err(validation_error)?;

    let account = state
        .accounts
        .create(payload.into())
        .await
        .map_err(identity_error)?;

    Ok((StatusCode::CREATED, Json(account.into())))
}

/// 계정 수정.
///
/// PUT /users/update/{id}
pub async fn update_account(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<String>,
    ApiJson(payload): ApiJson<AccountPayload>,
) -> ApiResult<Json<AccountResponse>> {
    payload.validate().map_err(validation_error)?;

    let account = state
        .accounts
        .update(&id, payload.into())
        .await
        .map_err(identity_error)?;

    Ok(Json(account.into()))
}

/// 역할 부여.
///
/// PUT /users/add-role
pub async fn add_role(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    ApiJson(request): ApiJson<RoleChangeRequest>,
) -> ApiResult<Json<bool>> {
    request.validate().map_err(validation_error)?;

    let result = state.roles.grant(&request.username, &request.role_name).await;
    record_role_mutation("grant", mutation_outcome(&result));

    let applied = result.map_err(identity_error)?;
    info!(
        actor = identity.principal().map(|p| p.username()).unwrap_or("-"),
        username = %request.username,
        role = %request.role_name,
        applied,
        "add-role handled"
    );
    Ok(Json(applied))
}

/// 역할 회수.
///
/// PUT /users/remove-role
pub async fn remove_role(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    ApiJson(request): ApiJson<RoleChangeRequest>,
) -> ApiResult<Json<bool>> {
    request.validate().map_err(validation_error)?;

    let result = state.roles.revoke(&request.username, &request.role_name).await;
    record_role_mutation("revoke", mutation_outcome(&result));

    let applied = result.map_err(identity_error)?;
    info!(
        actor = identity.principal().map(|p| p.username()).unwrap_or("-"),
        username = %request.username,
        role = %request.role_name,
        applied,
        "remove-role handled"
    );
    Ok(Json(applied))
}

fn mutation_outcome(result: &Result<bool, IdentityError>) -> &'static str {
    match result {
        Ok(true) => "applied",
        Ok(false) => "not_applied",
        Err(_) => "error",
    }
}

/// ID로 계정 조회.
///
/// GET /users/get/{id}
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<AccountResponse>> {
    let account = state.accounts.find_by_id(&id).await.map_err(identity_error)?;
    Ok(Json(account.into()))
}

/// 사용자 이름으로 계정 조회.
///
/// GET /users/find/{username}
pub async fn find_account(
    State(state): State<Arc<AppState>>,
    ApiPath(username): ApiPath<String>,
) -> ApiResult<Json<AccountResponse>> {
    let account = state
        .accounts
        .find_by_username(&username)
        .await
        .map_err(identity_error)?;
    Ok(Json(account.into()))
}

/// 전체 계정 조회.
///
/// GET /users/all
pub async fn list_all(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<AccountResponse>>> {
    let accounts = state.accounts.find_all().await.map_err(identity_error)?;
    Ok(Json(accounts.into_iter().map(AccountResponse::from).collect()))
}

/// 페이지 단위 계정 조회.
///
/// GET /users/list/{page}/{size}
pub async fn list_page(
    State(state): State<Arc<AppState>>,
    ApiPath((page, size)): ApiPath<(u32, u32)>,
) -> ApiResult<Json<AccountPageResponse>> {
    let page = state
        .accounts
        .find_page(page, size)
        .await
        .map_err(identity_error)?;
    Ok(Json(page.into()))
}

/// 계정 삭제.
///
/// DELETE /users/delete/{id}
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<StatusCode> {
    let deleted = state.accounts.delete_by_id(&id).await.map_err(identity_error)?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(identity_error(IdentityError::AccountNotFound(id)))
    }
}

/// 전체 계정 삭제.
///
/// DELETE /users/delete-all
pub async fn delete_all(State(state): State<Arc<AppState>>) -> ApiResult<Json<DeleteAllResponse>> {
    let deleted = state.accounts.delete_all().await.map_err(identity_error)?;
    Ok(Json(DeleteAllResponse { deleted }))
}

pub fn users_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/create", post(create_account))
        .route("/update/{id}", put(update_account))
        .route("/add-role", put(add_role))
        .route("/remove-role", put(remove_role))
        .route("/get/{id}", get(get_account))
        .route("/find/{username}", get(find_account))
        .route("/all", get(list_all))
        .route("/list/{page}/{size}", get(list_page))
        .route("/delete/{id}", delete(delete_account))
        .route("/delete-all", delete(delete_all))
}
