//! 시작 시 초기 데이터 생성.
//!
//! 기본 역할(`USER`, `ADMIN`, `SUPER_ADMIN`)이 없으면 만들고, 계정이 하나도 없으면
//! 모든 역할을 가진 `admin` 계정을 만듭니다.

use identity_core::{
    BootstrapConfig, CredentialStore, IdentityResult, NewAccount, PasswordHasher, DEFAULT_ROLES,
};
use rand::{distributions::Alphanumeric, Rng};
use tracing::{info, warn};

/// 초기 관리자 사용자 이름.
pub const ADMIN_USERNAME: &str = "admin";

/// 초기 관리자 이메일.
pub const ADMIN_EMAIL: &str = "admin@identity.local";

const GENERATED_PASSWORD_LEN: usize = 24;

/// 초기화 결과.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    /// 새로 만든 역할 이름
    pub created_roles: Vec<String>,
    /// 관리자 계정 생성 여부
    pub admin_created: bool,
}

/// 초기 데이터 생성.
///
/// 여러 번 실행해도 이미 있는 데이터는 건드리지 않습니다.
pub async fn seed(
    store: &dyn CredentialStore,
    hasher: &dyn PasswordHasher,
    config: &BootstrapConfig,
) -> IdentityResult<BootstrapReport> {
    let needs_admin = store.count_accounts().await? == 0;

    let (admin_password, generated) = match &config.admin_password {
        Some(password) if !password.is_empty() => (password.clone(), false),
        _ => (generate_password(), true),
    };
    let password_hash = if needs_admin {
        Some(hasher.hash(&admin_password)?)
    } else {
        None
    };

    let mut report = BootstrapReport::default();
    let mut tx = store.begin().await?;

    let mut roles = Vec::with_capacity(DEFAULT_ROLES.len());
    for name in DEFAULT_ROLES {
        let role = match tx.find_role(name).await? {
            Some(role) => role,
            None => {
                report.created_roles.push(name.to_string());
                tx.insert_role(name).await?
            }
        };
        roles.push(role);
    }

    if let Some(password_hash) = password_hash {
        tx.insert_account(NewAccount {
            username: ADMIN_USERNAME.to_string(),
            email: ADMIN_EMAIL.to_string(),
            password_hash,
            enabled: true,
            roles,
        })
        .await?;
        report.admin_created = true;
    }

    tx.commit().await?;

    if !report.created_roles.is_empty() {
        info!(roles = ?report.created_roles, "default roles created");
    }
    if report.admin_created {
        if generated {
            warn!(
                username = ADMIN_USERNAME,
                password = %admin_password,
                "initial admin account created with a generated password, change it after first login"
            );
        } else {
            info!(username = ADMIN_USERNAME, "initial admin account created");
        }
    }

    Ok(report)
}

fn generate_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LEN)
        .map(char::from)
        .collect()
}
