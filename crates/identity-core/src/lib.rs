//! # Identity Core
//!
//! 신원(Identity) 서비스의 핵심 도메인 모델과 서비스를 제공합니다.
//!
//! 이 크레이트는 API 계층과 저장소 구현 사이에서 공유되는 기본 요소를 담습니다:
//! - 계정/역할 도메인 타입
//! - 저장소 계약 (`CredentialStore`) 및 인메모리/PostgreSQL 구현
//! - 비밀번호 해싱
//! - 계정 관리 및 역할 부여/회수 서비스
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod password;
pub mod service;
pub mod store;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use password::{Argon2Hasher, PasswordError, PasswordHasher};
pub use service::{AccountRequest, AccountService, RoleAssignmentService};
pub use store::{CredentialStore, MemoryStore, StoreError, StoreResult, StoreTransaction};

#[cfg(feature = "postgres")]
pub use store::PgStore;
