//! 도메인 모델.
//!
//! 계정, 역할, 페이지 조회 타입을 정의합니다.

mod account;
mod page;
mod role;

pub use account::{Account, NewAccount};
pub use page::{Page, PageRequest};
pub use role::{Role, ADMIN, DEFAULT_ROLES, SUPER_ADMIN, USER};
