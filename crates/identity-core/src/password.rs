//! 비밀번호 해싱 유틸리티.
//!
//! Argon2 기반 비밀번호 해싱 및 검증.

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};

/// 비밀번호 처리 에러.
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("비밀번호 해싱 실패")]
    HashingFailed,
    #[error("잘못된 해시 파라미터")]
    InvalidParams,
}

/// 단방향 비밀번호 해셔.
///
/// `hash`는 호출마다 다른 솔트를 사용하므로 같은 입력이라도 결과가 다릅니다.
/// `verify`는 형식이 잘못된 해시를 검증 실패로 취급하며 패닉하지 않습니다.
pub trait PasswordHasher: Send + Sync {
    /// 평문 비밀번호를 해싱합니다.
    fn hash(&self, plaintext: &str) -> Result<String, PasswordError>;

    /// 평문 비밀번호가 해시와 일치하는지 확인합니다.
    fn verify(&self, plaintext: &str, digest: &str) -> bool;
}

/// Argon2id 해셔.
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl Argon2Hasher {
    /// 비용 파라미터를 지정하여 생성.
    ///
    /// # Arguments
    ///
    /// * `memory_kib` - 메모리 비용 (KiB)
    /// * `iterations` - 반복 횟수
    /// * `parallelism` - 병렬도
    pub fn with_cost(
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
    ) -> Result<Self, PasswordError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|_| PasswordError::InvalidParams)?;
        Ok(Self { params })
    }

    /// 테스트용 저비용 해셔.
    pub fn low_cost() -> Self {
        Self::with_cost(Params::MIN_M_COST.max(64), 1, 1).unwrap_or_default()
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|_| PasswordError::HashingFailed)?;

        Ok(hash.to_string())
    }

    fn verify(&self, plaintext: &str, digest: &str) -> bool {
        // 검증에는 해시 문자열에 기록된 파라미터가 사용됩니다
        let Ok(parsed) = PasswordHash::new(digest) else {
            return false;
        };

        Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }
}
