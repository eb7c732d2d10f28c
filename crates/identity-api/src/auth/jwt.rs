//! JWT 토큰 처리.
//!
//! HS256으로 서명된 액세스 토큰을 발급하고 검증합니다.
//! 검증은 토큰과 비밀 키만으로 끝나며 저장소를 조회하지 않습니다.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::Principal;

/// JWT 페이로드.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - 사용자 이름
    pub sub: String,
    /// 역할 이름 (정렬됨)
    #[serde(default)]
    pub roles: Vec<String>,
    /// Issued At (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// 토큰 에러.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("잘못된 토큰 형식")]
    Malformed,
    #[error("토큰 서명이 일치하지 않습니다")]
    BadSignature,
    #[error("토큰이 만료되었습니다")]
    Expired,
    #[error("토큰 인코딩 실패: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
}

/// 토큰 발급/검증기.
///
/// 비밀 키와 유효 기간은 생성 시 고정되며 이후 읽기 전용입니다.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// 새 코덱 생성.
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // 만료는 verify_at에서 직접 확인 (exp <= now 거부, 유예 없음)
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    /// 토큰 유효 기간.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// 현재 시각 기준으로 토큰 발급.
    pub fn issue(&self, subject: &str, roles: &BTreeSet<String>) -> Result<String, TokenError> {
        self.issue_at(subject, roles, Utc::now())
    }

    /// 주어진 시각 기준으로 토큰 발급.
    pub fn issue_at(
        &self,
        subject: &str,
        roles: &BTreeSet<String>,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = Claims {
            sub: subject.to_string(),
            roles: roles.iter().cloned().collect(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding,
        )?)
    }

    /// 현재 시각 기준으로 토큰 검증.
    pub fn verify(&self, token: &str) -> Result<Principal, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// 주어진 시각 기준으로 토큰 검증.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Principal, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::BadSignature
                }
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            }
        })?;

        if data.claims.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(Principal::new(
            data.claims.sub,
            data.claims.roles.into_iter().collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &[u8] = b"test-secret-key-for-jwt-testing-minimum-32-chars";

    fn codec() -> TokenCodec {
        TokenCodec::new(TEST_SECRET, Duration::hours(1))
    }

    fn roles(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_issue_and_verify() {
        let codec = codec();
        let token = codec.issue("alice", &roles(&["USER", "ADMIN"])).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let principal = codec.verify(&token).unwrap();
        assert_eq!(principal.username(), "alice");
        assert_eq!(principal.roles(), &roles(&["ADMIN", "USER"]));
    }

    #[test]
    fn test_empty_roles_round_trip() {
        let codec = codec();
        let token = codec.issue("bob", &BTreeSet::new()).unwrap();
        assert!(codec.verify(&token).unwrap().roles().is_empty());
    }

    #[test]
    fn test_expiry_boundary() {
        let codec = codec();
        let issued = Utc::now();
        let token = codec.issue_at("alice", &roles(&["USER"]), issued).unwrap();

        let just_before = issued + Duration::hours(1) - Duration::seconds(1);
        assert!(codec.verify_at(&token, just_before).is_ok());

        let at_expiry = issued + Duration::hours(1);
        assert!(matches!(
            codec.verify_at(&token, at_expiry),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let codec = codec();
        let token = codec
            .issue_at("alice", &roles(&["USER"]), Utc::now() - Duration::hours(2))
            .unwrap();
        assert!(matches!(codec.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_tampering_any_character_fails() {
        let codec = codec();
        let token = codec.issue("alice", &roles(&["USER"])).unwrap();

        for (i, c) in token.char_indices() {
            if c == '.' {
                continue;
            }
            let replacement = if c == 'A' { 'B' } else { 'A' };
            let mut tampered = token.clone();
            tampered.replace_range(i..i + 1, &replacement.to_string());

            assert!(
                codec.verify(&tampered).is_err(),
                "tampered position {} was accepted",
                i
            );
        }
    }

    #[test]
    fn test_wrong_secret() {
        let token = codec().issue("alice", &roles(&["USER"])).unwrap();
        let other = TokenCodec::new(b"another-secret-key-for-testing-minimum-32", Duration::hours(1));
        assert!(matches!(
            other.verify(&token),
            Err(TokenError::BadSignature)
        ));
    }

    #[test]
    fn test_malformed_token() {
        let codec = codec();
        assert!(matches!(codec.verify("invalid.token.here"), Err(TokenError::Malformed)));
        assert!(matches!(codec.verify(""), Err(TokenError::Malformed)));
    }

    #[test]
    fn test_other_algorithm_rejected() {
        let claims = Claims {
            sub: "alice".to_string(),
            roles: vec!["SUPER_ADMIN".to_string()],
            iat: Utc::now().timestamp(),
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(TEST_SECRET),
        )
        .unwrap();

        assert!(codec().verify(&token).is_err());
    }
}
