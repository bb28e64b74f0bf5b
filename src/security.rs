use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::Role,
};

/// Identity claims embedded in every access token. All three identity
/// fields are required; a token missing any of them fails verification.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// Username, OAuth2 "sub" convention.
    pub sub: String,
    pub user_id: Uuid,
    pub role: Role,
    pub exp: usize,
}

pub fn hash_password(plain: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

/// A malformed stored hash verifies as false instead of erroring into the
/// login path.
pub fn verify_password(plain: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok()
}

pub fn issue_token(config: &AuthConfig, username: &str, user_id: Uuid, role: Role) -> AppResult<String> {
    let expiry = Utc::now() + Duration::minutes(config.token_expiry_minutes);
    let claims = Claims {
        sub: username.to_string(),
        user_id,
        role,
        exp: expiry.timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

/// Pure verification: signature, expiry and claim presence. Any failure
/// collapses into `InvalidCredentials`.
pub fn decode_token(config: &AuthConfig, token: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::InvalidCredentials)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AuthConfig {
        AuthConfig {
            secret: "test-secret".into(),
            token_expiry_minutes: 30,
        }
    }

    #[test]
    fn password_roundtrip() {
        let hash = hash_password("hunter2").unwrap();
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
    }

    #[test]
    fn malformed_hash_verifies_false() {
        assert!(!verify_password("hunter2", "not-a-phc-string"));
        assert!(!verify_password("hunter2", ""));
    }

    #[test]
    fn token_roundtrip_preserves_claims() {
        let config = test_config();
        let user_id = Uuid::new_v4();
        let token = issue_token(&config, "alice", user_id, Role::Admin).unwrap();
        let claims = decode_token(&config, &token).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.role, Role::Admin);
    }

    #[test]
    fn expired_token_is_rejected() {
        // Past expiry beyond the default 60s leeway.
        let config = AuthConfig {
            secret: "test-secret".into(),
            token_expiry_minutes: -5,
        };
        let token = issue_token(&config, "alice", Uuid::new_v4(), Role::User).unwrap();
        let err = decode_token(&config, &token).unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let config = test_config();
        let token = issue_token(&config, "alice", Uuid::new_v4(), Role::User).unwrap();
        let other = AuthConfig {
            secret: "other-secret".into(),
            token_expiry_minutes: 30,
        };
        let err = decode_token(&other, &token).unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[test]
    fn token_missing_identity_claim_is_rejected() {
        #[derive(Serialize)]
        struct PartialClaims {
            sub: String,
            exp: usize,
        }
        let config = test_config();
        let partial = PartialClaims {
            sub: "alice".into(),
            exp: (Utc::now() + Duration::minutes(30)).timestamp() as usize,
        };
        let token = encode(
            &Header::default(),
            &partial,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap();
        let err = decode_token(&config, &token).unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[test]
    fn garbage_token_is_rejected() {
        let err = decode_token(&test_config(), "definitely.not.ajwt").unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }
}
