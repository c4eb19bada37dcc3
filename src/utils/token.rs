use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use uuid::Uuid;

use crate::middleware::auth::Claims;
use crate::utils::time::minutes_from_now;

/// Length of refresh and password-reset tokens.
pub const OPAQUE_TOKEN_LEN: usize = 48;

pub fn generate_opaque_token(length: usize) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

pub fn issue_access_token(
    user_id: Uuid,
    email: &str,
    role: &str,
    secret: &str,
    expire_minutes: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        role: Some(role.to_string()),
        exp: minutes_from_now(expire_minutes).timestamp() as usize,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn decode_access_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_tokens_are_alphanumeric_and_distinct() {
        let a = generate_opaque_token(OPAQUE_TOKEN_LEN);
        let b = generate_opaque_token(OPAQUE_TOKEN_LEN);
        assert_eq!(a.len(), OPAQUE_TOKEN_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn access_token_round_trip() {
        let id = Uuid::new_v4();
        let token = issue_access_token(id, "t@example.com", "trainer", "secret", 5).unwrap();
        let claims = decode_access_token(&token, "secret").unwrap();
        assert_eq!(claims.user_id(), Some(id));
        assert_eq!(claims.email, "t@example.com");
        assert_eq!(claims.role.as_deref(), Some("trainer"));
    }

    #[test]
    fn wrong_secret_and_expired_tokens_are_rejected() {
        let id = Uuid::new_v4();
        let token = issue_access_token(id, "t@example.com", "student", "secret", 5).unwrap();
        assert!(decode_access_token(&token, "other").is_err());

        // Past the default 60s leeway.
        let expired = issue_access_token(id, "t@example.com", "student", "secret", -5).unwrap();
        assert!(decode_access_token(&expired, "secret").is_err());
    }
}
