use crate::error::{AppError, AppResult};
use crate::models::UserRole;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id
    pub email: String,
    pub role: UserRole,
    pub exp: i64,
    pub iat: i64,
    pub token_type: String, // "access" or "refresh"
}

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expires_in: i64,
    refresh_token_expires_in: i64,
}

impl JwtService {
    pub fn new(secret: &str, access_expires_in: i64, refresh_expires_in: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_expires_in: access_expires_in,
            refresh_token_expires_in: refresh_expires_in,
        }
    }

    fn generate_token(
        &self,
        user_id: &str,
        email: &str,
        role: UserRole,
        token_type: &str,
        expires_in: i64,
    ) -> AppResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(expires_in);

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role,
            exp: exp.timestamp(),
            iat: now.timestamp(),
            token_type: token_type.to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(AppError::JwtError)
    }

    pub fn generate_access_token(
        &self,
        user_id: &str,
        email: &str,
        role: UserRole,
    ) -> AppResult<String> {
        self.generate_token(user_id, email, role, "access", self.access_token_expires_in)
    }

    pub fn generate_refresh_token(
        &self,
        user_id: &str,
        email: &str,
        role: UserRole,
    ) -> AppResult<String> {
        self.generate_token(
            user_id,
            email,
            role,
            "refresh",
            self.refresh_token_expires_in,
        )
    }

    pub fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(AppError::JwtError)
    }

    pub fn verify_access_token(&self, token: &str) -> AppResult<Claims> {
        let claims = self.verify_token(token)?;

        if claims.token_type != "access" {
            return Err(AppError::AuthError("Invalid access token type".to_string()));
        }

        Ok(claims)
    }

    pub fn verify_refresh_token(&self, token: &str) -> AppResult<Claims> {
        let claims = self.verify_token(token)?;

        if claims.token_type != "refresh" {
            return Err(AppError::AuthError(
                "Invalid refresh token type".to_string(),
            ));
        }

        Ok(claims)
    }

    pub fn get_access_token_expires_in(&self) -> i64 {
        self.access_token_expires_in
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::new("test-secret", 3600, 86400)
    }

    #[test]
    fn test_access_token_roundtrip() {
        let jwt = service();
        let token = jwt
            .generate_access_token("user_1", "alice@example.com", UserRole::User)
            .unwrap();

        let claims = jwt.verify_access_token(&token).unwrap();
        assert_eq!(claims.sub, "user_1");
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.role, UserRole::User);
        assert_eq!(claims.token_type, "access");
    }

    #[test]
    fn test_refresh_token_rejected_as_access() {
        let jwt = service();
        let token = jwt
            .generate_refresh_token("admin", "admin@example.com", UserRole::Admin)
            .unwrap();

        assert!(jwt.verify_refresh_token(&token).is_ok());
        assert!(jwt.verify_access_token(&token).is_err());
    }

    #[test]
    fn test_tampered_token_rejected() {
        let jwt = service();
        let other = JwtService::new("another-secret", 3600, 86400);
        let token = other
            .generate_access_token("user_1", "alice@example.com", UserRole::User)
            .unwrap();

        assert!(jwt.verify_access_token(&token).is_err());
    }
}
