// JWT Token Generation Service
// HS256 access/refresh token pair with separate secrets

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uuid::Uuid;

use crate::models::auth::{AccessTokenClaims, RefreshTokenClaims};
use crate::models::staff::Staff;

// Error types for JWT operations
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Token generation failed: {0}")]
    TokenGeneration(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token validation failed: {0}")]
    Validation(String),
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => JwtError::TokenExpired,
            ErrorKind::InvalidToken | ErrorKind::InvalidSignature => JwtError::InvalidToken,
            _ => JwtError::Validation(err.to_string()),
        }
    }
}

// JWT Configuration with separate keys for access and refresh tokens
#[derive(Clone)]
pub struct JwtConfig {
    pub access_token_expiry: u64,
    pub refresh_token_expiry: u64,
    pub algorithm: Algorithm,

    pub audience: String,
    pub issuer: String,

    pub access_encoding_key: EncodingKey,
    pub access_decoding_key: DecodingKey,

    pub refresh_encoding_key: EncodingKey,
    pub refresh_decoding_key: DecodingKey,

    // Key versioning for rotation
    pub key_version: u32,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("access_token_expiry", &self.access_token_expiry)
            .field("refresh_token_expiry", &self.refresh_token_expiry)
            .field("algorithm", &self.algorithm)
            .field("audience", &self.audience)
            .field("issuer", &self.issuer)
            .field("access_encoding_key", &"<redacted>")
            .field("refresh_encoding_key", &"<redacted>")
            .field("key_version", &self.key_version)
            .finish()
    }
}

impl JwtConfig {
    /// Build from the `jwt` section of the application config
    pub fn from_app_config(config: &crate::app_config::JwtConfig) -> Self {
        JwtConfig {
            access_token_expiry: config.access_expiry,
            refresh_token_expiry: config.refresh_expiry,
            algorithm: Algorithm::HS256,
            audience: config.audience.clone(),
            issuer: config.issuer.clone(),
            access_encoding_key: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_decoding_key: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_encoding_key: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            refresh_decoding_key: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            key_version: config.key_version,
        }
    }

    /// Create JWT config for tests without touching the environment
    #[cfg(test)]
    pub fn for_test() -> Self {
        Self::from_app_config(&crate::app_config::JwtConfig {
            access_secret: "test-access-secret-hs256-at-least-32-chars".to_string(),
            refresh_secret: "test-refresh-secret-hs256-at-least-32-chars".to_string(),
            access_expiry: 3600,
            refresh_expiry: 604800,
            audience: "test.academy".to_string(),
            issuer: "test.academy".to_string(),
            key_version: 1,
        })
    }
}

/// Issued access/refresh pair
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
}

pub struct JwtService {
    config: JwtConfig,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        Self { config }
    }

    pub fn access_token_expiry(&self) -> u64 {
        self.config.access_token_expiry
    }

    fn now() -> Result<u64, JwtError> {
        Ok(SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| JwtError::TokenGeneration(e.to_string()))?
            .as_secs())
    }

    fn header(&self) -> Header {
        let mut header = Header::new(self.config.algorithm);
        header.kid = Some(self.config.key_version.to_string());
        header
    }

    /// Generate access token for a staff member
    pub fn generate_access_token(&self, staff: &Staff) -> Result<String, JwtError> {
        let now = Self::now()?;

        let claims = AccessTokenClaims {
            sub: staff.id.to_string(),
            jti: Uuid::new_v4().to_string(),
            email: staff.email.clone(),
            name: staff.full_name.clone(),
            role: staff.role.clone(),
            aud: self.config.audience.clone(),
            iss: self.config.issuer.clone(),
            iat: now,
            exp: now + self.config.access_token_expiry,
        };

        encode(&self.header(), &claims, &self.config.access_encoding_key)
            .map_err(|e| JwtError::TokenGeneration(e.to_string()))
    }

    /// Generate refresh token signed with the refresh secret
    pub fn generate_refresh_token(&self, staff_id: Uuid) -> Result<String, JwtError> {
        let now = Self::now()?;

        let claims = RefreshTokenClaims {
            sub: staff_id.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp: now + self.config.refresh_token_expiry,
        };

        encode(&self.header(), &claims, &self.config.refresh_encoding_key)
            .map_err(|e| JwtError::TokenGeneration(e.to_string()))
    }

    pub fn issue_pair(&self, staff: &Staff) -> Result<TokenPair, JwtError> {
        Ok(TokenPair {
            access_token: self.generate_access_token(staff)?,
            refresh_token: self.generate_refresh_token(staff.id)?,
            expires_in: self.config.access_token_expiry,
        })
    }

    /// Validates an access token and returns the decoded claims
    ///
    /// # Errors
    /// * `JwtError::TokenExpired` - Token has expired (leeway=0)
    /// * `JwtError::InvalidToken` - Malformed token or bad signature
    /// * `JwtError::Validation` - Wrong audience/issuer or other claim failures
    pub fn validate_access_token(&self, token: &str) -> Result<AccessTokenClaims, JwtError> {
        let mut validation = Validation::new(self.config.algorithm);
        validation.set_audience(&[self.config.audience.clone()]);
        validation.set_issuer(&[self.config.issuer.clone()]);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.leeway = 0;

        let token_data =
            decode::<AccessTokenClaims>(token, &self.config.access_decoding_key, &validation)?;

        Ok(token_data.claims)
    }

    /// Validate a refresh token; it carries no audience
    pub fn validate_refresh_token(&self, token: &str) -> Result<RefreshTokenClaims, JwtError> {
        let mut validation = Validation::new(self.config.algorithm);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;

        let token_data =
            decode::<RefreshTokenClaims>(token, &self.config.refresh_decoding_key, &validation)?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn staff(role: &str) -> Staff {
        Staff {
            id: Uuid::new_v4(),
            full_name: "Carla Souza".to_string(),
            email: "carla@academy.test".to_string(),
            password_hash: "$2b$04$hash".to_string(),
            role: role.to_string(),
            is_active: true,
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_token_generation_and_validation() {
        let service = JwtService::new(JwtConfig::for_test());
        let staff = staff("instrutor");

        let token = service.generate_access_token(&staff).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let claims = service.validate_access_token(&token).unwrap();
        assert_eq!(claims.sub, staff.id.to_string());
        assert_eq!(claims.role, "instrutor");
        assert_eq!(claims.name, "Carla Souza");
        assert_eq!(claims.aud, "test.academy");
        assert!(!claims.is_expired());
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_refresh_token_not_accepted_as_access_token() {
        let service = JwtService::new(JwtConfig::for_test());
        let staff = staff("atendente");

        let pair = service.issue_pair(&staff).unwrap();
        assert!(service.validate_access_token(&pair.refresh_token).is_err());
        assert!(service.validate_refresh_token(&pair.access_token).is_err());

        let refresh = service.validate_refresh_token(&pair.refresh_token).unwrap();
        assert_eq!(refresh.sub, staff.id.to_string());
    }

    #[test]
    fn test_tampered_token_rejected() {
        let service = JwtService::new(JwtConfig::for_test());
        let token = service.generate_access_token(&staff("administrador")).unwrap();
        let (unsigned, signature) = token.rsplit_once('.').unwrap();
        let flipped = if signature.starts_with('A') { 'B' } else { 'A' };
        let tampered = format!("{}.{}{}", unsigned, flipped, &signature[1..]);

        assert!(service.validate_access_token(&tampered).is_err());
        assert!(matches!(
            service.validate_access_token("garbage"),
            Err(JwtError::InvalidToken)
        ));
    }

    #[test]
    fn test_token_from_other_issuer_rejected() {
        let service = JwtService::new(JwtConfig::for_test());
        let mut other_config = JwtConfig::for_test();
        other_config.issuer = "someone-else".to_string();
        let other = JwtService::new(other_config);

        let token = other.generate_access_token(&staff("administrador")).unwrap();
        assert!(service.validate_access_token(&token).is_err());
    }
}
