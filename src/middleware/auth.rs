// Identity of the staff member behind a validated access token

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::models::auth::AccessTokenClaims;
use crate::models::staff::StaffRole;
use crate::utils::ApiError;

/// Authenticated staff information extracted from the JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub staff_id: Uuid,
    pub token_id: String,
    pub email: String,
    pub name: String,
    pub role: StaffRole,
    pub exp: u64,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == StaffRole::Administrador
    }
}

impl TryFrom<AccessTokenClaims> for AuthenticatedUser {
    type Error = ApiError;

    fn try_from(claims: AccessTokenClaims) -> Result<Self, Self::Error> {
        let staff_id = Uuid::parse_str(&claims.sub).map_err(|_| ApiError::InvalidToken)?;
        let role = StaffRole::from_str(&claims.role).map_err(|_| ApiError::InvalidToken)?;
        Ok(Self {
            staff_id,
            token_id: claims.jti,
            email: claims.email,
            name: claims.name,
            role,
            exp: claims.exp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(sub: &str, role: &str) -> AccessTokenClaims {
        AccessTokenClaims {
            sub: sub.to_string(),
            jti: "jti".into(),
            email: "ana@academia.com".into(),
            name: "Ana".into(),
            role: role.to_string(),
            aud: "aud".into(),
            iss: "iss".into(),
            iat: 0,
            exp: 0,
        }
    }

    #[test]
    fn test_claims_to_user() {
        let id = Uuid::new_v4();
        let user = AuthenticatedUser::try_from(claims(&id.to_string(), "instrutor")).unwrap();
        assert_eq!(user.staff_id, id);
        assert_eq!(user.role, StaffRole::Instrutor);
        assert!(!user.is_admin());
    }

    #[test]
    fn test_unknown_role_rejected() {
        let id = Uuid::new_v4().to_string();
        assert!(matches!(
            AuthenticatedUser::try_from(claims(&id, "aluno")),
            Err(ApiError::InvalidToken)
        ));
        assert!(AuthenticatedUser::try_from(claims("not-a-uuid", "atendente")).is_err());
    }
}
