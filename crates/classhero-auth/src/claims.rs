//! JWT claim structures for authentication tokens.
//!
//! - [`Claims`]: Access token claims carrying the user's role flags
//! - [`RefreshTokenClaims`]: Refresh token claims for token renewal

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// JWT claims for access tokens.
///
/// Role flags are embedded so authorization needs no database lookup. They
/// are refreshed from the database whenever a new token pair is issued.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// User ID (subject claim)
    pub sub: String,
    /// User's email address
    pub email: String,
    pub is_a_admin: bool,
    pub is_a_teacher: bool,
    pub is_a_student: bool,
    /// Token expiration timestamp (Unix timestamp)
    pub exp: usize,
    /// Token issued-at timestamp (Unix timestamp)
    pub iat: usize,
}

impl Claims {
    /// Admins and teachers.
    pub fn is_staff(&self) -> bool {
        self.is_a_admin || self.is_a_teacher
    }
}

/// Role flags copied into an access token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoleFlags {
    pub is_a_admin: bool,
    pub is_a_teacher: bool,
    pub is_a_student: bool,
}

/// JWT claims for refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenClaims {
    /// User ID (subject claim)
    pub sub: String,
    /// User's email address
    pub email: String,
    /// Always `"refresh"`; keeps refresh tokens from passing as access tokens.
    pub token_type: String,
    pub exp: usize,
    pub iat: usize,
    /// Unique token identifier (JWT ID)
    pub jti: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(is_a_admin: bool, is_a_teacher: bool) -> Claims {
        Claims {
            sub: "user-id-123".to_string(),
            email: "test@example.com".to_string(),
            is_a_admin,
            is_a_teacher,
            is_a_student: false,
            exp: 1234567890,
            iat: 1234567800,
        }
    }

    #[test]
    fn test_claims_serialize() {
        let serialized = serde_json::to_string(&claims(true, false)).unwrap();
        assert!(serialized.contains(r#""sub":"user-id-123""#));
        assert!(serialized.contains(r#""is_a_admin":true"#));
    }

    #[test]
    fn test_claims_deserialize() {
        let json = r#"{"sub":"u","email":"user@test.com","is_a_admin":false,"is_a_teacher":true,"is_a_student":false,"exp":9999999999,"iat":9999999900}"#;
        let claims: Claims = serde_json::from_str(json).unwrap();
        assert_eq!(claims.email, "user@test.com");
        assert!(claims.is_a_teacher);
        assert_eq!(claims.exp, 9999999999);
    }

    #[test]
    fn test_is_staff() {
        assert!(claims(true, false).is_staff());
        assert!(claims(false, true).is_staff());
        assert!(!claims(false, false).is_staff());
    }
}
