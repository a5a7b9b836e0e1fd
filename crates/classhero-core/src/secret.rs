//! Hashing of short-lived secrets (one-time access codes).

use bcrypt::{hash, verify};

use crate::errors::AppError;

/// bcrypt cost for one-time codes.
pub const CODE_HASH_COST: u32 = 8;

pub fn hash_code(code: &str) -> Result<String, AppError> {
    hash(code, CODE_HASH_COST)
        .map_err(|e| AppError::internal_error(format!("Failed to hash code: {}", e)))
}

pub fn verify_code(code: &str, hashed: &str) -> Result<bool, AppError> {
    verify(code, hashed)
        .map_err(|e| AppError::internal_error(format!("Failed to verify code: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hashed = hash_code("123456").unwrap();
        assert_ne!(hashed, "123456");
        assert!(verify_code("123456", &hashed).unwrap());
        assert!(!verify_code("654321", &hashed).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_code("123456").unwrap();
        let b = hash_code("123456").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_with_malformed_hash_errors() {
        assert!(verify_code("123456", "not-a-bcrypt-hash").is_err());
    }
}
