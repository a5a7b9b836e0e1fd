use std::env;

/// One-time access code settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OtpConfig {
    /// Seconds a code stays valid after it is sent.
    pub ttl_seconds: i64,
    /// Wrong guesses allowed before the code is discarded.
    pub max_attempts: i32,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 600,
            max_attempts: 5,
        }
    }
}

impl OtpConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ttl_seconds: env::var("OTP_TTL_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|v: &i64| *v > 0)
                .unwrap_or(defaults.ttl_seconds),
            max_attempts: env::var("OTP_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|v: &i32| *v > 0)
                .unwrap_or(defaults.max_attempts),
        }
    }
}
