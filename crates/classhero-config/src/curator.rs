use std::env;

/// Location of the content curator service that generates quizzes from PDFs.
#[derive(Clone, Debug)]
pub struct CuratorConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl CuratorConfig {
    pub fn from_env() -> Self {
        Self {
            base_url: env::var("CURATOR_URL")
                .unwrap_or_else(|_| "http://curator:8000".to_string())
                .trim_end_matches('/')
                .to_string(),
            timeout_seconds: env::var("CURATOR_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(120),
        }
    }
}
