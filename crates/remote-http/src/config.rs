use std::time::Duration;

/// Configuration for the HTTP backend.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Organization base URL (e.g. `https://dev.azure.com/acme`).
    pub org_url: String,
    /// Personal access token presented as basic-auth password.
    pub token: String,
    /// Bounded retry count for transient failures.
    pub max_retries: u32,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl HttpClientConfig {
    pub fn new(org_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            org_url: org_url.into(),
            token: token.into(),
            max_retries: 3,
            timeout: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = HttpClientConfig::new("https://dev.azure.com/acme", "secret");
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }
}
