//! REST server configuration.

use api_shared::ApiTokens;

/// Default bind address when `RENTDESK_REST_ADDR` is unset.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";

/// Settings for the HTTP listener, resolved once at startup.
#[derive(Clone, Debug)]
pub struct RestConfig {
    pub addr: String,
    pub tokens: ApiTokens,
}

impl RestConfig {
    /// Read `RENTDESK_REST_ADDR` and `RENTDESK_API_TOKENS`.
    pub fn from_env() -> Self {
        Self::from_env_values(
            std::env::var("RENTDESK_REST_ADDR").ok(),
            std::env::var("RENTDESK_API_TOKENS").ok(),
        )
    }

    pub fn from_env_values(addr: Option<String>, tokens: Option<String>) -> Self {
        Self {
            addr: addr
                .map(|a| a.trim().to_owned())
                .filter(|a| !a.is_empty())
                .unwrap_or_else(|| DEFAULT_REST_ADDR.into()),
            tokens: ApiTokens::from_env_value(tokens.as_deref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let cfg = RestConfig::from_env_values(Some("  ".into()), None);
        assert_eq!(cfg.addr, DEFAULT_REST_ADDR);
        assert!(!cfg.tokens.is_enabled());

        let cfg = RestConfig::from_env_values(Some("127.0.0.1:8080".into()), Some("s3cret".into()));
        assert_eq!(cfg.addr, "127.0.0.1:8080");
        assert!(cfg.tokens.is_enabled());
    }
}
