//! Static bearer-token authentication.
//!
//! Tokens are configured once at startup (`RENTDESK_API_TOKENS`, comma separated). Nothing in
//! Rentdesk issues tokens; a request is accepted when its `Authorization: Bearer <token>`
//! header names one of the configured values.

/// Why a request failed authentication.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    Missing,
    #[error("invalid bearer token")]
    Invalid,
}

/// The set of accepted API tokens. An empty set disables authentication.
#[derive(Clone, Default)]
pub struct ApiTokens {
    tokens: Vec<String>,
}

impl std::fmt::Debug for ApiTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiTokens")
            .field("count", &self.tokens.len())
            .finish()
    }
}

impl ApiTokens {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tokens: Vec<String> = tokens
            .into_iter()
            .map(Into::into)
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty())
            .collect();
        tokens.dedup();
        Self { tokens }
    }

    /// Parse a comma-separated list, e.g. the value of `RENTDESK_API_TOKENS`.
    pub fn from_env_value(value: Option<&str>) -> Self {
        Self::new(value.unwrap_or_default().split(','))
    }

    pub fn is_enabled(&self) -> bool {
        !self.tokens.is_empty()
    }

    /// Check an `Authorization` header value.
    pub fn check_header(&self, header: Option<&str>) -> Result<(), AuthError> {
        if !self.is_enabled() {
            return Ok(());
        }
        let header = header.ok_or(AuthError::Missing)?;
        let token = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::Missing)?;

        if self.tokens.iter().any(|known| constant_time_eq(known, token)) {
            Ok(())
        } else {
            Err(AuthError::Invalid)
        }
    }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_configuration_disables_auth() {
        let tokens = ApiTokens::from_env_value(Some(" , "));
        assert!(!tokens.is_enabled());
        assert_eq!(tokens.check_header(None), Ok(()));
    }

    #[test]
    fn accepts_only_configured_tokens() {
        let tokens = ApiTokens::from_env_value(Some("alpha, beta"));
        assert_eq!(tokens.check_header(Some("Bearer beta")), Ok(()));
        assert_eq!(tokens.check_header(Some("Bearer gamma")), Err(AuthError::Invalid));
        assert_eq!(tokens.check_header(Some("Basic YWxwaGE=")), Err(AuthError::Missing));
        assert_eq!(tokens.check_header(None), Err(AuthError::Missing));
    }
}
