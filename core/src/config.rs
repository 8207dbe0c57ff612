//! Base URL configuration.

use log::debug;

/// Environment variable holding the backend base URL.
pub const BASE_URL_ENV: &str = "FIELDOPS_API_URL";

/// Used when `FIELDOPS_API_URL` is unset or blank.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
}

impl ApiConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
        }
    }

    /// Read the base URL from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the base URL through `lookup`, falling back to
    /// [`DEFAULT_BASE_URL`].
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(BASE_URL_ENV) {
            Some(url) if !url.trim().is_empty() => {
                debug!("using API base URL {url} from {BASE_URL_ENV}");
                Self::new(url.trim())
            }
            _ => {
                debug!("{BASE_URL_ENV} not set, using {DEFAULT_BASE_URL}");
                Self::new(DEFAULT_BASE_URL)
            }
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_configured_url() {
        let config = ApiConfig::from_lookup(|key| {
            assert_eq!(key, BASE_URL_ENV);
            Some("https://api.example.com".to_string())
        });
        assert_eq!(config.base_url, "https://api.example.com");
    }

    #[test]
    fn falls_back_when_unset() {
        let config = ApiConfig::from_lookup(|_| None);
        assert_eq!(config.base_url, "http://localhost:5000");
    }

    #[test]
    fn falls_back_when_blank() {
        let config = ApiConfig::from_lookup(|_| Some("  ".to_string()));
        assert_eq!(config, ApiConfig::default());
    }
}
