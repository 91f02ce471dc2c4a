//! Application configuration loaded from environment variables.

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `DATABASE_URL`: Postgres connection string; unset runs on the in-memory store
/// - `STRIPE_KEY`: Stripe secret key; unset runs on the in-memory gateway
/// - `STRIPE_API_BASE`: Stripe API base URL (default: `"https://api.stripe.com"`)
/// - `SITE_URL`: storefront base URL for checkout redirects (default: `"http://localhost:5173"`)
/// - `CURRENCY`: default checkout currency (default: `"usd"`)
#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub stripe_key: Option<String>,
    pub stripe_api_base: String,
    pub site_url: String,
    pub currency: String,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            host: non_empty("HOST").unwrap_or(defaults.host),
            port: non_empty("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: non_empty("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: non_empty("DATABASE_URL"),
            stripe_key: non_empty("STRIPE_KEY"),
            stripe_api_base: non_empty("STRIPE_API_BASE").unwrap_or(defaults.stripe_api_base),
            site_url: non_empty("SITE_URL").unwrap_or(defaults.site_url),
            currency: non_empty("CURRENCY").unwrap_or(defaults.currency),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            stripe_key: None,
            stripe_api_base: "https://api.stripe.com".to_string(),
            site_url: "http://localhost:5173".to_string(),
            currency: "usd".to_string(),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("log_level", &self.log_level)
            .field("database_url", &self.database_url.as_ref().map(|_| "<set>"))
            .field("stripe_key", &self.stripe_key.as_ref().map(|_| "<set>"))
            .field("stripe_api_base", &self.stripe_api_base)
            .field("site_url", &self.site_url)
            .field("currency", &self.currency)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_map(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.database_url, None);
        assert_eq!(config.stripe_key, None);
        assert_eq!(config.site_url, "http://localhost:5173");
        assert_eq!(config.currency, "usd");
    }

    #[test]
    fn test_values_from_environment() {
        let config = from_map(&[
            ("PORT", "8080"),
            ("DATABASE_URL", "postgres://localhost/bookstore"),
            ("STRIPE_KEY", "sk_test_123"),
            ("SITE_URL", "https://books.example.com"),
        ]);
        assert_eq!(config.port, 8080);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/bookstore")
        );
        assert_eq!(config.stripe_key.as_deref(), Some("sk_test_123"));
        assert_eq!(config.site_url, "https://books.example.com");
        assert_eq!(config.host, "0.0.0.0");
    }

    #[test]
    fn test_blank_and_invalid_values_fall_back() {
        let config = from_map(&[("PORT", "not-a-port"), ("STRIPE_KEY", "  ")]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.stripe_key, None);
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_debug_hides_secrets() {
        let config = from_map(&[("STRIPE_KEY", "sk_live_secret")]);
        assert!(!format!("{config:?}").contains("sk_live_secret"));
    }
}
