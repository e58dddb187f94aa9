use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host (default: 127.0.0.1)
    pub server_host: String,

    /// Server port (default: 3000)
    pub server_port: u16,

    /// Environment: development, production, test
    pub environment: String,

    /// Mount prefix of the resolver endpoint (default: /api)
    pub api_prefix: String,

    /// Root of the resolver source tree walked at startup (default: src/resolvers)
    pub resolvers_dir: String,

    /// Per-invocation timeout in milliseconds. Unset means no timeout.
    pub resolver_timeout_ms: Option<u64>,

    /// Answer unknown resolver names with 404 instead of 500.
    pub unknown_resolver_not_found: bool,
}

impl Config {
    /// Load configuration from environment variables (with .env support).
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        // Load .env file if present (ignore errors if missing)
        let _ = dotenvy::dotenv();

        Ok(Self::from_lookup(|key| std::env::var(key).ok()))
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Config {
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            server_port: lookup("SERVER_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            api_prefix: lookup("API_PREFIX").unwrap_or_else(|| "/api".to_string()),
            resolvers_dir: lookup("RESOLVERS_DIR").unwrap_or_else(|| "src/resolvers".to_string()),
            resolver_timeout_ms: lookup("RESOLVER_TIMEOUT_MS").and_then(|v| v.parse().ok()),
            unknown_resolver_not_found: lookup("UNKNOWN_RESOLVER_NOT_FOUND")
                .is_some_and(|v| is_truthy(&v)),
        }
    }

    /// Check if running in development mode.
    pub fn is_dev(&self) -> bool {
        self.environment == "development"
    }

    /// Get the full server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn resolver_timeout(&self) -> Option<Duration> {
        self.resolver_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::default();

        assert_eq!(config.server_host, "127.0.0.1");
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.environment, "development");
        assert_eq!(config.api_prefix, "/api");
        assert_eq!(config.resolvers_dir, "src/resolvers");
        assert!(config.resolver_timeout().is_none());
        assert!(!config.unknown_resolver_not_found);
        assert!(config.is_dev());
        assert_eq!(config.server_addr(), "127.0.0.1:3000");
    }

    #[test]
    fn test_config_from_vars() {
        let config = config_from(&[
            ("SERVER_HOST", "0.0.0.0"),
            ("SERVER_PORT", "8080"),
            ("ENVIRONMENT", "production"),
            ("API_PREFIX", "/rpc"),
            ("RESOLVERS_DIR", "app/resolvers"),
            ("RESOLVER_TIMEOUT_MS", "2500"),
            ("UNKNOWN_RESOLVER_NOT_FOUND", "yes"),
        ]);

        assert_eq!(config.server_addr(), "0.0.0.0:8080");
        assert!(!config.is_dev());
        assert_eq!(config.api_prefix, "/rpc");
        assert_eq!(config.resolvers_dir, "app/resolvers");
        assert_eq!(config.resolver_timeout(), Some(Duration::from_millis(2500)));
        assert!(config.unknown_resolver_not_found);
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let config = config_from(&[("SERVER_PORT", "not-a-port"), ("RESOLVER_TIMEOUT_MS", "soon")]);
        assert_eq!(config.server_port, 3000);
        assert!(config.resolver_timeout_ms.is_none());
    }

    #[test]
    fn test_truthy_variations() {
        let cases = [
            ("true", true),
            ("True", true),
            ("TRUE", true),
            ("1", true),
            ("yes", true),
            ("YES", true),
            ("false", false),
            ("0", false),
            ("no", false),
            ("", false),
        ];

        for (value, expected) in cases {
            let config = config_from(&[("UNKNOWN_RESOLVER_NOT_FOUND", value)]);
            assert_eq!(
                config.unknown_resolver_not_found, expected,
                "UNKNOWN_RESOLVER_NOT_FOUND={value:?}"
            );
        }
    }
}
