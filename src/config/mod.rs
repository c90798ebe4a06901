//! Configuration module for the course catalog backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Locale whose courses sort first when a search names no locale
    pub default_locale: String,
    /// Locales a search may return when the caller supplies none
    pub allowed_locales: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let db_path = env::var("CATALOG_DB_PATH")
            .unwrap_or_else(|_| "./data/catalog.sqlite".to_string())
            .into();

        let bind_addr = env::var("CATALOG_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .expect("Invalid CATALOG_BIND_ADDR format");

        let log_level = env::var("CATALOG_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let default_locale =
            env::var("CATALOG_DEFAULT_LOCALE").unwrap_or_else(|_| "en".to_string());

        let allowed_locales = parse_locale_list(
            &env::var("CATALOG_ALLOWED_LOCALES").unwrap_or_else(|_| "en,fr,es,de".to_string()),
        );

        Self {
            db_path,
            bind_addr,
            log_level,
            default_locale,
            allowed_locales,
        }
    }
}

/// Split a comma separated locale list, dropping blanks.
pub fn parse_locale_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // Clear any existing env vars
        env::remove_var("CATALOG_DB_PATH");
        env::remove_var("CATALOG_BIND_ADDR");
        env::remove_var("CATALOG_LOG_LEVEL");
        env::remove_var("CATALOG_DEFAULT_LOCALE");
        env::remove_var("CATALOG_ALLOWED_LOCALES");

        let config = Config::from_env();

        assert_eq!(config.db_path, PathBuf::from("./data/catalog.sqlite"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.default_locale, "en");
        assert_eq!(config.allowed_locales, vec!["en", "fr", "es", "de"]);
    }

    #[test]
    fn test_parse_locale_list() {
        assert_eq!(parse_locale_list(" en, fr ,,es "), vec!["en", "fr", "es"]);
        assert!(parse_locale_list("").is_empty());
    }
}
