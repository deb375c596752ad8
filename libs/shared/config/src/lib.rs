use std::env;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Supabase,
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub storage_backend: StorageBackend,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub store_timeout_seconds: u64,
    pub access_token_secret: String,
    pub access_token_ttl_hours: i64,
    pub notify_webhook_url: Option<String>,
    pub notify_from_address: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            storage_backend: StorageBackend::Memory,
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            store_timeout_seconds: 10,
            access_token_secret: String::new(),
            access_token_ttl_hours: 1,
            notify_webhook_url: None,
            notify_from_address: "no-reply@clinic.local".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let supabase_url = env::var("SUPABASE_URL").unwrap_or_else(|_| {
            warn!("SUPABASE_URL not set, using empty value");
            String::new()
        });

        let storage_backend = match env::var("STORAGE_BACKEND").ok().as_deref() {
            Some("supabase") => StorageBackend::Supabase,
            Some("memory") => StorageBackend::Memory,
            Some(other) => {
                warn!("Unknown STORAGE_BACKEND '{}', choosing from SUPABASE_URL", other);
                Self::backend_for_url(&supabase_url)
            }
            None => Self::backend_for_url(&supabase_url),
        };

        let config = Self {
            port: parse_or("PORT", defaults.port),
            storage_backend,
            supabase_url,
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            store_timeout_seconds: parse_or("STORE_TIMEOUT_SECONDS", defaults.store_timeout_seconds),
            access_token_secret: env::var("ACCESS_TOKEN_SECRET")
                .unwrap_or_else(|_| {
                    warn!("ACCESS_TOKEN_SECRET not set, bearer tokens cannot be verified");
                    String::new()
                }),
            access_token_ttl_hours: parse_or("ACCESS_TOKEN_TTL_HOURS", defaults.access_token_ttl_hours),
            notify_webhook_url: env::var("NOTIFY_WEBHOOK_URL").ok().filter(|url| !url.is_empty()),
            notify_from_address: env::var("NOTIFY_FROM_ADDRESS")
                .unwrap_or(defaults.notify_from_address),
        };

        if config.storage_backend == StorageBackend::Supabase && !config.is_configured() {
            warn!("Supabase backend selected but not fully configured - missing environment variables");
        }

        config
    }

    fn backend_for_url(supabase_url: &str) -> StorageBackend {
        if supabase_url.is_empty() {
            StorageBackend::Memory
        } else {
            StorageBackend::Supabase
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_seconds)
    }
}

fn parse_or<T: std::str::FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.storage_backend, StorageBackend::Memory);
        assert_eq!(config.access_token_ttl_hours, 1);
        assert_eq!(config.store_timeout(), Duration::from_secs(10));
        assert!(!config.is_configured());
    }

    #[test]
    fn test_backend_follows_supabase_url() {
        assert_eq!(AppConfig::backend_for_url(""), StorageBackend::Memory);
        assert_eq!(
            AppConfig::backend_for_url("https://example.supabase.co"),
            StorageBackend::Supabase
        );
    }
}
