//! Runtime configuration
//!
//! Every option is a long flag backed by an environment variable. Secrets are
//! hidden from `--help` and redacted from `Debug`.

use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use std::fmt;

/// Which user store the service talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreBackend {
    /// Supabase project (PostgREST over HTTPS)
    Supabase,
    /// Local SQLite file
    Sqlite,
}

#[derive(Parser, Clone)]
#[command(name = "credgate")]
#[command(version, about = "Credential service - registration, login and JWT-gated routes")]
pub struct Config {
    /// Interface to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// HMAC secret for signing tokens
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// User store backend
    #[arg(long, env = "STORE_BACKEND", value_enum, default_value_t = StoreBackend::Supabase)]
    pub store_backend: StoreBackend,

    /// Supabase project URL (falls back to NEXT_PUBLIC_SUPABASE_URL)
    #[arg(long, env = "SUPABASE_URL")]
    pub supabase_url: Option<String>,

    /// Supabase anon key (falls back to NEXT_PUBLIC_SUPABASE_ANON_KEY)
    #[arg(long, env = "SUPABASE_ANON_KEY", hide_env_values = true)]
    pub supabase_anon_key: Option<String>,

    /// SQLite database file for the sqlite backend
    #[arg(long, env = "SQLITE_PATH", default_value = "credgate_users.db")]
    pub sqlite_path: String,

    /// Email of the admin account ensured at startup
    #[arg(long, env = "ADMIN_EMAIL")]
    pub admin_email: Option<String>,

    /// Password for the admin account ensured at startup
    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .field("store_backend", &self.store_backend)
            .field("supabase_url", &self.supabase_url)
            .field(
                "supabase_anon_key",
                &self.supabase_anon_key.as_ref().map(|_| "<redacted>"),
            )
            .field("sqlite_path", &self.sqlite_path)
            .field("admin_email", &self.admin_email)
            .field(
                "admin_password",
                &self.admin_password.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Resolved Supabase connection settings
#[derive(Clone)]
pub struct SupabaseSettings {
    pub url: String,
    pub anon_key: String,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Signing secret; startup stops here when it is missing or blank
    pub fn jwt_secret(&self) -> Result<&str> {
        match self.jwt_secret.as_deref() {
            Some(secret) if !secret.trim().is_empty() => Ok(secret),
            _ => bail!("JWT_SECRET must be set to a non-empty value"),
        }
    }

    /// Supabase URL and key, including the `NEXT_PUBLIC_` fallbacks
    pub fn supabase_settings(&self) -> Result<SupabaseSettings> {
        let url = non_blank(self.supabase_url.clone())
            .or_else(|| non_blank(std::env::var("NEXT_PUBLIC_SUPABASE_URL").ok()));
        let anon_key = non_blank(self.supabase_anon_key.clone())
            .or_else(|| non_blank(std::env::var("NEXT_PUBLIC_SUPABASE_ANON_KEY").ok()));

        match (url, anon_key) {
            (Some(url), Some(anon_key)) => Ok(SupabaseSettings { url, anon_key }),
            (None, _) => bail!("SUPABASE_URL (or NEXT_PUBLIC_SUPABASE_URL) must be set"),
            (_, None) => {
                bail!("SUPABASE_ANON_KEY (or NEXT_PUBLIC_SUPABASE_ANON_KEY) must be set")
            }
        }
    }

    /// Admin bootstrap credentials, only when both halves are present
    pub fn admin_credentials(&self) -> Option<(&str, &str)> {
        match (self.admin_email.as_deref(), self.admin_password.as_deref()) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                Some((email, password))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENV_KEYS: [&str; 11] = [
        "HOST",
        "PORT",
        "JWT_SECRET",
        "STORE_BACKEND",
        "SUPABASE_URL",
        "SUPABASE_ANON_KEY",
        "NEXT_PUBLIC_SUPABASE_URL",
        "NEXT_PUBLIC_SUPABASE_ANON_KEY",
        "SQLITE_PATH",
        "ADMIN_EMAIL",
        "ADMIN_PASSWORD",
    ];

    /// Run `f` with every config variable unset except the ones given
    fn with_env<F: FnOnce()>(set: &[(&str, &str)], f: F) {
        let vars: Vec<(&str, Option<&str>)> = ENV_KEYS
            .iter()
            .map(|key| {
                let value = set.iter().find(|(k, _)| k == key).map(|(_, v)| *v);
                (*key, value)
            })
            .collect();
        temp_env::with_vars(vars, f);
    }

    #[test]
    fn test_defaults() {
        with_env(&[], || {
            let config = Config::try_parse_from(["credgate"]).unwrap();
            assert_eq!(config.bind_addr(), "0.0.0.0:3000");
            assert_eq!(config.store_backend, StoreBackend::Supabase);
            assert_eq!(config.sqlite_path, "credgate_users.db");
            assert!(config.jwt_secret().is_err());
            assert!(config.admin_credentials().is_none());
        });
    }

    #[test]
    fn test_env_overrides() {
        with_env(
            &[
                ("HOST", "127.0.0.1"),
                ("PORT", "8080"),
                ("JWT_SECRET", "s3cret"),
                ("STORE_BACKEND", "sqlite"),
                ("SQLITE_PATH", "/tmp/users.db"),
            ],
            || {
                let config = Config::try_parse_from(["credgate"]).unwrap();
                assert_eq!(config.bind_addr(), "127.0.0.1:8080");
                assert_eq!(config.jwt_secret().unwrap(), "s3cret");
                assert_eq!(config.store_backend, StoreBackend::Sqlite);
                assert_eq!(config.sqlite_path, "/tmp/users.db");
            },
        );
    }

    #[test]
    fn test_flags_beat_env() {
        with_env(&[("PORT", "8080")], || {
            let config = Config::try_parse_from(["credgate", "--port", "9000"]).unwrap();
            assert_eq!(config.port, 9000);
        });
    }

    #[test]
    fn test_blank_secret_rejected() {
        with_env(&[("JWT_SECRET", "   ")], || {
            let config = Config::try_parse_from(["credgate"]).unwrap();
            assert!(config.jwt_secret().is_err());
        });
    }

    #[test]
    fn test_unknown_backend_rejected() {
        with_env(&[("STORE_BACKEND", "postgres")], || {
            assert!(Config::try_parse_from(["credgate"]).is_err());
        });
    }

    #[test]
    fn test_supabase_settings_fallback() {
        with_env(
            &[
                ("NEXT_PUBLIC_SUPABASE_URL", "https://proj.supabase.co"),
                ("NEXT_PUBLIC_SUPABASE_ANON_KEY", "public-anon"),
            ],
            || {
                let config = Config::try_parse_from(["credgate"]).unwrap();
                let settings = config.supabase_settings().unwrap();
                assert_eq!(settings.url, "https://proj.supabase.co");
                assert_eq!(settings.anon_key, "public-anon");
            },
        );

        with_env(
            &[
                ("SUPABASE_URL", "https://primary.supabase.co"),
                ("SUPABASE_ANON_KEY", "primary-key"),
                ("NEXT_PUBLIC_SUPABASE_URL", "https://fallback.supabase.co"),
            ],
            || {
                let config = Config::try_parse_from(["credgate"]).unwrap();
                let settings = config.supabase_settings().unwrap();
                assert_eq!(settings.url, "https://primary.supabase.co");
                assert_eq!(settings.anon_key, "primary-key");
            },
        );
    }

    #[test]
    fn test_supabase_settings_missing() {
        with_env(&[("SUPABASE_URL", "https://proj.supabase.co")], || {
            let config = Config::try_parse_from(["credgate"]).unwrap();
            assert!(config.supabase_settings().is_err());
        });
    }

    #[test]
    fn test_admin_credentials_need_both() {
        with_env(&[("ADMIN_EMAIL", "root@corp.io")], || {
            let config = Config::try_parse_from(["credgate"]).unwrap();
            assert!(config.admin_credentials().is_none());
        });

        with_env(
            &[("ADMIN_EMAIL", "root@corp.io"), ("ADMIN_PASSWORD", "Sup3rSecret")],
            || {
                let config = Config::try_parse_from(["credgate"]).unwrap();
                assert_eq!(
                    config.admin_credentials(),
                    Some(("root@corp.io", "Sup3rSecret"))
                );
            },
        );
    }

    #[test]
    fn test_debug_redacts_secrets() {
        with_env(
            &[("JWT_SECRET", "topsecret"), ("ADMIN_PASSWORD", "Sup3rSecret")],
            || {
                let config = Config::try_parse_from(["credgate"]).unwrap();
                let rendered = format!("{config:?}");
                assert!(!rendered.contains("topsecret"));
                assert!(!rendered.contains("Sup3rSecret"));
                assert!(rendered.contains("<redacted>"));
            },
        );
    }
}
