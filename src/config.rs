use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub delay_ms: u64,
    pub settle_ms: u64,
    pub profile_delay_ms: u64,
    pub username_cooldown_days: i64,
}

impl AuthConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn profile_delay(&self) -> Duration {
        Duration::from_millis(self.profile_delay_ms)
    }

    pub fn username_cooldown(&self) -> time::Duration {
        time::Duration::days(self.username_cooldown_days)
    }

    /// No artificial latency; the cooldown stays at its real length.
    #[cfg(test)]
    pub fn instant() -> Self {
        Self {
            delay_ms: 0,
            settle_ms: 0,
            profile_delay_ms: 0,
            ..Self::default()
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            delay_ms: 1000,
            settle_ms: 800,
            profile_delay_ms: 1500,
            username_cooldown_days: 30,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub store_path: Option<PathBuf>,
    pub auth: AuthConfig,
}

/// Unset or blank falls back to `default`; anything else must parse.
fn parse_or<T>(name: &str, raw: Option<String>, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw.filter(|v| !v.trim().is_empty()) {
        Some(v) => v.trim().parse().with_context(|| format!("{name}={v}")),
        None => Ok(default),
    }
}

fn env_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    parse_or(name, std::env::var(name).ok(), default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = AuthConfig::default();
        let port = env_or("APP_PORT", 8080u16)?;
        let auth = AuthConfig {
            delay_ms: env_or("AUTH_DELAY_MS", defaults.delay_ms)?,
            settle_ms: env_or("AUTH_SETTLE_MS", defaults.settle_ms)?,
            profile_delay_ms: env_or("PROFILE_DELAY_MS", defaults.profile_delay_ms)?,
            username_cooldown_days: env_or(
                "USERNAME_COOLDOWN_DAYS",
                defaults.username_cooldown_days,
            )?,
        };
        anyhow::ensure!(
            auth.username_cooldown_days >= 0,
            "USERNAME_COOLDOWN_DAYS must not be negative"
        );
        Ok(Self {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port,
            store_path: std::env::var("STORE_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            auth,
        })
    }
}
