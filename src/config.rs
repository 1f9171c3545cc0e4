use std::{env, fmt::Display, net::SocketAddr, path::PathBuf, str::FromStr};

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Environment variable {0} is required")]
    Missing(&'static str),

    #[error("Invalid {key} value: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub database_max_connections: u32,
    pub redis_url: Option<String>,
    pub jwt_secret: String,
    pub media_root: PathBuf,
    pub media_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            bind_address: try_load(&lookup, "BIND_ADDRESS", "0.0.0.0:8000")?,
            database_url: require(&lookup, "DATABASE_URL")?,
            database_max_connections: try_load(&lookup, "DATABASE_MAX_CONNECTIONS", "5")?,
            redis_url: lookup("REDIS_URL").filter(|url| !url.trim().is_empty()),
            jwt_secret: require(&lookup, "JWT_SECRET")?,
            media_root: try_load(&lookup, "MEDIA_ROOT", "media")?,
            media_url: try_load(&lookup, "MEDIA_URL", "/media/")?,
        })
    }
}

fn require<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|value| !value.trim().is_empty())
        .ok_or(ConfigError::Missing(key))
}

fn try_load<T, F>(lookup: &F, key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .unwrap_or_else(|| {
            log::info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e: T::Err| {
            log::warn!("Invalid {key} value: {e}");
            ConfigError::Invalid {
                key,
                reason: e.to_string(),
            }
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/foodgram"),
            ("JWT_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.bind_address, "0.0.0.0:8000".parse().unwrap());
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.redis_url, None);
        assert_eq!(config.media_root, PathBuf::from("media"));
        assert_eq!(config.media_url, "/media/");
    }

    #[test]
    fn required_values() {
        assert_eq!(
            Config::from_lookup(lookup(&[("JWT_SECRET", "secret")])).unwrap_err(),
            ConfigError::Missing("DATABASE_URL")
        );
        assert_eq!(
            Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://x"), ("JWT_SECRET", " ")]))
                .unwrap_err(),
            ConfigError::Missing("JWT_SECRET")
        );
    }

    #[test]
    fn invalid_values() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "secret"),
            ("BIND_ADDRESS", "nowhere"),
        ]))
        .unwrap_err();

        assert!(matches!(err, ConfigError::Invalid { key: "BIND_ADDRESS", .. }));
    }

    #[test]
    fn overrides() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "secret"),
            ("REDIS_URL", "redis://127.0.0.1"),
            ("DATABASE_MAX_CONNECTIONS", "12"),
            ("MEDIA_URL", "https://cdn.example.com/media/"),
        ]))
        .unwrap();

        assert_eq!(config.redis_url.as_deref(), Some("redis://127.0.0.1"));
        assert_eq!(config.database_max_connections, 12);
        assert_eq!(config.media_url, "https://cdn.example.com/media/");
    }
}
