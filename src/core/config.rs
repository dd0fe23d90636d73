//! Service configuration, read from environment variables.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use rust_decimal::Decimal;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value `{value}`")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
}

impl ServerConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// development | staging | production
    pub environment: String,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    /// HS256 secret for admin session tokens
    pub jwt_secret: String,
    /// VAT applied to order subtotals, as a fraction (0.16 = 16%)
    pub tax_rate: Decimal,
    /// Receives order events when set
    pub notify_webhook_url: Option<String>,
}

/// Load configuration from the process environment.
pub fn load() -> Result<Config, ConfigError> {
    Config::from_lookup(|name| std::env::var(name).ok())
}

impl Config {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let environment = get("ENVIRONMENT").unwrap_or_else(|| "development".into());

        let database = DatabaseConfig {
            url: get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
            max_connections: parse_or(get("DATABASE_MAX_CONNECTIONS"), "DATABASE_MAX_CONNECTIONS", 10)?,
        };

        let server = ServerConfig {
            host: parse_or(get("SERVER_HOST"), "SERVER_HOST", IpAddr::V4(Ipv4Addr::UNSPECIFIED))?,
            port: parse_or(get("SERVER_PORT"), "SERVER_PORT", 3000)?,
        };

        let jwt_secret = match get("JWT_SECRET") {
            Some(secret) => secret,
            None if environment == "development" => "dev-jwt-secret-not-for-production".into(),
            None => return Err(ConfigError::Missing("JWT_SECRET")),
        };

        let tax_rate: Decimal = parse_or(get("TAX_RATE"), "TAX_RATE", Decimal::new(16, 2))?;
        if tax_rate.is_sign_negative() || tax_rate >= Decimal::ONE {
            return Err(ConfigError::Invalid {
                name: "TAX_RATE",
                value: tax_rate.to_string(),
            });
        }

        Ok(Self {
            environment,
            database,
            server,
            jwt_secret,
            tax_rate,
            notify_webhook_url: get("NOTIFY_WEBHOOK_URL"),
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    raw: Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_in_development() {
        let config = config_from(&[("DATABASE_URL", "postgres://localhost/shoecare")]).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.tax_rate, Decimal::new(16, 2));
        assert!(config.notify_webhook_url.is_none());
    }

    #[test]
    fn database_url_is_required() {
        assert!(matches!(
            config_from(&[]),
            Err(ConfigError::Missing("DATABASE_URL"))
        ));
    }

    #[test]
    fn production_requires_a_jwt_secret() {
        let result = config_from(&[
            ("DATABASE_URL", "postgres://localhost/shoecare"),
            ("ENVIRONMENT", "production"),
        ]);
        assert!(matches!(result, Err(ConfigError::Missing("JWT_SECRET"))));
    }

    #[test]
    fn tax_rate_must_be_a_fraction() {
        let result = config_from(&[
            ("DATABASE_URL", "postgres://localhost/shoecare"),
            ("TAX_RATE", "16"),
        ]);
        assert!(matches!(result, Err(ConfigError::Invalid { name: "TAX_RATE", .. })));
    }

    #[test]
    fn bad_port_is_reported() {
        let result = config_from(&[
            ("DATABASE_URL", "postgres://localhost/shoecare"),
            ("SERVER_PORT", "http"),
        ]);
        assert!(matches!(result, Err(ConfigError::Invalid { name: "SERVER_PORT", .. })));
    }
}
