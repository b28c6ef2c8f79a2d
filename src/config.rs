use crate::error::Error;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_address: String,
    pub port: u16,
    pub database_max_connections: u32,
    pub token_ttl_days: i64,
    pub seed_demo: bool,
}

fn required(key: &str) -> Result<String, Error> {
    dotenv::var(key).map_err(|_| Error::ConfigError(format!("environment variable {} not been set", key)))
}

fn optional<T: FromStr>(key: &str, default: T) -> Result<T, Error> {
    match dotenv::var(key) {
        Ok(v) => v.trim().parse().map_err(|_| Error::ConfigError(format!("invalid value for {}: {}", key, v))),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Reads the process environment, `.env` included once `dotenv()` ran.
    pub fn from_env() -> Result<Self, Error> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            bind_address: optional("BIND_ADDRESS", "0.0.0.0".to_owned())?,
            port: optional("PORT", 8000)?,
            database_max_connections: optional("DATABASE_MAX_CONNECTIONS", 5)?,
            token_ttl_days: optional("TOKEN_TTL_DAYS", 7)?,
            seed_demo: optional("SEED_DEMO", false)?,
        })
    }

    pub fn is_memory(&self) -> bool {
        self.database_url.starts_with("memory://")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_optional_parses_and_defaults() {
        std::env::set_var("TALLY_TEST_PORT", " 9000 ");
        assert_eq!(optional("TALLY_TEST_PORT", 8000u16).unwrap(), 9000);
        assert_eq!(optional("TALLY_TEST_UNSET", 8000u16).unwrap(), 8000);

        std::env::set_var("TALLY_TEST_BAD", "yes please");
        assert!(matches!(optional("TALLY_TEST_BAD", false), Err(Error::ConfigError(_))));
        assert!(matches!(required("TALLY_TEST_UNSET"), Err(Error::ConfigError(_))));
    }
}
