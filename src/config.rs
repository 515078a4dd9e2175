use std::{env, fmt::Display, path::PathBuf, str::FromStr};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
#[error("invalid {key} value '{value}': {reason}")]
pub struct ConfigError {
    key: &'static str,
    value: String,
    reason: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    pub seed_path: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            port: try_load("PORT", "8080")?,
            data_path: try_load("APP_DATA_PATH", "data/state.json")?,
            seed_path: try_load("APP_SEED_PATH", "data/seed.json")?,
        })
    }
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let value = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    value.parse().map_err(|err: T::Err| ConfigError {
        key,
        reason: err.to_string(),
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let port: u16 = try_load("BUSINESS_DIRECTORY_TEST_UNSET_PORT", "8080").unwrap();
        assert_eq!(port, 8080);
    }

    #[test]
    fn invalid_value_names_the_key() {
        let err = try_load::<u16>("BUSINESS_DIRECTORY_TEST_UNSET_PORT", "not-a-port").unwrap_err();
        assert!(err.to_string().contains("BUSINESS_DIRECTORY_TEST_UNSET_PORT"));
    }
}
