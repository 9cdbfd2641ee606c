use crate::{env_or_default, env_required, ConfigError, FromEnv};

/// Message broker (Redis Streams) configuration.
///
/// Every recognized topic lives on the same broker; publishers are
/// created per topic from this one connection target.
#[derive(Clone, Debug)]
pub struct BrokerConfig {
    /// Redis connection URI, e.g. "redis://localhost:6379"
    pub uri: String,
    /// Approximate maximum stream length before trimming (XADD MAXLEN ~)
    pub max_stream_length: i64,
}

impl BrokerConfig {
    pub fn new(uri: String) -> Self {
        Self {
            uri,
            max_stream_length: 100_000,
        }
    }
}

impl FromEnv for BrokerConfig {
    /// Requires BROKER_URI to be set (no default); optional
    /// BROKER_MAX_STREAM_LENGTH override.
    fn from_env() -> Result<Self, ConfigError> {
        let uri = env_required("BROKER_URI")?;
        let max_stream_length = env_or_default("BROKER_MAX_STREAM_LENGTH", "100000")
            .parse()
            .map_err(|e| ConfigError::ParseError {
                key: "BROKER_MAX_STREAM_LENGTH".to_string(),
                details: format!("{}", e),
            })?;

        Ok(Self {
            uri,
            max_stream_length,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broker_config_from_env() {
        temp_env::with_vars(
            [
                ("BROKER_URI", Some("redis://localhost:6379")),
                ("BROKER_MAX_STREAM_LENGTH", None),
            ],
            || {
                let config = BrokerConfig::from_env().unwrap();
                assert_eq!(config.uri, "redis://localhost:6379");
                assert_eq!(config.max_stream_length, 100_000);
            },
        );
    }

    #[test]
    fn test_broker_config_missing_uri() {
        temp_env::with_var_unset("BROKER_URI", || {
            let err = BrokerConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("BROKER_URI"));
        });
    }

    #[test]
    fn test_broker_config_length_override() {
        temp_env::with_vars(
            [
                ("BROKER_URI", Some("redis://localhost:6379")),
                ("BROKER_MAX_STREAM_LENGTH", Some("5000")),
            ],
            || {
                let config = BrokerConfig::from_env().unwrap();
                assert_eq!(config.max_stream_length, 5000);
            },
        );
    }
}
