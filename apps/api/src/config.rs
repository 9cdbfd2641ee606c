//! Process configuration, assembled from the environment at startup.

use core_config::broker::BrokerConfig;
use core_config::server::ServerConfig;
use core_config::{ConfigError, Environment, FromEnv};
use uploads::UploadsConfig;

/// Everything the API binary needs to boot.
///
/// Any missing or malformed value is fatal before the listener binds.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub broker: BrokerConfig,
    pub uploads: UploadsConfig,
}

impl FromEnv for AppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            environment: Environment::from_env(),
            server: ServerConfig::from_env()?,
            broker: BrokerConfig::from_env()?,
            uploads: UploadsConfig::from_env()?,
        })
    }
}
