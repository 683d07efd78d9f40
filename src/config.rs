use std::{env, net::{SocketAddr, ToSocketAddrs as _}, path::PathBuf};

use sea_orm::ConnectOptions;
use thiserror::Error;
use tracing::info;

pub struct Config {
    pub host_address: SocketAddr,

    pub database_opt: ConnectOptions,

    pub jwt_key: String,

    pub log_file: PathBuf,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment `{0}` is required to be set")]
    Missing(&'static str),
    #[error("`HOST_ADDRESS` is not in a valid format: {0}")]
    InvalidHostAddress(String),
}

pub fn load() -> Result<Config, ConfigError> {
    Ok(Config {
        host_address: load_host_address()?,
        database_opt: load_database_opt()?.into(),
        jwt_key: load_jwt_key()?,
        log_file: load_log_file(),
    })
}

fn load_host_address() -> Result<SocketAddr, ConfigError> {
    info!("Loading environment `HOST_ADDRESS`");

    let var = env::var("HOST_ADDRESS").unwrap_or_else(|_| "127.0.0.1:0".to_string());

    var.to_socket_addrs()
        .map_err(|_| ConfigError::InvalidHostAddress(var.clone()))?
        .next()
        .ok_or_else(|| ConfigError::InvalidHostAddress(var))
}

fn load_database_opt() -> Result<impl Into<ConnectOptions>, ConfigError> {
    info!("Loading environment `DATABASE_URL`");

    env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))
}

fn load_jwt_key() -> Result<String, ConfigError> {
    info!("Loading environment `JWT_SECRET`");

    env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))
}

fn load_log_file() -> PathBuf {
    env::var("LOG_FILE").unwrap_or_else(|_| "trace.log".to_string()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_names_variable() {
        assert_eq!(
            ConfigError::Missing("JWT_SECRET").to_string(),
            "environment `JWT_SECRET` is required to be set"
        );
    }
}
