//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `M3SCORE_*` environment variables.

pub mod error;

#[cfg(test)]
mod tests;

pub use error::ConfigError;

use std::env;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use crate::constants::{DEFAULT_MODEL_ID, DEFAULT_PORT};
use crate::embedding::M3Config;

/// Server configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `M3SCORE_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port. Default: `5000`.
    pub port: u16,

    /// IP address to bind to. Default: `127.0.0.1`.
    pub bind_addr: IpAddr,

    /// Hub repository id. Default: `BAAI/bge-m3`.
    pub model_id: String,

    /// Local model directory; when set the hub is not contacted.
    pub model_path: Option<PathBuf>,

    /// Hub cache directory.
    pub cache_dir: Option<PathBuf>,

    /// Half-precision hint. Default: `true`.
    pub use_fp16: bool,

    /// Serve from the deterministic stub encoder instead of real weights.
    pub stub: bool,

    /// Show hub download progress bars.
    pub download_progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_addr: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            model_id: DEFAULT_MODEL_ID.to_string(),
            model_path: None,
            cache_dir: None,
            use_fp16: true,
            stub: false,
            download_progress: false,
        }
    }
}

impl Config {
    const ENV_PORT: &'static str = "M3SCORE_PORT";
    const ENV_BIND_ADDR: &'static str = "M3SCORE_BIND_ADDR";
    const ENV_MODEL_ID: &'static str = "M3SCORE_MODEL_ID";
    const ENV_MODEL_PATH: &'static str = "M3SCORE_MODEL_PATH";
    const ENV_CACHE_DIR: &'static str = "M3SCORE_CACHE_DIR";
    const ENV_USE_FP16: &'static str = "M3SCORE_USE_FP16";
    const ENV_STUB: &'static str = "M3SCORE_STUB";
    const ENV_DOWNLOAD_PROGRESS: &'static str = "M3SCORE_DOWNLOAD_PROGRESS";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            port: Self::parse_port_from_env(defaults.port)?,
            bind_addr: Self::parse_bind_addr_from_env(defaults.bind_addr)?,
            model_id: Self::parse_string_from_env(Self::ENV_MODEL_ID, defaults.model_id),
            model_path: Self::parse_optional_path_from_env(Self::ENV_MODEL_PATH),
            cache_dir: Self::parse_optional_path_from_env(Self::ENV_CACHE_DIR),
            use_fp16: Self::parse_bool_from_env(Self::ENV_USE_FP16, defaults.use_fp16)?,
            stub: Self::parse_bool_from_env(Self::ENV_STUB, defaults.stub)?,
            download_progress: Self::parse_bool_from_env(
                Self::ENV_DOWNLOAD_PROGRESS,
                defaults.download_progress,
            )?,
        })
    }

    /// Validates paths (does not create directories).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref path) = self.model_path {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_dir() {
                return Err(ConfigError::NotADirectory { path: path.clone() });
            }
        }

        if let Some(ref path) = self.cache_dir
            && path.exists()
            && !path.is_dir()
        {
            return Err(ConfigError::NotADirectory { path: path.clone() });
        }

        Ok(())
    }

    /// Returns `"{bind_addr}:{port}"` (useful for logging/binding).
    pub fn socket_addr(&self) -> String {
        match self.bind_addr {
            IpAddr::V4(addr) => format!("{}:{}", addr, self.port),
            IpAddr::V6(addr) => format!("[{}]:{}", addr, self.port),
        }
    }

    /// Encoder configuration derived from these settings.
    pub fn m3_config(&self) -> M3Config {
        M3Config {
            model_id: self.model_id.clone(),
            model_dir: self.model_path.clone(),
            cache_dir: self.cache_dir.clone(),
            use_fp16: self.use_fp16,
            download_progress: self.download_progress,
            testing_stub: self.stub,
        }
    }

    fn parse_port_from_env(default: u16) -> Result<u16, ConfigError> {
        match env::var(Self::ENV_PORT) {
            Ok(value) => {
                let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
                    value: value.clone(),
                    source: e,
                })?;

                if port == 0 {
                    return Err(ConfigError::InvalidPort { value });
                }

                Ok(port)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::var(Self::ENV_BIND_ADDR) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            Err(_) => Ok(default),
        }
    }

    fn parse_bool_from_env(name: &'static str, default: bool) -> Result<bool, ConfigError> {
        let Ok(value) = env::var(name) else {
            return Ok(default);
        };
        match value.trim().to_ascii_lowercase().as_str() {
            "" => Ok(default),
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidBool { name, value }),
        }
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(default)
    }
}
