use crate::ppm::{FindingsGrouping, MissingIdPolicy, PpmStatus, TransformOptions, UnknownStatusPolicy};
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub ppm: PpmConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let ppm = PpmConfig {
            unknown_status: env::var("PPM_UNKNOWN_STATUS")
                .ok()
                .map(|value| parse_unknown_status(&value))
                .transpose()?
                .unwrap_or_default(),
            missing_id: env::var("PPM_MISSING_ID")
                .ok()
                .map(|value| parse_missing_id(&value))
                .transpose()?
                .unwrap_or_default(),
            grouping: env::var("PPM_FINDINGS_GROUPING")
                .ok()
                .map(|value| parse_grouping(&value))
                .transpose()?
                .unwrap_or_default(),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            ppm,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Ingestion and grouping policies for tracker exports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PpmConfig {
    pub unknown_status: UnknownStatusPolicy,
    pub missing_id: MissingIdPolicy,
    pub grouping: FindingsGrouping,
}

impl PpmConfig {
    pub fn transform_options(&self) -> TransformOptions {
        TransformOptions {
            unknown_status: self.unknown_status,
            missing_id: self.missing_id,
        }
    }
}

pub fn parse_unknown_status(value: &str) -> Result<UnknownStatusPolicy, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "reject" => Ok(UnknownStatusPolicy::Reject),
        "pending" => Ok(UnknownStatusPolicy::Coerce(PpmStatus::Pending)),
        "in_progress" | "in-progress" => Ok(UnknownStatusPolicy::Coerce(PpmStatus::InProgress)),
        "completed" => Ok(UnknownStatusPolicy::Coerce(PpmStatus::Completed)),
        _ => Err(ConfigError::InvalidPolicy {
            key: "PPM_UNKNOWN_STATUS",
            value: value.to_string(),
        }),
    }
}

pub fn parse_missing_id(value: &str) -> Result<MissingIdPolicy, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "positional" => Ok(MissingIdPolicy::Positional),
        "reject" => Ok(MissingIdPolicy::Reject),
        _ => Err(ConfigError::InvalidPolicy {
            key: "PPM_MISSING_ID",
            value: value.to_string(),
        }),
    }
}

pub fn parse_grouping(value: &str) -> Result<FindingsGrouping, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "dynamic" => Ok(FindingsGrouping::Dynamic),
        "seeded" => Ok(FindingsGrouping::standard_seeded()),
        _ => Err(ConfigError::InvalidPolicy {
            key: "PPM_FINDINGS_GROUPING",
            value: value.to_string(),
        }),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidPolicy { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidPolicy { key, value } => {
                write!(f, "{} does not accept '{}'", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidPolicy { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
