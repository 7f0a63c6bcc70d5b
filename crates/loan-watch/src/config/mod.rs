use chrono::FixedOffset;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

pub const DEFAULT_ALERT_THRESHOLD_DAYS: i64 = 3;
pub const DEFAULT_UTC_OFFSET: &str = "-04:00";

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
    pub access: AccessConfig,
    pub catalog: CatalogConfig,
    pub alerts: AlertConfig,
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

        let admin_token = env::var("LOAN_ADMIN_TOKEN")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        let table = env::var("LOAN_TABLE").unwrap_or_else(|_| "books".to_string());
        let topic = env::var("LOAN_ALERT_TOPIC").unwrap_or_else(|_| "loan-due-alerts".to_string());

        let threshold_days = match env::var("LOAN_ALERT_THRESHOLD_DAYS") {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidThreshold { value: raw.clone() })?
                as i64,
            Err(_) => DEFAULT_ALERT_THRESHOLD_DAYS,
        };

        let raw_offset =
            env::var("LOAN_ALERT_UTC_OFFSET").unwrap_or_else(|_| DEFAULT_UTC_OFFSET.to_string());
        let reference_offset = parse_utc_offset(&raw_offset)
            .ok_or_else(|| ConfigError::InvalidUtcOffset { value: raw_offset })?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            access: AccessConfig { admin_token },
            catalog: CatalogConfig { table },
            alerts: AlertConfig {
                topic,
                threshold_days,
                reference_offset,
            },
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Credential material for the write gate. `None` means no write is ever admitted.
#[derive(Clone, Default)]
pub struct AccessConfig {
    pub admin_token: Option<String>,
}

impl fmt::Debug for AccessConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessConfig")
            .field(
                "admin_token",
                &self.admin_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub table: String,
}

/// Due-date alert job settings.
#[derive(Debug, Clone)]
pub struct AlertConfig {
    pub topic: String,
    pub threshold_days: i64,
    /// Every civil-date computation and rendered timestamp uses this offset.
    pub reference_offset: FixedOffset,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            topic: "loan-due-alerts".to_string(),
            threshold_days: DEFAULT_ALERT_THRESHOLD_DAYS,
            reference_offset: FixedOffset::west_opt(4 * 3600).unwrap_or(utc()),
        }
    }
}

fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).unwrap_or_else(|| unreachable!("zero offset is always valid"))
}

/// Parses `Z`/`UTC` or a `±HH:MM` (`±HHMM`) offset.
pub fn parse_utc_offset(raw: &str) -> Option<FixedOffset> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return Some(utc());
    }
    raw.parse::<FixedOffset>().ok()
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidThreshold { value: String },
    InvalidUtcOffset { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidThreshold { value } => write!(
                f,
                "LOAN_ALERT_THRESHOLD_DAYS must be a non-negative whole number (got '{value}')"
            ),
            ConfigError::InvalidUtcOffset { value } => write!(
                f,
                "LOAN_ALERT_UTC_OFFSET must look like +HH:MM or -HH:MM (got '{value}')"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidThreshold { .. }
            | ConfigError::InvalidUtcOffset { .. } => None,
        }
    }
}
