use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

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
    pub payment: PaymentConfig,
    pub geo: GeoConfig,
    pub backup: BackupConfig,
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

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            payment: PaymentConfig::from_env()?,
            geo: GeoConfig::from_env(),
            backup: BackupConfig::from_env(),
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

/// Hosted-checkout gateway settings and the prepayment business rules.
///
/// The shop credentials are optional: without them the gateway client reports
/// itself unconfigured and every payment operation fails with a service-level
/// error instead of reaching the network.
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub shop_id: Option<String>,
    pub secret_key: Option<String>,
    pub api_base: String,
    pub return_url: String,
    /// Percentage of the booking total collected up front.
    pub prepayment_percent: u32,
    /// Smallest charge the provider accepts, in minor currency units.
    pub min_charge_minor: i64,
    /// Cancellations closer to the start than this forfeit the prepayment.
    pub cancellation_lead_hours: i64,
}

impl PaymentConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            shop_id: env::var("PAYMENT_SHOP_ID").ok().filter(|v| !v.is_empty()),
            secret_key: env::var("PAYMENT_SECRET_KEY")
                .ok()
                .filter(|v| !v.is_empty()),
            api_base: env::var("PAYMENT_API_BASE")
                .unwrap_or_else(|_| "https://api.yookassa.ru/v3".to_string()),
            return_url: env::var("PAYMENT_RETURN_URL")
                .unwrap_or_else(|_| "http://localhost:3000/payments/return".to_string()),
            prepayment_percent: parse_env_number("PAYMENT_PREPAYMENT_PERCENT", 10)?,
            min_charge_minor: parse_env_number("PAYMENT_MIN_CHARGE_MINOR", 100)?,
            cancellation_lead_hours: parse_env_number("PAYMENT_CANCELLATION_LEAD_HOURS", 24)?,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.shop_id.is_some() && self.secret_key.is_some()
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            shop_id: None,
            secret_key: None,
            api_base: "https://api.yookassa.ru/v3".to_string(),
            return_url: "http://localhost:3000/payments/return".to_string(),
            prepayment_percent: 10,
            min_charge_minor: 100,
            cancellation_lead_hours: 24,
        }
    }
}

/// Geocoder API settings; an absent key disables the lookup entirely.
#[derive(Debug, Clone, Default)]
pub struct GeoConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
}

impl GeoConfig {
    fn from_env() -> Self {
        Self {
            api_key: env::var("GEOCODER_API_KEY").ok().filter(|v| !v.is_empty()),
            endpoint: env::var("GEOCODER_ENDPOINT")
                .unwrap_or_else(|_| "https://geocode-maps.yandex.ru/1.x".to_string()),
        }
    }
}

/// Where database dumps land.
#[derive(Debug, Clone)]
pub struct BackupConfig {
    pub dir: PathBuf,
}

impl BackupConfig {
    fn from_env() -> Self {
        Self {
            dir: env::var("BACKUP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("backups")),
        }
    }
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("backups"),
        }
    }
}

fn parse_env_number<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { key }),
        Err(_) => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key } => {
                write!(f, "{key} must be a non-negative number")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "PAYMENT_SHOP_ID",
            "PAYMENT_SECRET_KEY",
            "PAYMENT_PREPAYMENT_PERCENT",
            "PAYMENT_MIN_CHARGE_MINOR",
            "PAYMENT_CANCELLATION_LEAD_HOURS",
            "GEOCODER_API_KEY",
            "BACKUP_DIR",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.payment.prepayment_percent, 10);
        assert_eq!(config.payment.min_charge_minor, 100);
        assert_eq!(config.payment.cancellation_lead_hours, 24);
        assert!(!config.payment.is_configured());
        assert!(config.geo.api_key.is_none());
    }

    #[test]
    fn payment_gateway_configured_when_credentials_present() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("PAYMENT_SHOP_ID", "shop-1");
        env::set_var("PAYMENT_SECRET_KEY", "sk-test");
        env::set_var("PAYMENT_PREPAYMENT_PERCENT", "15");
        let config = AppConfig::load().expect("config loads");
        assert!(config.payment.is_configured());
        assert_eq!(config.payment.prepayment_percent, 15);
    }

    #[test]
    fn rejects_garbage_numeric_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("PAYMENT_CANCELLATION_LEAD_HOURS", "soon");
        let err = AppConfig::load().expect_err("lead hours must be numeric");
        assert!(matches!(err, ConfigError::InvalidNumber { .. }));
        reset_env();
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }
}
