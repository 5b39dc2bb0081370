use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use url::Url;

use crate::workflows::waitlist::{HoneypotPolicy, ReferralBase};

/// Endpoint the landing page posted to before the Rust service existed.
pub const DEFAULT_ENDPOINT_URL: &str = "https://script.google.com/macros/s/AKfycbyYKBD1TfaGnRiIENdIEPwsy6jvGmiz9rILhqNVMBfiPVVPkxnqgG0WnDsSNlP39fz8QQ/exec";
pub const DEFAULT_SITE_ORIGIN: &str = "http://localhost:3000";
pub const DEFAULT_REFERRAL_PATH: &str = "void-walker";
pub const DEFAULT_CAMPAIGN_URL: &str = "https://x.com/cherygpt";
pub const DEFAULT_SESSION_TTL_SECS: u64 = 1800;

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
    pub waitlist: WaitlistConfig,
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
        let log_format = LogFormat::from_str(
            &env::var("APP_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string()),
        );

        let waitlist = WaitlistConfig::from_env()?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                log_format,
            },
            waitlist,
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

/// Output layout for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
}

impl LogFormat {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" => Self::Pretty,
            _ => Self::Compact,
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub log_format: LogFormat,
}

/// Where submissions go and how referral links are built.
#[derive(Debug, Clone)]
pub struct WaitlistConfig {
    pub endpoint_url: Url,
    pub site_origin: Url,
    pub referral_path: String,
    pub campaign_url: Url,
    pub request_timeout: Duration,
    pub honeypot_policy: HoneypotPolicy,
    /// Idle time after which an untouched wizard session is dropped.
    pub session_ttl: Duration,
}

impl WaitlistConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let endpoint_url = url_var("WAITLIST_ENDPOINT_URL", DEFAULT_ENDPOINT_URL)?;
        let site_origin = url_var("WAITLIST_SITE_ORIGIN", DEFAULT_SITE_ORIGIN)?;
        let campaign_url = url_var("WAITLIST_CAMPAIGN_URL", DEFAULT_CAMPAIGN_URL)?;
        let referral_path = env::var("WAITLIST_REFERRAL_PATH")
            .unwrap_or_else(|_| DEFAULT_REFERRAL_PATH.to_string());

        let timeout_secs = env::var("WAITLIST_REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or(ConfigError::InvalidTimeout)?;

        let ttl_secs = env::var("WAITLIST_SESSION_TTL_SECS")
            .unwrap_or_else(|_| DEFAULT_SESSION_TTL_SECS.to_string())
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or(ConfigError::InvalidSessionTtl)?;

        let raw_policy =
            env::var("WAITLIST_HONEYPOT_POLICY").unwrap_or_else(|_| "discard".to_string());
        let honeypot_policy = raw_policy
            .parse::<HoneypotPolicy>()
            .map_err(|_| ConfigError::InvalidHoneypotPolicy(raw_policy.clone()))?;

        Ok(Self {
            endpoint_url,
            site_origin,
            referral_path,
            campaign_url,
            request_timeout: Duration::from_secs(timeout_secs),
            honeypot_policy,
            session_ttl: Duration::from_secs(ttl_secs),
        })
    }

    /// Replaces the site origin, keeping only scheme, host and port.
    pub fn set_site_origin(&mut self, raw: &str) -> Result<(), ConfigError> {
        self.site_origin = parse_url("--origin", raw)?;
        Ok(())
    }

    pub fn set_endpoint_url(&mut self, raw: &str) -> Result<(), ConfigError> {
        self.endpoint_url = parse_url("--endpoint", raw)?;
        Ok(())
    }

    pub fn referral_base(&self) -> ReferralBase {
        ReferralBase::new(&self.site_origin, &self.referral_path)
    }
}

fn url_var(name: &'static str, default: &str) -> Result<Url, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    parse_url(name, &raw)
}

fn parse_url(name: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidUrl { name, source })
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost {
        source: std::net::AddrParseError,
    },
    InvalidUrl {
        name: &'static str,
        source: url::ParseError,
    },
    InvalidTimeout,
    InvalidSessionTtl,
    InvalidHoneypotPolicy(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidUrl { name, source } => {
                write!(f, "{name} must be an absolute URL ({source})")
            }
            ConfigError::InvalidTimeout => write!(
                f,
                "WAITLIST_REQUEST_TIMEOUT_SECS must be a positive number of seconds"
            ),
            ConfigError::InvalidSessionTtl => write!(
                f,
                "WAITLIST_SESSION_TTL_SECS must be a positive number of seconds"
            ),
            ConfigError::InvalidHoneypotPolicy(value) => write!(
                f,
                "WAITLIST_HONEYPOT_POLICY '{value}' must be one of discard, forward, reject"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidUrl { source, .. } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidTimeout
            | ConfigError::InvalidSessionTtl
            | ConfigError::InvalidHoneypotPolicy(_) => None,
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
        for name in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "APP_LOG_FORMAT",
            "WAITLIST_ENDPOINT_URL",
            "WAITLIST_SITE_ORIGIN",
            "WAITLIST_REFERRAL_PATH",
            "WAITLIST_CAMPAIGN_URL",
            "WAITLIST_REQUEST_TIMEOUT_SECS",
            "WAITLIST_HONEYPOT_POLICY",
            "WAITLIST_SESSION_TTL_SECS",
        ] {
            env::remove_var(name);
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
        assert_eq!(config.telemetry.log_format, LogFormat::Compact);
        assert_eq!(config.waitlist.endpoint_url.as_str(), DEFAULT_ENDPOINT_URL);
        assert_eq!(config.waitlist.referral_path, "void-walker");
        assert_eq!(config.waitlist.request_timeout, Duration::from_secs(10));
        assert_eq!(config.waitlist.honeypot_policy, HoneypotPolicy::Discard);
        assert_eq!(config.waitlist.session_ttl, Duration::from_secs(1800));
    }

    #[test]
    fn rejects_zero_session_ttl() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("WAITLIST_SESSION_TTL_SECS", "0");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidSessionTtl)
        ));
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
    }

    #[test]
    fn rejects_relative_endpoint_url() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("WAITLIST_ENDPOINT_URL", "/exec");
        match AppConfig::load() {
            Err(ConfigError::InvalidUrl { name, .. }) => {
                assert_eq!(name, "WAITLIST_ENDPOINT_URL")
            }
            other => panic!("expected invalid url, got {other:?}"),
        }
        reset_env();
    }

    #[test]
    fn rejects_unknown_honeypot_policy() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("WAITLIST_HONEYPOT_POLICY", "ignore");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidHoneypotPolicy(value)) if value == "ignore"
        ));
        reset_env();
    }

    #[test]
    fn referral_base_uses_origin_without_path() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("WAITLIST_SITE_ORIGIN", "https://example.com/landing/index.html");
        let config = AppConfig::load().expect("config loads");
        let link = config.waitlist.referral_base().link_for("alice");
        assert_eq!(link.as_str(), "https://example.com/void-walker/?ref=alice");
        reset_env();
    }
}
