use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

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
///
/// Built once at process start and handed to each pipeline component; nothing
/// below the binary reads the process environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub links: LinkConfig,
    pub mail: MailConfig,
    pub store: StoreConfig,
    pub renderer: RendererConfig,
    pub timeouts: TimeoutConfig,
}

const DEFAULT_BASE_URL: &str = "http://localhost:5000";
const DEFAULT_FROM_NAME: &str = "PSNA Technology Foundation";
const DEFAULT_ADMIN_EMAIL: &str = "admin@localhost";
const DEFAULT_SENDER: &str = "no-reply@localhost";

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;
        let max_body_bytes = parse_number("MAX_BODY_BYTES", 10 * 1024 * 1024)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let base_url = env::var("PUBLIC_BASE_URL")
            .or_else(|_| env::var("RENDER_EXTERNAL_URL"))
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let links = LinkConfig::new(&base_url)?;

        let admin_email = match env::var("ADMIN_EMAIL") {
            Ok(value) if !value.trim().is_empty() => value.trim().to_string(),
            _ if environment == AppEnvironment::Production => {
                return Err(ConfigError::MissingVar("ADMIN_EMAIL"))
            }
            _ => DEFAULT_ADMIN_EMAIL.to_string(),
        };
        let username = non_empty_var("EMAIL_USER");
        let password = non_empty_var("EMAIL_PASS");
        let mail = MailConfig {
            smtp_host: env::var("SMTP_HOST").unwrap_or_else(|_| "smtp.gmail.com".to_string()),
            smtp_port: parse_number("SMTP_PORT", 587)?,
            sender_address: username
                .clone()
                .unwrap_or_else(|| DEFAULT_SENDER.to_string()),
            sender_name: env::var("MAIL_FROM_NAME")
                .unwrap_or_else(|_| DEFAULT_FROM_NAME.to_string()),
            username,
            password,
            admin_email,
        };

        let store = StoreConfig::parse(
            &env::var("STORE_URL").unwrap_or_else(|_| "memory://".to_string()),
        )?;

        let renderer_url =
            env::var("RENDERER_URL").unwrap_or_else(|_| "http://localhost:3001".to_string());
        let renderer = RendererConfig {
            endpoint: Url::parse(&renderer_url).map_err(|source| ConfigError::InvalidUrl {
                var: "RENDERER_URL",
                source,
            })?,
        };

        let timeouts = TimeoutConfig {
            store: Duration::from_secs(parse_number("STORE_TIMEOUT_SECS", 5)?),
            render: Duration::from_secs(parse_number("RENDER_TIMEOUT_SECS", 30)?),
            mail: Duration::from_secs(parse_number("MAIL_TIMEOUT_SECS", 20)?),
        };

        Ok(Self {
            environment,
            server: ServerConfig {
                host,
                port,
                max_body_bytes,
            },
            telemetry: TelemetryConfig { log_level },
            links,
            mail,
            store,
            renderer,
            timeouts,
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_number<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { var: key }),
        Err(_) => Ok(default),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_body_bytes: usize,
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

/// Public base URL used to build document links embedded in notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    base_url: String,
}

impl LinkConfig {
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        Url::parse(trimmed).map_err(|source| ConfigError::InvalidUrl {
            var: "PUBLIC_BASE_URL",
            source,
        })?;
        Ok(Self {
            base_url: trimmed.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Stable download link for a stored record.
    pub fn download_link(&self, id: &impl fmt::Display) -> String {
        format!("{}/api/download-pdf/{}", self.base_url, id)
    }
}

/// Outbound mail relay and addressing.
#[derive(Clone)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub sender_address: String,
    pub sender_name: String,
    pub admin_email: String,
}

impl fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("sender_address", &self.sender_address)
            .field("sender_name", &self.sender_name)
            .field("admin_email", &self.admin_email)
            .finish()
    }
}

/// Where application records are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Memory,
    Directory(PathBuf),
}

impl StoreConfig {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("memory://") || raw.eq_ignore_ascii_case("memory") {
            return Ok(Self::Memory);
        }

        let url = Url::parse(raw).map_err(|source| ConfigError::InvalidUrl {
            var: "STORE_URL",
            source,
        })?;
        if url.scheme() != "file" {
            return Err(ConfigError::UnsupportedStore {
                value: raw.to_string(),
            });
        }
        let path = url
            .to_file_path()
            .map_err(|_| ConfigError::UnsupportedStore {
                value: raw.to_string(),
            })?;
        Ok(Self::Directory(path))
    }
}

/// HTML to PDF conversion service.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    pub endpoint: Url,
}

/// Upper bounds for each call to an external collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutConfig {
    pub store: Duration,
    pub render: Duration,
    pub mail: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            store: Duration::from_secs(5),
            render: Duration::from_secs(30),
            mail: Duration::from_secs(20),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost {
        source: std::net::AddrParseError,
    },
    InvalidNumber {
        var: &'static str,
    },
    InvalidUrl {
        var: &'static str,
        source: url::ParseError,
    },
    UnsupportedStore {
        value: String,
    },
    MissingVar(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { var } => {
                write!(f, "{var} must be a non-negative integer")
            }
            ConfigError::InvalidUrl { var, .. } => write!(f, "{var} must be an absolute URL"),
            ConfigError::UnsupportedStore { value } => write!(
                f,
                "STORE_URL '{value}' is not supported (use memory:// or file:///path)"
            ),
            ConfigError::MissingVar(var) => write!(f, "{var} must be set in production"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidUrl { source, .. } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::UnsupportedStore { .. }
            | ConfigError::MissingVar(_) => None,
        }
    }
}
