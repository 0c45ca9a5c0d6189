// vendbot/bot/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";
pub const DEFAULT_XENDIT_BASE_URL: &str = "https://api.xendit.co";

/// Where the catalog and the order ledger live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
  /// JSON documents under `data_dir`.
  File,
  /// Postgres rows at `database_url`.
  Postgres,
}

impl FromStr for StoreBackend {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "file" | "json" => Ok(StoreBackend::File),
      "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
      other => Err(AppError::Config(format!(
        "Invalid STORE_BACKEND '{}' (expected 'file' or 'postgres')",
        other
      ))),
    }
  }
}

#[derive(Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  /// Externally reachable base URL. When set, the Telegram webhook is pointed at `{app_base_url}/telegram`.
  pub app_base_url: Option<String>,

  pub telegram_token: String,
  pub telegram_api_base: String,
  /// Sent as `secret_token` in `setWebhook`; Telegram echoes it in `X-Telegram-Bot-Api-Secret-Token`.
  pub telegram_webhook_secret: String,
  pub admin_chat_id: i64,

  pub xendit_api_key: String,
  pub xendit_base_url: String,
  pub xendit_webhook_token: String,

  pub store_name: String,
  pub logo_url: Option<String>,
  /// First segment of every external id.
  pub order_prefix: String,

  pub store_backend: StoreBackend,
  pub data_dir: PathBuf,
  pub database_url: Option<String>,
}

// Secrets stay out of logs.
impl fmt::Debug for AppConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("AppConfig")
      .field("server_host", &self.server_host)
      .field("server_port", &self.server_port)
      .field("app_base_url", &self.app_base_url)
      .field("telegram_token", &"[REDACTED]")
      .field("telegram_api_base", &self.telegram_api_base)
      .field("telegram_webhook_secret", &"[REDACTED]")
      .field("admin_chat_id", &self.admin_chat_id)
      .field("xendit_api_key", &"[REDACTED]")
      .field("xendit_base_url", &self.xendit_base_url)
      .field("xendit_webhook_token", &"[REDACTED]")
      .field("store_name", &self.store_name)
      .field("logo_url", &self.logo_url)
      .field("order_prefix", &self.order_prefix)
      .field("store_backend", &self.store_backend)
      .field("data_dir", &self.data_dir)
      .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
      .finish()
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present
    Self::from_vars(|name| std::env::var(name).ok())
  }

  /// Builds the config from any variable source; `from_env` passes the process environment.
  pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let optional = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    let required = |name: &str| {
      optional(name).ok_or_else(|| AppError::Config(format!("Missing environment variable '{}'", name)))
    };

    let server_host = optional("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
    let server_port = optional("SERVER_PORT")
      .unwrap_or_else(|| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let app_base_url = optional("APP_BASE_URL").map(|url| url.trim_end_matches('/').to_string());

    let telegram_token = required("TELEGRAM_TOKEN")?;
    let telegram_api_base = optional("TELEGRAM_API_BASE")
      .unwrap_or_else(|| DEFAULT_TELEGRAM_API_BASE.to_string())
      .trim_end_matches('/')
      .to_string();
    let telegram_webhook_secret = required("TELEGRAM_WEBHOOK_SECRET")?;
    validate_webhook_secret(&telegram_webhook_secret)?;
    let admin_chat_id = required("ADMIN_CHAT_ID")?
      .parse::<i64>()
      .map_err(|e| AppError::Config(format!("Invalid ADMIN_CHAT_ID: {}", e)))?;

    let xendit_api_key = required("XENDIT_API_KEY")?;
    let xendit_base_url = optional("XENDIT_BASE_URL")
      .unwrap_or_else(|| DEFAULT_XENDIT_BASE_URL.to_string())
      .trim_end_matches('/')
      .to_string();
    let xendit_webhook_token = required("XENDIT_WEBHOOK_TOKEN")?;

    let store_name = optional("STORE_NAME").unwrap_or_else(|| "Vendbot Store".to_string());
    let logo_url = optional("LOGO_URL");
    let order_prefix = optional("ORDER_PREFIX").unwrap_or_else(|| "vendbot".to_string());

    let store_backend = match optional("STORE_BACKEND") {
      Some(raw) => raw.parse::<StoreBackend>()?,
      None => StoreBackend::File,
    };
    let data_dir = PathBuf::from(optional("DATA_DIR").unwrap_or_else(|| "data".to_string()));
    let database_url = optional("DATABASE_URL");
    if store_backend == StoreBackend::Postgres && database_url.is_none() {
      return Err(AppError::Config(
        "DATABASE_URL is required when STORE_BACKEND=postgres".to_string(),
      ));
    }

    tracing::info!(backend = ?store_backend, "Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      app_base_url,
      telegram_token,
      telegram_api_base,
      telegram_webhook_secret,
      admin_chat_id,
      xendit_api_key,
      xendit_base_url,
      xendit_webhook_token,
      store_name,
      logo_url,
      order_prefix,
      store_backend,
      data_dir,
      database_url,
    })
  }

  pub fn bind_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}

// Telegram accepts 1-256 characters of A-Z, a-z, 0-9, `_` and `-`.
fn validate_webhook_secret(secret: &str) -> Result<()> {
  let allowed = |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-';
  if secret.len() > 256 || !secret.chars().all(allowed) {
    return Err(AppError::Config(
      "Invalid TELEGRAM_WEBHOOK_SECRET (1-256 characters of A-Z, a-z, 0-9, '_' or '-')".to_string(),
    ));
  }
  Ok(())
}
