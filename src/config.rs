/// Configuration management for Lockside
use crate::error::{LockError, LockResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub gateway: GatewayConfig,
    pub codes: CodeConfig,
    pub pricing: PricingConfig,
    pub email: Option<EmailConfig>,
    pub sms: Option<SmsConfig>,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    pub version: String,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_directory: PathBuf,
    pub database_file: PathBuf,
}

/// Lock gateway configuration
///
/// A missing or placeholder API key selects the in-memory demo gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
    /// Device the day-pass checkout issues codes against
    pub day_pass_device_id: String,
}

/// Access code policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeConfig {
    /// Default PIN length (clamped to 4-8 at generation time)
    pub pin_length: usize,
    /// Lead time the gateway requires between "now" and a code's start
    pub lead_time_minutes: i64,
    /// Civil time zone of the property as a fixed UTC offset, used to
    /// decide whether a booking is "today" and to build day windows.
    /// Explicit rather than host-local so deployments don't drift.
    pub property_utc_offset_minutes: i32,
}

/// Day-pass pricing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Price per person per day, in dollars
    pub day_pass_price: f64,
}

/// Email (SMTP) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub smtp_url: String,
    pub from_address: String,
}

/// SMS provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> LockResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("LOCKSIDE_HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
        let port = env::var("LOCKSIDE_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|_| LockError::Validation("Invalid port number".to_string()))?;
        let version = env::var("LOCKSIDE_VERSION")
            .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string());

        let data_directory: PathBuf = env::var("LOCKSIDE_DATA_DIRECTORY")
            .unwrap_or_else(|_| "./data".to_string())
            .into();
        let database_file = env::var("LOCKSIDE_DATABASE_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("lockside.json"));

        // Treat unset or obviously-placeholder keys as "no key" so a fresh
        // checkout of the repo runs in demo mode out of the box.
        let api_key = env::var("SEAM_API_KEY")
            .ok()
            .filter(|k| !k.is_empty() && !k.contains("your_api_key"));
        let gateway_base_url = env::var("SEAM_API_URL")
            .unwrap_or_else(|_| "https://connect.getseam.com".to_string());
        let gateway_timeout_secs = env::var("SEAM_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .unwrap_or(10);
        let day_pass_device_id = env::var("LOCKSIDE_DAY_PASS_DEVICE_ID")
            .unwrap_or_else(|_| "demo_device_001".to_string());

        let pin_length = env::var("LOCKSIDE_DEFAULT_CODE_LENGTH")
            .unwrap_or_else(|_| "6".to_string())
            .parse()
            .unwrap_or(6);
        let lead_time_minutes = env::var("LOCKSIDE_GATEWAY_LEAD_MINUTES")
            .unwrap_or_else(|_| "15".to_string())
            .parse()
            .unwrap_or(15);
        let property_utc_offset_minutes = env::var("LOCKSIDE_PROPERTY_UTC_OFFSET_MINUTES")
            .unwrap_or_else(|_| "0".to_string())
            .parse()
            .unwrap_or(0);

        let day_pass_price = env::var("LOCKSIDE_DAY_PASS_PRICE")
            .unwrap_or_else(|_| "15".to_string())
            .parse()
            .unwrap_or(15.0);

        let email = if let Ok(smtp_url) = env::var("LOCKSIDE_SMTP_URL") {
            Some(EmailConfig {
                smtp_url,
                from_address: env::var("LOCKSIDE_EMAIL_FROM_ADDRESS")
                    .unwrap_or_else(|_| format!("noreply@{}", hostname)),
            })
        } else {
            None
        };

        let sms = match (
            env::var("TWILIO_ACCOUNT_SID"),
            env::var("TWILIO_AUTH_TOKEN"),
            env::var("TWILIO_FROM_NUMBER"),
        ) {
            (Ok(account_sid), Ok(auth_token), Ok(from_number)) => Some(SmsConfig {
                account_sid,
                auth_token,
                from_number,
            }),
            _ => None,
        };

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                version,
            },
            storage: StorageConfig {
                data_directory,
                database_file,
            },
            gateway: GatewayConfig {
                api_key,
                base_url: gateway_base_url,
                timeout_secs: gateway_timeout_secs,
                day_pass_device_id,
            },
            codes: CodeConfig {
                pin_length,
                lead_time_minutes,
                property_utc_offset_minutes,
            },
            pricing: PricingConfig { day_pass_price },
            email,
            sms,
            logging: LoggingConfig { level: log_level },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> LockResult<()> {
        if self.service.hostname.is_empty() {
            return Err(LockError::Validation("Hostname cannot be empty".to_string()));
        }

        if self.codes.lead_time_minutes < 0 {
            return Err(LockError::Validation(
                "Gateway lead time cannot be negative".to_string(),
            ));
        }

        // FixedOffset rejects offsets of a day or more; fail early with a
        // clearer message than a panic deep in window math.
        if self.codes.property_utc_offset_minutes.abs() >= 24 * 60 {
            return Err(LockError::Validation(
                "Property UTC offset must be less than 24 hours".to_string(),
            ));
        }

        if self.pricing.day_pass_price < 0.0 {
            return Err(LockError::Validation(
                "Day pass price cannot be negative".to_string(),
            ));
        }

        Ok(())
    }

    /// True when no gateway API key is configured and the service should
    /// run against the in-memory demo gateway
    pub fn demo_mode(&self) -> bool {
        self.gateway.api_key.is_none()
    }
}
