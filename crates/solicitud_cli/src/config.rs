use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use solicitud_intake::{IntakeConfig, DEFAULT_MAX_UPLOAD_BYTES};
use solicitud_mailer::SmtpConfig;
use solicitud_storage::StorageConfig;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub bind_address: IpAddr,
    pub port: u16,
    pub storage: StorageConfig,
    pub smtp: SmtpConfig,
    pub intake: IntakeConfig,
}

impl RuntimeConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from a variable lookup. Blank values count as
    /// unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let required = |key: &str| {
            get(key).ok_or_else(|| anyhow!("missing required environment variable {key}"))
        };

        let port = parse_or(get("PORT"), "PORT", DEFAULT_PORT)?;
        let bind_address = parse_or(
            get("BIND_ADDRESS"),
            "BIND_ADDRESS",
            IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        )?;

        let database_url = required("DATABASE_URL")?;
        let email_user = required("EMAIL_USER")?;
        let email_password = required("EMAIL_PASSWORD")?;

        let smtp_port = get("SMTP_PORT")
            .map(|raw| parse_value::<u16>(&raw, "SMTP_PORT"))
            .transpose()?;

        let smtp = SmtpConfig {
            host: get("SMTP_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
            port: smtp_port,
            from: get("MAIL_FROM").unwrap_or_else(|| email_user.clone()),
            username: email_user.clone(),
            password: email_password,
        };

        let mut intake = IntakeConfig::new(get("ADMIN_EMAIL").unwrap_or(email_user));
        intake.upload_dir = PathBuf::from(
            get("UPLOAD_DIR").unwrap_or_else(|| DEFAULT_UPLOAD_DIR.to_string()),
        );
        intake.max_upload_bytes =
            parse_or(get("MAX_UPLOAD_BYTES"), "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?;
        if let Some(origins) = get("CORS_ALLOWED_ORIGINS") {
            intake.cors_allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect();
        }

        Ok(Self {
            bind_address,
            port,
            storage: StorageConfig::new(database_url),
            smtp,
            intake,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(raw) => parse_value(&raw, key),
        None => Ok(default),
    }
}

fn parse_value<T>(raw: &str, key: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse::<T>()
        .with_context(|| format!("invalid value {raw:?} for {key}"))
}
