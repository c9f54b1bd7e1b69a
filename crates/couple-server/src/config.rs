use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

use couple_api::mailer::SmtpConfig;
use couple_gateway::pusher::PusherConfig;

#[derive(Debug, Clone)]
pub struct VapidSettings {
    pub subject: String,
    pub public_key: String,
    pub private_key_path: PathBuf,
}

/// Server configuration from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    /// Empty means any origin.
    pub allowed_origins: Vec<String>,
    pub app_url: String,
    pub pusher: Option<PusherConfig>,
    pub smtp: Option<SmtpConfig>,
    pub vapid: Option<VapidSettings>,
}

impl Config {
    /// Load from the process environment, after reading `.env` if present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = var("COUPLE_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = match var("COUPLE_PORT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("Invalid COUPLE_PORT: {}", raw))?,
            None => 3000,
        };
        let db_path = PathBuf::from(var("COUPLE_DB_PATH").unwrap_or_else(|| "couple.db".into()));
        let allowed_origins = var("COUPLE_ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        let app_url = var("COUPLE_APP_URL").unwrap_or_else(|| "http://localhost:3000".into());

        let pusher = match (var("PUSHER_APP_ID"), var("PUSHER_KEY"), var("PUSHER_SECRET")) {
            (Some(app_id), Some(key), Some(secret)) => Some(PusherConfig {
                app_id,
                key,
                secret,
                cluster: var("PUSHER_CLUSTER").unwrap_or_else(|| "ap1".into()),
            }),
            _ => None,
        };

        let smtp = match (var("SMTP_USER"), var("SMTP_PASS")) {
            (Some(user), Some(pass)) => Some(SmtpConfig {
                host: var("SMTP_HOST").unwrap_or_else(|| "smtp.gmail.com".into()),
                user,
                pass,
                from: var("SMTP_FROM"),
            }),
            _ => None,
        };

        let vapid = match (var("VAPID_PUBLIC_KEY"), var("VAPID_PRIVATE_KEY_PEM")) {
            (Some(public_key), Some(path)) => Some(VapidSettings {
                subject: var("VAPID_SUBJECT").unwrap_or_else(|| "mailto:admin@localhost".into()),
                public_key,
                private_key_path: PathBuf::from(path),
            }),
            _ => None,
        };

        Ok(Self {
            host,
            port,
            db_path,
            allowed_origins,
            app_url,
            pusher,
            smtp,
            vapid,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
