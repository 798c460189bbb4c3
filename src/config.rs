use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

use crate::errors::ServerError;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    /// Take the submitter IP from X-Forwarded-For. Only safe behind a proxy
    /// that overwrites the header.
    pub trust_forwarded_for: bool,
    pub database_path: String,
    pub max_workers: usize,
    /// Distinct-IP reports needed before a status is applied automatically.
    pub approval_threshold: i64,
    pub claim_token_ttl_secs: i64,
    pub signin_link_ttl_secs: i64,
    pub session_ttl_secs: i64,
    pub public_base_url: String,
    pub moderator_emails: Vec<String>,
    pub brevo_api_key: Option<String>,
    pub sender_email: String,
    pub sender_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            trust_forwarded_for: false,
            database_path: "famdoc.sqlite3".to_string(),
            max_workers: 8,
            approval_threshold: crate::consensus::DEFAULT_THRESHOLD,
            claim_token_ttl_secs: 24 * 60 * 60,
            signin_link_ttl_secs: 15 * 60,
            session_ttl_secs: 7 * 24 * 60 * 60,
            public_base_url: "http://127.0.0.1:3000".to_string(),
            moderator_emails: Vec::new(),
            brevo_api_key: None,
            sender_email: "no-reply@famdoc.local".to_string(),
            sender_name: "Family Doctor Directory".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ServerError> {
        dotenvy::dotenv().ok();
        let defaults = Config::default();

        let cfg = Self {
            bind_addr: try_load("BIND_ADDR", &defaults.bind_addr)?,
            trust_forwarded_for: try_load("TRUST_FORWARDED_FOR", "false")?,
            database_path: try_load("DATABASE_PATH", &defaults.database_path)?,
            max_workers: try_load("MAX_WORKERS", "8")?,
            approval_threshold: try_load("APPROVAL_THRESHOLD", "2")?,
            claim_token_ttl_secs: try_load("CLAIM_TOKEN_TTL_SECS", "86400")?,
            signin_link_ttl_secs: try_load("SIGNIN_LINK_TTL_SECS", "900")?,
            session_ttl_secs: try_load("SESSION_TTL_SECS", "604800")?,
            public_base_url: try_load("PUBLIC_BASE_URL", &defaults.public_base_url)?,
            moderator_emails: parse_email_list(&var("MODERATOR_EMAILS").unwrap_or_default()),
            brevo_api_key: var("BREVO_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            sender_email: try_load("MAIL_SENDER_EMAIL", &defaults.sender_email)?,
            sender_name: try_load("MAIL_SENDER_NAME", &defaults.sender_name)?,
        };

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ServerError> {
        if self.approval_threshold < 1 {
            return Err(ServerError::Config(
                "APPROVAL_THRESHOLD must be at least 1".into(),
            ));
        }
        if self.max_workers == 0 {
            return Err(ServerError::Config("MAX_WORKERS must be positive".into()));
        }
        for (key, ttl) in [
            ("CLAIM_TOKEN_TTL_SECS", self.claim_token_ttl_secs),
            ("SIGNIN_LINK_TTL_SECS", self.signin_link_ttl_secs),
            ("SESSION_TTL_SECS", self.session_ttl_secs),
        ] {
            if ttl <= 0 {
                return Err(ServerError::Config(format!("{key} must be positive")));
            }
        }
        Ok(())
    }

    /// Absolute URL for a path like "/claim/verify?token=..."
    pub fn absolute_url(&self, path: &str) -> String {
        format!("{}{}", self.public_base_url.trim_end_matches('/'), path)
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        info!("Environment variable {key} not set");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T, ServerError>
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
            ServerError::Config(format!("invalid {key}: {e}"))
        })
}

fn parse_email_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}
