// src/auth/magic.rs
use crate::errors::ServerError;
use rusqlite::Connection;
use tracing::info;

use crate::auth::token;
use crate::config::Config;
use crate::db::auth as db_auth;
use crate::db::plans;

#[derive(Debug, Clone)]
pub struct MagicLinkConfig {
    /// TTL for sign-in links in seconds.
    pub ttl_secs: i64,
    /// Relative path used when building links.
    pub magic_path: String,
    /// Plan every new account starts on.
    pub default_plan_code: String,
    /// Accounts promoted to moderator when they sign in.
    pub moderator_emails: Vec<String>,
}

impl Default for MagicLinkConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 15 * 60,
            magic_path: "/auth/magic".to_string(),
            default_plan_code: plans::DEFAULT_PLAN.to_string(),
            moderator_emails: Vec::new(),
        }
    }
}

impl From<&Config> for MagicLinkConfig {
    fn from(cfg: &Config) -> Self {
        Self {
            ttl_secs: cfg.signin_link_ttl_secs,
            moderator_emails: cfg.moderator_emails.clone(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct IssuedMagicLink {
    pub email: String,
    pub user_id: i64,
    /// Raw token (never store this in DB).
    pub token: String,
    pub expires_at: i64,
    /// Relative URL like "/auth/magic?token=..."
    pub link: String,
}

#[derive(Debug, Clone)]
pub struct RedeemedMagicLink {
    pub user_id: i64,
    pub email: String,
    pub is_moderator: bool,
}

pub struct MagicLinkService {
    cfg: MagicLinkConfig,
}

impl MagicLinkService {
    pub fn new(cfg: MagicLinkConfig) -> Self {
        Self { cfg }
    }

    /// Trim + lowercase, minimal sanity check.
    pub fn normalize_email(email: &str) -> Result<String, ServerError> {
        let e = email.trim().to_lowercase();
        if e.is_empty() || !e.contains('@') || e.starts_with('@') || e.ends_with('@') {
            return Err(ServerError::validation("email", "enter a valid email address"));
        }
        Ok(e)
    }

    fn build_link(&self, token: &str) -> String {
        format!("{}?token={}", self.cfg.magic_path, token)
    }

    /// Request a sign-in link (signup + login unified):
    /// creates the user on first use, gives them the default plan,
    /// and stores only the token hash.
    pub fn request_link(
        &self,
        conn: &Connection,
        email: &str,
        now: i64,
    ) -> Result<IssuedMagicLink, ServerError> {
        let email = Self::normalize_email(email)?;
        let user_id = db_auth::get_or_create_user(conn, &email, now)?;
        plans::ensure_entitlement(conn, user_id, &self.cfg.default_plan_code, now)?;

        let issued = token::issue();
        let expires_at = now + self.cfg.ttl_secs;
        db_auth::insert_magic_link(conn, user_id, &issued.hash, now, expires_at)?;

        Ok(IssuedMagicLink {
            email,
            user_id,
            link: self.build_link(&issued.raw),
            token: issued.raw,
            expires_at,
        })
    }

    /// Redeem a sign-in link (single-use), promoting configured moderators.
    pub fn redeem(
        &self,
        conn: &mut Connection,
        raw_token: &str,
        now: i64,
    ) -> Result<RedeemedMagicLink, ServerError> {
        let raw_token = raw_token.trim();
        if raw_token.is_empty() {
            return Err(ServerError::BadRequest("missing token".into()));
        }

        let token_hash = token::hash_token(raw_token);
        let Some(user_id) = db_auth::consume_magic_link(conn, &token_hash, now)? else {
            return Err(ServerError::Unauthorized("invalid or expired link".into()));
        };

        db_auth::touch_last_login(conn, user_id, now)?;

        let user = db_auth::get_user(conn, user_id)?
            .ok_or_else(|| ServerError::not_found(format!("user {user_id}")))?;

        let mut is_moderator = user.is_moderator;
        if !is_moderator && self.cfg.moderator_emails.iter().any(|m| *m == user.email) {
            db_auth::set_moderator(conn, user_id, true)?;
            info!(user_id, "promoted configured moderator");
            is_moderator = true;
        }

        Ok(RedeemedMagicLink {
            user_id,
            email: user.email,
            is_moderator,
        })
    }
}
