// src/auth/sessions.rs
use crate::auth::token;
use crate::errors::ServerError;
use rusqlite::{params, Connection, OptionalExtension};

pub const SESSION_COOKIE: &str = "session";

/// The signed-in principal behind a request.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionUser {
    pub id: i64,
    pub email: String,
    pub is_moderator: bool,
}

pub fn create_session(
    conn: &Connection,
    user_id: i64,
    now: i64,
    ttl_secs: i64,
) -> Result<String, ServerError> {
    let issued = token::issue();

    conn.execute(
        r#"
        insert into sessions (user_id, token_hash, created_at, expires_at)
        values (?, ?, ?, ?)
        "#,
        params![user_id, issued.hash.as_slice(), now, now + ttl_secs],
    )
    .map_err(|e| ServerError::DbError(format!("create session failed: {e}")))?;

    Ok(issued.raw)
}

pub fn load_user_from_session(
    conn: &Connection,
    raw_token: &str,
    now: i64,
) -> Result<Option<SessionUser>, ServerError> {
    let hash = token::hash_token(raw_token);

    conn.query_row(
        r#"
        select u.id, u.email, u.is_moderator
        from sessions s
        join users u on u.id = s.user_id
        where s.token_hash = ?
          and s.expires_at > ?
          and s.revoked_at is null
        "#,
        params![hash.as_slice(), now],
        |row| {
            Ok(SessionUser {
                id: row.get(0)?,
                email: row.get(1)?,
                is_moderator: row.get(2)?,
            })
        },
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("session lookup failed: {e}")))
}

pub fn revoke_session(conn: &Connection, raw_token: &str, now: i64) -> Result<(), ServerError> {
    let hash = token::hash_token(raw_token);
    conn.execute(
        "update sessions set revoked_at = ? where token_hash = ? and revoked_at is null",
        params![now, hash.as_slice()],
    )
    .map_err(|e| ServerError::DbError(format!("revoke session failed: {e}")))?;
    Ok(())
}

/// Pull the session token out of a raw `Cookie` header.
pub fn session_token_from_cookie(header: &str) -> Option<&str> {
    header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE && !value.is_empty()).then_some(value)
    })
}

pub fn session_cookie(raw_token: &str, ttl_secs: i64) -> String {
    format!("{SESSION_COOKIE}={raw_token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl_secs}")
}

pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

pub fn require_user(user: Option<SessionUser>) -> Result<SessionUser, ServerError> {
    user.ok_or_else(|| ServerError::Unauthorized("please sign in".into()))
}

/// The moderation console capability check.
pub fn require_moderator(user: Option<SessionUser>) -> Result<SessionUser, ServerError> {
    let user = require_user(user)?;
    if !user.is_moderator {
        return Err(ServerError::Forbidden("moderator access required".into()));
    }
    Ok(user)
}
