// src/db/tokens.rs
use rusqlite::types::{FromSqlError, Type};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::{ClaimState, TokenPurpose, VerificationToken};
use crate::errors::ServerError;

const TOKEN_COLUMNS: &str = "id, clinic_id, email, purpose, state, created_at, expires_at, used_at";

fn column_error(idx: usize, e: ServerError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(FromSqlError::Other(Box::new(e))))
}

/// Only `requested` and `verified` are ever written; `expired` is derived.
fn stored_state(raw: &str) -> Result<ClaimState, ServerError> {
    [ClaimState::Requested, ClaimState::Verified]
        .into_iter()
        .find(|s| s.as_str() == raw)
        .ok_or_else(|| ServerError::DbError(format!("unknown token state '{raw}'")))
}

fn token_from_row(r: &Row<'_>) -> rusqlite::Result<VerificationToken> {
    let purpose: String = r.get(3)?;
    let state: String = r.get(4)?;
    Ok(VerificationToken {
        id: r.get(0)?,
        clinic_id: r.get(1)?,
        email: r.get(2)?,
        purpose: purpose.parse().map_err(|e| column_error(3, e))?,
        stored_state: stored_state(&state).map_err(|e| column_error(4, e))?,
        created_at: r.get(5)?,
        expires_at: r.get(6)?,
        used_at: r.get(7)?,
    })
}

/// Insert a verification token (token_hash should be SHA-256 bytes).
pub fn insert_token(
    conn: &Connection,
    clinic_id: i64,
    email: &str,
    token_hash: &[u8],
    purpose: TokenPurpose,
    created_at: i64,
    expires_at: i64,
) -> Result<i64, ServerError> {
    conn.execute(
        "insert into verification_tokens (clinic_id, email, token_hash, purpose, state, created_at, expires_at)
         values (?, ?, ?, ?, ?, ?, ?)",
        params![
            clinic_id,
            email,
            token_hash,
            purpose.as_str(),
            ClaimState::Requested.as_str(),
            created_at,
            expires_at
        ],
    )
    .map_err(|e| ServerError::DbError(format!("insert verification token failed: {e}")))?;
    Ok(conn.last_insert_rowid())
}

pub fn find_token_by_hash(
    conn: &Connection,
    token_hash: &[u8],
) -> Result<Option<VerificationToken>, ServerError> {
    conn.query_row(
        &format!("select {TOKEN_COLUMNS} from verification_tokens where token_hash = ?"),
        params![token_hash],
        token_from_row,
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("select verification token failed: {e}")))
}

/// Move a token from `requested` to `verified`.
///
/// Must exist, be unexpired, and still be `requested`; otherwise the error
/// names which of those failed. The guarded update means only one consumer
/// can win even if two requests race.
pub fn consume_token(
    conn: &Connection,
    token_hash: &[u8],
    now: i64,
) -> Result<VerificationToken, ServerError> {
    let Some(token) = find_token_by_hash(conn, token_hash)? else {
        return Err(ServerError::not_found("verification link"));
    };

    token.ensure_usable(now)?;

    let updated = conn
        .execute(
            "update verification_tokens set state = ?, used_at = ?
             where id = ? and state = ?",
            params![
                ClaimState::Verified.as_str(),
                now,
                token.id,
                ClaimState::Requested.as_str()
            ],
        )
        .map_err(|e| ServerError::DbError(format!("update verification token failed: {e}")))?;

    if updated != 1 {
        return Err(ServerError::TokenUsed);
    }

    Ok(VerificationToken {
        stored_state: ClaimState::Verified,
        used_at: Some(now),
        ..token
    })
}
