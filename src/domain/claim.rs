// src/domain/claim.rs

use std::str::FromStr;

use crate::errors::ServerError;

/// Lifecycle of one claim attempt.
///
/// `Requested` tokens become `Verified` when consumed. `Expired` is never
/// stored: it is a `Requested` token observed at or after its expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimState {
    Requested,
    Verified,
    Expired,
}

impl ClaimState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimState::Requested => "requested",
            ClaimState::Verified => "verified",
            ClaimState::Expired => "expired",
        }
    }
}

/// What a verified token lets the operator do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurpose {
    /// First claim of an unclaimed listing.
    Claim,
    /// Further edits by the operator who already claimed it.
    Update,
}

impl TokenPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenPurpose::Claim => "claim",
            TokenPurpose::Update => "update",
        }
    }
}

impl FromStr for TokenPurpose {
    type Err = ServerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "claim" => Ok(TokenPurpose::Claim),
            "update" => Ok(TokenPurpose::Update),
            other => Err(ServerError::DbError(format!("unknown token purpose '{other}'"))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct VerificationToken {
    pub id: i64,
    pub clinic_id: i64,
    pub email: String,
    pub purpose: TokenPurpose,
    /// Stored state: only `Requested` or `Verified`.
    pub stored_state: ClaimState,
    pub created_at: i64,
    pub expires_at: i64,
    pub used_at: Option<i64>,
}

impl VerificationToken {
    pub fn used(&self) -> bool {
        self.stored_state == ClaimState::Verified
    }

    pub fn state(&self, now: i64) -> ClaimState {
        match self.stored_state {
            ClaimState::Requested if self.expires_at <= now => ClaimState::Expired,
            s => s,
        }
    }

    /// Fails with the error matching the token's state unless it can be honored.
    pub fn ensure_usable(&self, now: i64) -> Result<(), ServerError> {
        match self.state(now) {
            ClaimState::Requested => Ok(()),
            ClaimState::Verified => Err(ServerError::TokenUsed),
            ClaimState::Expired => Err(ServerError::TokenExpired),
        }
    }
}
