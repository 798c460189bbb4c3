// src/auth/claim.rs
use rusqlite::{Connection, TransactionBehavior};
use tracing::info;

use crate::auth::magic::MagicLinkService;
use crate::auth::token;
use crate::config::Config;
use crate::db::{clinics, tokens};
use crate::domain::{
    AcceptingStatus, Clinic, ClinicPatch, StatusChange, TokenPurpose, VerificationToken,
    VerifiedBy,
};
use crate::errors::ServerError;

#[derive(Debug, Clone)]
pub struct ClaimConfig {
    pub ttl_secs: i64,
    pub verify_path: String,
}

impl Default for ClaimConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 24 * 60 * 60,
            verify_path: "/claim/verify".to_string(),
        }
    }
}

impl From<&Config> for ClaimConfig {
    fn from(cfg: &Config) -> Self {
        Self {
            ttl_secs: cfg.claim_token_ttl_secs,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct IssuedClaim {
    pub clinic: Clinic,
    pub email: String,
    pub purpose: TokenPurpose,
    /// Raw token, only ever sent by email.
    pub token: String,
    pub expires_at: i64,
    /// Relative URL like "/claim/verify?token=..."
    pub link: String,
}

/// What a verified operator may change. Empty strings clear optional contact fields.
#[derive(Debug, Clone, Default)]
pub struct OperatorEdit {
    pub status: Option<AcceptingStatus>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
}

impl OperatorEdit {
    fn to_patch(&self, now: i64) -> ClinicPatch {
        let optional = |v: &Option<String>| {
            v.as_ref().map(|s| {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            })
        };

        ClinicPatch {
            address: self.address.as_ref().map(|a| a.trim().to_string()),
            phone: optional(&self.phone),
            website: optional(&self.website),
            status: self.status.map(|status| StatusChange {
                status,
                verified_by: VerifiedBy::Clinic,
                at: now,
            }),
            ..ClinicPatch::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClaimOutcome {
    pub clinic: Clinic,
    pub previous_status: AcceptingStatus,
}

impl ClaimOutcome {
    /// The new status, if the edit actually changed it.
    pub fn status_change(&self) -> Option<AcceptingStatus> {
        (self.clinic.accepting_status != self.previous_status)
            .then_some(self.clinic.accepting_status)
    }
}

pub struct ClaimService {
    cfg: ClaimConfig,
}

impl ClaimService {
    pub fn new(cfg: ClaimConfig) -> Self {
        Self { cfg }
    }

    fn build_link(&self, token: &str) -> String {
        format!("{}?token={}", self.cfg.verify_path, token)
    }

    /// Issue a verification token for a clinic.
    ///
    /// Unclaimed clinics get a `claim` token for any address; once claimed,
    /// only the recorded claimant may request `update` tokens.
    pub fn request_claim(
        &self,
        conn: &Connection,
        clinic_id: i64,
        email: &str,
        now: i64,
    ) -> Result<IssuedClaim, ServerError> {
        let email = MagicLinkService::normalize_email(email)?;
        let clinic = clinics::require_clinic(conn, clinic_id)?;

        let purpose = if clinic.claimed_by_clinic {
            if clinic.claimed_email.as_deref() != Some(email.as_str()) {
                return Err(ServerError::Forbidden(
                    "this clinic has already been claimed by another address".into(),
                ));
            }
            TokenPurpose::Update
        } else {
            TokenPurpose::Claim
        };

        let issued = token::issue();
        let expires_at = now + self.cfg.ttl_secs;
        tokens::insert_token(conn, clinic_id, &email, &issued.hash, purpose, now, expires_at)?;

        info!(clinic_id, purpose = purpose.as_str(), "verification token issued");

        Ok(IssuedClaim {
            clinic,
            email,
            purpose,
            link: self.build_link(&issued.raw),
            token: issued.raw,
            expires_at,
        })
    }

    /// Look at a token without consuming it.
    pub fn inspect(
        &self,
        conn: &Connection,
        raw_token: &str,
        now: i64,
    ) -> Result<(VerificationToken, Clinic), ServerError> {
        let hash = hash_nonblank(raw_token)?;
        let token = tokens::find_token_by_hash(conn, &hash)?
            .ok_or_else(|| ServerError::not_found("verification link"))?;
        token.ensure_usable(now)?;
        let clinic = clinics::require_clinic(conn, token.clinic_id)?;
        Ok((token, clinic))
    }

    /// Consume the token and apply the operator's edit directly to the record.
    ///
    /// Token consumption and the edit commit together or not at all.
    pub fn complete(
        &self,
        conn: &mut Connection,
        raw_token: &str,
        edit: &OperatorEdit,
        now: i64,
    ) -> Result<ClaimOutcome, ServerError> {
        let hash = hash_nonblank(raw_token)?;

        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| ServerError::DbError(format!("begin tx failed: {e}")))?;

        let token = tokens::consume_token(&tx, &hash, now)?;
        let before = clinics::require_clinic(&tx, token.clinic_id)?;

        // Two claim tokens can be outstanding for an unclaimed clinic; first one wins.
        if before.claimed_by_clinic && before.claimed_email.as_deref() != Some(token.email.as_str())
        {
            return Err(ServerError::Forbidden(
                "this clinic has already been claimed by another address".into(),
            ));
        }

        clinics::update_clinic(&tx, token.clinic_id, &edit.to_patch(now))?;
        clinics::set_claimed(&tx, token.clinic_id, &token.email)?;
        let clinic = clinics::require_clinic(&tx, token.clinic_id)?;

        tx.commit()
            .map_err(|e| ServerError::DbError(format!("commit tx failed: {e}")))?;

        info!(
            clinic_id = clinic.id,
            purpose = token.purpose.as_str(),
            status = %clinic.accepting_status,
            "clinic edit applied by operator"
        );

        Ok(ClaimOutcome {
            clinic,
            previous_status: before.accepting_status,
        })
    }
}

fn hash_nonblank(raw_token: &str) -> Result<[u8; 32], ServerError> {
    let raw_token = raw_token.trim();
    if raw_token.is_empty() {
        return Err(ServerError::BadRequest("missing token".into()));
    }
    Ok(token::hash_token(raw_token))
}
