// src/consensus/threshold.rs
use rusqlite::Connection;
use tracing::info;

use crate::db::{clinics, pending};
use crate::domain::AcceptingStatus;
use crate::errors::ServerError;

/// Distinct-address reports needed before a status applies on its own.
pub const DEFAULT_THRESHOLD: i64 = 2;

/// Commit a community-backed status and consume its ledger row.
///
/// Shared by auto-apply and moderator approval so both produce the same
/// record mutation. Callers run it inside their transaction.
pub fn commit_pending(
    conn: &Connection,
    pending_id: i64,
    clinic_id: i64,
    status: AcceptingStatus,
    count: i64,
    now: i64,
) -> Result<(), ServerError> {
    clinics::commit_status(conn, clinic_id, status, count, now)?;
    pending::delete_pending(conn, pending_id)?;
    info!(clinic_id, pending_id, %status, count, "status committed");
    Ok(())
}

/// Apply the status when the tally has reached `threshold`. Returns whether it did.
pub fn apply_if_reached(
    conn: &Connection,
    tally: &pending::LedgerTally,
    clinic_id: i64,
    status: AcceptingStatus,
    threshold: i64,
    now: i64,
) -> Result<bool, ServerError> {
    if tally.count < threshold {
        return Ok(false);
    }
    commit_pending(conn, tally.pending_id, clinic_id, status, tally.count, now)?;
    Ok(true)
}
