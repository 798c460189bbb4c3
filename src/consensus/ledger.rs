// src/consensus/ledger.rs
use rusqlite::Connection;
use tracing::debug;

use crate::db::pending::{self, LedgerTally};
use crate::domain::{AcceptingStatus, PendingUpdate};
use crate::errors::ServerError;

/// Count one assertion towards the (clinic, status) tally.
///
/// Tallies are per status: an assertion of `waitlist` never touches an
/// in-flight `accepting` tally for the same clinic. A repeat from an address
/// already in the tally leaves the count alone.
pub fn record_assertion(
    conn: &Connection,
    clinic_id: i64,
    status: AcceptingStatus,
    submitter_ip: &str,
    now: i64,
) -> Result<LedgerTally, ServerError> {
    let tally = pending::upsert_pending(conn, clinic_id, status, submitter_ip, now)?;
    debug!(
        clinic_id,
        %status,
        pending_id = tally.pending_id,
        count = tally.count,
        counted = tally.counted,
        submitter_ip,
        "ledger upsert"
    );
    Ok(tally)
}

/// Every tally currently open for a clinic.
pub fn open_tallies(conn: &Connection, clinic_id: i64) -> Result<Vec<PendingUpdate>, ServerError> {
    pending::list_pending_for_clinic(conn, clinic_id)
}
