// src/consensus/intake.rs
use rusqlite::{Connection, TransactionBehavior};
use tracing::{debug, info};

use crate::consensus::{ledger, threshold};
use crate::db::{clinics, reports};
use crate::domain::report::MAX_DETAIL_LEN;
use crate::domain::AcceptingStatus;
use crate::errors::ServerError;

/// A status report as it arrives from the form.
#[derive(Debug, Clone)]
pub struct ReportInput<'a> {
    pub clinic_id: i64,
    pub status: &'a str,
    pub detail: Option<&'a str>,
    pub submitter_ip: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntakeOutcome {
    pub report_id: i64,
    pub clinic_id: i64,
    pub status: AcceptingStatus,
    pub previous_status: AcceptingStatus,
    /// Tally after this report; the committed count when `applied`.
    pub count: i64,
    pub threshold: i64,
    pub applied: bool,
}

impl IntakeOutcome {
    pub fn message(&self) -> String {
        if self.applied {
            format!("Status updated to {}.", self.status.label())
        } else {
            format!(
                "Thanks, {} of {} reports needed to update this listing.",
                self.count, self.threshold
            )
        }
    }

    /// The new status when this report actually changed the listing.
    pub fn status_change(&self) -> Option<AcceptingStatus> {
        (self.applied && self.status != self.previous_status).then_some(self.status)
    }
}

/// Validates form input before anything is written.
fn parse_input(input: &ReportInput<'_>) -> Result<(AcceptingStatus, Option<String>), ServerError> {
    let status: AcceptingStatus = input.status.parse()?;

    let detail = input
        .detail
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string);
    if let Some(d) = &detail {
        if d.chars().count() > MAX_DETAIL_LEN {
            return Err(ServerError::validation(
                "detail",
                format!("must be at most {MAX_DETAIL_LEN} characters"),
            ));
        }
    }

    if input.submitter_ip.trim().is_empty() {
        return Err(ServerError::BadRequest("missing submitter address".into()));
    }

    Ok((status, detail))
}

/// Record a report, count it in the ledger and apply the status if the
/// tally reaches `threshold`.
///
/// Everything happens in one immediate transaction so concurrent reports
/// are serialized and no increment is lost.
pub fn submit_report(
    conn: &mut Connection,
    input: &ReportInput<'_>,
    threshold: i64,
    now: i64,
) -> Result<IntakeOutcome, ServerError> {
    let (status, detail) = parse_input(input)?;
    let ip = input.submitter_ip.trim();

    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|e| ServerError::DbError(format!("begin tx failed: {e}")))?;

    let clinic = clinics::require_clinic(&tx, input.clinic_id)?;
    let report_id = reports::insert_report(&tx, clinic.id, status, detail.as_deref(), ip, now)?;
    let tally = ledger::record_assertion(&tx, clinic.id, status, ip, now)?;
    let applied = threshold::apply_if_reached(&tx, &tally, clinic.id, status, threshold, now)?;

    tx.commit()
        .map_err(|e| ServerError::DbError(format!("commit tx failed: {e}")))?;

    if applied {
        info!(clinic_id = clinic.id, %status, count = tally.count, "report reached threshold");
    } else {
        debug!(clinic_id = clinic.id, %status, count = tally.count, threshold, "report recorded");
    }

    Ok(IntakeOutcome {
        report_id,
        clinic_id: clinic.id,
        status,
        previous_status: clinic.accepting_status,
        count: tally.count,
        threshold,
        applied,
    })
}
