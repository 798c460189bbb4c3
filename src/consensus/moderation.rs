// src/consensus/moderation.rs
use rusqlite::{Connection, TransactionBehavior};
use tracing::info;

use crate::consensus::threshold;
use crate::db::{clinics, pending, reports};
use crate::domain::{AcceptingStatus, Clinic, PendingWithClinic, ReportWithClinic};
use crate::errors::ServerError;

/// Result of a moderator approval.
#[derive(Debug, Clone)]
pub struct Approved {
    pub clinic: Clinic,
    pub previous_status: AcceptingStatus,
}

impl Approved {
    pub fn status_change(&self) -> Option<AcceptingStatus> {
        (self.clinic.accepting_status != self.previous_status)
            .then_some(self.clinic.accepting_status)
    }
}

pub fn list_pending(conn: &Connection) -> Result<Vec<PendingWithClinic>, ServerError> {
    pending::list_pending(conn)
}

/// Apply a pending status now, whatever its count.
pub fn approve(conn: &mut Connection, pending_id: i64, now: i64) -> Result<Approved, ServerError> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|e| ServerError::DbError(format!("begin tx failed: {e}")))?;

    let p = pending::require_pending(&tx, pending_id)?;
    let before = clinics::require_clinic(&tx, p.clinic_id)?;
    threshold::commit_pending(&tx, p.id, p.clinic_id, p.status, p.count, now)?;
    let clinic = clinics::require_clinic(&tx, p.clinic_id)?;

    tx.commit()
        .map_err(|e| ServerError::DbError(format!("commit tx failed: {e}")))?;

    info!(pending_id, clinic_id = p.clinic_id, status = %p.status, count = p.count, "pending update approved");
    Ok(Approved {
        clinic,
        previous_status: before.accepting_status,
    })
}

/// Drop a pending update without touching the clinic.
pub fn dismiss(conn: &Connection, pending_id: i64) -> Result<(), ServerError> {
    if !pending::delete_pending(conn, pending_id)? {
        return Err(ServerError::not_found(format!("pending update {pending_id}")));
    }
    info!(pending_id, "pending update dismissed");
    Ok(())
}

pub fn list_recent_reports(conn: &Connection) -> Result<Vec<ReportWithClinic>, ServerError> {
    reports::list_recent_reports(conn, reports::RECENT_REPORTS_LIMIT)
}

/// Hard-delete one raw report. Open tallies keep their counts.
pub fn delete_report(conn: &Connection, report_id: i64) -> Result<(), ServerError> {
    reports::delete_report(conn, report_id)?;
    info!(report_id, "report deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::intake::{submit_report, ReportInput};
    use crate::db::clinics::{insert_clinic, require_clinic};
    use crate::db::connection::test_conn;
    use crate::db::pending::{find_pending, get_pending};
    use crate::domain::{NewClinic, VerifiedBy};

    fn clinic_x(conn: &Connection) -> i64 {
        insert_clinic(
            conn,
            &NewClinic {
                name: "Clinic X".into(),
                city: "Antigonish".into(),
                ..NewClinic::default()
            },
            0,
        )
        .unwrap()
    }

    fn submit(conn: &mut Connection, clinic_id: i64, status: &str, ip: &str, threshold: i64, now: i64) -> i64 {
        let input = ReportInput {
            clinic_id,
            status,
            detail: None,
            submitter_ip: ip,
        };
        submit_report(conn, &input, threshold, now).unwrap().report_id
    }

    #[test]
    fn scenario_d_approve_at_count_one_matches_auto_apply() {
        // Auto-apply at count 2 on one clinic...
        let mut conn = test_conn();
        let auto = clinic_x(&conn);
        submit(&mut conn, auto, "accepting", "1.1.1.1", 2, 10);
        submit(&mut conn, auto, "accepting", "2.2.2.2", 2, 50);
        let auto_clinic = require_clinic(&conn, auto).unwrap();

        // ...and moderator approval at count 1 on another.
        let manual = clinic_x(&conn);
        submit(&mut conn, manual, "accepting", "1.1.1.1", 2, 10);
        let p = find_pending(&conn, manual, AcceptingStatus::Accepting).unwrap().unwrap();
        assert_eq!(p.count, 1);

        let approved = approve(&mut conn, p.id, 50).unwrap();
        let c = &approved.clinic;
        assert_eq!(c.accepting_status, auto_clinic.accepting_status);
        assert_eq!(c.status_verified_by, Some(VerifiedBy::Community));
        assert_eq!(c.status_verified_by, auto_clinic.status_verified_by);
        assert_eq!(c.status_last_updated_at, auto_clinic.status_last_updated_at);
        assert_eq!(c.community_report_count, 1);
        assert_eq!(approved.status_change(), Some(AcceptingStatus::Accepting));
        assert!(get_pending(&conn, p.id).unwrap().is_none());
    }

    #[test]
    fn dismiss_never_changes_clinic_status() {
        let mut conn = test_conn();
        let x = clinic_x(&conn);
        submit(&mut conn, x, "waitlist", "1.1.1.1", 2, 10);
        submit(&mut conn, x, "waitlist", "2.2.2.2", 2, 20);
        submit(&mut conn, x, "not_accepting", "3.3.3.3", 2, 30);
        let before = require_clinic(&conn, x).unwrap();

        let p = find_pending(&conn, x, AcceptingStatus::NotAccepting).unwrap().unwrap();
        dismiss(&conn, p.id).unwrap();

        assert_eq!(require_clinic(&conn, x).unwrap(), before);
        assert!(get_pending(&conn, p.id).unwrap().is_none());
    }

    #[test]
    fn approve_and_dismiss_are_terminal() {
        let mut conn = test_conn();
        let x = clinic_x(&conn);
        submit(&mut conn, x, "accepting", "1.1.1.1", 2, 10);
        let p = find_pending(&conn, x, AcceptingStatus::Accepting).unwrap().unwrap();

        dismiss(&conn, p.id).unwrap();
        assert!(matches!(dismiss(&conn, p.id), Err(ServerError::NotFound(_))));
        assert!(matches!(approve(&mut conn, p.id, 20), Err(ServerError::NotFound(_))));
        assert_eq!(
            require_clinic(&conn, x).unwrap().accepting_status,
            AcceptingStatus::Unknown
        );
    }

    #[test]
    fn scenario_e_deleting_a_report_keeps_the_tally() {
        // Threshold 3 so a count of 2 stays pending.
        let mut conn = test_conn();
        let x = clinic_x(&conn);
        let first = submit(&mut conn, x, "accepting", "1.1.1.1", 3, 10);
        submit(&mut conn, x, "accepting", "2.2.2.2", 3, 20);
        let p = find_pending(&conn, x, AcceptingStatus::Accepting).unwrap().unwrap();
        assert_eq!(p.count, 2);

        delete_report(&conn, first).unwrap();

        let after = get_pending(&conn, p.id).unwrap().unwrap();
        assert_eq!(after.count, 2);
        assert_eq!(after.ip_addresses.len(), 2);
        assert!(list_recent_reports(&conn).unwrap().iter().all(|r| r.report.id != first));
    }

    #[test]
    fn recent_reports_join_clinic_summary() {
        let mut conn = test_conn();
        let x = clinic_x(&conn);
        submit(&mut conn, x, "accepting", "1.1.1.1", 2, 10);
        let recent = list_recent_reports(&conn).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].clinic_name, "Clinic X");
        assert_eq!(recent[0].report.status, AcceptingStatus::Accepting);
    }

    #[test]
    fn pending_list_shows_current_status() {
        let mut conn = test_conn();
        let x = clinic_x(&conn);
        submit(&mut conn, x, "waitlist", "1.1.1.1", 2, 10);
        let rows = list_pending(&conn).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].current_status, AcceptingStatus::Unknown);
        assert_eq!(rows[0].status, AcceptingStatus::Waitlist);
    }
}
