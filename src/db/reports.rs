// src/db/reports.rs
use rusqlite::{params, Connection};

use crate::domain::{AcceptingStatus, ReportWithClinic, StatusReport};
use crate::errors::ServerError;

pub const RECENT_REPORTS_LIMIT: i64 = 50;

/// Append one raw report. Rows are never updated afterwards.
pub fn insert_report(
    conn: &Connection,
    clinic_id: i64,
    status: AcceptingStatus,
    detail: Option<&str>,
    submitter_ip: &str,
    now: i64,
) -> Result<i64, ServerError> {
    conn.execute(
        "insert into status_reports (clinic_id, status, detail, submitter_ip, created_at)
         values (?, ?, ?, ?, ?)",
        params![clinic_id, status, detail, submitter_ip, now],
    )
    .map_err(|e| ServerError::DbError(format!("insert report failed: {e}")))?;
    Ok(conn.last_insert_rowid())
}

/// Most recent reports across all clinics, newest first.
pub fn list_recent_reports(
    conn: &Connection,
    limit: i64,
) -> Result<Vec<ReportWithClinic>, ServerError> {
    let mut stmt = conn
        .prepare(
            r#"
            select r.id, r.clinic_id, r.status, r.detail, r.submitter_ip, r.created_at,
                   c.name, c.city, c.accepting_status
            from status_reports r
            join clinics c on c.id = r.clinic_id
            order by r.created_at desc, r.id desc
            limit ?
            "#,
        )
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let rows = stmt
        .query_map(params![limit], |row| {
            Ok(ReportWithClinic {
                report: StatusReport {
                    id: row.get(0)?,
                    clinic_id: row.get(1)?,
                    status: row.get(2)?,
                    detail: row.get(3)?,
                    submitter_ip: row.get(4)?,
                    created_at: row.get(5)?,
                },
                clinic_name: row.get(6)?,
                clinic_city: row.get(7)?,
                clinic_status: row.get(8)?,
            })
        })
        .map_err(|e| ServerError::DbError(format!("list reports failed: {e}")))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
    }
    Ok(out)
}

pub fn list_reports_for_clinic(
    conn: &Connection,
    clinic_id: i64,
    limit: i64,
) -> Result<Vec<StatusReport>, ServerError> {
    let mut stmt = conn
        .prepare(
            "select id, clinic_id, status, detail, submitter_ip, created_at
             from status_reports
             where clinic_id = ?
             order by created_at desc, id desc
             limit ?",
        )
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let rows = stmt
        .query_map(params![clinic_id, limit], |row| {
            Ok(StatusReport {
                id: row.get(0)?,
                clinic_id: row.get(1)?,
                status: row.get(2)?,
                detail: row.get(3)?,
                submitter_ip: row.get(4)?,
                created_at: row.get(5)?,
            })
        })
        .map_err(|e| ServerError::DbError(format!("list clinic reports failed: {e}")))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
    }
    Ok(out)
}

pub fn count_reports_for_clinic(conn: &Connection, clinic_id: i64) -> Result<i64, ServerError> {
    conn.query_row(
        "select count(*) from status_reports where clinic_id = ?",
        params![clinic_id],
        |r| r.get(0),
    )
    .map_err(|e| ServerError::DbError(format!("count reports failed: {e}")))
}

/// Hard-delete one report. Ledger tallies are left as they are.
pub fn delete_report(conn: &Connection, report_id: i64) -> Result<(), ServerError> {
    let deleted = conn
        .execute("delete from status_reports where id = ?", params![report_id])
        .map_err(|e| ServerError::DbError(format!("delete report failed: {e}")))?;

    if deleted == 0 {
        return Err(ServerError::not_found(format!("report {report_id}")));
    }
    Ok(())
}
