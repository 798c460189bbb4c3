// src/db/pending.rs
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::{AcceptingStatus, PendingUpdate, PendingWithClinic};
use crate::errors::ServerError;

/// Outcome of one ledger upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerTally {
    pub pending_id: i64,
    pub count: i64,
    /// False when the submitter's IP was already part of the tally.
    pub counted: bool,
}

/// Create-or-increment the ledger row for (clinic, status), keyed by distinct IP.
///
/// Each statement is a single conditional write, and callers run this inside
/// an immediate transaction, so concurrent reports cannot lose an increment.
pub fn upsert_pending(
    conn: &Connection,
    clinic_id: i64,
    status: AcceptingStatus,
    submitter_ip: &str,
    now: i64,
) -> Result<LedgerTally, ServerError> {
    conn.execute(
        r#"
        insert into pending_updates (clinic_id, status, count, created_at, updated_at)
        values (?, ?, 0, ?, ?)
        on conflict(clinic_id, status) do nothing
        "#,
        params![clinic_id, status, now, now],
    )
    .map_err(|e| ServerError::DbError(format!("insert pending update failed: {e}")))?;

    let pending_id: i64 = conn
        .query_row(
            "select id from pending_updates where clinic_id = ? and status = ?",
            params![clinic_id, status],
            |r| r.get(0),
        )
        .map_err(|e| ServerError::DbError(format!("select pending update failed: {e}")))?;

    let new_ip = conn
        .execute(
            "insert or ignore into pending_update_ips (pending_update_id, ip_address) values (?, ?)",
            params![pending_id, submitter_ip],
        )
        .map_err(|e| ServerError::DbError(format!("insert pending ip failed: {e}")))?
        == 1;

    let count: i64 = if new_ip {
        conn.query_row(
            "update pending_updates set count = count + 1, updated_at = ? where id = ? returning count",
            params![now, pending_id],
            |r| r.get(0),
        )
        .map_err(|e| ServerError::DbError(format!("increment pending update failed: {e}")))?
    } else {
        conn.query_row(
            "select count from pending_updates where id = ?",
            params![pending_id],
            |r| r.get(0),
        )
        .map_err(|e| ServerError::DbError(format!("select pending count failed: {e}")))?
    };

    Ok(LedgerTally {
        pending_id,
        count,
        counted: new_ip,
    })
}

fn pending_from_row(r: &Row<'_>) -> rusqlite::Result<PendingUpdate> {
    Ok(PendingUpdate {
        id: r.get(0)?,
        clinic_id: r.get(1)?,
        status: r.get(2)?,
        count: r.get(3)?,
        ip_addresses: Vec::new(),
        created_at: r.get(4)?,
        updated_at: r.get(5)?,
    })
}

fn load_ips(conn: &Connection, pending_id: i64) -> Result<Vec<String>, ServerError> {
    let mut stmt = conn
        .prepare(
            "select ip_address from pending_update_ips where pending_update_id = ? order by ip_address",
        )
        .map_err(|e| ServerError::DbError(e.to_string()))?;
    let rows = stmt
        .query_map(params![pending_id], |r| r.get::<_, String>(0))
        .map_err(|e| ServerError::DbError(format!("select pending ips failed: {e}")))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
    }
    Ok(out)
}

pub fn get_pending(conn: &Connection, id: i64) -> Result<Option<PendingUpdate>, ServerError> {
    let row = conn
        .query_row(
            "select id, clinic_id, status, count, created_at, updated_at
             from pending_updates where id = ?",
            params![id],
            pending_from_row,
        )
        .optional()
        .map_err(|e| ServerError::DbError(format!("select pending update failed: {e}")))?;

    match row {
        Some(mut p) => {
            p.ip_addresses = load_ips(conn, p.id)?;
            Ok(Some(p))
        }
        None => Ok(None),
    }
}

pub fn require_pending(conn: &Connection, id: i64) -> Result<PendingUpdate, ServerError> {
    get_pending(conn, id)?.ok_or_else(|| ServerError::not_found(format!("pending update {id}")))
}

pub fn find_pending(
    conn: &Connection,
    clinic_id: i64,
    status: AcceptingStatus,
) -> Result<Option<PendingUpdate>, ServerError> {
    let id: Option<i64> = conn
        .query_row(
            "select id from pending_updates where clinic_id = ? and status = ?",
            params![clinic_id, status],
            |r| r.get(0),
        )
        .optional()
        .map_err(|e| ServerError::DbError(format!("find pending update failed: {e}")))?;

    match id {
        Some(id) => get_pending(conn, id),
        None => Ok(None),
    }
}

/// All ledger rows for one clinic (one per asserted status in flight).
pub fn list_pending_for_clinic(
    conn: &Connection,
    clinic_id: i64,
) -> Result<Vec<PendingUpdate>, ServerError> {
    let mut stmt = conn
        .prepare(
            "select id, clinic_id, status, count, created_at, updated_at
             from pending_updates where clinic_id = ?
             order by count desc, updated_at desc",
        )
        .map_err(|e| ServerError::DbError(e.to_string()))?;
    let rows = stmt
        .query_map(params![clinic_id], pending_from_row)
        .map_err(|e| ServerError::DbError(format!("list clinic pending failed: {e}")))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
    }
    Ok(out)
}

/// Every ledger row joined with its clinic, most recently updated first.
pub fn list_pending(conn: &Connection) -> Result<Vec<PendingWithClinic>, ServerError> {
    let mut stmt = conn
        .prepare(
            r#"
            select p.id, p.clinic_id, p.status, p.count, p.created_at, p.updated_at,
                   c.name, c.city, c.accepting_status
            from pending_updates p
            join clinics c on c.id = p.clinic_id
            order by p.updated_at desc, p.id desc
            "#,
        )
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let rows = stmt
        .query_map([], |r| {
            Ok(PendingWithClinic {
                id: r.get(0)?,
                clinic_id: r.get(1)?,
                status: r.get(2)?,
                count: r.get(3)?,
                created_at: r.get(4)?,
                updated_at: r.get(5)?,
                clinic_name: r.get(6)?,
                clinic_city: r.get(7)?,
                current_status: r.get(8)?,
            })
        })
        .map_err(|e| ServerError::DbError(format!("list pending failed: {e}")))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
    }
    Ok(out)
}

/// Delete a ledger row (its IP set cascades). Returns false if it was already gone.
pub fn delete_pending(conn: &Connection, id: i64) -> Result<bool, ServerError> {
    let deleted = conn
        .execute("delete from pending_updates where id = ?", params![id])
        .map_err(|e| ServerError::DbError(format!("delete pending update failed: {e}")))?;
    Ok(deleted == 1)
}
