// src/db/alerts.rs
use rusqlite::{params, Connection, Row};

use crate::domain::{AcceptingStatus, Clinic};
use crate::errors::ServerError;

#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub id: i64,
    pub user_id: i64,
    pub clinic_id: Option<i64>,
    pub city: Option<String>,
    pub status: AcceptingStatus,
    pub created_at: i64,
}

/// An alert that fired, with where to send it.
#[derive(Debug, Clone)]
pub struct AlertMatch {
    pub alert_id: i64,
    pub email: String,
}

fn alert_from_row(r: &Row<'_>) -> rusqlite::Result<Alert> {
    Ok(Alert {
        id: r.get(0)?,
        user_id: r.get(1)?,
        clinic_id: r.get(2)?,
        city: r.get(3)?,
        status: r.get(4)?,
        created_at: r.get(5)?,
    })
}

pub fn insert_alert(
    conn: &Connection,
    user_id: i64,
    clinic_id: Option<i64>,
    city: Option<&str>,
    status: AcceptingStatus,
    now: i64,
) -> Result<i64, ServerError> {
    conn.execute(
        "insert into alerts (user_id, clinic_id, city, status, created_at) values (?, ?, ?, ?, ?)",
        params![user_id, clinic_id, city, status, now],
    )
    .map_err(|e| ServerError::DbError(format!("insert alert failed: {e}")))?;
    Ok(conn.last_insert_rowid())
}

pub fn list_alerts_for_user(conn: &Connection, user_id: i64) -> Result<Vec<Alert>, ServerError> {
    let mut stmt = conn
        .prepare(
            "select id, user_id, clinic_id, city, status, created_at
             from alerts where user_id = ? order by created_at desc, id desc",
        )
        .map_err(|e| ServerError::DbError(e.to_string()))?;
    let rows = stmt
        .query_map(params![user_id], alert_from_row)
        .map_err(|e| ServerError::DbError(format!("list alerts failed: {e}")))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
    }
    Ok(out)
}

pub fn count_alerts_for_user(conn: &Connection, user_id: i64) -> Result<i64, ServerError> {
    conn.query_row(
        "select count(*) from alerts where user_id = ?",
        params![user_id],
        |r| r.get(0),
    )
    .map_err(|e| ServerError::DbError(format!("count alerts failed: {e}")))
}

/// Owner-scoped delete; another user's alert looks the same as a missing one.
pub fn delete_alert(conn: &Connection, user_id: i64, alert_id: i64) -> Result<(), ServerError> {
    let deleted = conn
        .execute(
            "delete from alerts where id = ? and user_id = ?",
            params![alert_id, user_id],
        )
        .map_err(|e| ServerError::DbError(format!("delete alert failed: {e}")))?;

    if deleted == 0 {
        return Err(ServerError::not_found(format!("alert {alert_id}")));
    }
    Ok(())
}

/// Alerts watching for `status` on this clinic, either directly or by city.
/// An alert with neither clinic nor city matches every clinic.
pub fn matching_alerts(
    conn: &Connection,
    clinic: &Clinic,
    status: AcceptingStatus,
) -> Result<Vec<AlertMatch>, ServerError> {
    let mut stmt = conn
        .prepare(
            r#"
            select a.id, u.email
            from alerts a
            join users u on u.id = a.user_id
            where a.status = ?1
              and (a.clinic_id is null or a.clinic_id = ?2)
              and (a.city is null or lower(a.city) = lower(?3))
            order by a.id
            "#,
        )
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let rows = stmt
        .query_map(params![status, clinic.id, clinic.city], |r| {
            Ok(AlertMatch {
                alert_id: r.get(0)?,
                email: r.get(1)?,
            })
        })
        .map_err(|e| ServerError::DbError(format!("match alerts failed: {e}")))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
    }
    Ok(out)
}
