// src/db/clinics.rs
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use crate::domain::{AcceptingStatus, Clinic, ClinicPatch, NewClinic, VerifiedBy};
use crate::errors::ServerError;

pub const SEARCH_LIMIT: i64 = 100;

const CLINIC_COLUMNS: &str = "id, name, address, city, province, postal_code, phone, website, \
     accepting_status, status_last_updated_at, status_verified_by, community_report_count, \
     claimed_by_clinic, claimed_email, created_at";

fn clinic_from_row(r: &Row<'_>) -> rusqlite::Result<Clinic> {
    Ok(Clinic {
        id: r.get(0)?,
        name: r.get(1)?,
        address: r.get(2)?,
        city: r.get(3)?,
        province: r.get(4)?,
        postal_code: r.get(5)?,
        phone: r.get(6)?,
        website: r.get(7)?,
        accepting_status: r.get(8)?,
        status_last_updated_at: r.get(9)?,
        status_verified_by: r.get(10)?,
        community_report_count: r.get(11)?,
        claimed_by_clinic: r.get(12)?,
        claimed_email: r.get(13)?,
        created_at: r.get(14)?,
    })
}

/// Insert a clinic. A known status is attributed to the community at `now`;
/// a missing or `unknown` status carries no provenance.
pub fn insert_clinic(conn: &Connection, c: &NewClinic, now: i64) -> Result<i64, ServerError> {
    let name = c.name.trim();
    if name.is_empty() {
        return Err(ServerError::validation("name", "must not be empty"));
    }

    let status = c.accepting_status.unwrap_or(AcceptingStatus::Unknown);
    let (updated_at, verified_by) = match status {
        AcceptingStatus::Unknown => (None, None),
        _ => (Some(now), Some(VerifiedBy::Community)),
    };

    conn.execute(
        r#"
        insert into clinics (name, address, city, province, postal_code, phone, website,
                             accepting_status, status_last_updated_at, status_verified_by, created_at)
        values (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
        params![
            name,
            c.address.trim(),
            c.city.trim(),
            c.province.trim(),
            c.postal_code.trim(),
            c.phone,
            c.website,
            status,
            updated_at,
            verified_by,
            now
        ],
    )
    .map_err(|e| ServerError::DbError(format!("insert clinic failed: {e}")))?;

    Ok(conn.last_insert_rowid())
}

pub fn get_clinic(conn: &Connection, id: i64) -> Result<Option<Clinic>, ServerError> {
    conn.query_row(
        &format!("select {CLINIC_COLUMNS} from clinics where id = ?"),
        params![id],
        clinic_from_row,
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("select clinic failed: {e}")))
}

pub fn require_clinic(conn: &Connection, id: i64) -> Result<Clinic, ServerError> {
    get_clinic(conn, id)?.ok_or_else(|| ServerError::not_found(format!("clinic {id}")))
}

/// `%`, `_` and the escape char itself match literally.
fn like_escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Sort key for `accepting_status`, ranked by `AcceptingStatus::sort_rank`.
fn status_rank_sql() -> String {
    let arms: String = AcceptingStatus::ALL
        .iter()
        .map(|s| format!(" when '{}' then {}", s.as_str(), s.sort_rank()))
        .collect();
    format!("case accepting_status{arms} else {} end", AcceptingStatus::ALL.len())
}

/// Free-text search over name, city and postal code.
/// Accepting clinics first, then most recently updated, then by name.
pub fn search_clinics(
    conn: &Connection,
    query: &str,
    status: Option<AcceptingStatus>,
    limit: i64,
) -> Result<Vec<Clinic>, ServerError> {
    let needle = like_escape(&query.trim().to_lowercase());
    let pattern = format!("%{needle}%");
    let compact_pattern = format!("%{}%", needle.replace(' ', ""));
    let rank = status_rank_sql();

    let sql = format!(
        r#"
        select {CLINIC_COLUMNS}
        from clinics
        where (lower(name) like ?1 escape '\'
               or lower(city) like ?1 escape '\'
               or replace(lower(postal_code), ' ', '') like ?2 escape '\')
          and (?3 is null or accepting_status = ?3)
        order by
          {rank},
          coalesce(status_last_updated_at, 0) desc,
          name asc
        limit ?4
        "#
    );

    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| ServerError::DbError(format!("prepare search failed: {e}")))?;

    let rows = stmt
        .query_map(
            params![pattern, compact_pattern, status, limit],
            clinic_from_row,
        )
        .map_err(|e| ServerError::DbError(format!("search clinics failed: {e}")))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
    }
    Ok(out)
}

/// Plain field-level patch with no concurrency token: last writer wins.
pub fn update_clinic(conn: &Connection, id: i64, patch: &ClinicPatch) -> Result<(), ServerError> {
    if patch.is_empty() {
        require_clinic(conn, id)?;
        return Ok(());
    }

    let mut sets: Vec<&str> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    for (col, field) in [
        ("name = ?", &patch.name),
        ("address = ?", &patch.address),
        ("city = ?", &patch.city),
        ("province = ?", &patch.province),
        ("postal_code = ?", &patch.postal_code),
    ] {
        if let Some(v) = field {
            sets.push(col);
            values.push(Value::Text(v.trim().to_string()));
        }
    }

    for (col, field) in [("phone = ?", &patch.phone), ("website = ?", &patch.website)] {
        if let Some(v) = field {
            sets.push(col);
            values.push(match v {
                Some(s) => Value::Text(s.trim().to_string()),
                None => Value::Null,
            });
        }
    }

    if let Some(change) = &patch.status {
        sets.push("accepting_status = ?");
        values.push(Value::Text(change.status.as_str().to_string()));
        sets.push("status_last_updated_at = ?");
        values.push(Value::Integer(change.at));
        sets.push("status_verified_by = ?");
        values.push(Value::Text(change.verified_by.as_str().to_string()));
    }

    values.push(Value::Integer(id));
    let sql = format!("update clinics set {} where id = ?", sets.join(", "));

    let updated = conn
        .execute(&sql, params_from_iter(values.iter()))
        .map_err(|e| ServerError::DbError(format!("update clinic failed: {e}")))?;

    if updated == 0 {
        return Err(ServerError::not_found(format!("clinic {id}")));
    }
    Ok(())
}

/// The one mutation used to apply a community-backed status.
pub fn commit_status(
    conn: &Connection,
    clinic_id: i64,
    status: AcceptingStatus,
    report_count: i64,
    now: i64,
) -> Result<(), ServerError> {
    let updated = conn
        .execute(
            r#"
            update clinics
            set accepting_status = ?,
                status_last_updated_at = ?,
                status_verified_by = 'community',
                community_report_count = ?
            where id = ?
            "#,
            params![status, now, report_count, clinic_id],
        )
        .map_err(|e| ServerError::DbError(format!("commit clinic status failed: {e}")))?;

    if updated == 0 {
        return Err(ServerError::not_found(format!("clinic {clinic_id}")));
    }
    Ok(())
}

pub fn set_claimed(conn: &Connection, clinic_id: i64, email: &str) -> Result<(), ServerError> {
    conn.execute(
        "update clinics set claimed_by_clinic = 1, claimed_email = ? where id = ?",
        params![email, clinic_id],
    )
    .map_err(|e| ServerError::DbError(format!("mark clinic claimed failed: {e}")))?;
    Ok(())
}

/// Removes every clinic; reports, ledger rows, tokens and clinic alerts cascade.
pub fn delete_all_clinics(conn: &Connection) -> Result<usize, ServerError> {
    conn.execute("delete from clinics", [])
        .map_err(|e| ServerError::DbError(format!("delete clinics failed: {e}")))
}

pub fn count_clinics(conn: &Connection) -> Result<i64, ServerError> {
    conn.query_row("select count(*) from clinics", [], |r| r.get(0))
        .map_err(|e| ServerError::DbError(format!("count clinics failed: {e}")))
}
