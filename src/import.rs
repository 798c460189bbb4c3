// src/import.rs
use rusqlite::{Connection, TransactionBehavior};
use serde::Deserialize;
use tracing::info;

use crate::db::clinics;
use crate::domain::{AcceptingStatus, NewClinic};
use crate::errors::ServerError;

pub const IMPORT_HEADERS: [&str; 8] = [
    "name",
    "address",
    "city",
    "province",
    "postal_code",
    "phone",
    "website",
    "accepting_status",
];

#[derive(Debug, Deserialize)]
struct ImportRow {
    name: String,
    address: String,
    city: String,
    province: String,
    postal_code: String,
    phone: Option<String>,
    website: Option<String>,
    accepting_status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub replaced: usize,
}

fn csv_error(e: csv::Error) -> ServerError {
    let line = e.position().map(|p| p.line()).unwrap_or(0);
    ServerError::validation("csv", format!("line {line}: {e}"))
}

fn parse_rows(data: &[u8]) -> Result<Vec<NewClinic>, ServerError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers = reader.headers().map_err(csv_error)?.clone();
    for wanted in IMPORT_HEADERS {
        if !headers.iter().any(|h| h == wanted) {
            return Err(ServerError::validation(
                "csv",
                format!("missing column '{wanted}'"),
            ));
        }
    }

    let mut out = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let row: ImportRow = record.deserialize(Some(&headers)).map_err(csv_error)?;

        if row.name.is_empty() {
            return Err(ServerError::validation("csv", format!("line {line}: name is empty")));
        }

        let accepting_status = match row.accepting_status.as_deref() {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<AcceptingStatus>().map_err(|_| {
                ServerError::validation(
                    "csv",
                    format!("line {line}: invalid accepting_status '{raw}'"),
                )
            })?),
        };

        out.push(NewClinic {
            name: row.name,
            address: row.address,
            city: row.city,
            province: row.province,
            postal_code: row.postal_code,
            phone: row.phone.filter(|p| !p.is_empty()),
            website: row.website.filter(|w| !w.is_empty()),
            accepting_status,
        });
    }
    Ok(out)
}

/// Replace every clinic with the rows in `data`.
///
/// The file is parsed completely before anything is deleted, and the
/// delete and inserts share one transaction.
pub fn replace_clinics(
    conn: &mut Connection,
    data: &[u8],
    now: i64,
) -> Result<ImportSummary, ServerError> {
    let rows = parse_rows(data)?;

    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|e| ServerError::DbError(format!("begin tx failed: {e}")))?;

    let replaced = clinics::delete_all_clinics(&tx)?;
    for row in &rows {
        clinics::insert_clinic(&tx, row, now)?;
    }

    tx.commit()
        .map_err(|e| ServerError::DbError(format!("commit tx failed: {e}")))?;

    info!(imported = rows.len(), replaced, "clinic import complete");
    Ok(ImportSummary {
        imported: rows.len(),
        replaced,
    })
}
