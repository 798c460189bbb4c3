// src/domain/status.rs

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ServerError;

/// Whether a clinic is taking new patients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcceptingStatus {
    Accepting,
    NotAccepting,
    Waitlist,
    Unknown,
}

impl AcceptingStatus {
    pub const ALL: [AcceptingStatus; 4] = [
        AcceptingStatus::Accepting,
        AcceptingStatus::Waitlist,
        AcceptingStatus::NotAccepting,
        AcceptingStatus::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AcceptingStatus::Accepting => "accepting",
            AcceptingStatus::NotAccepting => "not_accepting",
            AcceptingStatus::Waitlist => "waitlist",
            AcceptingStatus::Unknown => "unknown",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AcceptingStatus::Accepting => "Accepting patients",
            AcceptingStatus::NotAccepting => "Not accepting",
            AcceptingStatus::Waitlist => "Waitlist",
            AcceptingStatus::Unknown => "Unknown",
        }
    }

    /// Search ordering: the statuses a patient is looking for come first.
    pub fn sort_rank(&self) -> u8 {
        match self {
            AcceptingStatus::Accepting => 0,
            AcceptingStatus::Waitlist => 1,
            AcceptingStatus::Unknown => 2,
            AcceptingStatus::NotAccepting => 3,
        }
    }
}

impl fmt::Display for AcceptingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AcceptingStatus {
    type Err = ServerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "accepting" => Ok(AcceptingStatus::Accepting),
            "not_accepting" => Ok(AcceptingStatus::NotAccepting),
            "waitlist" => Ok(AcceptingStatus::Waitlist),
            "unknown" => Ok(AcceptingStatus::Unknown),
            other => Err(ServerError::validation(
                "status",
                format!("unknown value '{other}'"),
            )),
        }
    }
}

impl ToSql for AcceptingStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for AcceptingStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: ServerError| FromSqlError::Other(Box::new(e)))
    }
}

/// Who stands behind the clinic's current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifiedBy {
    Clinic,
    Community,
}

impl VerifiedBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerifiedBy::Clinic => "clinic",
            VerifiedBy::Community => "community",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            VerifiedBy::Clinic => "Verified by clinic",
            VerifiedBy::Community => "Community reported",
        }
    }
}

impl FromStr for VerifiedBy {
    type Err = ServerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clinic" => Ok(VerifiedBy::Clinic),
            "community" => Ok(VerifiedBy::Community),
            other => Err(ServerError::validation(
                "status_verified_by",
                format!("unknown value '{other}'"),
            )),
        }
    }
}

impl ToSql for VerifiedBy {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for VerifiedBy {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: ServerError| FromSqlError::Other(Box::new(e)))
    }
}
