// src/domain/pending.rs

use super::status::AcceptingStatus;

/// Ledger entry: distinct-IP tally for one (clinic, asserted status) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingUpdate {
    pub id: i64,
    pub clinic_id: i64,
    pub status: AcceptingStatus,
    pub count: i64,
    pub ip_addresses: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Ledger entry joined with a clinic summary, newest activity first.
#[derive(Debug, Clone)]
pub struct PendingWithClinic {
    pub id: i64,
    pub clinic_id: i64,
    pub status: AcceptingStatus,
    pub count: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub clinic_name: String,
    pub clinic_city: String,
    pub current_status: AcceptingStatus,
}
