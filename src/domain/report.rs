// src/domain/report.rs

use super::status::AcceptingStatus;

pub const MAX_DETAIL_LEN: usize = 500;

/// One community assertion about a clinic. Never mutated once stored.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub id: i64,
    pub clinic_id: i64,
    pub status: AcceptingStatus,
    pub detail: Option<String>,
    /// Kept for abuse detection only; never rendered.
    pub submitter_ip: String,
    pub created_at: i64,
}

/// A raw report joined with the clinic it is about, for the moderation console.
#[derive(Debug, Clone)]
pub struct ReportWithClinic {
    pub report: StatusReport,
    pub clinic_name: String,
    pub clinic_city: String,
    pub clinic_status: AcceptingStatus,
}
