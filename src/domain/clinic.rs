// src/domain/clinic.rs

use serde::Serialize;

use super::status::{AcceptingStatus, VerifiedBy};

/// A place of practice listed in the directory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Clinic {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub accepting_status: AcceptingStatus,
    pub status_last_updated_at: Option<i64>,
    /// Non-null whenever `status_last_updated_at` is non-null.
    pub status_verified_by: Option<VerifiedBy>,
    pub community_report_count: i64,
    pub claimed_by_clinic: bool,
    pub claimed_email: Option<String>,
    pub created_at: i64,
}

impl Clinic {
    pub fn location_line(&self) -> String {
        [self.address.as_str(), self.city.as_str(), self.province.as_str()]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Input for administrative entry and bulk import.
#[derive(Debug, Clone, Default)]
pub struct NewClinic {
    pub name: String,
    pub address: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub accepting_status: Option<AcceptingStatus>,
}

/// Field-level patch. `None` leaves a field as it is; last writer wins.
#[derive(Debug, Clone, Default)]
pub struct ClinicPatch {
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub postal_code: Option<String>,
    pub phone: Option<Option<String>>,
    pub website: Option<Option<String>>,
    pub status: Option<StatusChange>,
}

impl ClinicPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.address.is_none()
            && self.city.is_none()
            && self.province.is_none()
            && self.postal_code.is_none()
            && self.phone.is_none()
            && self.website.is_none()
            && self.status.is_none()
    }
}

/// A status write always carries its provenance and time together.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusChange {
    pub status: AcceptingStatus,
    pub verified_by: VerifiedBy,
    pub at: i64,
}
