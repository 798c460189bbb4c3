// src/alerts/notify.rs
use std::sync::Arc;

use rusqlite::Connection;
use tracing::{error, info, warn};

use crate::db::alerts as db_alerts;
use crate::domain::Clinic;
use crate::errors::ServerError;
use crate::mailer::Mailer;

/// Tells a subscriber that a clinic they watch changed status.
pub trait Notifier: Send + Sync {
    fn notify(&self, to: &str, clinic: &Clinic) -> Result<(), ServerError>;
}

pub struct MailNotifier {
    mailer: Arc<dyn Mailer>,
    public_base_url: String,
}

impl MailNotifier {
    pub fn new(mailer: Arc<dyn Mailer>, public_base_url: impl Into<String>) -> Self {
        Self {
            mailer,
            public_base_url: public_base_url.into(),
        }
    }
}

impl Notifier for MailNotifier {
    fn notify(&self, to: &str, clinic: &Clinic) -> Result<(), ServerError> {
        let link = format!(
            "{}/clinics/{}",
            self.public_base_url.trim_end_matches('/'),
            clinic.id
        );
        self.mailer.send_status_alert(to, clinic, &link)?;
        Ok(())
    }
}

/// Notify every subscriber whose alert matches the clinic's new status.
///
/// Runs after the status change has committed. Failures are logged and
/// swallowed; returns how many notifications went out.
pub fn notify_status_change(conn: &Connection, notifier: &dyn Notifier, clinic: &Clinic) -> usize {
    let matches = match db_alerts::matching_alerts(conn, clinic, clinic.accepting_status) {
        Ok(m) => m,
        Err(e) => {
            error!(clinic_id = clinic.id, error = %e, "alert lookup failed");
            return 0;
        }
    };

    let mut sent = 0;
    for m in &matches {
        match notifier.notify(&m.email, clinic) {
            Ok(()) => sent += 1,
            Err(e) => warn!(alert_id = m.alert_id, error = %e, "alert notification failed"),
        }
    }

    if !matches.is_empty() {
        info!(
            clinic_id = clinic.id,
            status = %clinic.accepting_status,
            matched = matches.len(),
            sent,
            "status alerts dispatched"
        );
    }
    sent
}
