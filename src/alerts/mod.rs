// src/alerts/mod.rs
pub mod notify;

pub use notify::{notify_status_change, MailNotifier, Notifier};

use rusqlite::{Connection, TransactionBehavior};
use tracing::info;

use crate::db::alerts::{self as db_alerts, Alert};
use crate::db::{clinics, plans};
use crate::domain::AcceptingStatus;
use crate::errors::ServerError;

/// What a subscriber wants to hear about.
#[derive(Debug, Clone)]
pub struct AlertCriteria {
    pub clinic_id: Option<i64>,
    pub city: Option<String>,
    pub status: AcceptingStatus,
}

/// Save an alert, enforcing the user's plan limit.
pub fn create_alert(
    conn: &mut Connection,
    user_id: i64,
    criteria: &AlertCriteria,
    now: i64,
) -> Result<i64, ServerError> {
    let city = criteria
        .city
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|e| ServerError::DbError(format!("begin tx failed: {e}")))?;

    if let Some(clinic_id) = criteria.clinic_id {
        clinics::require_clinic(&tx, clinic_id)?;
    }

    plans::ensure_entitlement(&tx, user_id, plans::DEFAULT_PLAN, now)?;
    let plan = plans::get_user_plan(&tx, user_id)?;
    if let Some(limit) = plan.alert_limit {
        if db_alerts::count_alerts_for_user(&tx, user_id)? >= limit {
            return Err(ServerError::LimitReached(format!(
                "the {} plan allows {limit} saved alert{}",
                plan.name,
                if limit == 1 { "" } else { "s" }
            )));
        }
    }

    let id = db_alerts::insert_alert(&tx, user_id, criteria.clinic_id, city, criteria.status, now)?;

    tx.commit()
        .map_err(|e| ServerError::DbError(format!("commit tx failed: {e}")))?;

    info!(user_id, alert_id = id, status = %criteria.status, "alert saved");
    Ok(id)
}

pub fn list_alerts(conn: &Connection, user_id: i64) -> Result<Vec<Alert>, ServerError> {
    db_alerts::list_alerts_for_user(conn, user_id)
}

pub fn delete_alert(conn: &Connection, user_id: i64, alert_id: i64) -> Result<(), ServerError> {
    db_alerts::delete_alert(conn, user_id, alert_id)
}
