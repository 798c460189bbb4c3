use crate::domain::{AcceptingStatus, Clinic};
use chrono::DateTime;
use maud::{html, Markup};

pub fn format_ts(ts: i64) -> String {
    DateTime::from_timestamp(ts, 0)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| ts.to_string())
}

pub fn status_badge(status: AcceptingStatus) -> Markup {
    html! {
        span class=(format!("badge badge-{}", status.as_str())) { (status.label()) }
    }
}

/// "Updated 2024-03-01 by the clinic" or "Not yet reported".
pub fn provenance_line(clinic: &Clinic) -> Markup {
    html! {
        @match (clinic.status_last_updated_at, clinic.status_verified_by) {
            (Some(ts), Some(by)) => {
                span class="muted" { "Updated " (format_ts(ts)) " · " (by.label()) }
            }
            _ => span class="muted" { "Not yet reported" },
        }
    }
}

pub fn status_options(selected: Option<AcceptingStatus>) -> Markup {
    html! {
        @for s in AcceptingStatus::ALL {
            option value=(s.as_str()) selected[selected == Some(s)] { (s.label()) }
        }
    }
}
