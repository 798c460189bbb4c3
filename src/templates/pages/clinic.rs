// templates/pages/clinic.rs

use crate::auth::sessions::SessionUser;
use crate::consensus::IntakeOutcome;
use crate::domain::{Clinic, PendingUpdate, StatusReport};
use crate::templates::{
    components::{format_ts, notice, provenance_line, status_badge, status_options},
    desktop_layout,
};
use maud::{html, Markup};

pub struct ClinicVm<'a> {
    pub user: Option<&'a SessionUser>,
    pub clinic: Clinic,
    pub open_tallies: Vec<PendingUpdate>,
    pub recent_reports: Vec<StatusReport>,
    pub threshold: i64,
}

pub fn clinic_page(vm: &ClinicVm<'_>) -> Markup {
    let c = &vm.clinic;
    desktop_layout(
        &c.name,
        vm.user,
        html! {
            main class="container" {
                h1 { (c.name) }
                p { (c.location_line()) " " (c.postal_code) }
                @if let Some(phone) = &c.phone {
                    p { "Phone: " a href=(format!("tel:{phone}")) { (phone) } }
                }
                @if let Some(site) = &c.website {
                    p { a href=(site) rel="nofollow noopener" { (site) } }
                }

                section class="card" {
                    h3 { "Accepting new patients?" }
                    p { (status_badge(c.accepting_status)) " " (provenance_line(c)) }
                    @if c.claimed_by_clinic {
                        p class="muted" { "This listing is managed by the clinic." }
                    }
                    @if !vm.open_tallies.is_empty() {
                        ul class="muted" {
                            @for p in &vm.open_tallies {
                                li {
                                    (p.count) " of " (vm.threshold) " reports say "
                                    strong { (p.status.label()) }
                                }
                            }
                        }
                    }
                }

                @if !vm.recent_reports.is_empty() {
                    section class="card" {
                        h3 { "Recent reports" }
                        ul {
                            @for r in &vm.recent_reports {
                                li {
                                    (format_ts(r.created_at)) ": " (r.status.label())
                                    @if let Some(detail) = &r.detail {
                                        " · " em { (detail) }
                                    }
                                }
                            }
                        }
                    }
                }

                (report_form(c.id))
                (claim_form(c))

                @if vm.user.is_some_and(|u| u.is_moderator) {
                    p { a href=(format!("/admin/clinics/{}", c.id)) { "Edit as moderator" } }
                }
            }
        },
    )
}

pub fn report_form(clinic_id: i64) -> Markup {
    let action = format!("/clinics/{clinic_id}/report");
    html! {
        section class="card" {
            h3 { "Report what you were told" }
            form
                method="post"
                action=(action)
                hx-post=(action)
                hx-target="#report-result"
                hx-swap="innerHTML"
                hx-disabled-elt="button"
            {
                label for="status" { "Status" }
                select id="status" name="status" required {
                    (status_options(None))
                }
                label for="detail" { "Details (optional)" }
                textarea id="detail" name="detail" maxlength="500" rows="3"
                    placeholder="e.g. called on Monday, taking patients from within the city" {}
                button type="submit" class="primary" { "Send report" }
            }
            div id="report-result" {}
        }
    }
}

pub fn report_ack(outcome: &IntakeOutcome) -> Markup {
    notice(&outcome.message())
}

pub fn claim_form(clinic: &Clinic) -> Markup {
    let action = format!("/clinics/{}/claim", clinic.id);
    html! {
        section class="card" {
            @if clinic.claimed_by_clinic {
                h3 { "Update this listing" }
                p { "Clinic staff: enter the address that claimed this listing for an edit link." }
            } @else {
                h3 { "Work at this clinic?" }
                p { "Claim the listing to set your status directly." }
            }
            form
                method="post"
                action=(action)
                hx-post=(action)
                hx-target="#claim-result"
                hx-swap="innerHTML"
                hx-disabled-elt="button"
            {
                label class="sr-only" for="claim-email" { "Clinic email address" }
                input type="email" id="claim-email" name="email" placeholder="office@clinic.ca" required;
                button type="submit" { "Email me a link" }
            }
            div id="claim-result" {}
        }
    }
}
