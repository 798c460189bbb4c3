use crate::auth::sessions::SessionUser;
use crate::db::plans::{PlanInfo, UserWithPlan};
use crate::domain::{Clinic, PendingWithClinic, ReportWithClinic};
use crate::templates::{
    components::{format_ts, provenance_line, status_badge, status_options},
    desktop_layout,
};
use maud::{html, Markup};

pub struct AdminVm<'a> {
    pub user: &'a SessionUser,
    pub threshold: i64,
    pub pending: Vec<PendingWithClinic>,
    pub reports: Vec<ReportWithClinic>,
    pub users: Vec<UserWithPlan>,
    pub plans: Vec<PlanInfo>,
    pub clinic_count: i64,
}

const TH: &str = "padding: 12px 8px; border-bottom: 2px solid #e5e7eb; text-align: left;";
const TD: &str = "padding: 8px; border-bottom: 1px solid #f3f4f6;";

pub fn admin_page(vm: &AdminVm<'_>) -> Markup {
    desktop_layout(
        "Moderation",
        Some(vm.user),
        html! {
            main class="container" {
                h1 { "Moderation" }

                div class="card" style="margin-bottom: 2rem;" {
                    h3 { "Pending updates" }
                    p class="muted" {
                        "Statuses apply on their own at " (vm.threshold)
                        " distinct reports. Approve applies one now; dismiss drops it."
                    }
                    div id="pending-list" style="overflow-x: auto;" {
                        (pending_table(vm))
                    }
                }

                div class="card" style="margin-bottom: 2rem;" {
                    h3 { "Recent reports" }
                    div style="overflow-x: auto;" {
                        table style="width: 100%; border-collapse: collapse; margin-top: 1rem;" {
                            thead {
                                tr {
                                    th style=(TH) { "When" }
                                    th style=(TH) { "Clinic" }
                                    th style=(TH) { "Reported" }
                                    th style=(TH) { "Detail" }
                                    th style=(TH) { "" }
                                }
                            }
                            tbody {
                                @for r in &vm.reports {
                                    tr id=(format!("report-{}", r.report.id)) {
                                        td style=(TD) { (format_ts(r.report.created_at)) }
                                        td style=(TD) {
                                            a href=(format!("/clinics/{}", r.report.clinic_id)) { (r.clinic_name) }
                                            " (" (r.clinic_city) ")"
                                        }
                                        td style=(TD) { (status_badge(r.report.status)) }
                                        td style=(TD) { (r.report.detail.as_deref().unwrap_or("")) }
                                        td style=(TD) {
                                            form
                                                action=(format!("/admin/reports/{}/delete", r.report.id))
                                                method="post"
                                                onsubmit="return confirm('Delete this report? Pending counts are not changed.');"
                                                style="margin: 0;"
                                            {
                                                button type="submit" style="color: #dc2626; background: none; border: none; cursor: pointer; padding: 0;" { "Delete" }
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }

                div class="card" style="margin-bottom: 2rem;" {
                    h3 { "Bulk import" }
                    p {
                        "Replaces all " (vm.clinic_count) " clinics, with their reports and pending updates. "
                        "Columns: " code { "name,address,city,province,postal_code,phone,website,accepting_status" }
                    }
                    form action="/admin/import" method="post"
                        onsubmit="return confirm('Replace every clinic with this file?');"
                    {
                        textarea name="csv" rows="6" style="width: 100%;" placeholder="Paste CSV here" {}
                        button type="submit" { "Replace clinics" }
                    }
                }

                div class="card" {
                    h3 { "Users" }
                    div style="overflow-x: auto;" {
                        table style="width: 100%; border-collapse: collapse; margin-top: 1rem;" {
                            thead {
                                tr {
                                    th style=(TH) { "ID" }
                                    th style=(TH) { "Email" }
                                    th style=(TH) { "Plan" }
                                    th style=(TH) { "Alerts" }
                                    th style=(TH) { "Role" }
                                    th style=(TH) { "Last login" }
                                }
                            }
                            tbody {
                                @for user in &vm.users {
                                    tr {
                                        td style=(TD) { (user.id) }
                                        td style=(TD) { (user.email) }
                                        td style=(TD) {
                                            form action=(format!("/admin/users/{}/plan", user.id)) method="post" style="display: flex; gap: 8px; margin: 0;" {
                                                select name="plan" {
                                                    @for plan in &vm.plans {
                                                        option value=(plan.code) selected[user.plan_code.as_deref() == Some(plan.code.as_str())] { (plan.name) }
                                                    }
                                                }
                                                button type="submit" { "Set" }
                                            }
                                        }
                                        td style=(TD) { (user.alert_count) }
                                        td style=(TD) {
                                            @if user.is_moderator { "Moderator" } @else { "User" }
                                        }
                                        td style=(TD) {
                                            @match user.last_login_at {
                                                Some(ts) => (format_ts(ts)),
                                                None => "Never",
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        },
    )
}

fn pending_table(vm: &AdminVm<'_>) -> Markup {
    html! {
        @if vm.pending.is_empty() {
            p class="muted" { "Nothing waiting." }
        } @else {
            table style="width: 100%; border-collapse: collapse; margin-top: 1rem;" {
                thead {
                    tr {
                        th style=(TH) { "Clinic" }
                        th style=(TH) { "Now" }
                        th style=(TH) { "Reported" }
                        th style=(TH) { "Reports" }
                        th style=(TH) { "Last report" }
                        th style=(TH) { "" }
                    }
                }
                tbody {
                    @for p in &vm.pending {
                        tr {
                            td style=(TD) {
                                a href=(format!("/clinics/{}", p.clinic_id)) { (p.clinic_name) }
                                " (" (p.clinic_city) ")"
                            }
                            td style=(TD) { (status_badge(p.current_status)) }
                            td style=(TD) { (status_badge(p.status)) }
                            td style=(TD) { (p.count) " / " (vm.threshold) }
                            td style=(TD) { (format_ts(p.updated_at)) }
                            td style=(TD) {
                                form action=(format!("/admin/pending/{}/approve", p.id)) method="post" style="display: inline; margin: 0;" {
                                    button type="submit" style="padding: 4px 8px; background: #10b981; color: white; border: none; border-radius: 4px; cursor: pointer;" { "Approve" }
                                }
                                " "
                                form action=(format!("/admin/pending/{}/dismiss", p.id)) method="post" style="display: inline; margin: 0;" {
                                    button type="submit" style="padding: 4px 8px; background: none; border: 1px solid #ccc; border-radius: 4px; cursor: pointer;" { "Dismiss" }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Moderator's direct edit of one clinic.
pub fn clinic_edit_page(user: &SessionUser, clinic: &Clinic) -> Markup {
    desktop_layout(
        "Edit clinic",
        Some(user),
        html! {
            main class="container narrow" {
                h1 { "Edit " (clinic.name) }
                p { (status_badge(clinic.accepting_status)) " " (provenance_line(clinic)) }

                form method="post" action=(format!("/admin/clinics/{}", clinic.id)) class="stack" {
                    label for="name" { "Name" }
                    input type="text" id="name" name="name" value=(clinic.name) required;
                    label for="address" { "Address" }
                    input type="text" id="address" name="address" value=(clinic.address);
                    label for="city" { "City" }
                    input type="text" id="city" name="city" value=(clinic.city);
                    label for="province" { "Province" }
                    input type="text" id="province" name="province" value=(clinic.province);
                    label for="postal_code" { "Postal code" }
                    input type="text" id="postal_code" name="postal_code" value=(clinic.postal_code);
                    label for="phone" { "Phone" }
                    input type="tel" id="phone" name="phone" value=(clinic.phone.as_deref().unwrap_or(""));
                    label for="website" { "Website" }
                    input type="url" id="website" name="website" value=(clinic.website.as_deref().unwrap_or(""));

                    label for="status" { "Status" }
                    select id="status" name="status" {
                        option value="" { "Leave unchanged" }
                        (status_options(None))
                    }

                    button type="submit" class="primary" { "Save" }
                }
            }
        },
    )
}
