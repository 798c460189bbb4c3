use crate::auth::sessions::SessionUser;
use crate::db::alerts::Alert;
use crate::db::plans::PlanInfo;
use crate::templates::{
    components::{format_ts, status_options},
    desktop_layout,
};
use maud::{html, Markup};

pub struct AlertsVm<'a> {
    pub user: &'a SessionUser,
    pub plan: PlanInfo,
    pub alerts: Vec<Alert>,
}

impl AlertsVm<'_> {
    fn limit_reached(&self) -> bool {
        self.plan
            .alert_limit
            .map(|limit| self.alerts.len() as i64 >= limit)
            .unwrap_or(false)
    }
}

pub fn alerts_page(vm: &AlertsVm<'_>) -> Markup {
    desktop_layout(
        "My alerts",
        Some(vm.user),
        html! {
            main class="container" {
                h1 { "My alerts" }
                p { "Signed in as " strong { (vm.user.email) } }

                section class="card" {
                    h3 { "Your plan" }
                    p { strong { (vm.plan.name) } " (" (vm.plan.code) ")" }
                    @match vm.plan.alert_limit {
                        Some(n) => p { "Saved alerts: " strong { (vm.alerts.len()) " / " (n) } },
                        None => p { "Saved alerts: " strong { "Unlimited" } },
                    }
                }

                section class="card" {
                    h3 { "Saved alerts" }
                    @if vm.alerts.is_empty() {
                        p class="muted" { "No alerts yet." }
                    } @else {
                        table {
                            thead {
                                tr { th { "When" } th { "Where" } th { "Since" } th {} }
                            }
                            tbody {
                                @for a in &vm.alerts {
                                    tr {
                                        td { (a.status.label()) }
                                        td {
                                            @match (a.clinic_id, &a.city) {
                                                (Some(id), _) => a href=(format!("/clinics/{id}")) { "Clinic #" (id) },
                                                (None, Some(city)) => (city),
                                                (None, None) => "Anywhere",
                                            }
                                        }
                                        td { (format_ts(a.created_at)) }
                                        td {
                                            form method="post" action=(format!("/alerts/{}/delete", a.id)) style="margin: 0;" {
                                                button type="submit" class="link" { "Remove" }
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }

                section class="card" {
                    h3 { "New alert" }
                    @if vm.limit_reached() {
                        p { "You've used every alert on your plan. Remove one or ask us about Premium." }
                    } @else {
                        form method="post" action="/alerts" class="stack" {
                            label for="alert-status" { "Tell me when a clinic is" }
                            select id="alert-status" name="status" required {
                                (status_options(None))
                            }
                            label for="alert-city" { "In city (optional)" }
                            input type="text" id="alert-city" name="city" placeholder="Halifax";
                            label for="alert-clinic" { "Or a specific clinic id (optional)" }
                            input type="number" id="alert-clinic" name="clinic_id" min="1";
                            button type="submit" class="primary" { "Save alert" }
                        }
                    }
                }
            }
        },
    )
}
