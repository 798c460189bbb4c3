// templates/pages/home.rs

use crate::auth::sessions::SessionUser;
use crate::domain::{AcceptingStatus, Clinic};
use crate::templates::{
    components::{provenance_line, status_badge, status_options},
    desktop_layout,
};
use maud::{html, Markup};

pub struct SearchVm<'a> {
    pub user: Option<&'a SessionUser>,
    pub query: String,
    pub status: Option<AcceptingStatus>,
    pub clinics: Vec<Clinic>,
}

pub fn home_page(vm: &SearchVm<'_>) -> Markup {
    desktop_layout(
        "Find a family doctor",
        vm.user,
        html! {
            main class="container" {
                h1 { "Find a family doctor who is taking patients" }
                p class="lead" {
                    "Statuses come from the clinics themselves and from people like you. "
                    "Saw something different? Open a clinic and report it."
                }

                form
                    method="get"
                    action="/search"
                    hx-get="/search"
                    hx-target="#results"
                    hx-push-url="true"
                    class="search"
                {
                    label class="sr-only" for="q" { "Clinic, city or postal code" }
                    input type="search" id="q" name="q" value=(vm.query)
                        placeholder="Clinic, city or postal code";
                    select name="status" {
                        option value="" selected[vm.status.is_none()] { "Any status" }
                        (status_options(vm.status))
                    }
                    button type="submit" class="primary" { "Search" }
                }

                div id="results" {
                    (search_results(&vm.clinics))
                }
            }
        },
    )
}

/// Result table; also returned alone for htmx searches.
pub fn search_results(clinics: &[Clinic]) -> Markup {
    html! {
        @if clinics.is_empty() {
            p class="muted" { "No clinics match that search." }
        } @else {
            table class="results" {
                thead {
                    tr {
                        th { "Clinic" }
                        th { "Location" }
                        th { "Status" }
                        th { "Last update" }
                    }
                }
                tbody {
                    @for c in clinics {
                        tr {
                            td { a href=(format!("/clinics/{}", c.id)) { (c.name) } }
                            td { (c.location_line()) }
                            td { (status_badge(c.accepting_status)) }
                            td { (provenance_line(c)) }
                        }
                    }
                }
            }
        }
    }
}
