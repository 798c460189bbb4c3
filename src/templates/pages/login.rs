use crate::templates::{components::email_cta_form, desktop_layout};
use maud::{html, Markup};

pub fn login_page() -> Markup {
    desktop_layout(
        "Sign in",
        None,
        html! {
            main class="container narrow" {
                h1 { "Sign in" }
                (email_cta_form(
                    "An account lets you save alerts and hear when a clinic near you starts taking patients."
                ))
                p class="muted" {
                    "Reporting a status never needs an account. "
                    a href="/" { "Back to search" }
                }
            }
        },
    )
}
