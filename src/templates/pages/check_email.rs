use maud::{html, Markup};

/// Partial shown in place of the sign-in form.
pub fn check_email_content(email: &str) -> Markup {
    sent_link_content(email, "Click the link in the email to sign in.", "/login")
}

/// Partial shown in place of the claim form.
pub fn check_claim_email_content(email: &str, clinic_id: i64) -> Markup {
    sent_link_content(
        email,
        "Open the link in the email to verify and edit this listing.",
        &format!("/clinics/{clinic_id}"),
    )
}

fn sent_link_content(email: &str, next_step: &str, retry_href: &str) -> Markup {
    html! {
        div class="text-center py-8 px-4 fade-in" {
            h3 class="text-lg leading-6 font-medium text-gray-900" { "Check your email" }

            div class="mt-2" {
                p class="text-sm text-gray-500" {
                    "We sent a link to "
                    strong class="text-gray-900" { (email) }
                    "."
                }
                p class="text-sm text-gray-500 mt-2" { (next_step) }
            }

            div class="mt-6" {
                a href=(retry_href) class="text-sm font-medium text-blue-600 hover:text-blue-500" {
                    "Try with a different email"
                }
            }
        }
    }
}
