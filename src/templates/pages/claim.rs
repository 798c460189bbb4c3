use crate::domain::{Clinic, TokenPurpose, VerificationToken};
use crate::templates::{
    components::{format_ts, status_badge, status_options},
    desktop_layout,
};
use maud::{html, Markup};

/// Operator edit form behind a verified email link.
pub fn claim_verify_page(raw_token: &str, token: &VerificationToken, clinic: &Clinic) -> Markup {
    let heading = match token.purpose {
        TokenPurpose::Claim => "Claim this listing",
        TokenPurpose::Update => "Update your listing",
    };

    desktop_layout(
        heading,
        None,
        html! {
            main class="container narrow" {
                h1 { (heading) }
                p { strong { (clinic.name) } " · " (clinic.location_line()) }
                p { "Current status: " (status_badge(clinic.accepting_status)) }
                p class="muted" {
                    "Signed in as " (token.email) ". This link works once and expires "
                    (format_ts(token.expires_at)) "."
                }

                form method="post" action="/claim/verify" class="stack" {
                    input type="hidden" name="token" value=(raw_token);

                    label for="status" { "Accepting new patients?" }
                    select id="status" name="status" {
                        option value="" { "Leave unchanged" }
                        (status_options(None))
                    }

                    label for="address" { "Address" }
                    input type="text" id="address" name="address" value=(clinic.address);

                    label for="phone" { "Phone" }
                    input type="tel" id="phone" name="phone" value=(clinic.phone.as_deref().unwrap_or(""));

                    label for="website" { "Website" }
                    input type="url" id="website" name="website" value=(clinic.website.as_deref().unwrap_or(""));

                    button type="submit" class="primary" { "Save listing" }
                }
            }
        },
    )
}

pub fn claim_done_page(clinic: &Clinic) -> Markup {
    desktop_layout(
        "Listing updated",
        None,
        html! {
            main class="container narrow" {
                h1 { "Thanks, your listing is updated" }
                p { strong { (clinic.name) } " now shows " (status_badge(clinic.accepting_status)) }
                p { "To make further changes, request a new link from the clinic page." }
                p { a href=(format!("/clinics/{}", clinic.id)) { "View listing" } }
            }
        },
    )
}
