use maud::{html, Markup};

pub mod email_cta;
pub mod error;
pub mod status;

pub use email_cta::email_cta_form;
pub use error::error_fragment;
pub use status::{format_ts, provenance_line, status_badge, status_options};

/// Success message swapped in after a form post.
pub fn notice(message: &str) -> Markup {
    html! {
        div class="alert alert-success" role="status" {
            p { (message) }
        }
    }
}
