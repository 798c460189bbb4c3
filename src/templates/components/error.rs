use maud::{html, Markup};

/// Inline error for htmx swaps.
pub fn error_fragment(message: &str) -> Markup {
    html! {
        div class="alert alert-error" role="alert" {
            p { (message) }
        }
    }
}
