use maud::{html, Markup};

/// Sign-in form; the emailed-link confirmation replaces `#signin-result`.
pub fn email_cta_form(intro: &str) -> Markup {
    html! {
        section class="card signin" {
            p { (intro) }
            form
                method="post"
                action="/auth/request-link"
                hx-post="/auth/request-link"
                hx-target="#signin-result"
                hx-swap="innerHTML"
                hx-disabled-elt="button"
                class="stack"
            {
                label for="signin-email" { "Your email" }
                input type="email" id="signin-email" name="email"
                    placeholder="name@example.ca" autocomplete="email" required;
                button type="submit" class="primary" { "Email me a sign-in link" }
            }
            p class="muted" { "Links expire shortly and work once." }
            div id="signin-result" {}
        }
    }
}
