use crate::auth::sessions::SessionUser;
use maud::{html, Markup, DOCTYPE};

/// htmx 2 leaves 4xx/5xx bodies unswapped by default; error fragments need swapping.
const HTMX_CONFIG: &str = r#"{"responseHandling":[{"code":"204","swap":false},{"code":"[23]..","swap":true},{"code":"[45]..","swap":true,"error":true}]}"#;

pub fn desktop_layout(title: &str, user: Option<&SessionUser>, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                meta name="htmx-config" content=(HTMX_CONFIG);
                title { (title) " · Family Doctor Directory" }
                link rel="stylesheet" href="/static/main.css";
                script src="/static/htmx.js" defer {};
            }
            body {
              header class="flex items-center justify-between px-6 py-3 shadow" {
                  a href="/" class="brand" { "Family Doctor Directory" }
                  nav {
                      ul {
                          li { a href="/" { "Search" } }
                          @if let Some(u) = user {
                              li { a href="/alerts" { "My alerts" } }
                              @if u.is_moderator {
                                  li { a href="/admin" { "Moderation" } }
                              }
                          }
                      }
                  }

                  @match user {
                      Some(u) => {
                          form method="post" action="/auth/logout" class="inline" {
                              span class="muted" { (u.email) " " }
                              button type="submit" class="link" { "Sign out" }
                          }
                      }
                      None => {
                          a href="/login" class="text-base font-medium hover:text-blue-600" { "Sign in" }
                      }
                  }
              }
                (content)
            }
        }
    }
}
