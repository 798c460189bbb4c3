use crate::tests::utils::{body_string, location, test_app};

#[test]
fn login_page_loads_successfully() {
    let app = test_app();
    let resp = app.get("/login", None);
    assert_eq!(resp.status(), 200);

    let body = body_string(resp);
    assert!(body.contains("Sign in"));
    assert!(body.contains("form"));
}

#[test]
fn request_link_returns_partial_html_for_htmx() {
    let app = test_app();
    let resp = app.htmx_post("/auth/request-link", "email=test@example.com", None);
    assert_eq!(resp.status(), 200);

    let body = body_string(resp);
    assert!(body.contains("Check your email"));
    assert!(body.contains("test@example.com"));
    assert!(!body.contains("<!DOCTYPE html>"));
    assert!(!body.contains("<html"));

    let sent = app.mail.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "test@example.com");
    assert!(sent[0].body.contains("http://famdoc.test/auth/magic?token="));
}

#[test]
fn invalid_email_is_rejected() {
    let app = test_app();
    let resp = app.htmx_post("/auth/request-link", "email=nobody", None);
    assert_eq!(resp.status(), 400);
    assert!(app.mail.sent().is_empty());
}

#[test]
fn magic_link_signs_in_once() {
    let app = test_app();
    app.post_form("/auth/request-link", "email=Patient@Example.com", None);
    let token = app.mail.last_token("/auth/magic").unwrap();

    let resp = app.get(&format!("/auth/magic?token={token}"), None);
    assert_eq!(resp.status(), 302);
    assert_eq!(location(&resp), "/alerts");
    let cookie = resp.headers().get("Set-Cookie").unwrap().to_str().unwrap();
    assert!(cookie.starts_with("session="));
    assert!(cookie.contains("HttpOnly"));

    let resp = app.get(&format!("/auth/magic?token={token}"), None);
    assert_eq!(resp.status(), 401);
}

#[test]
fn signed_in_user_sees_their_alerts_page() {
    let app = test_app();
    let cookie = app.sign_in("patient@example.com");

    let resp = app.get("/alerts", Some(&cookie));
    assert_eq!(resp.status(), 200);
    assert!(body_string(resp).contains("Sign out"));
}

#[test]
fn logout_revokes_the_session() {
    let app = test_app();
    let cookie = app.sign_in("patient@example.com");

    let resp = app.post_form("/auth/logout", "", Some(&cookie));
    assert_eq!(resp.status(), 302);
    assert_eq!(location(&resp), "/");
    let cleared = resp.headers().get("Set-Cookie").unwrap().to_str().unwrap();
    assert!(cleared.contains("Max-Age=0"));

    assert_eq!(app.get("/alerts", Some(&cookie)).status(), 401);
}
