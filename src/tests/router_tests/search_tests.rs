use astra::Body;
use http::{Method, Request};

use crate::tests::utils::{body_string, test_app};

#[test]
fn home_page_lists_clinics() {
    let app = test_app();
    app.seed_clinic("Harbourview Clinic", "Halifax");

    let resp = app.get("/", None);
    assert_eq!(resp.status(), 200);

    let body = body_string(resp);
    assert!(body.contains("<!DOCTYPE html>"));
    assert!(body.contains("Harbourview Clinic"));
}

#[test]
fn search_filters_by_city() {
    let app = test_app();
    app.seed_clinic("Harbourview Clinic", "Halifax");
    app.seed_clinic("Cove Medical", "Digby");

    let body = body_string(app.get("/search?q=digby", None));
    assert!(body.contains("Cove Medical"));
    assert!(!body.contains("Harbourview Clinic"));
}

#[test]
fn htmx_search_returns_only_the_results_table() {
    let app = test_app();
    app.seed_clinic("Harbourview Clinic", "Halifax");

    let req = Request::builder()
        .method(Method::GET)
        .uri("/search?q=halifax&status=")
        .header("HX-Request", "true")
        .body(Body::empty())
        .unwrap();
    let resp = app.send(req);
    assert_eq!(resp.status(), 200);

    let body = body_string(resp);
    assert!(body.contains("Harbourview Clinic"));
    assert!(!body.contains("<html"));
}

#[test]
fn unknown_status_filter_is_rejected() {
    let app = test_app();
    let resp = app.get("/search?status=open", None);
    assert_eq!(resp.status(), 400);
}

#[test]
fn clinic_page_loads_and_missing_clinic_is_404() {
    let app = test_app();
    let id = app.seed_clinic("Harbourview Clinic", "Halifax");

    let resp = app.get(&format!("/clinics/{id}"), None);
    assert_eq!(resp.status(), 200);
    assert!(body_string(resp).contains("Report what you were told"));

    assert_eq!(app.get("/clinics/9999", None).status(), 404);
    assert_eq!(app.get("/clinics/abc", None).status(), 404);
}

#[test]
fn unknown_route_is_404() {
    let app = test_app();
    assert_eq!(app.get("/nowhere", None).status(), 404);
}
