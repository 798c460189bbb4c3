use astra::{Body, Response};
use http::{Method, Request};

use crate::consensus::ledger::open_tallies;
use crate::db::clinics::require_clinic;
use crate::domain::{AcceptingStatus, VerifiedBy};
use crate::tests::utils::{body_string, location, peer, test_app, TestApp};

fn report_request(clinic_id: i64, form: &str, ip: &str) -> http::request::Builder {
    Request::builder()
        .method(Method::POST)
        .uri(format!("/clinics/{clinic_id}/report"))
        .header("Content-Type", "application/x-www-form-urlencoded")
        .header("HX-Request", "true")
        .extension(peer(ip))
}

fn report_from(app: &TestApp, clinic_id: i64, form: &str, ip: &str) -> Response {
    let req = report_request(clinic_id, form, ip)
        .body(Body::from(form.as_bytes().to_vec()))
        .unwrap();
    app.send(req)
}

fn report_forwarded(app: &TestApp, clinic_id: i64, form: &str, ip: &str, forwarded: &str) -> Response {
    let req = report_request(clinic_id, form, ip)
        .header("X-Forwarded-For", forwarded)
        .body(Body::from(form.as_bytes().to_vec()))
        .unwrap();
    app.send(req)
}

#[test]
fn first_report_is_acknowledged_with_progress() {
    let app = test_app();
    let id = app.seed_clinic("Harbourview Clinic", "Halifax");

    let resp = report_from(&app, id, "status=accepting&detail=called+today", "203.0.113.1");
    assert_eq!(resp.status(), 200);

    let body = body_string(resp);
    assert!(body.contains("1 of 2 reports"), "{body}");
    assert!(!body.contains("<html"));

    let clinic = app.state.db.with_conn(|conn| require_clinic(conn, id)).unwrap();
    assert_eq!(clinic.accepting_status, AcceptingStatus::Unknown);
}

#[test]
fn second_distinct_ip_applies_status() {
    let app = test_app();
    let id = app.seed_clinic("Harbourview Clinic", "Halifax");

    report_from(&app, id, "status=waitlist", "203.0.113.1");
    let body = body_string(report_from(&app, id, "status=waitlist", "203.0.113.2"));
    assert!(body.contains("Status updated to Waitlist"), "{body}");

    let clinic = app.state.db.with_conn(|conn| require_clinic(conn, id)).unwrap();
    assert_eq!(clinic.accepting_status, AcceptingStatus::Waitlist);
    assert_eq!(clinic.status_verified_by, Some(VerifiedBy::Community));
}

#[test]
fn repeat_ip_does_not_advance_the_tally() {
    let app = test_app();
    let id = app.seed_clinic("Harbourview Clinic", "Halifax");

    report_from(&app, id, "status=accepting", "203.0.113.1");
    let body = body_string(report_from(&app, id, "status=accepting", "203.0.113.1"));
    assert!(body.contains("1 of 2 reports"), "{body}");

    let clinic = app.state.db.with_conn(|conn| require_clinic(conn, id)).unwrap();
    assert_eq!(clinic.accepting_status, AcceptingStatus::Unknown);
}

#[test]
fn invalid_status_renders_error_fragment() {
    let app = test_app();
    let id = app.seed_clinic("Harbourview Clinic", "Halifax");

    let resp = report_from(&app, id, "status=open", "203.0.113.1");
    assert_eq!(resp.status(), 400);

    let body = body_string(resp);
    assert!(body.contains("invalid status"), "{body}");
    assert!(!body.contains("<html"));
}

#[test]
fn report_for_missing_clinic_is_404() {
    let app = test_app();
    assert_eq!(report_from(&app, 777, "status=accepting", "203.0.113.1").status(), 404);
}

#[test]
fn plain_form_post_redirects_back_to_clinic() {
    let app = test_app();
    let id = app.seed_clinic("Harbourview Clinic", "Halifax");

    let resp = app.post_form(&format!("/clinics/{id}/report"), "status=accepting", None);
    assert_eq!(resp.status(), 302);
    assert_eq!(location(&resp), format!("/clinics/{id}"));
}

#[test]
fn applied_status_notifies_matching_alerts() {
    let app = test_app();
    let id = app.seed_clinic("Harbourview Clinic", "Halifax");

    let cookie = app.sign_in("patient@example.com");
    let resp = app.post_form("/alerts", "status=accepting&city=Halifax", Some(&cookie));
    assert_eq!(resp.status(), 302);

    report_from(&app, id, "status=accepting", "203.0.113.1");
    assert!(!app
        .mail
        .sent()
        .iter()
        .any(|m| m.subject.starts_with("Harbourview Clinic")));

    report_from(&app, id, "status=accepting", "203.0.113.2");
    let alert = app
        .mail
        .sent()
        .into_iter()
        .find(|m| m.subject.starts_with("Harbourview Clinic"))
        .expect("no alert mail");
    assert_eq!(alert.to, "patient@example.com");
    assert!(alert.body.contains(&format!("http://famdoc.test/clinics/{id}")));
}

#[test]
fn forwarded_for_is_ignored_unless_trusted() {
    let app = test_app();
    let id = app.seed_clinic("Harbourview Clinic", "Halifax");

    report_forwarded(&app, id, "status=accepting", "198.51.100.7", "1.1.1.1");
    let body = body_string(report_forwarded(&app, id, "status=accepting", "198.51.100.7", "2.2.2.2"));
    assert!(body.contains("1 of 2 reports"), "{body}");

    let open = app.state.db.with_conn(|conn| open_tallies(conn, id)).unwrap();
    assert_eq!(open[0].count, 1);
    assert_eq!(open[0].ip_addresses, vec!["198.51.100.7".to_string()]);

    let clinic = app.state.db.with_conn(|conn| require_clinic(conn, id)).unwrap();
    assert_eq!(clinic.accepting_status, AcceptingStatus::Unknown);
}

#[test]
fn trusted_proxy_uses_first_forwarded_hop() {
    let mut app = test_app();
    app.state.config.trust_forwarded_for = true;
    let id = app.seed_clinic("Harbourview Clinic", "Halifax");

    report_forwarded(&app, id, "status=waitlist", "10.0.0.1", "203.0.113.1, 10.0.0.1");
    report_forwarded(&app, id, "status=waitlist", "10.0.0.1", "203.0.113.2, 10.0.0.1");

    let clinic = app.state.db.with_conn(|conn| require_clinic(conn, id)).unwrap();
    assert_eq!(clinic.accepting_status, AcceptingStatus::Waitlist);
}
