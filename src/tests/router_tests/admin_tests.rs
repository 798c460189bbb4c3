use astra::Body;
use http::{Method, Request};

use crate::consensus::{ledger, moderation};
use crate::db::auth::get_or_create_user;
use crate::db::clinics::{count_clinics, require_clinic};
use crate::db::plans::get_user_plan;
use crate::domain::{AcceptingStatus, VerifiedBy};
use crate::router::MAX_BODY_BYTES;
use crate::tests::utils::{body_string, location, peer, test_app, TestApp};

fn report_from(app: &TestApp, clinic_id: i64, status: &str, ip: &str) {
    let req = Request::builder()
        .method(Method::POST)
        .uri(format!("/clinics/{clinic_id}/report"))
        .header("Content-Type", "application/x-www-form-urlencoded")
        .extension(peer(ip))
        .body(Body::from(format!("status={status}").into_bytes()))
        .unwrap();
    assert_eq!(app.send(req).status(), 302);
}

fn only_tally_id(app: &TestApp, clinic_id: i64) -> i64 {
    let open = app
        .state
        .db
        .with_conn(|conn| ledger::open_tallies(conn, clinic_id))
        .unwrap();
    assert_eq!(open.len(), 1);
    open[0].id
}

#[test]
fn console_requires_a_moderator() {
    let app = test_app();
    assert_eq!(app.get("/admin", None).status(), 401);

    let patient = app.sign_in("patient@example.com");
    assert_eq!(app.get("/admin", Some(&patient)).status(), 403);
    assert_eq!(app.post_form("/admin/pending/1/approve", "", Some(&patient)).status(), 403);

    let moderator = app.sign_in_moderator();
    let resp = app.get("/admin", Some(&moderator));
    assert_eq!(resp.status(), 200);

    let body = body_string(resp);
    assert!(body.contains("Moderation"));
    assert!(body.contains("patient@example.com"));
}

#[test]
fn approve_applies_a_pending_status() {
    let app = test_app();
    let id = app.seed_clinic("Harbourview Clinic", "Halifax");
    report_from(&app, id, "accepting", "203.0.113.1");
    let pending_id = only_tally_id(&app, id);

    let moderator = app.sign_in_moderator();
    let resp = app.post_form(&format!("/admin/pending/{pending_id}/approve"), "", Some(&moderator));
    assert_eq!(resp.status(), 302);
    assert_eq!(location(&resp), "/admin");

    let clinic = app.state.db.with_conn(|conn| require_clinic(conn, id)).unwrap();
    assert_eq!(clinic.accepting_status, AcceptingStatus::Accepting);
    assert_eq!(clinic.status_verified_by, Some(VerifiedBy::Community));

    let open = app.state.db.with_conn(|conn| ledger::open_tallies(conn, id)).unwrap();
    assert!(open.is_empty());

    let again = app.post_form(&format!("/admin/pending/{pending_id}/approve"), "", Some(&moderator));
    assert_eq!(again.status(), 404);
}

#[test]
fn dismiss_drops_the_tally_without_touching_the_clinic() {
    let app = test_app();
    let id = app.seed_clinic("Harbourview Clinic", "Halifax");
    report_from(&app, id, "not_accepting", "203.0.113.1");
    let pending_id = only_tally_id(&app, id);

    let moderator = app.sign_in_moderator();
    let resp = app.post_form(&format!("/admin/pending/{pending_id}/dismiss"), "", Some(&moderator));
    assert_eq!(resp.status(), 302);

    let clinic = app.state.db.with_conn(|conn| require_clinic(conn, id)).unwrap();
    assert_eq!(clinic.accepting_status, AcceptingStatus::Unknown);
    assert_eq!(clinic.status_last_updated_at, None);
}

#[test]
fn moderator_can_delete_a_report() {
    let app = test_app();
    let id = app.seed_clinic("Harbourview Clinic", "Halifax");
    report_from(&app, id, "waitlist", "203.0.113.1");

    let reports = app
        .state
        .db
        .with_conn(|conn| moderation::list_recent_reports(conn))
        .unwrap();
    assert_eq!(reports.len(), 1);

    let moderator = app.sign_in_moderator();
    let resp = app.post_form(
        &format!("/admin/reports/{}/delete", reports[0].report.id),
        "",
        Some(&moderator),
    );
    assert_eq!(resp.status(), 302);

    let reports = app
        .state
        .db
        .with_conn(|conn| moderation::list_recent_reports(conn))
        .unwrap();
    assert!(reports.is_empty());
}

#[test]
fn moderator_edit_is_community_verified() {
    let app = test_app();
    let id = app.seed_clinic("Harbourview Clinic", "Halifax");
    let moderator = app.sign_in_moderator();

    let resp = app.get(&format!("/admin/clinics/{id}"), Some(&moderator));
    assert_eq!(resp.status(), 200);

    let resp = app.post_form(
        &format!("/admin/clinics/{id}"),
        "name=Harbourview+Family+Clinic&status=waitlist&phone=",
        Some(&moderator),
    );
    assert_eq!(resp.status(), 302);
    assert_eq!(location(&resp), format!("/clinics/{id}"));

    let clinic = app.state.db.with_conn(|conn| require_clinic(conn, id)).unwrap();
    assert_eq!(clinic.name, "Harbourview Family Clinic");
    assert_eq!(clinic.accepting_status, AcceptingStatus::Waitlist);
    assert_eq!(clinic.status_verified_by, Some(VerifiedBy::Community));
    assert_eq!(clinic.phone, None);
}

#[test]
fn moderator_edit_rejects_blank_name() {
    let app = test_app();
    let id = app.seed_clinic("Harbourview Clinic", "Halifax");
    let moderator = app.sign_in_moderator();

    let resp = app.post_form(&format!("/admin/clinics/{id}"), "name=+", Some(&moderator));
    assert_eq!(resp.status(), 400);
}

#[test]
fn moderator_can_change_a_plan() {
    let app = test_app();
    app.sign_in("patient@example.com");
    let user_id = app
        .state
        .db
        .with_conn(|conn| get_or_create_user(conn, "patient@example.com", 0))
        .unwrap();

    let moderator = app.sign_in_moderator();
    let resp = app.post_form(&format!("/admin/users/{user_id}/plan"), "plan=premium", Some(&moderator));
    assert_eq!(resp.status(), 302);

    let plan = app.state.db.with_conn(|conn| get_user_plan(conn, user_id)).unwrap();
    assert_eq!(plan.code, "premium");
    assert_eq!(plan.alert_limit, None);

    let resp = app.post_form(&format!("/admin/users/{user_id}/plan"), "plan=gold", Some(&moderator));
    assert_eq!(resp.status(), 400);
}

#[test]
fn import_replaces_the_directory() {
    let app = test_app();
    app.seed_clinic("Old Listing", "Nowhere");
    let moderator = app.sign_in_moderator();

    let csv = "name,address,city,province,postal_code,phone,website,accepting_status\n\
               Harbourview Clinic,1 Water St,Halifax,NS,B3H 1A1,,,accepting\n\
               Cove Medical,2 Main St,Digby,NS,B0V 1A0,,,\n";
    let form: String = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("csv", csv)
        .finish();

    let resp = app.post_form("/admin/import", &form, Some(&moderator));
    assert_eq!(resp.status(), 302);
    assert_eq!(app.state.db.with_conn(|conn| count_clinics(conn)).unwrap(), 2);

    let body = body_string(app.get("/search?q=old", None));
    assert!(body.contains("No clinics match"));
}

#[test]
fn raw_csv_import_reports_bad_lines() {
    let app = test_app();
    app.seed_clinic("Keep Me", "Halifax");
    let moderator = app.sign_in_moderator();

    let req = Request::builder()
        .method(Method::POST)
        .uri("/admin/import")
        .header("Content-Type", "text/csv")
        .header("Cookie", moderator.as_str())
        .body(Body::from(
            b"name,address,city,province,postal_code,phone,website,accepting_status\nA,,Halifax,NS,,,,open\n"
                .to_vec(),
        ))
        .unwrap();
    let resp = app.send(req);
    assert_eq!(resp.status(), 400);
    assert!(body_string(resp).contains("line 2"));
    assert_eq!(app.state.db.with_conn(|conn| count_clinics(conn)).unwrap(), 1);
}

#[test]
fn oversized_import_is_rejected_whole() {
    let app = test_app();
    app.seed_clinic("Keep Me", "Halifax");
    let moderator = app.sign_in_moderator();

    let header = "name,address,city,province,postal_code,phone,website,accepting_status\n";
    let row = "Filler Clinic,1 Main St,Halifax,NS,B3H 1A1,,,accepting\n";
    let mut csv = String::from(header);
    while (csv.len() as u64) < MAX_BODY_BYTES {
        csv.push_str(row);
    }
    csv.truncate(MAX_BODY_BYTES as usize);
    csv.push('\n');
    assert_eq!(csv.len() as u64, MAX_BODY_BYTES + 1);

    let req = Request::builder()
        .method(Method::POST)
        .uri("/admin/import")
        .header("Content-Type", "text/csv")
        .header("Cookie", moderator.as_str())
        .body(Body::from(csv.into_bytes()))
        .unwrap();
    let resp = app.send(req);
    assert_eq!(resp.status(), 400);
    assert!(body_string(resp).contains("too large"));
    assert_eq!(app.state.db.with_conn(|conn| count_clinics(conn)).unwrap(), 1);
}
