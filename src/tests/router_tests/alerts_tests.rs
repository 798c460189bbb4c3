use crate::alerts::list_alerts;
use crate::db::auth::get_or_create_user;
use crate::tests::utils::{body_string, location, test_app};

#[test]
fn alerts_require_sign_in() {
    let app = test_app();
    assert_eq!(app.get("/alerts", None).status(), 401);
    assert_eq!(app.post_form("/alerts", "status=accepting", None).status(), 401);
}

#[test]
fn free_plan_stops_at_one_alert() {
    let app = test_app();
    let cookie = app.sign_in("patient@example.com");

    let resp = app.post_form("/alerts", "status=accepting&city=Halifax", Some(&cookie));
    assert_eq!(resp.status(), 302);
    assert_eq!(location(&resp), "/alerts");

    let resp = app.post_form("/alerts", "status=waitlist&city=Truro", Some(&cookie));
    assert_eq!(resp.status(), 402);

    let body = body_string(app.get("/alerts", Some(&cookie)));
    assert!(body.contains("1 / 1"));
    assert!(!body.contains("Truro"));
}

#[test]
fn alert_for_one_clinic() {
    let app = test_app();
    let id = app.seed_clinic("Harbourview Clinic", "Halifax");
    let cookie = app.sign_in("patient@example.com");

    let resp = app.post_form("/alerts", &format!("status=accepting&clinic_id={id}"), Some(&cookie));
    assert_eq!(resp.status(), 302);

    let resp = app.post_form("/alerts", "status=accepting&clinic_id=abc", Some(&cookie));
    assert_eq!(resp.status(), 400);
}

#[test]
fn only_the_owner_can_delete_an_alert() {
    let app = test_app();
    let owner = app.sign_in("owner@example.com");
    let other = app.sign_in("other@example.com");
    app.post_form("/alerts", "status=accepting", Some(&owner));

    let owner_id = app
        .state
        .db
        .with_conn(|conn| get_or_create_user(conn, "owner@example.com", 0))
        .unwrap();
    let alert_id = app
        .state
        .db
        .with_conn(|conn| list_alerts(conn, owner_id))
        .unwrap()[0]
        .id;

    let path = format!("/alerts/{alert_id}/delete");
    assert_eq!(app.post_form(&path, "", Some(&other)).status(), 404);
    assert_eq!(app.post_form(&path, "", Some(&owner)).status(), 302);

    let left = app.state.db.with_conn(|conn| list_alerts(conn, owner_id)).unwrap();
    assert!(left.is_empty());
}
