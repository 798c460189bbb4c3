use crate::db::clinics::require_clinic;
use crate::domain::{AcceptingStatus, VerifiedBy};
use crate::tests::utils::{body_string, test_app, TestApp};

const OFFICE: &str = "office@harbourview.ca";

fn request_claim(app: &TestApp, clinic_id: i64, email: &str) -> String {
    let resp = app.post_form(&format!("/clinics/{clinic_id}/claim"), &format!("email={email}"), None);
    assert_eq!(resp.status(), 200);
    assert!(body_string(resp).contains("Check your email"));
    app.mail.last_token("/claim/verify").expect("no claim mail")
}

#[test]
fn claim_flow_sets_clinic_verified_status() {
    let app = test_app();
    let id = app.seed_clinic("Harbourview Clinic", "Halifax");
    let token = request_claim(&app, id, OFFICE);

    let resp = app.get(&format!("/claim/verify?token={token}"), None);
    assert_eq!(resp.status(), 200);
    let body = body_string(resp);
    assert!(body.contains("Claim this listing"));
    assert!(body.contains("Harbourview Clinic"));

    let form = format!("token={token}&status=accepting&address=1+Water+St&phone=902-555-0101&website=");
    let resp = app.post_form("/claim/verify", &form, None);
    assert_eq!(resp.status(), 200);

    let clinic = app.state.db.with_conn(|conn| require_clinic(conn, id)).unwrap();
    assert_eq!(clinic.accepting_status, AcceptingStatus::Accepting);
    assert_eq!(clinic.status_verified_by, Some(VerifiedBy::Clinic));
    assert_eq!(clinic.address, "1 Water St");
    assert_eq!(clinic.phone.as_deref(), Some("902-555-0101"));
    assert!(clinic.claimed_by_clinic);
    assert_eq!(clinic.claimed_email.as_deref(), Some(OFFICE));
}

#[test]
fn used_claim_link_is_rejected() {
    let app = test_app();
    let id = app.seed_clinic("Harbourview Clinic", "Halifax");
    let token = request_claim(&app, id, OFFICE);

    let form = format!("token={token}&status=waitlist");
    assert_eq!(app.post_form("/claim/verify", &form, None).status(), 200);
    assert_eq!(app.post_form("/claim/verify", &form, None).status(), 409);
    assert_eq!(app.get(&format!("/claim/verify?token={token}"), None).status(), 409);
}

#[test]
fn unknown_claim_link_is_404() {
    let app = test_app();
    assert_eq!(app.get("/claim/verify?token=not-a-real-token", None).status(), 404);
}

#[test]
fn claimed_clinic_only_accepts_its_claimant() {
    let app = test_app();
    let id = app.seed_clinic("Harbourview Clinic", "Halifax");
    let token = request_claim(&app, id, OFFICE);
    app.post_form("/claim/verify", &format!("token={token}"), None);

    let resp = app.post_form(&format!("/clinics/{id}/claim"), "email=someone@else.ca", None);
    assert_eq!(resp.status(), 403);

    let token = request_claim(&app, id, OFFICE);
    let resp = app.get(&format!("/claim/verify?token={token}"), None);
    assert!(body_string(resp).contains("Update your listing"));
}

#[test]
fn empty_status_leaves_status_unchanged() {
    let app = test_app();
    let id = app.seed_clinic("Harbourview Clinic", "Halifax");
    let token = request_claim(&app, id, OFFICE);

    let resp = app.post_form("/claim/verify", &format!("token={token}&status=&phone=555"), None);
    assert_eq!(resp.status(), 200);

    let clinic = app.state.db.with_conn(|conn| require_clinic(conn, id)).unwrap();
    assert_eq!(clinic.accepting_status, AcceptingStatus::Unknown);
    assert_eq!(clinic.status_verified_by, None);
    assert_eq!(clinic.phone.as_deref(), Some("555"));
}
