use std::collections::HashMap;
use std::io::Read;
use std::net::SocketAddr;
use std::sync::Arc;

use astra::Request;
use tracing::{debug, warn};

use crate::alerts::{self, AlertCriteria, Notifier};
use crate::auth::claim::{ClaimConfig, ClaimService, OperatorEdit};
use crate::auth::magic::{MagicLinkConfig, MagicLinkService};
use crate::auth::sessions::{self, SessionUser};
use crate::config::Config;
use crate::consensus::{self, ledger, moderation, ReportInput};
use crate::db::{clinics, plans, reports, Database};
use crate::domain::{AcceptingStatus, Clinic, ClinicPatch, StatusChange, VerifiedBy};
use crate::errors::ServerError;
use crate::import;
use crate::mailer::Mailer;
use crate::responses::{html_response, redirect, redirect_with_cookie, ResultResp};
use crate::templates::pages;

/// Largest request body accepted (bulk imports included).
pub const MAX_BODY_BYTES: u64 = 4 * 1024 * 1024;

const CLINIC_PAGE_REPORTS: i64 = 10;

/// Everything a request handler can reach.
pub struct AppState {
    pub db: Database,
    pub config: Config,
    pub mailer: Arc<dyn Mailer>,
    pub notifier: Arc<dyn Notifier>,
}

/// Socket peer address, attached to each request by the server loop.
#[derive(Debug, Clone, Copy)]
pub struct ClientAddr(pub SocketAddr);

pub fn handle(mut req: Request, state: &AppState) -> ResultResp {
    let method = req.method().as_str().to_string();
    let path = req.uri().path().to_string();
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    let now = now_unix();

    let user = current_user(&req, state, now)?;
    debug!(%method, %path, signed_in = user.is_some(), "request");

    match (method.as_str(), segments.as_slice()) {
        ("GET", [""]) | ("GET", ["search"]) => search(&req, state, user.as_ref()),
        ("GET", ["login"]) => html_response(pages::login_page()),

        ("POST", ["auth", "request-link"]) => request_link(&mut req, state, now),
        ("GET", ["auth", "magic"]) => redeem_link(&req, state, now),
        ("POST", ["auth", "logout"]) => logout(&req, state, now),

        ("GET", ["clinics", id]) => clinic_detail(state, user.as_ref(), path_id(id, "clinic")?),
        ("POST", ["clinics", id, "report"]) => {
            submit_report(&mut req, state, path_id(id, "clinic")?, now)
        }
        ("POST", ["clinics", id, "claim"]) => {
            request_claim(&mut req, state, path_id(id, "clinic")?, now)
        }

        ("GET", ["claim", "verify"]) => claim_form(&req, state, now),
        ("POST", ["claim", "verify"]) => claim_submit(&mut req, state, now),

        ("GET", ["alerts"]) => alerts_page(state, sessions::require_user(user)?, now),
        ("POST", ["alerts"]) => create_alert(&mut req, state, sessions::require_user(user)?, now),
        ("POST", ["alerts", id, "delete"]) => {
            let user = sessions::require_user(user)?;
            let alert_id = path_id(id, "alert")?;
            state
                .db
                .with_conn(|conn| alerts::delete_alert(conn, user.id, alert_id))?;
            redirect("/alerts")
        }

        ("GET", ["admin"]) => admin_page(state, sessions::require_moderator(user)?),
        ("POST", ["admin", "pending", id, "approve"]) => {
            sessions::require_moderator(user)?;
            let pending_id = path_id(id, "pending update")?;
            let approved = state
                .db
                .with_conn(|conn| moderation::approve(conn, pending_id, now))?;
            if approved.status_change().is_some() {
                notify(state, &approved.clinic);
            }
            redirect("/admin")
        }
        ("POST", ["admin", "pending", id, "dismiss"]) => {
            sessions::require_moderator(user)?;
            let pending_id = path_id(id, "pending update")?;
            state
                .db
                .with_conn(|conn| moderation::dismiss(conn, pending_id))?;
            redirect("/admin")
        }
        ("POST", ["admin", "reports", id, "delete"]) => {
            sessions::require_moderator(user)?;
            let report_id = path_id(id, "report")?;
            state
                .db
                .with_conn(|conn| moderation::delete_report(conn, report_id))?;
            redirect("/admin")
        }
        ("GET", ["admin", "clinics", id]) => {
            let user = sessions::require_moderator(user)?;
            let clinic_id = path_id(id, "clinic")?;
            let clinic = state
                .db
                .with_conn(|conn| clinics::require_clinic(conn, clinic_id))?;
            html_response(pages::clinic_edit_page(&user, &clinic))
        }
        ("POST", ["admin", "clinics", id]) => {
            sessions::require_moderator(user)?;
            moderator_edit(&mut req, state, path_id(id, "clinic")?, now)
        }
        ("POST", ["admin", "users", id, "plan"]) => {
            sessions::require_moderator(user)?;
            let user_id = path_id(id, "user")?;
            let form = parse_form(&mut req)?;
            let plan = required(&form, "plan")?;
            state
                .db
                .with_conn(|conn| plans::set_user_plan(conn, user_id, &plan, now))?;
            redirect("/admin")
        }
        ("POST", ["admin", "import"]) => {
            sessions::require_moderator(user)?;
            import_clinics(&mut req, state, now)
        }

        _ => Err(ServerError::not_found("page")),
    }
}

pub fn is_htmx(req: &Request) -> bool {
    req.headers()
        .get("HX-Request")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == "true")
}

fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}

// -------- request helpers --------

fn parse_query(req: &Request) -> HashMap<String, String> {
    req.uri()
        .query()
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

/// Bodies over the cap are rejected whole, never cut short.
fn read_body(req: &mut Request) -> Result<Vec<u8>, ServerError> {
    let mut buf = Vec::new();
    req.body_mut()
        .reader()
        .take(MAX_BODY_BYTES + 1)
        .read_to_end(&mut buf)
        .map_err(|e| ServerError::BadRequest(format!("could not read request body: {e}")))?;
    if buf.len() as u64 > MAX_BODY_BYTES {
        return Err(ServerError::BadRequest("request body too large".into()));
    }
    Ok(buf)
}

fn parse_form(req: &mut Request) -> Result<HashMap<String, String>, ServerError> {
    let body = read_body(req)?;
    Ok(url::form_urlencoded::parse(&body).into_owned().collect())
}

fn required(form: &HashMap<String, String>, field: &str) -> Result<String, ServerError> {
    form.get(field)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ServerError::validation(field, "is required"))
}

/// A blank or missing value means "no choice".
fn optional_status(
    form: &HashMap<String, String>,
    field: &str,
) -> Result<Option<AcceptingStatus>, ServerError> {
    match form.get(field).map(|s| s.trim()).filter(|s| !s.is_empty()) {
        Some(raw) => Ok(Some(raw.parse()?)),
        None => Ok(None),
    }
}

fn path_id(raw: &str, what: &str) -> Result<i64, ServerError> {
    raw.parse()
        .map_err(|_| ServerError::not_found(format!("{what} {raw}")))
}

/// The socket peer, or the first X-Forwarded-For hop when running behind
/// a trusted proxy.
fn client_ip(req: &Request, trust_forwarded_for: bool) -> String {
    let forwarded = req
        .headers()
        .get("X-Forwarded-For")
        .filter(|_| trust_forwarded_for)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    match forwarded {
        Some(ip) => ip.to_string(),
        None => req
            .extensions()
            .get::<ClientAddr>()
            .map(|a| a.0.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string()),
    }
}

fn session_token(req: &Request) -> Option<String> {
    req.headers()
        .get("Cookie")
        .and_then(|v| v.to_str().ok())
        .and_then(sessions::session_token_from_cookie)
        .map(str::to_string)
}

fn current_user(
    req: &Request,
    state: &AppState,
    now: i64,
) -> Result<Option<SessionUser>, ServerError> {
    match session_token(req) {
        Some(token) => state
            .db
            .with_conn(|conn| sessions::load_user_from_session(conn, &token, now)),
        None => Ok(None),
    }
}

/// Fan a committed status change out to subscribers. Never fails the request.
fn notify(state: &AppState, clinic: &Clinic) {
    let res = state.db.with_conn(|conn| {
        Ok(alerts::notify_status_change(conn, state.notifier.as_ref(), clinic))
    });
    if let Err(e) = res {
        warn!(clinic_id = clinic.id, error = %e, "alert dispatch skipped");
    }
}

// -------- directory --------

fn search(req: &Request, state: &AppState, user: Option<&SessionUser>) -> ResultResp {
    let query = parse_query(req);
    let q = query.get("q").cloned().unwrap_or_default();
    let status = optional_status(&query, "status")?;

    let found = state
        .db
        .with_conn(|conn| clinics::search_clinics(conn, &q, status, clinics::SEARCH_LIMIT))?;

    if is_htmx(req) {
        return html_response(pages::search_results(&found));
    }
    html_response(pages::home_page(&pages::SearchVm {
        user,
        query: q,
        status,
        clinics: found,
    }))
}

fn clinic_detail(state: &AppState, user: Option<&SessionUser>, clinic_id: i64) -> ResultResp {
    let (clinic, open_tallies, recent_reports) = state.db.with_conn(|conn| {
        let clinic = clinics::require_clinic(conn, clinic_id)?;
        let open = ledger::open_tallies(conn, clinic_id)?;
        let recent = reports::list_reports_for_clinic(conn, clinic_id, CLINIC_PAGE_REPORTS)?;
        Ok((clinic, open, recent))
    })?;

    html_response(pages::clinic_page(&pages::ClinicVm {
        user,
        clinic,
        open_tallies,
        recent_reports,
        threshold: state.config.approval_threshold,
    }))
}

fn submit_report(req: &mut Request, state: &AppState, clinic_id: i64, now: i64) -> ResultResp {
    let ip = client_ip(req, state.config.trust_forwarded_for);
    let form = parse_form(req)?;
    let status = form.get("status").map(String::as_str).unwrap_or("");

    let input = ReportInput {
        clinic_id,
        status,
        detail: form.get("detail").map(String::as_str),
        submitter_ip: &ip,
    };
    let outcome = state.db.with_conn(|conn| {
        consensus::submit_report(conn, &input, state.config.approval_threshold, now)
    })?;

    if outcome.status_change().is_some() {
        let clinic = state
            .db
            .with_conn(|conn| clinics::require_clinic(conn, clinic_id))?;
        notify(state, &clinic);
    }

    if is_htmx(req) {
        html_response(pages::report_ack(&outcome))
    } else {
        redirect(&format!("/clinics/{clinic_id}"))
    }
}

// -------- sign-in --------

fn request_link(req: &mut Request, state: &AppState, now: i64) -> ResultResp {
    let form = parse_form(req)?;
    let email = form.get("email").map(String::as_str).unwrap_or("");

    let svc = MagicLinkService::new(MagicLinkConfig::from(&state.config));
    let issued = state
        .db
        .with_conn(|conn| svc.request_link(conn, email, now))?;

    state
        .mailer
        .send_signin_link(&issued.email, &state.config.absolute_url(&issued.link))?;

    html_response(pages::check_email_content(&issued.email))
}

fn redeem_link(req: &Request, state: &AppState, now: i64) -> ResultResp {
    let query = parse_query(req);
    let token = query.get("token").map(String::as_str).unwrap_or("");
    let ttl = state.config.session_ttl_secs;

    let svc = MagicLinkService::new(MagicLinkConfig::from(&state.config));
    let raw_session = state.db.with_conn(|conn| {
        let redeemed = svc.redeem(conn, token, now)?;
        sessions::create_session(conn, redeemed.user_id, now, ttl)
    })?;

    redirect_with_cookie("/alerts", &sessions::session_cookie(&raw_session, ttl))
}

fn logout(req: &Request, state: &AppState, now: i64) -> ResultResp {
    if let Some(token) = session_token(req) {
        state
            .db
            .with_conn(|conn| sessions::revoke_session(conn, &token, now))?;
    }
    redirect_with_cookie("/", &sessions::clear_session_cookie())
}

// -------- claim --------

fn request_claim(req: &mut Request, state: &AppState, clinic_id: i64, now: i64) -> ResultResp {
    let form = parse_form(req)?;
    let email = form.get("email").map(String::as_str).unwrap_or("");

    let svc = ClaimService::new(ClaimConfig::from(&state.config));
    let issued = state
        .db
        .with_conn(|conn| svc.request_claim(conn, clinic_id, email, now))?;

    state.mailer.send_claim_link(
        &issued.email,
        &issued.clinic.name,
        &state.config.absolute_url(&issued.link),
    )?;

    html_response(pages::check_claim_email_content(&issued.email, clinic_id))
}

fn claim_form(req: &Request, state: &AppState, now: i64) -> ResultResp {
    let query = parse_query(req);
    let raw = query.get("token").map(String::as_str).unwrap_or("");

    let svc = ClaimService::new(ClaimConfig::from(&state.config));
    let (token, clinic) = state.db.with_conn(|conn| svc.inspect(conn, raw, now))?;

    html_response(pages::claim_verify_page(raw.trim(), &token, &clinic))
}

fn claim_submit(req: &mut Request, state: &AppState, now: i64) -> ResultResp {
    let form = parse_form(req)?;
    let raw = form.get("token").map(String::as_str).unwrap_or("");

    let edit = OperatorEdit {
        status: optional_status(&form, "status")?,
        address: form.get("address").cloned(),
        phone: form.get("phone").cloned(),
        website: form.get("website").cloned(),
    };

    let svc = ClaimService::new(ClaimConfig::from(&state.config));
    let outcome = state
        .db
        .with_conn(|conn| svc.complete(conn, raw, &edit, now))?;

    if outcome.status_change().is_some() {
        notify(state, &outcome.clinic);
    }
    html_response(pages::claim_done_page(&outcome.clinic))
}

// -------- alerts --------

fn alerts_page(state: &AppState, user: SessionUser, now: i64) -> ResultResp {
    let (plan, saved) = state.db.with_conn(|conn| {
        plans::ensure_entitlement(conn, user.id, plans::DEFAULT_PLAN, now)?;
        let plan = plans::get_user_plan(conn, user.id)?;
        let saved = alerts::list_alerts(conn, user.id)?;
        Ok((plan, saved))
    })?;

    html_response(pages::alerts_page(&pages::AlertsVm {
        user: &user,
        plan,
        alerts: saved,
    }))
}

fn create_alert(req: &mut Request, state: &AppState, user: SessionUser, now: i64) -> ResultResp {
    let form = parse_form(req)?;

    let status = optional_status(&form, "status")?
        .ok_or_else(|| ServerError::validation("status", "is required"))?;
    let clinic_id = match form.get("clinic_id").map(|s| s.trim()).filter(|s| !s.is_empty()) {
        Some(raw) => Some(
            raw.parse::<i64>()
                .map_err(|_| ServerError::validation("clinic_id", "must be a number"))?,
        ),
        None => None,
    };

    let criteria = AlertCriteria {
        clinic_id,
        city: form.get("city").cloned(),
        status,
    };
    state
        .db
        .with_conn(|conn| alerts::create_alert(conn, user.id, &criteria, now))?;

    redirect("/alerts")
}

// -------- moderation --------

fn admin_page(state: &AppState, user: SessionUser) -> ResultResp {
    let vm = state.db.with_conn(|conn| {
        Ok(pages::AdminVm {
            user: &user,
            threshold: state.config.approval_threshold,
            pending: moderation::list_pending(conn)?,
            reports: moderation::list_recent_reports(conn)?,
            users: plans::list_users_with_plans(conn)?,
            plans: plans::list_plans(conn)?,
            clinic_count: clinics::count_clinics(conn)?,
        })
    })?;

    html_response(pages::admin_page(&vm))
}

fn moderator_edit(req: &mut Request, state: &AppState, clinic_id: i64, now: i64) -> ResultResp {
    let form = parse_form(req)?;

    let text = |field: &str| form.get(field).map(|v| v.trim().to_string());
    let optional = |field: &str| text(field).map(|v| (!v.is_empty()).then_some(v));

    let name = text("name");
    if name.as_deref() == Some("") {
        return Err(ServerError::validation("name", "must not be empty"));
    }

    let patch = ClinicPatch {
        name,
        address: text("address"),
        city: text("city"),
        province: text("province"),
        postal_code: text("postal_code"),
        phone: optional("phone"),
        website: optional("website"),
        status: optional_status(&form, "status")?.map(|status| StatusChange {
            status,
            verified_by: VerifiedBy::Community,
            at: now,
        }),
    };

    let (before, after) = state.db.with_conn(|conn| {
        let before = clinics::require_clinic(conn, clinic_id)?;
        clinics::update_clinic(conn, clinic_id, &patch)?;
        let after = clinics::require_clinic(conn, clinic_id)?;
        Ok((before, after))
    })?;

    if before.accepting_status != after.accepting_status {
        notify(state, &after);
    }
    redirect(&format!("/clinics/{clinic_id}"))
}

fn import_clinics(req: &mut Request, state: &AppState, now: i64) -> ResultResp {
    let is_csv = req
        .headers()
        .get("Content-Type")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("text/csv"));

    let data = if is_csv {
        read_body(req)?
    } else {
        parse_form(req)?
            .remove("csv")
            .unwrap_or_default()
            .into_bytes()
    };

    state
        .db
        .with_conn(|conn| import::replace_clinics(conn, &data, now))?;
    redirect("/admin")
}
