use std::io::Read;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use astra::{Body, Response};
use http::{Method, Request};

use crate::alerts::MailNotifier;
use crate::config::Config;
use crate::db::clinics::insert_clinic;
use crate::db::connection::{init_db, Database};
use crate::domain::NewClinic;
use crate::mailer::testing::RecordingMailer;
use crate::responses::error_to_response;
use crate::router::{handle, is_htmx, AppState, ClientAddr};

pub const MODERATOR_EMAIL: &str = "mod@famdoc.test";

static DB_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// A fresh file-backed DB with the production schema.
pub fn init_test_db() -> Database {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let n = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
    let path = std::env::temp_dir().join(format!("famdoc_test_{nanos}_{n}.sqlite"));
    let db = Database::new(path.to_string_lossy());

    init_db(&db).unwrap_or_else(|e| panic!("Database initialization failed: {e}"));
    db
}

pub struct TestApp {
    pub state: AppState,
    pub mail: Arc<RecordingMailer>,
}

pub fn test_app() -> TestApp {
    let config = Config {
        moderator_emails: vec![MODERATOR_EMAIL.to_string()],
        public_base_url: "http://famdoc.test".to_string(),
        ..Config::default()
    };
    let mail = Arc::new(RecordingMailer::default());
    let notifier = Arc::new(MailNotifier::new(mail.clone(), config.public_base_url.clone()));

    TestApp {
        state: AppState {
            db: init_test_db(),
            config,
            mailer: mail.clone(),
            notifier,
        },
        mail,
    }
}

impl TestApp {
    /// Runs a request the way the server loop does, errors rendered included.
    pub fn send(&self, req: Request<Body>) -> Response {
        let htmx = is_htmx(&req);
        match handle(req, &self.state) {
            Ok(resp) => resp,
            Err(err) => error_to_response(err, htmx),
        }
    }

    pub fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        self.send(build(Method::GET, uri, cookie, false, Vec::new()))
    }

    pub fn post_form(&self, uri: &str, form: &str, cookie: Option<&str>) -> Response {
        self.send(build(Method::POST, uri, cookie, false, form.as_bytes().to_vec()))
    }

    pub fn htmx_post(&self, uri: &str, form: &str, cookie: Option<&str>) -> Response {
        self.send(build(Method::POST, uri, cookie, true, form.as_bytes().to_vec()))
    }

    pub fn seed_clinic(&self, name: &str, city: &str) -> i64 {
        self.state
            .db
            .with_conn(|conn| {
                insert_clinic(
                    conn,
                    &NewClinic {
                        name: name.to_string(),
                        city: city.to_string(),
                        province: "NS".to_string(),
                        ..NewClinic::default()
                    },
                    0,
                )
            })
            .unwrap()
    }

    /// Goes through the emailed sign-in link; returns a `Cookie` header value.
    pub fn sign_in(&self, email: &str) -> String {
        let resp = self.post_form("/auth/request-link", &format!("email={email}"), None);
        assert_eq!(resp.status(), 200);

        let token = self.mail.last_token("/auth/magic").expect("no sign-in mail");
        let resp = self.get(&format!("/auth/magic?token={token}"), None);
        assert_eq!(resp.status(), 302);

        let set_cookie = resp
            .headers()
            .get("Set-Cookie")
            .expect("no session cookie")
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    pub fn sign_in_moderator(&self) -> String {
        self.sign_in(MODERATOR_EMAIL)
    }
}

fn build(method: Method, uri: &str, cookie: Option<&str>, htmx: bool, body: Vec<u8>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if !body.is_empty() {
        builder = builder.header("Content-Type", "application/x-www-form-urlencoded");
    }
    if let Some(c) = cookie {
        builder = builder.header("Cookie", c);
    }
    if htmx {
        builder = builder.header("HX-Request", "true");
    }
    builder.body(Body::from(body)).unwrap()
}

/// Socket peer for a request, as the server loop attaches it.
pub fn peer(ip: &str) -> ClientAddr {
    let ip: IpAddr = ip.parse().unwrap();
    ClientAddr(SocketAddr::new(ip, 40000))
}

pub fn body_string(resp: Response) -> String {
    let mut body = String::new();
    resp.into_body().reader().read_to_string(&mut body).unwrap();
    body
}

pub fn location(resp: &Response) -> &str {
    resp.headers().get("Location").unwrap().to_str().unwrap()
}
