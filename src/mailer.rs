// src/mailer.rs

use maud::{html, Markup};
use reqwest::blocking::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::Config;
use crate::domain::Clinic;
use crate::errors::ServerError;

const BREVO_SEND_URL: &str = "https://api.brevo.com/v3/smtp/email";

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("Request failed: {0}")]
    RequestFailed(String),
    #[error("API error: {0}")]
    ApiError(String),
}

impl From<MailerError> for ServerError {
    fn from(e: MailerError) -> Self {
        ServerError::Mail(e.to_string())
    }
}

/// Outbound transactional mail.
pub trait Mailer: Send + Sync {
    fn send_html(&self, to: &str, subject: &str, body: Markup) -> Result<(), MailerError>;

    fn send_signin_link(&self, to: &str, link: &str) -> Result<(), MailerError> {
        let body = html! {
            h1 { "Sign in to the family doctor directory" }
            p { "Click the link below to sign in. It expires shortly and works once." }
            p { a href=(link) { "Sign in" } }
            p { "If you did not request this link, you can safely ignore this email." }
        };
        self.send_html(to, "Your sign-in link", body)
    }

    fn send_claim_link(&self, to: &str, clinic_name: &str, link: &str) -> Result<(), MailerError> {
        let body = html! {
            h1 { "Verify your clinic listing" }
            p { "Someone asked to manage the listing for " strong { (clinic_name) } " with this address." }
            p { a href=(link) { "Open the listing editor" } }
            p { "The link works once. If this wasn't you, ignore this email." }
        };
        self.send_html(to, &format!("Manage {clinic_name}"), body)
    }

    fn send_status_alert(&self, to: &str, clinic: &Clinic, link: &str) -> Result<(), MailerError> {
        let body = html! {
            h1 { (clinic.name) }
            p {
                "The listing in " (clinic.city) " is now marked "
                strong { (clinic.accepting_status.label()) } "."
            }
            p { a href=(link) { "View the clinic" } }
            p { "You are receiving this because of an alert you saved." }
        };
        self.send_html(
            to,
            &format!("{}: {}", clinic.name, clinic.accepting_status.label()),
            body,
        )
    }
}

pub struct BrevoMailer {
    api_key: String,
    sender_email: String,
    sender_name: String,
    client: Client,
}

#[derive(Serialize)]
struct BrevoSender<'a> {
    name: &'a str,
    email: &'a str,
}

#[derive(Serialize)]
struct BrevoRecipient<'a> {
    email: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BrevoPayload<'a> {
    sender: BrevoSender<'a>,
    to: Vec<BrevoRecipient<'a>>,
    subject: &'a str,
    html_content: String,
}

impl BrevoMailer {
    pub fn new(api_key: String, sender_email: String, sender_name: String) -> Self {
        Self {
            api_key,
            sender_email,
            sender_name,
            client: Client::new(),
        }
    }
}

impl Mailer for BrevoMailer {
    fn send_html(&self, to: &str, subject: &str, body: Markup) -> Result<(), MailerError> {
        let payload = BrevoPayload {
            sender: BrevoSender {
                name: &self.sender_name,
                email: &self.sender_email,
            },
            to: vec![BrevoRecipient { email: to }],
            subject,
            html_content: body.into_string(),
        };

        let resp = self
            .client
            .post(BREVO_SEND_URL)
            .header("api-key", &self.api_key)
            .json(&payload)
            .send()
            .map_err(|e| MailerError::RequestFailed(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_body = resp.text().unwrap_or_else(|_| "Unknown error".to_string());
            return Err(MailerError::ApiError(format!(
                "{status}: {}",
                api_error_message(&error_body)
            )));
        }

        debug!(subject, "mail sent");
        Ok(())
    }
}

/// Brevo errors look like `{"code":"unauthorized","message":"Key not found"}`.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

/// Used when no API key is configured: the message is logged instead of sent.
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send_html(&self, to: &str, subject: &str, body: Markup) -> Result<(), MailerError> {
        info!(to, subject, body = %body.into_string(), "mail not sent (no BREVO_API_KEY)");
        Ok(())
    }
}

pub fn from_config(cfg: &Config) -> Box<dyn Mailer> {
    match &cfg.brevo_api_key {
        Some(key) => Box::new(BrevoMailer::new(
            key.clone(),
            cfg.sender_email.clone(),
            cfg.sender_name.clone(),
        )),
        None => Box::new(LogMailer),
    }
}
