pub mod admin;
pub mod alerts;
pub mod check_email;
pub mod claim;
pub mod clinic;
pub mod error;
pub mod home;
pub mod login;

pub use admin::{admin_page, clinic_edit_page, AdminVm};
pub use alerts::{alerts_page, AlertsVm};
pub use check_email::{check_claim_email_content, check_email_content};
pub use claim::{claim_done_page, claim_verify_page};
pub use clinic::{clinic_page, report_ack, ClinicVm};
pub use error::error_page;
pub use home::{home_page, search_results, SearchVm};
pub use login::login_page;
