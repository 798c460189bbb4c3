mod admin_tests;
mod alerts_tests;
mod auth_tests;
mod claim_tests;
mod report_tests;
mod search_tests;
