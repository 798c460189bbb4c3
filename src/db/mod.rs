pub mod alerts;
pub mod auth;
pub mod clinics;
pub mod connection;
pub mod pending;
pub mod plans;
pub mod reports;
pub mod tokens;

pub use connection::{init_db, Database};
