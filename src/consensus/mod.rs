//! Community consensus: raw reports feed per-status tallies, and a tally
//! that reaches the threshold (or a moderator's approval) sets the status.

pub mod intake;
pub mod ledger;
pub mod moderation;
pub mod threshold;

pub use intake::{submit_report, IntakeOutcome, ReportInput};
pub use threshold::DEFAULT_THRESHOLD;
