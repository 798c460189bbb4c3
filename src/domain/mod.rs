pub mod claim;
pub mod clinic;
pub mod pending;
pub mod report;
pub mod status;

pub use claim::{ClaimState, TokenPurpose, VerificationToken};
pub use clinic::{Clinic, ClinicPatch, NewClinic, StatusChange};
pub use pending::{PendingUpdate, PendingWithClinic};
pub use report::{ReportWithClinic, StatusReport};
pub use status::{AcceptingStatus, VerifiedBy};
