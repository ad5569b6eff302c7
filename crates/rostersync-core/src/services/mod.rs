//! Services the reconciliation engine drives for each roster row.
//!
//! Each service wraps one or two collaborator stores and turns their raw
//! answers into an outcome enum the engine can branch on.

pub mod enrolment;
pub mod groups;
pub mod membership;
pub mod user_resolver;

pub use enrolment::{enrol_window, EnrolmentOutcome, EnrolmentService};
pub use groups::{Ensured, GroupCatalog, GroupingCatalog, LinkOutcome};
pub use membership::{MembershipManager, MembershipOutcome};
pub use user_resolver::UserResolver;
