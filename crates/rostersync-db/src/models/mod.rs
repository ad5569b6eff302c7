//! Table models. Each exposes associated query functions over any
//! `PgExecutor`, so they run equally on the pool or inside a transaction.

pub mod course;
pub mod enrolment;
pub mod group;
pub mod grouping;
pub mod role_assignment;
pub mod user;

pub use course::CourseRow;
pub use enrolment::{EnrolInstanceRow, UserEnrolment};
pub use group::{GroupMember, GroupRow};
pub use grouping::{GroupingGroup, GroupingRow};
pub use role_assignment::RoleAssignment;
pub use user::UserRow;
