//! rostersync Core Library
//!
//! Reconciles a course roster (one `identifier,group` row per user) against
//! a learning platform's enrolments, groups, groupings and group membership.
//!
//! # Modules
//!
//! - [`engine`] - Row-by-row reconciliation ([`ReconciliationEngine`])
//! - [`services`] - User resolution, enrolment, group catalogs, membership
//! - [`store`] - Collaborator traits implemented by storage backends
//! - [`memory`] - In-memory backend for tests and embedding
//! - [`source`] - Roster record sources (CSV, in-memory)
//! - [`messages`] - Localised run log messages
//! - [`summary`] - Counters, per-row reports and the run log
//! - [`lock`] - Per-course run locks
//! - [`types`] - Domain types and typed identifiers
//! - [`error`] - Error type ([`EnrolError`])
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use rostersync_core::{
//!     ContextId, Course, CourseId, InMemoryBackend, ReconcileOptions, ReconciliationEngine,
//!     RoleId, Stores, TemplateCatalog, User, UserId, VecRecordSource,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let backend = Arc::new(InMemoryBackend::new());
//! backend
//!     .insert_user(User {
//!         id: UserId::new(),
//!         username: "alice".into(),
//!         id_number: None,
//!         email: None,
//!         first_name: "Alice".into(),
//!         last_name: "Martin".into(),
//!     })
//!     .await;
//!
//! let engine = ReconciliationEngine::new(
//!     Stores::from_backend(backend),
//!     Arc::new(TemplateCatalog::english()),
//! );
//! let course = Course {
//!     id: CourseId::new(),
//!     context_id: ContextId::new(),
//!     short_name: "HIST200".into(),
//! };
//! let options = ReconcileOptions {
//!     create_groups: true,
//!     ..ReconcileOptions::default()
//! };
//! let mut source = VecRecordSource::from_rows([["alice", "Seminar-A"]]);
//!
//! let summary = engine
//!     .process(&mut source, &course, RoleId::new(), &options)
//!     .await
//!     .unwrap();
//! assert_eq!(summary.enrolled_count, 1);
//! assert_eq!(summary.groups_created.names(), ["Seminar-A"]);
//! # }
//! ```

pub mod engine;
pub mod error;
pub mod lock;
pub mod memory;
pub mod messages;
pub mod services;
pub mod source;
pub mod store;
pub mod summary;
pub mod types;

// Re-export main types for convenient access
pub use engine::{Clock, FixedClock, ReconcileOptions, ReconciliationEngine, SystemClock};
pub use error::{EnrolError, Result};
pub use lock::{CourseGuard, CourseLocks};
pub use memory::InMemoryBackend;
pub use messages::{Message, MessageCatalog, TemplateCatalog, DEFAULT_LOCALE};
pub use source::{CsvDelimiter, CsvRecordSource, CsvSourceConfig, RecordSource, VecRecordSource};
pub use store::{
    Backend, EnrolmentPlugin, EnrolmentStore, GroupStore, GroupingStore, LinkStore,
    MembershipStore, RoleStore, Stores, UserStore,
};
pub use summary::{CreatedNames, RowFailure, RowOutcome, RowReport, RunSummary};
pub use types::{
    ContextId, Course, CourseId, EnrolInstance, EnrolInstanceId, EnrolMethod, EnrolWindow, Group,
    GroupId, Grouping, GroupingId, IdentifierField, LinkId, NewGroup, NewGrouping, ParseIdError,
    RawRecord, RoleId, Row, User, UserId,
};
