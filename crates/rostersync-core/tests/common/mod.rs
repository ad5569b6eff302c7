//! Shared fixtures for rostersync-core integration tests.
//!
//! Builds an engine over an [`InMemoryBackend`] with a fixed clock so
//! enrolment windows are deterministic.

#![allow(dead_code)]

use std::sync::{Arc, Once};

use chrono::{FixedOffset, TimeZone};
use rostersync_core::{
    ContextId, Course, CourseId, FixedClock, InMemoryBackend, ReconcileOptions,
    ReconciliationEngine, RoleId, RunSummary, Stores, TemplateCatalog, User, UserId,
    VecRecordSource,
};

static INIT: Once = Once::new();

/// Initialize logging for tests (once).
pub fn init_test_logging() {
    INIT.call_once(|| {
        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::fmt()
                .with_test_writer()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .try_init()
                .ok();
        }
    });
}

/// Test context: one backend, one course, one role.
pub struct TestContext {
    pub backend: Arc<InMemoryBackend>,
    pub engine: ReconciliationEngine,
    pub course: Course,
    pub role_id: RoleId,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_backend(Arc::new(InMemoryBackend::new()))
    }

    pub fn with_backend(backend: Arc<InMemoryBackend>) -> Self {
        init_test_logging();
        let engine = ReconciliationEngine::new(
            Stores::from_backend(backend.clone()),
            Arc::new(TemplateCatalog::english()),
        )
        .with_clock(Arc::new(FixedClock(fixed_now())));
        Self {
            backend,
            engine,
            course: test_course(),
            role_id: RoleId::new(),
        }
    }

    /// Register a user whose full name is "<First> <Last>".
    pub async fn add_user(&self, username: &str, first: &str, last: &str) -> UserId {
        let id = UserId::new();
        self.backend
            .insert_user(User {
                id,
                username: username.to_string(),
                id_number: Some(format!("ID-{username}")),
                email: Some(format!("{username}@example.edu")),
                first_name: first.to_string(),
                last_name: last.to_string(),
            })
            .await;
        id
    }

    /// Grant the context's role in the course directly.
    pub async fn grant_role(&self, user_id: UserId) {
        self.backend
            .insert_role_assignment(user_id, self.role_id, self.course.context_id)
            .await;
    }

    /// Run the engine over in-memory rows.
    pub async fn run(&self, rows: &[&[&str]], options: &ReconcileOptions) -> RunSummary {
        let mut source = VecRecordSource::from_rows(rows.iter().map(|r| r.iter().copied()));
        self.engine
            .process(&mut source, &self.course, self.role_id, options)
            .await
            .expect("reconciliation run failed")
    }
}

pub fn test_course() -> Course {
    Course {
        id: CourseId::new(),
        context_id: ContextId::new(),
        short_name: "BIO101".to_string(),
    }
}

/// 2024-09-02 10:15 at UTC+2.
pub fn fixed_now() -> chrono::DateTime<FixedOffset> {
    FixedOffset::east_opt(2 * 3600)
        .unwrap()
        .with_ymd_and_hms(2024, 9, 2, 10, 15, 0)
        .unwrap()
}

pub fn create_all() -> ReconcileOptions {
    ReconcileOptions {
        create_groups: true,
        create_groupings: true,
        ..ReconcileOptions::default()
    }
}

pub fn create_groups_only() -> ReconcileOptions {
    ReconcileOptions {
        create_groups: true,
        ..ReconcileOptions::default()
    }
}

/// Log lines without the three closing statistics lines.
pub fn row_lines(summary: &RunSummary) -> Vec<&str> {
    let lines: Vec<&str> = summary.log().lines().collect();
    lines[..lines.len().saturating_sub(3)].to_vec()
}
