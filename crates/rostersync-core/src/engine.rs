//! Roster reconciliation.
//!
//! [`ReconciliationEngine::process`] walks a record source once, in order,
//! and for each row:
//!
//! 1. resolves the user (unknown users end the row),
//! 2. enrols them with the requested role unless already assigned,
//! 3. finds or creates the group named in the row,
//! 4. finds or creates the same-named grouping and links the group into it,
//! 5. adds the user to the group.
//!
//! Row-level problems are written to the run log and recorded as a
//! [`RowFailure`]; the run continues with the next row. Collaborator errors
//! abort the run.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Local};

use crate::error::{EnrolError, Result};
use crate::lock::CourseLocks;
use crate::messages::{Message, MessageCatalog, DEFAULT_LOCALE};
use crate::services::{
    EnrolmentOutcome, EnrolmentService, Ensured, GroupCatalog, GroupingCatalog, LinkOutcome,
    MembershipManager, MembershipOutcome, UserResolver,
};
use crate::source::RecordSource;
use crate::store::Stores;
use crate::summary::{RowFailure, RowOutcome, RunSummary};
use crate::types::{Course, EnrolInstance, GroupId, IdentifierField, RoleId, Row};

/// Source of the current time. Enrolment windows start at its local midnight.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Wall clock in the server's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

/// Per-run switches.
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    /// User field the roster's first column is matched against.
    pub identifier_field: IdentifierField,
    /// Create groups that do not exist yet.
    pub create_groups: bool,
    /// Create groupings that do not exist yet.
    pub create_groupings: bool,
    /// Locale for log messages and for the language tag of new groups.
    pub locale: String,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            identifier_field: IdentifierField::Username,
            create_groups: false,
            create_groupings: false,
            locale: DEFAULT_LOCALE.to_string(),
        }
    }
}

/// Everything a row needs that stays fixed for the run.
struct RunContext<'a> {
    course: &'a Course,
    instance: &'a EnrolInstance,
    role_id: RoleId,
    options: &'a ReconcileOptions,
}

pub struct ReconciliationEngine {
    users: UserResolver,
    enrolment: EnrolmentService,
    groups: GroupCatalog,
    groupings: GroupingCatalog,
    memberships: MembershipManager,
    catalog: Arc<dyn MessageCatalog>,
    clock: Arc<dyn Clock>,
    locks: CourseLocks,
}

impl ReconciliationEngine {
    /// Build an engine with its own [`CourseLocks`].
    ///
    /// Runs on the same course exclude each other only when they go through
    /// this engine or through engines given the same locks via
    /// [`with_locks`](Self::with_locks).
    pub fn new(stores: Stores, catalog: Arc<dyn MessageCatalog>) -> Self {
        Self {
            users: UserResolver::new(stores.users),
            enrolment: EnrolmentService::new(stores.enrolments, stores.roles, stores.enrol_plugin),
            groups: GroupCatalog::new(stores.groups),
            groupings: GroupingCatalog::new(stores.groupings, stores.links),
            memberships: MembershipManager::new(stores.memberships),
            catalog,
            clock: Arc::new(SystemClock),
            locks: CourseLocks::new(),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Share run locks with other engines in the same process.
    #[must_use]
    pub fn with_locks(mut self, locks: CourseLocks) -> Self {
        self.locks = locks;
        self
    }

    /// Reconcile every record of `source` against `course`.
    ///
    /// Holds the course's run lock until the summary is complete.
    pub async fn process(
        &self,
        source: &mut dyn RecordSource,
        course: &Course,
        role_id: RoleId,
        options: &ReconcileOptions,
    ) -> Result<RunSummary> {
        if options.locale.trim().is_empty() {
            return Err(EnrolError::InvalidInput("locale must not be empty".into()));
        }

        let _guard = self.locks.acquire(course.id).await;

        tracing::info!(
            course_id = %course.id,
            course = %course.short_name,
            role_id = %role_id,
            identifier_field = options.identifier_field.as_str(),
            create_groups = options.create_groups,
            create_groupings = options.create_groupings,
            "Starting roster reconciliation"
        );

        let instance = self.enrolment.get_or_create_instance(course).await?;
        let run = RunContext {
            course,
            instance: &instance,
            role_id,
            options,
        };

        let mut summary = RunSummary::new();
        source.init()?;
        while let Some(record) = source.next_record()? {
            let Some(row) = Row::from_record(&record) else {
                tracing::debug!(line = record.line_number, "Skipping empty record");
                continue;
            };
            let outcome = self.process_row(&mut summary, &run, &row).await?;
            if let RowOutcome::Failed(failure) = outcome {
                tracing::warn!(
                    line = row.line_number,
                    identifier = %row.identifier,
                    group = %row.group_name,
                    failure = ?failure,
                    "Roster row not fully applied"
                );
            }
            summary.report(row.line_number, &row.identifier, outcome);
        }
        summary.finalize(self.catalog.as_ref(), &options.locale);

        tracing::info!(
            course_id = %course.id,
            rows = summary.processed_rows(),
            enrolled = summary.enrolled_count,
            groups_created = summary.groups_created.count(),
            groupings_created = summary.groupings_created.count(),
            failures = summary.failures().count(),
            "Roster reconciliation completed"
        );
        Ok(summary)
    }

    async fn process_row(
        &self,
        summary: &mut RunSummary,
        run: &RunContext<'_>,
        row: &Row,
    ) -> Result<RowOutcome> {
        let catalog = self.catalog.as_ref();
        let locale = run.options.locale.as_str();

        let Some(user) = self
            .users
            .resolve(&row.identifier, run.options.identifier_field)
            .await?
        else {
            summary.push_line(
                catalog,
                locale,
                &Message::UserUnknown {
                    identifier: row.identifier.clone(),
                },
            );
            return Ok(RowOutcome::Failed(RowFailure::UnknownUser));
        };

        let enrolment = self
            .enrolment
            .ensure_enrolled(
                run.instance,
                run.course,
                user.id,
                run.role_id,
                self.clock.now(),
            )
            .await?;
        let full_name = user.full_name();
        match enrolment {
            EnrolmentOutcome::AlreadyEnrolled => {
                tracing::debug!(user_id = %user.id, "User already holds role");
                summary.push(catalog, locale, &Message::AlreadyEnrolled { full_name });
            }
            EnrolmentOutcome::Enrolled(window) => {
                tracing::debug!(
                    user_id = %user.id,
                    start = %window.start,
                    end = ?window.end,
                    "Enrolled user"
                );
                summary.enrolled_count += 1;
                summary.push(catalog, locale, &Message::EnrolledOk { full_name });
            }
        }

        if row.group_name.is_empty() {
            summary.end_line();
            return Ok(RowOutcome::Completed);
        }

        let group_id = match self.ensure_group(summary, run, &row.group_name).await? {
            Ok(id) => id,
            Err(failure) => return Ok(RowOutcome::Failed(failure)),
        };
        if let Err(failure) = self
            .ensure_grouping_link(summary, run, &row.group_name, group_id)
            .await?
        {
            return Ok(RowOutcome::Failed(failure));
        }

        let group = row.group_name.clone();
        let outcome = match self.memberships.ensure_member(group_id, user.id).await? {
            MembershipOutcome::Added => {
                summary.push_line(catalog, locale, &Message::AddedToGroup { group });
                RowOutcome::Completed
            }
            MembershipOutcome::AlreadyMember => {
                summary.push_line(catalog, locale, &Message::AlreadyInGroup { group });
                RowOutcome::Completed
            }
            MembershipOutcome::AddFailed => {
                summary.push_line(catalog, locale, &Message::AddToGroupFailed { group });
                RowOutcome::Failed(RowFailure::MembershipAddFailed)
            }
        };
        Ok(outcome)
    }

    /// Find or create the row's group. The inner `Err` ends the row.
    async fn ensure_group(
        &self,
        summary: &mut RunSummary,
        run: &RunContext<'_>,
        name: &str,
    ) -> Result<std::result::Result<GroupId, RowFailure>> {
        let catalog = self.catalog.as_ref();
        let locale = run.options.locale.as_str();

        let ensured = self
            .groups
            .ensure(name, run.course.id, run.options.create_groups, locale)
            .await?;
        Ok(match ensured {
            Ensured::Existing(id) => Ok(id),
            Ensured::Created(id) => {
                tracing::info!(
                    course_id = %run.course.id,
                    group_id = %id,
                    group = %name,
                    "Created group"
                );
                summary.groups_created.record(name);
                Ok(id)
            }
            Ensured::CreationFailed => {
                summary.push_line(
                    catalog,
                    locale,
                    &Message::GroupCreateFailed {
                        group: name.to_string(),
                        course: run.course.id.to_string(),
                    },
                );
                Err(RowFailure::GroupCreationFailed)
            }
            Ensured::Absent => {
                summary.push_line(
                    catalog,
                    locale,
                    &Message::GroupUnknown {
                        group: name.to_string(),
                    },
                );
                Err(RowFailure::UnknownGroup)
            }
        })
    }

    /// Find or create the same-named grouping and link the group into it.
    ///
    /// A grouping that is absent and may not be created is skipped silently.
    async fn ensure_grouping_link(
        &self,
        summary: &mut RunSummary,
        run: &RunContext<'_>,
        name: &str,
        group_id: GroupId,
    ) -> Result<std::result::Result<(), RowFailure>> {
        let catalog = self.catalog.as_ref();
        let locale = run.options.locale.as_str();

        let grouping_id = match self
            .groupings
            .ensure(name, run.course.id, run.options.create_groupings)
            .await?
        {
            Ensured::Existing(id) => id,
            Ensured::Created(id) => {
                tracing::info!(
                    course_id = %run.course.id,
                    grouping_id = %id,
                    grouping = %name,
                    "Created grouping"
                );
                summary.groupings_created.record(name);
                id
            }
            Ensured::Absent => return Ok(Ok(())),
            Ensured::CreationFailed => {
                summary.push_line(
                    catalog,
                    locale,
                    &Message::GroupingCreateFailed {
                        group: name.to_string(),
                        course: run.course.id.to_string(),
                    },
                );
                return Ok(Err(RowFailure::GroupingCreationFailed));
            }
        };

        match self.groupings.link_group(group_id, grouping_id).await? {
            LinkOutcome::Linked | LinkOutcome::AlreadyLinked => Ok(Ok(())),
            LinkOutcome::LinkFailed => {
                summary.push_line(
                    catalog,
                    locale,
                    &Message::LinkFailed {
                        group: name.to_string(),
                    },
                );
                Ok(Err(RowFailure::LinkCreationFailed))
            }
        }
    }
}
