//! PostgreSQL implementation of the rostersync store traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rostersync_core::{
    ContextId, Course, CourseId, EnrolError, EnrolInstance, EnrolMethod, EnrolmentPlugin,
    EnrolmentStore, Group, GroupId, GroupStore, Grouping, GroupingId, GroupingStore,
    IdentifierField, LinkId, LinkStore, MembershipStore, NewGroup, NewGrouping, Result, RoleId,
    RoleStore, User, UserId, UserStore,
};

use crate::error::DbError;
use crate::models::{
    CourseRow, EnrolInstanceRow, GroupMember, GroupRow, GroupingGroup, GroupingRow,
    RoleAssignment, UserEnrolment, UserRow,
};
use crate::pool::DbPool;

/// Store backend over a PostgreSQL pool.
///
/// Creates rely on unique constraints: a row lost to a concurrent writer
/// comes back as `None`, never as a duplicate.
#[derive(Debug, Clone)]
pub struct PgBackend {
    pool: DbPool,
    default_enrol_period_secs: i64,
}

impl PgBackend {
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            default_enrol_period_secs: 0,
        }
    }

    /// Enrolment period given to manual instances created by this backend.
    #[must_use]
    pub fn with_default_enrol_period_secs(mut self, secs: i64) -> Self {
        self.default_enrol_period_secs = secs;
        self
    }

    #[must_use]
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Load a course by id.
    pub async fn find_course(&self, course_id: CourseId) -> Result<Option<Course>> {
        let row = CourseRow::find_by_id(self.pool.inner(), course_id.into_inner())
            .await
            .map_err(DbError::from)?;
        Ok(row.map(Course::from))
    }
}

#[async_trait]
impl UserStore for PgBackend {
    async fn find_by_field(&self, field: IdentifierField, value: &str) -> Result<Option<User>> {
        let row = UserRow::find_by_field(self.pool.inner(), field, value)
            .await
            .map_err(DbError::from)?;
        Ok(row.map(User::from))
    }
}

#[async_trait]
impl EnrolmentStore for PgBackend {
    async fn get_instance(
        &self,
        course_id: CourseId,
        method: EnrolMethod,
    ) -> Result<Option<EnrolInstance>> {
        let row = EnrolInstanceRow::find(self.pool.inner(), course_id.into_inner(), method)
            .await
            .map_err(DbError::from)?;
        Ok(row.map(|r| r.into_instance(method)))
    }

    async fn create_instance(&self, course: &Course) -> Result<EnrolInstance> {
        let method = EnrolMethod::Manual;
        let mut tx = self.pool.inner().begin().await.map_err(DbError::from)?;
        CourseRow::upsert(&mut *tx, course)
            .await
            .map_err(DbError::from)?;
        let created = EnrolInstanceRow::create(
            &mut *tx,
            course.id.into_inner(),
            method,
            self.default_enrol_period_secs,
        )
        .await
        .map_err(DbError::from)?;
        let row = match created {
            Some(row) => row,
            // Attached concurrently by another writer.
            None => EnrolInstanceRow::find(&mut *tx, course.id.into_inner(), method)
                .await
                .map_err(DbError::from)?
                .ok_or_else(|| {
                    EnrolError::Store(format!(
                        "enrolment instance for course {} vanished during creation",
                        course.id
                    ))
                })?,
        };
        tx.commit().await.map_err(DbError::from)?;
        Ok(row.into_instance(method))
    }
}

#[async_trait]
impl RoleStore for PgBackend {
    async fn has_assignment(
        &self,
        user_id: UserId,
        role_id: RoleId,
        context_id: ContextId,
    ) -> Result<bool> {
        let exists = RoleAssignment::exists(
            self.pool.inner(),
            user_id.into_inner(),
            role_id.into_inner(),
            context_id.into_inner(),
        )
        .await
        .map_err(DbError::from)?;
        Ok(exists)
    }
}

#[async_trait]
impl EnrolmentPlugin for PgBackend {
    async fn enrol_user(
        &self,
        instance: &EnrolInstance,
        user_id: UserId,
        role_id: RoleId,
        time_start: DateTime<Utc>,
        time_end: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let mut tx = self.pool.inner().begin().await.map_err(DbError::from)?;
        UserEnrolment::create(
            &mut *tx,
            instance.id.into_inner(),
            user_id.into_inner(),
            time_start,
            time_end,
        )
        .await
        .map_err(DbError::from)?;

        let context_id = CourseRow::context_of(&mut *tx, instance.course_id.into_inner())
            .await
            .map_err(DbError::from)?;
        match context_id {
            Some(context_id) => {
                RoleAssignment::create(
                    &mut *tx,
                    user_id.into_inner(),
                    role_id.into_inner(),
                    context_id,
                )
                .await
                .map_err(DbError::from)?;
            }
            None => {
                tracing::warn!(
                    course_id = %instance.course_id,
                    user_id = %user_id,
                    "Enrolment instance has no course; role not assigned"
                );
            }
        }
        tx.commit().await.map_err(DbError::from)?;
        Ok(())
    }
}

#[async_trait]
impl GroupStore for PgBackend {
    async fn find_by_name(&self, course_id: CourseId, name: &str) -> Result<Option<Group>> {
        let row = GroupRow::find_by_name(self.pool.inner(), course_id.into_inner(), name)
            .await
            .map_err(DbError::from)?;
        Ok(row.map(Group::from))
    }

    async fn create(&self, group: NewGroup) -> Result<Option<GroupId>> {
        let id = GroupRow::create(self.pool.inner(), &group)
            .await
            .map_err(DbError::from)?;
        Ok(id.map(GroupId::from_uuid))
    }
}

#[async_trait]
impl GroupingStore for PgBackend {
    async fn find_by_name(&self, course_id: CourseId, name: &str) -> Result<Option<Grouping>> {
        let row = GroupingRow::find_by_name(self.pool.inner(), course_id.into_inner(), name)
            .await
            .map_err(DbError::from)?;
        Ok(row.map(Grouping::from))
    }

    async fn create(&self, grouping: NewGrouping) -> Result<Option<GroupingId>> {
        let id = GroupingRow::create(self.pool.inner(), &grouping)
            .await
            .map_err(DbError::from)?;
        Ok(id.map(GroupingId::from_uuid))
    }
}

#[async_trait]
impl LinkStore for PgBackend {
    async fn exists(&self, group_id: GroupId, grouping_id: GroupingId) -> Result<bool> {
        let exists = GroupingGroup::exists(
            self.pool.inner(),
            group_id.into_inner(),
            grouping_id.into_inner(),
        )
        .await
        .map_err(DbError::from)?;
        Ok(exists)
    }

    async fn create(
        &self,
        group_id: GroupId,
        grouping_id: GroupingId,
        time_added: DateTime<Utc>,
    ) -> Result<Option<LinkId>> {
        let id = GroupingGroup::create(
            self.pool.inner(),
            group_id.into_inner(),
            grouping_id.into_inner(),
            time_added,
        )
        .await
        .map_err(DbError::from)?;
        Ok(id.map(LinkId::from_uuid))
    }
}

#[async_trait]
impl MembershipStore for PgBackend {
    async fn is_member(&self, group_id: GroupId, user_id: UserId) -> Result<bool> {
        let member = GroupMember::exists(
            self.pool.inner(),
            group_id.into_inner(),
            user_id.into_inner(),
        )
        .await
        .map_err(DbError::from)?;
        Ok(member)
    }

    async fn add(&self, group_id: GroupId, user_id: UserId) -> Result<bool> {
        let added = GroupMember::add(self.pool.inner(), group_id.into_inner(), user_id.into_inner())
            .await
            .map_err(DbError::from)?;
        Ok(added)
    }
}
