//! Collaborator traits for the stores the engine reads and writes.
//!
//! Each trait is a narrow seam over one concern of the membership store.
//! Backends usually implement all of them on a single type and hand it to
//! [`Stores::from_backend`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::{
    ContextId, Course, CourseId, EnrolInstance, EnrolMethod, Group, GroupId, Grouping, GroupingId,
    IdentifierField, LinkId, NewGroup, NewGrouping, RoleId, User, UserId,
};

/// Looks up user accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Exact match on the given identifier field.
    async fn find_by_field(&self, field: IdentifierField, value: &str) -> Result<Option<User>>;
}

/// Enrolment method instances of courses.
#[async_trait]
pub trait EnrolmentStore: Send + Sync {
    /// Get the instance of `method` attached to the course, if any.
    async fn get_instance(
        &self,
        course_id: CourseId,
        method: EnrolMethod,
    ) -> Result<Option<EnrolInstance>>;

    /// Attach a new manual enrolment instance to the course.
    async fn create_instance(&self, course: &Course) -> Result<EnrolInstance>;
}

/// Role assignments within contexts.
#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn has_assignment(
        &self,
        user_id: UserId,
        role_id: RoleId,
        context_id: ContextId,
    ) -> Result<bool>;
}

/// Enrols users through an enrolment instance.
///
/// The call reports no status: a rejected enrolment is indistinguishable
/// from a successful one.
#[async_trait]
pub trait EnrolmentPlugin: Send + Sync {
    async fn enrol_user(
        &self,
        instance: &EnrolInstance,
        user_id: UserId,
        role_id: RoleId,
        time_start: DateTime<Utc>,
        time_end: Option<DateTime<Utc>>,
    ) -> Result<()>;
}

/// Course groups.
#[async_trait]
pub trait GroupStore: Send + Sync {
    async fn find_by_name(&self, course_id: CourseId, name: &str) -> Result<Option<Group>>;

    /// Create a group. `None` means the store refused the creation.
    async fn create(&self, group: NewGroup) -> Result<Option<GroupId>>;
}

/// Course groupings.
#[async_trait]
pub trait GroupingStore: Send + Sync {
    async fn find_by_name(&self, course_id: CourseId, name: &str) -> Result<Option<Grouping>>;

    /// Create a grouping. `None` means the store refused the creation.
    async fn create(&self, grouping: NewGrouping) -> Result<Option<GroupingId>>;
}

/// Group-to-grouping links.
#[async_trait]
pub trait LinkStore: Send + Sync {
    async fn exists(&self, group_id: GroupId, grouping_id: GroupingId) -> Result<bool>;

    /// Create a link. `None` means the store refused the creation.
    async fn create(
        &self,
        group_id: GroupId,
        grouping_id: GroupingId,
        time_added: DateTime<Utc>,
    ) -> Result<Option<LinkId>>;
}

/// Group memberships.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    async fn is_member(&self, group_id: GroupId, user_id: UserId) -> Result<bool>;

    /// Add a member. `false` means the store refused the addition.
    async fn add(&self, group_id: GroupId, user_id: UserId) -> Result<bool>;
}

/// A backend implementing every collaborator trait.
pub trait Backend:
    UserStore
    + EnrolmentStore
    + RoleStore
    + EnrolmentPlugin
    + GroupStore
    + GroupingStore
    + LinkStore
    + MembershipStore
{
}

impl<T> Backend for T where
    T: UserStore
        + EnrolmentStore
        + RoleStore
        + EnrolmentPlugin
        + GroupStore
        + GroupingStore
        + LinkStore
        + MembershipStore
{
}

/// One handle per collaborator, as consumed by the services.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub enrolments: Arc<dyn EnrolmentStore>,
    pub roles: Arc<dyn RoleStore>,
    pub enrol_plugin: Arc<dyn EnrolmentPlugin>,
    pub groups: Arc<dyn GroupStore>,
    pub groupings: Arc<dyn GroupingStore>,
    pub links: Arc<dyn LinkStore>,
    pub memberships: Arc<dyn MembershipStore>,
}

impl Stores {
    /// Route every collaborator to the same backend.
    pub fn from_backend<B: Backend + 'static>(backend: Arc<B>) -> Self {
        Self {
            users: backend.clone(),
            enrolments: backend.clone(),
            roles: backend.clone(),
            enrol_plugin: backend.clone(),
            groups: backend.clone(),
            groupings: backend.clone(),
            links: backend.clone(),
            memberships: backend,
        }
    }
}
