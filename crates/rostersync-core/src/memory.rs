//! In-memory backend implementing every collaborator trait.
//!
//! Used by tests and by callers embedding the engine without a database.
//! Mirrors the uniqueness rules of the Postgres schema: creating a group,
//! grouping, link or membership that already exists is refused rather than
//! duplicated. Individual creations can be made to fail for testing.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::{EnrolError, Result};
use crate::store::{
    EnrolmentPlugin, EnrolmentStore, GroupStore, GroupingStore, LinkStore, MembershipStore,
    RoleStore, UserStore,
};
use crate::types::{
    ContextId, Course, CourseId, EnrolInstance, EnrolInstanceId, EnrolMethod, Group, GroupId,
    Grouping, GroupingId, IdentifierField, LinkId, NewGroup, NewGrouping, RoleId, User, UserId,
};

/// A stored user enrolment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserEnrolment {
    pub instance_id: EnrolInstanceId,
    pub user_id: UserId,
    pub time_start: DateTime<Utc>,
    pub time_end: Option<DateTime<Utc>>,
}

/// A stored group-to-grouping link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupingLink {
    pub id: LinkId,
    pub group_id: GroupId,
    pub grouping_id: GroupingId,
    pub time_added: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct State {
    users: HashMap<UserId, User>,
    courses: HashMap<CourseId, Course>,
    instances: HashMap<EnrolInstanceId, EnrolInstance>,
    enrolments: Vec<UserEnrolment>,
    role_assignments: HashSet<(UserId, RoleId, ContextId)>,
    groups: HashMap<GroupId, Group>,
    groupings: HashMap<GroupingId, Grouping>,
    links: Vec<GroupingLink>,
    members: HashSet<(GroupId, UserId)>,
}

#[derive(Debug, Default)]
struct Failures {
    unavailable: bool,
    user_lookups: HashSet<String>,
    group_names: HashSet<String>,
    grouping_names: HashSet<String>,
    links_for_group: HashSet<GroupId>,
    members_for_group: HashSet<GroupId>,
}

/// In-memory backend implementing every store trait.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    state: RwLock<State>,
    failures: RwLock<Failures>,
    default_enrol_period_secs: i64,
}

impl InMemoryBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enrolment period given to manual instances created by this backend.
    #[must_use]
    pub fn with_default_enrol_period_secs(mut self, secs: i64) -> Self {
        self.default_enrol_period_secs = secs;
        self
    }

    // ------------------------------------------------------------------
    // Seeding
    // ------------------------------------------------------------------

    pub async fn insert_user(&self, user: User) {
        self.state.write().await.users.insert(user.id, user);
    }

    pub async fn insert_course(&self, course: Course) {
        self.state.write().await.courses.insert(course.id, course);
    }

    pub async fn insert_instance(&self, instance: EnrolInstance) {
        self.state
            .write()
            .await
            .instances
            .insert(instance.id, instance);
    }

    pub async fn insert_role_assignment(&self, user_id: UserId, role_id: RoleId, context: ContextId) {
        self.state
            .write()
            .await
            .role_assignments
            .insert((user_id, role_id, context));
    }

    pub async fn insert_group(&self, course_id: CourseId, name: &str) -> GroupId {
        let group = Group {
            id: GroupId::new(),
            course_id,
            name: name.to_string(),
            lang: "en".to_string(),
        };
        let id = group.id;
        self.state.write().await.groups.insert(id, group);
        id
    }

    pub async fn insert_grouping(&self, course_id: CourseId, name: &str) -> GroupingId {
        let grouping = Grouping {
            id: GroupingId::new(),
            course_id,
            name: name.to_string(),
        };
        let id = grouping.id;
        self.state.write().await.groupings.insert(id, grouping);
        id
    }

    // ------------------------------------------------------------------
    // Failure injection
    // ------------------------------------------------------------------

    /// Make every call fail with a store error.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.failures.write().await.unavailable = unavailable;
    }

    /// Fail lookups of this identifier value with a store error.
    pub async fn fail_user_lookup(&self, value: &str) {
        self.failures
            .write()
            .await
            .user_lookups
            .insert(value.to_string());
    }

    /// Refuse creation of groups with this name.
    pub async fn fail_group_creation(&self, name: &str) {
        self.failures
            .write()
            .await
            .group_names
            .insert(name.to_string());
    }

    /// Refuse creation of groupings with this name.
    pub async fn fail_grouping_creation(&self, name: &str) {
        self.failures
            .write()
            .await
            .grouping_names
            .insert(name.to_string());
    }

    /// Refuse linking this group to any grouping.
    pub async fn fail_link_creation(&self, group_id: GroupId) {
        self.failures.write().await.links_for_group.insert(group_id);
    }

    /// Refuse adding members to this group.
    pub async fn fail_membership_add(&self, group_id: GroupId) {
        self.failures
            .write()
            .await
            .members_for_group
            .insert(group_id);
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    pub async fn groups_in(&self, course_id: CourseId) -> Vec<Group> {
        let state = self.state.read().await;
        let mut groups: Vec<_> = state
            .groups
            .values()
            .filter(|g| g.course_id == course_id)
            .cloned()
            .collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name));
        groups
    }

    pub async fn groupings_in(&self, course_id: CourseId) -> Vec<Grouping> {
        let state = self.state.read().await;
        let mut groupings: Vec<_> = state
            .groupings
            .values()
            .filter(|g| g.course_id == course_id)
            .cloned()
            .collect();
        groupings.sort_by(|a, b| a.name.cmp(&b.name));
        groupings
    }

    pub async fn links(&self) -> Vec<GroupingLink> {
        self.state.read().await.links.clone()
    }

    pub async fn member_count(&self, group_id: GroupId) -> usize {
        self.state
            .read()
            .await
            .members
            .iter()
            .filter(|(g, _)| *g == group_id)
            .count()
    }

    pub async fn enrolments(&self) -> Vec<UserEnrolment> {
        self.state.read().await.enrolments.clone()
    }

    pub async fn instances_of(&self, course_id: CourseId) -> Vec<EnrolInstance> {
        self.state
            .read()
            .await
            .instances
            .values()
            .filter(|i| i.course_id == course_id)
            .cloned()
            .collect()
    }

    async fn check_available(&self) -> Result<()> {
        if self.failures.read().await.unavailable {
            return Err(EnrolError::Store("in-memory backend unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for InMemoryBackend {
    async fn find_by_field(&self, field: IdentifierField, value: &str) -> Result<Option<User>> {
        self.check_available().await?;
        if self.failures.read().await.user_lookups.contains(value) {
            return Err(EnrolError::Store(format!("lookup of {value:?} failed")));
        }
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.identifier(field) == Some(value))
            .cloned())
    }
}

#[async_trait]
impl EnrolmentStore for InMemoryBackend {
    async fn get_instance(
        &self,
        course_id: CourseId,
        method: EnrolMethod,
    ) -> Result<Option<EnrolInstance>> {
        self.check_available().await?;
        let state = self.state.read().await;
        Ok(state
            .instances
            .values()
            .find(|i| i.course_id == course_id && i.method == method)
            .cloned())
    }

    async fn create_instance(&self, course: &Course) -> Result<EnrolInstance> {
        self.check_available().await?;
        let instance = EnrolInstance {
            id: EnrolInstanceId::new(),
            course_id: course.id,
            method: EnrolMethod::Manual,
            enrol_period_secs: self.default_enrol_period_secs,
        };
        let mut state = self.state.write().await;
        state
            .courses
            .entry(course.id)
            .or_insert_with(|| course.clone());
        state.instances.insert(instance.id, instance.clone());
        Ok(instance)
    }
}

#[async_trait]
impl RoleStore for InMemoryBackend {
    async fn has_assignment(
        &self,
        user_id: UserId,
        role_id: RoleId,
        context_id: ContextId,
    ) -> Result<bool> {
        self.check_available().await?;
        let state = self.state.read().await;
        Ok(state
            .role_assignments
            .contains(&(user_id, role_id, context_id)))
    }
}

#[async_trait]
impl EnrolmentPlugin for InMemoryBackend {
    async fn enrol_user(
        &self,
        instance: &EnrolInstance,
        user_id: UserId,
        role_id: RoleId,
        time_start: DateTime<Utc>,
        time_end: Option<DateTime<Utc>>,
    ) -> Result<()> {
        self.check_available().await?;
        let mut state = self.state.write().await;
        if !state
            .enrolments
            .iter()
            .any(|e| e.instance_id == instance.id && e.user_id == user_id)
        {
            state.enrolments.push(UserEnrolment {
                instance_id: instance.id,
                user_id,
                time_start,
                time_end,
            });
        }
        // Unknown course: the enrolment is recorded but no role is granted.
        if let Some(context_id) = state.courses.get(&instance.course_id).map(|c| c.context_id) {
            state.role_assignments.insert((user_id, role_id, context_id));
        }
        Ok(())
    }
}

#[async_trait]
impl GroupStore for InMemoryBackend {
    async fn find_by_name(&self, course_id: CourseId, name: &str) -> Result<Option<Group>> {
        self.check_available().await?;
        let state = self.state.read().await;
        Ok(state
            .groups
            .values()
            .find(|g| g.course_id == course_id && g.name == name)
            .cloned())
    }

    async fn create(&self, group: NewGroup) -> Result<Option<GroupId>> {
        self.check_available().await?;
        if self.failures.read().await.group_names.contains(&group.name) {
            return Ok(None);
        }
        let mut state = self.state.write().await;
        if state
            .groups
            .values()
            .any(|g| g.course_id == group.course_id && g.name == group.name)
        {
            return Ok(None);
        }
        let id = GroupId::new();
        state.groups.insert(
            id,
            Group {
                id,
                course_id: group.course_id,
                name: group.name,
                lang: group.lang,
            },
        );
        Ok(Some(id))
    }
}

#[async_trait]
impl GroupingStore for InMemoryBackend {
    async fn find_by_name(&self, course_id: CourseId, name: &str) -> Result<Option<Grouping>> {
        self.check_available().await?;
        let state = self.state.read().await;
        Ok(state
            .groupings
            .values()
            .find(|g| g.course_id == course_id && g.name == name)
            .cloned())
    }

    async fn create(&self, grouping: NewGrouping) -> Result<Option<GroupingId>> {
        self.check_available().await?;
        if self
            .failures
            .read()
            .await
            .grouping_names
            .contains(&grouping.name)
        {
            return Ok(None);
        }
        let mut state = self.state.write().await;
        if state
            .groupings
            .values()
            .any(|g| g.course_id == grouping.course_id && g.name == grouping.name)
        {
            return Ok(None);
        }
        let id = GroupingId::new();
        state.groupings.insert(
            id,
            Grouping {
                id,
                course_id: grouping.course_id,
                name: grouping.name,
            },
        );
        Ok(Some(id))
    }
}

#[async_trait]
impl LinkStore for InMemoryBackend {
    async fn exists(&self, group_id: GroupId, grouping_id: GroupingId) -> Result<bool> {
        self.check_available().await?;
        let state = self.state.read().await;
        Ok(state
            .links
            .iter()
            .any(|l| l.group_id == group_id && l.grouping_id == grouping_id))
    }

    async fn create(
        &self,
        group_id: GroupId,
        grouping_id: GroupingId,
        time_added: DateTime<Utc>,
    ) -> Result<Option<LinkId>> {
        self.check_available().await?;
        if self
            .failures
            .read()
            .await
            .links_for_group
            .contains(&group_id)
        {
            return Ok(None);
        }
        let mut state = self.state.write().await;
        if state
            .links
            .iter()
            .any(|l| l.group_id == group_id && l.grouping_id == grouping_id)
        {
            return Ok(None);
        }
        let id = LinkId::new();
        state.links.push(GroupingLink {
            id,
            group_id,
            grouping_id,
            time_added,
        });
        Ok(Some(id))
    }
}

#[async_trait]
impl MembershipStore for InMemoryBackend {
    async fn is_member(&self, group_id: GroupId, user_id: UserId) -> Result<bool> {
        self.check_available().await?;
        Ok(self
            .state
            .read()
            .await
            .members
            .contains(&(group_id, user_id)))
    }

    async fn add(&self, group_id: GroupId, user_id: UserId) -> Result<bool> {
        self.check_available().await?;
        if self
            .failures
            .read()
            .await
            .members_for_group
            .contains(&group_id)
        {
            return Ok(false);
        }
        Ok(self
            .state
            .write()
            .await
            .members
            .insert((group_id, user_id)))
    }
}
