//! Enrolment and role assignment for roster users.
//!
//! Enrolment goes through the course's manual enrolment instance, which is
//! looked up (or attached) once per run. The enrolment plugin reports no
//! status, so a new enrolment is always treated as successful.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::error::Result;
use crate::store::{EnrolmentPlugin, EnrolmentStore, RoleStore};
use crate::types::{ContextId, Course, EnrolInstance, EnrolMethod, EnrolWindow, RoleId, UserId};

/// Result of ensuring a user holds a role in a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrolmentOutcome {
    /// The role assignment already existed; nothing was written.
    AlreadyEnrolled,
    /// The user was enrolled with this window.
    Enrolled(EnrolWindow),
}

/// Compute the window of a new enrolment.
///
/// The start is `now` truncated to midnight in `now`'s own time zone; the
/// end is start + `period`, or unbounded when there is no period.
pub fn enrol_window<Tz: TimeZone>(now: DateTime<Tz>, period: Option<Duration>) -> EnrolWindow {
    let tz = now.timezone();
    // A DST gap can swallow midnight; keep the untruncated time then.
    let start = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| tz.from_local_datetime(&midnight).earliest())
        .map_or_else(|| now.with_timezone(&Utc), |d| d.with_timezone(&Utc));
    EnrolWindow {
        start,
        end: period.map(|p| start + p),
    }
}

/// Enrolment operations used by the engine.
pub struct EnrolmentService {
    instances: Arc<dyn EnrolmentStore>,
    roles: Arc<dyn RoleStore>,
    plugin: Arc<dyn EnrolmentPlugin>,
}

impl EnrolmentService {
    pub fn new(
        instances: Arc<dyn EnrolmentStore>,
        roles: Arc<dyn RoleStore>,
        plugin: Arc<dyn EnrolmentPlugin>,
    ) -> Self {
        Self {
            instances,
            roles,
            plugin,
        }
    }

    /// Get the course's manual enrolment instance, attaching one if missing.
    pub async fn get_or_create_instance(&self, course: &Course) -> Result<EnrolInstance> {
        if let Some(instance) = self
            .instances
            .get_instance(course.id, EnrolMethod::Manual)
            .await?
        {
            return Ok(instance);
        }

        let instance = self.instances.create_instance(course).await?;
        tracing::info!(
            course_id = %course.id,
            instance_id = %instance.id,
            "Attached manual enrolment instance to course"
        );
        Ok(instance)
    }

    pub async fn has_role(
        &self,
        user_id: UserId,
        role_id: RoleId,
        context_id: ContextId,
    ) -> Result<bool> {
        self.roles.has_assignment(user_id, role_id, context_id).await
    }

    pub async fn enrol(
        &self,
        instance: &EnrolInstance,
        user_id: UserId,
        role_id: RoleId,
        window: EnrolWindow,
    ) -> Result<()> {
        self.plugin
            .enrol_user(instance, user_id, role_id, window.start, window.end)
            .await
    }

    /// Enrol the user unless the role assignment already exists.
    pub async fn ensure_enrolled<Tz: TimeZone>(
        &self,
        instance: &EnrolInstance,
        course: &Course,
        user_id: UserId,
        role_id: RoleId,
        now: DateTime<Tz>,
    ) -> Result<EnrolmentOutcome> {
        if self.has_role(user_id, role_id, course.context_id).await? {
            return Ok(EnrolmentOutcome::AlreadyEnrolled);
        }

        let window = enrol_window(now, instance.enrol_period());
        self.enrol(instance, user_id, role_id, window).await?;
        Ok(EnrolmentOutcome::Enrolled(window))
    }
}
