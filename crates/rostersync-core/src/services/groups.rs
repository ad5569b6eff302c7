//! Group and grouping catalogs.
//!
//! Both catalogs follow create-if-absent: an exact (course, name) lookup
//! comes first and creation is attempted at most once. Groups and groupings
//! are separate namespaces even when they share a name.

use std::sync::Arc;

use chrono::Utc;

use crate::error::Result;
use crate::store::{GroupStore, GroupingStore, LinkStore};
use crate::types::{CourseId, GroupId, GroupingId, NewGroup, NewGrouping};

/// Result of ensuring a named entity exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ensured<Id> {
    /// Found by name.
    Existing(Id),
    /// Not found, created now.
    Created(Id),
    /// Not found and creation was not requested.
    Absent,
    /// Not found and the store refused the creation.
    CreationFailed,
}

impl<Id: Copy> Ensured<Id> {
    /// The entity id, whether found or created.
    pub fn id(&self) -> Option<Id> {
        match self {
            Ensured::Existing(id) | Ensured::Created(id) => Some(*id),
            Ensured::Absent | Ensured::CreationFailed => None,
        }
    }
}

/// Result of linking a group into a grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    Linked,
    AlreadyLinked,
    LinkFailed,
}

/// Course groups by name.
pub struct GroupCatalog {
    store: Arc<dyn GroupStore>,
}

impl GroupCatalog {
    pub fn new(store: Arc<dyn GroupStore>) -> Self {
        Self { store }
    }

    /// Find the group, creating it (tagged with `lang`) when allowed.
    pub async fn ensure(
        &self,
        name: &str,
        course_id: CourseId,
        create_if_absent: bool,
        lang: &str,
    ) -> Result<Ensured<GroupId>> {
        if let Some(group) = self.store.find_by_name(course_id, name).await? {
            return Ok(Ensured::Existing(group.id));
        }
        if !create_if_absent {
            return Ok(Ensured::Absent);
        }

        let created = self
            .store
            .create(NewGroup {
                course_id,
                name: name.to_string(),
                lang: lang.to_string(),
            })
            .await?;
        Ok(created.map_or(Ensured::CreationFailed, Ensured::Created))
    }
}

/// Course groupings by name, and the links between groups and groupings.
pub struct GroupingCatalog {
    store: Arc<dyn GroupingStore>,
    links: Arc<dyn LinkStore>,
}

impl GroupingCatalog {
    pub fn new(store: Arc<dyn GroupingStore>, links: Arc<dyn LinkStore>) -> Self {
        Self { store, links }
    }

    /// Find the grouping, creating it when allowed.
    pub async fn ensure(
        &self,
        name: &str,
        course_id: CourseId,
        create_if_absent: bool,
    ) -> Result<Ensured<GroupingId>> {
        if let Some(grouping) = self.store.find_by_name(course_id, name).await? {
            return Ok(Ensured::Existing(grouping.id));
        }
        if !create_if_absent {
            return Ok(Ensured::Absent);
        }

        let created = self
            .store
            .create(NewGrouping {
                course_id,
                name: name.to_string(),
            })
            .await?;
        Ok(created.map_or(Ensured::CreationFailed, Ensured::Created))
    }

    /// Link the group into the grouping unless already linked.
    pub async fn link_group(
        &self,
        group_id: GroupId,
        grouping_id: GroupingId,
    ) -> Result<LinkOutcome> {
        if self.links.exists(group_id, grouping_id).await? {
            return Ok(LinkOutcome::AlreadyLinked);
        }
        match self.links.create(group_id, grouping_id, Utc::now()).await? {
            Some(_) => Ok(LinkOutcome::Linked),
            None => Ok(LinkOutcome::LinkFailed),
        }
    }
}
