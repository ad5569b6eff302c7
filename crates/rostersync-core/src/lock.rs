//! Per-course run locks.
//!
//! Group, grouping and link creation is check-then-create. Two runs against
//! the same course would race between the check and the create, so a run
//! holds its course's lock from start to finish. Only runs sharing one
//! [`CourseLocks`] (or its clones) exclude each other. A course's entry is
//! dropped once no run holds or waits for it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::types::CourseId;

type LockMap = Arc<Mutex<HashMap<CourseId, Arc<AsyncMutex<()>>>>>;

/// Hands out one async mutex per course.
#[derive(Debug, Clone, Default)]
pub struct CourseLocks {
    inner: LockMap,
}

/// Held for the duration of a run.
#[derive(Debug)]
pub struct CourseGuard {
    course_id: CourseId,
    locks: LockMap,
    _guard: OwnedMutexGuard<()>,
}

impl CourseGuard {
    #[must_use]
    pub fn course_id(&self) -> CourseId {
        self.course_id
    }
}

impl Drop for CourseGuard {
    fn drop(&mut self) {
        let mut map = lock_map(&self.locks);
        // One reference from the map, one from this guard.
        let idle = map
            .get(&self.course_id)
            .is_some_and(|slot| Arc::strong_count(slot) <= 2);
        if idle {
            map.remove(&self.course_id);
        }
    }
}

fn lock_map(
    locks: &LockMap,
) -> std::sync::MutexGuard<'_, HashMap<CourseId, Arc<AsyncMutex<()>>>> {
    // A poisoned map only means another thread panicked mid-insert.
    locks
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

impl CourseLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, course_id: CourseId) -> Arc<AsyncMutex<()>> {
        lock_map(&self.inner).entry(course_id).or_default().clone()
    }

    /// Number of courses currently held or waited on.
    #[must_use]
    pub fn active_courses(&self) -> usize {
        lock_map(&self.inner).len()
    }

    /// Wait for exclusive access to the course.
    pub async fn acquire(&self, course_id: CourseId) -> CourseGuard {
        let slot = self.slot(course_id);
        if slot.try_lock().is_err() {
            tracing::info!(course_id = %course_id, "Waiting for concurrent run on course");
        }
        CourseGuard {
            course_id,
            locks: Arc::clone(&self.inner),
            _guard: slot.lock_owned().await,
        }
    }

    /// Exclusive access to the course, if no other run holds it.
    #[must_use]
    pub fn try_acquire(&self, course_id: CourseId) -> Option<CourseGuard> {
        let guard = self.slot(course_id).try_lock_owned().ok()?;
        Some(CourseGuard {
            course_id,
            locks: Arc::clone(&self.inner),
            _guard: guard,
        })
    }
}
