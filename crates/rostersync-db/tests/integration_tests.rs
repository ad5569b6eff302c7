//! Integration tests for rostersync-db.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test -p rostersync-db --features integration`

#![cfg(feature = "integration")]

mod common;

use std::sync::Arc;

use chrono::Utc;
use common::{unique_name, TestContext};
use rostersync_core::{
    EnrolMethod, EnrolmentPlugin, EnrolmentStore, GroupStore, GroupingStore, IdentifierField, LinkStore,
    MembershipStore, NewGroup, NewGrouping, ReconcileOptions, ReconciliationEngine, RoleId,
    RoleStore, Stores, TemplateCatalog, UserStore, VecRecordSource,
};
use rostersync_db::models::{GroupMember, GroupRow, UserEnrolment};

// ===========================================================================
// Connectivity
// ===========================================================================

#[tokio::test]
async fn test_database_connection() {
    let ctx = TestContext::new().await;

    let row: (i32,) = sqlx::query_as("SELECT 1")
        .fetch_one(ctx.pool.inner())
        .await
        .expect("Failed to execute query");

    assert_eq!(row.0, 1);
}

#[tokio::test]
async fn test_roster_tables_exist() {
    let ctx = TestContext::new().await;

    for table in [
        "users",
        "courses",
        "enrol_instances",
        "user_enrolments",
        "role_assignments",
        "groups",
        "groupings",
        "groupings_groups",
        "group_members",
    ] {
        let result: Result<(i64,), _> = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(ctx.pool.inner())
            .await;
        assert!(result.is_ok(), "{table} table should exist");
    }
}

// ===========================================================================
// Store traits
// ===========================================================================

#[tokio::test]
async fn test_find_user_by_each_field() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user("lookup").await;

    for (field, value) in [
        (IdentifierField::Username, user.username.clone()),
        (IdentifierField::IdNumber, user.id_number.clone().unwrap()),
        (IdentifierField::Email, user.email.clone().unwrap()),
    ] {
        let found = ctx.backend.find_by_field(field, &value).await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));
    }
    assert!(ctx
        .backend
        .find_by_field(IdentifierField::Username, &unique_name("nobody"))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_create_instance_is_idempotent() {
    let ctx = TestContext::new().await;
    let course = ctx.new_course();

    let first = ctx.backend.create_instance(&course).await.unwrap();
    let second = ctx.backend.create_instance(&course).await.unwrap();
    let found = ctx
        .backend
        .get_instance(course.id, EnrolMethod::Manual)
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(found.map(|i| i.id), Some(first.id));
}

#[tokio::test]
async fn test_enrol_user_assigns_role_in_course_context() {
    let ctx = TestContext::new().await;
    let course = ctx.new_course();
    let user = ctx.create_user("enrol").await;
    let role_id = RoleId::new();
    let instance = ctx.backend.create_instance(&course).await.unwrap();

    ctx.backend
        .enrol_user(&instance, user.id, role_id, Utc::now(), None)
        .await
        .unwrap();
    // Second call is absorbed by the unique constraints.
    ctx.backend
        .enrol_user(&instance, user.id, role_id, Utc::now(), None)
        .await
        .unwrap();

    assert!(ctx
        .backend
        .has_assignment(user.id, role_id, course.context_id)
        .await
        .unwrap());
    let count = UserEnrolment::count_for_instance(ctx.pool.inner(), instance.id.into_inner())
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_duplicate_group_create_returns_none() {
    let ctx = TestContext::new().await;
    let course = ctx.new_course();
    ctx.backend.create_instance(&course).await.unwrap();
    let new_group = NewGroup {
        course_id: course.id,
        name: "TeamX".to_string(),
        lang: "en".to_string(),
    };

    let first = GroupStore::create(ctx.backend.as_ref(), new_group.clone())
        .await
        .unwrap();
    let second = GroupStore::create(ctx.backend.as_ref(), new_group)
        .await
        .unwrap();

    assert!(first.is_some());
    assert!(second.is_none());
    let found = GroupStore::find_by_name(ctx.backend.as_ref(), course.id, "TeamX")
        .await
        .unwrap();
    assert_eq!(found.map(|g| g.id), first);
}

#[tokio::test]
async fn test_link_and_membership_round_trip() {
    let ctx = TestContext::new().await;
    let course = ctx.new_course();
    ctx.backend.create_instance(&course).await.unwrap();
    let user = ctx.create_user("member").await;
    let backend = ctx.backend.as_ref();

    let group_id = GroupStore::create(
        backend,
        NewGroup {
            course_id: course.id,
            name: "TeamY".to_string(),
            lang: "en".to_string(),
        },
    )
    .await
    .unwrap()
    .unwrap();
    let grouping_id = GroupingStore::create(
        backend,
        NewGrouping {
            course_id: course.id,
            name: "TeamY".to_string(),
        },
    )
    .await
    .unwrap()
    .unwrap();

    assert!(!LinkStore::exists(backend, group_id, grouping_id).await.unwrap());
    assert!(LinkStore::create(backend, group_id, grouping_id, Utc::now())
        .await
        .unwrap()
        .is_some());
    assert!(LinkStore::create(backend, group_id, grouping_id, Utc::now())
        .await
        .unwrap()
        .is_none());
    assert!(LinkStore::exists(backend, group_id, grouping_id).await.unwrap());

    assert!(backend.add(group_id, user.id).await.unwrap());
    assert!(!backend.add(group_id, user.id).await.unwrap());
    assert!(backend.is_member(group_id, user.id).await.unwrap());
}

// ===========================================================================
// Engine over PostgreSQL
// ===========================================================================

#[tokio::test]
async fn test_engine_run_and_replay() {
    let ctx = TestContext::new().await;
    let course = ctx.new_course();
    let alice = ctx.create_user("alice").await;
    let bob = ctx.create_user("bob").await;
    let engine = ReconciliationEngine::new(
        Stores::from_backend(ctx.backend.clone()),
        Arc::new(TemplateCatalog::english()),
    );
    let options = ReconcileOptions {
        create_groups: true,
        create_groupings: true,
        ..ReconcileOptions::default()
    };
    let role_id = RoleId::new();
    let rows = [
        [alice.username.as_str(), "TeamX"],
        [bob.username.as_str(), "TeamX"],
    ];

    let first = engine
        .process(&mut VecRecordSource::from_rows(rows), &course, role_id, &options)
        .await
        .unwrap();
    let replay = engine
        .process(&mut VecRecordSource::from_rows(rows), &course, role_id, &options)
        .await
        .unwrap();

    assert_eq!(first.enrolled_count, 2);
    assert_eq!(first.groups_created.names(), ["TeamX"]);
    assert_eq!(first.groupings_created.names(), ["TeamX"]);
    assert_eq!(replay.enrolled_count, 0);
    assert_eq!(replay.groups_created.count(), 0);

    let groups = GroupRow::list_for_course(ctx.pool.inner(), course.id.into_inner())
        .await
        .unwrap();
    assert_eq!(groups.len(), 1);
    let members = GroupMember::count(ctx.pool.inner(), groups[0].id).await.unwrap();
    assert_eq!(members, 2);
}
