//! Integration tests for school records and their activity trail.

#![allow(clippy::indexing_slicing)]

use literacy_census_client::activity::{ACTIVITY_COLLECTION, ActivityEvent};
use literacy_census_client::identity::MemoryIdentityProvider;
use literacy_census_client::schools::SCHOOLS_COLLECTION;
use literacy_census_client::store::StoreError;
use literacy_census_core::{ActivityKind, Identity, SchoolDraft, SchoolId};
use literacy_census_integration_tests::TestContext;

fn editor() -> Identity {
    Identity::new("editor-3")
        .with_email("coach@district.org")
        .with_provider("google.com")
}

fn draft(school_name: &str) -> SchoolDraft {
    SchoolDraft {
        state: "OR".to_owned(),
        district_id: "4100040".to_owned(),
        district_name: "Beaverton SD 48J".to_owned(),
        school_id: "410004000123".to_owned(),
        school_name: school_name.to_owned(),
        provider_name: "UFLI (University of Florida Literacy Institute)".to_owned(),
        product_name: "UFLI Foundations".to_owned(),
        adoption_year: Some(2024),
        notes: None,
    }
}

#[tokio::test]
async fn test_create_edit_delete_trail() {
    let ctx = TestContext::new(MemoryIdentityProvider::new()).expect("state");
    let schools = ctx.state.schools();

    let id = schools
        .create(&editor(), &draft("Aloha-Huber Park"))
        .await
        .expect("create");

    let mut edited = draft("Aloha-Huber Park");
    edited.adoption_year = None;
    edited.notes = Some("Grades K-3".to_owned());
    schools.update(&editor(), &id, &edited).await.expect("update");

    let record = schools.get(&id).await.expect("get").expect("exists");
    assert_eq!(record.draft, edited);
    assert_eq!(record.created_by, editor().uid);
    assert_eq!(record.updated_by, Some(editor().uid));

    schools.delete(&editor(), &id).await.expect("delete");
    assert!(schools.get(&id).await.expect("get").is_none());

    let trail = ctx.state.activity().recent(None, 10).await.expect("activity");
    let kinds: Vec<ActivityKind> = trail.iter().map(|e| e.event.kind()).collect();
    assert_eq!(
        kinds,
        [
            ActivityKind::SchoolDelete,
            ActivityKind::SchoolEdit,
            ActivityKind::SchoolCreate
        ]
    );

    let ActivityEvent::SchoolDelete(change) = &trail[0].event else {
        panic!("expected delete, got {:?}", trail[0].event);
    };
    assert_eq!(change.school_id, id);
    assert_eq!(change.school_name, "Aloha-Huber Park");
    assert_eq!(change.email.as_deref(), Some("coach@district.org"));
}

#[tokio::test]
async fn test_list_newest_first() {
    let ctx = TestContext::new(MemoryIdentityProvider::new()).expect("state");
    let schools = ctx.state.schools();

    for name in ["Bethany", "Cedar Mill", "Elmonica"] {
        schools.create(&editor(), &draft(name)).await.expect("create");
    }

    let names: Vec<String> = schools
        .list()
        .await
        .expect("list")
        .into_iter()
        .map(|r| r.draft.school_name)
        .collect();
    assert_eq!(names, ["Elmonica", "Cedar Mill", "Bethany"]);
}

#[tokio::test]
async fn test_activity_limit_and_filter() {
    let ctx = TestContext::new(MemoryIdentityProvider::new()).expect("state");
    let schools = ctx.state.schools();

    let id = schools.create(&editor(), &draft("Findley")).await.expect("create");
    for _ in 0..3 {
        schools.update(&editor(), &id, &draft("Findley")).await.expect("update");
    }

    let latest = ctx.state.activity().recent(None, 2).await.expect("recent");
    assert_eq!(latest.len(), 2);

    let creates = ctx
        .state
        .activity()
        .recent(Some(ActivityKind::SchoolCreate), 10)
        .await
        .expect("creates");
    assert_eq!(creates.len(), 1);
}

#[tokio::test]
async fn test_missing_record_edit_and_delete() {
    let ctx = TestContext::new(MemoryIdentityProvider::new()).expect("state");
    let schools = ctx.state.schools();
    let missing = SchoolId::new("nope");

    let err = schools
        .update(&editor(), &missing, &draft("Ghost"))
        .await
        .expect_err("update missing");
    assert!(matches!(err, StoreError::NotFound { .. }));

    let err = schools
        .delete(&editor(), &missing)
        .await
        .expect_err("delete missing");
    assert!(matches!(err, StoreError::NotFound { .. }));

    assert_eq!(ctx.store.count(ACTIVITY_COLLECTION), 0);
    assert_eq!(ctx.store.count(SCHOOLS_COLLECTION), 0);
}
