use crate::config::Settings;
use crate::modules::time_entries::adapters::outbound::related_entities::DocumentRelatedEntities;
use crate::modules::time_entries::adapters::outbound::time_entry_repository::{
    OverlapPolicy, TimeEntryRepository,
};
use crate::modules::time_entries::core::time_entry::{TimeEntry, TimeEntryPatch};
use crate::modules::time_entries::core::worked_time::{WorkedTime, sum_duration};
use crate::shared::core::event_context::EventContext;
use crate::shared::core::interval::Interval;
use crate::shared::core::time::FixedClock;
use crate::shared::infrastructure::document_store::in_memory::InMemoryDocumentStore;
use crate::shared::infrastructure::repository::{FindAllOptions, RepositoryError};
use crate::tests::fixtures::time_entry::{
    OWNER_ID, TENANT_ID, TimeEntryBuilder, at, seed_related_entities,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;

type Repository = TimeEntryRepository<InMemoryDocumentStore>;

async fn repository_at(now: DateTime<Utc>) -> (Arc<InMemoryDocumentStore>, Repository) {
    let store = Arc::new(
        InMemoryDocumentStore::new("time_entry")
            .with_unique_key(&["owner_id", "end_date", "deleted"]),
    );
    let (projects, activities) = seed_related_entities(TENANT_ID).await;
    let repository = TimeEntryRepository::new(
        store.clone(),
        Arc::new(DocumentRelatedEntities::new(projects, activities)),
        Arc::new(FixedClock::new(now)),
        &Settings::default(),
    );
    (store, repository)
}

fn context(action: &str) -> EventContext {
    EventContext::new("time_entry", action, OWNER_ID, TENANT_ID)
}

async fn create(
    repository: &Repository,
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
) -> Result<TimeEntry, RepositoryError> {
    repository
        .create(
            TimeEntryBuilder::new().between(start, end).build(),
            &context("create"),
            OverlapPolicy::Reject,
        )
        .await
}

fn assert_pairwise_disjoint(entries: &[TimeEntry], now: DateTime<Utc>) {
    for (index, left) in entries.iter().enumerate() {
        for right in &entries[index + 1..] {
            assert!(
                !left.interval().overlaps(&right.interval(), now),
                "{} and {} overlap",
                left.id,
                right.id
            );
        }
    }
}

#[tokio::test]
async fn walks_through_a_day_of_entries() {
    let now = at(13, 0);
    let (_, repository) = repository_at(now).await;

    let a = create(&repository, at(9, 0), Some(at(10, 0))).await.expect("A should be created");
    let b = create(&repository, at(9, 30), Some(at(10, 30))).await;
    assert!(matches!(b, Err(RepositoryError::OverlapDetected)));
    assert_eq!(b.unwrap_err().status_code(), 422);

    let c = create(&repository, at(10, 0), Some(at(11, 0)))
        .await
        .expect("back-to-back C should be created");

    let summary_before_d = sum_duration(&[a.interval(), c.interval()], now);
    assert_eq!(summary_before_d, WorkedTime { hours: 2, minutes: 0, seconds: 0.0 });

    create(&repository, at(11, 0), None).await.expect("running D should be created");
    let e = create(&repository, at(12, 0), None).await;
    assert!(matches!(e, Err(RepositoryError::Conflict(_))));

    let visible = repository
        .find_all(&context("read_many"), FindAllOptions::default())
        .await
        .unwrap();
    assert_eq!(visible.len(), 3);
    assert_pairwise_disjoint(&visible, now);
}

#[tokio::test]
async fn rejects_closed_entries_inside_a_running_one() {
    let now = at(13, 0);
    let (_, repository) = repository_at(now).await;
    create(&repository, at(11, 0), None).await.unwrap();

    let inside = create(&repository, at(11, 30), Some(at(12, 0))).await;
    assert!(matches!(inside, Err(RepositoryError::OverlapDetected)));
    create(&repository, at(10, 0), Some(at(11, 0)))
        .await
        .expect("entry ending at the running start is fine");
}

#[tokio::test]
async fn keeps_entries_disjoint_across_updates() {
    let now = at(17, 0);
    let (_, repository) = repository_at(now).await;
    let ctx = context("update");
    let mut created = Vec::new();
    for hour in [8, 10, 12, 14] {
        created.push(create(&repository, at(hour, 0), Some(at(hour + 1, 0))).await.unwrap());
    }

    let stretch = TimeEntryPatch {
        end_date: Some(Some(at(10, 30))),
        ..TimeEntryPatch::default()
    };
    let rejected = repository.partial_update(&created[0].id, stretch, &ctx).await;
    assert!(matches!(rejected, Err(RepositoryError::OverlapDetected)));

    let fill_gap = TimeEntryPatch {
        end_date: Some(Some(at(10, 0))),
        ..TimeEntryPatch::default()
    };
    repository.partial_update(&created[0].id, fill_gap, &ctx).await.expect("touching is allowed");

    let future = TimeEntryPatch {
        end_date: Some(Some(at(18, 0))),
        ..TimeEntryPatch::default()
    };
    let result = repository.partial_update(&created[3].id, future, &ctx).await;
    assert!(matches!(result, Err(RepositoryError::InvalidInterval(_))));

    let visible = repository.find_all(&ctx, FindAllOptions::default()).await.unwrap();
    assert_pairwise_disjoint(&visible, now);
}

#[tokio::test]
async fn soft_deleted_entries_stay_readable_on_request() {
    let now = at(13, 0);
    let (store, repository) = repository_at(now).await;
    let ctx = context("delete");
    let entry = create(&repository, at(9, 0), Some(at(10, 0))).await.unwrap();

    let deleted = repository.delete(&entry.id, &ctx).await.expect("delete failed");
    assert!(deleted.deleted.is_some());
    assert!(matches!(
        repository.find(&entry.id, &ctx, true).await,
        Err(RepositoryError::NotFound(_))
    ));
    let hidden = repository.find(&entry.id, &ctx, false).await.expect("still stored");
    assert_eq!(hidden.deleted, deleted.deleted);

    assert!(matches!(
        repository.delete(&entry.id, &ctx).await,
        Err(RepositoryError::NotFound(_))
    ));

    create(&repository, at(9, 0), Some(at(10, 0)))
        .await
        .expect("a deleted entry no longer blocks its interval");

    let stored = store.snapshot(TENANT_ID).await;
    let audit = stored
        .iter()
        .find(|document| document["id"] == entry.id.as_str())
        .map(|document| document["_last_event_ctx"].clone())
        .unwrap();
    assert_eq!(audit["action"], "delete");
    assert_eq!(audit["user_id"], OWNER_ID);

    repository.delete_permanently(&entry.id, &ctx).await.unwrap();
    assert!(matches!(
        repository.find(&entry.id, &ctx, false).await,
        Err(RepositoryError::NotFound(_))
    ));
}

#[tokio::test]
async fn stopping_and_restarting_follows_the_lifecycle() {
    let now = at(13, 0);
    let (_, repository) = repository_at(now).await;
    let ctx = context("update");
    let running = create(&repository, at(12, 0), None).await.unwrap();

    let stopped = repository.stop(&running.id, &ctx).await.unwrap();
    assert_eq!(stopped.interval(), Interval::closed(at(12, 0), now));

    let next = create(&repository, at(13, 0), None)
        .await
        .expect("a new running entry after stopping");
    let restart = repository.restart(&running.id, &ctx).await;
    assert!(matches!(restart, Err(RepositoryError::Conflict(_))));

    repository.delete(&next.id, &ctx).await.unwrap();
    let restarted = repository.restart(&running.id, &ctx).await.expect("restart failed");
    assert!(restarted.is_running());

    let deleted = repository
        .delete(&running.id, &ctx)
        .await
        .expect("deleting a running entry always works");
    assert!(deleted.deleted.is_some());
}

#[tokio::test]
async fn reports_transient_failures_unchanged() {
    let mut store = InMemoryDocumentStore::new("time_entry");
    store.toggle_offline();
    let (projects, activities) = seed_related_entities(TENANT_ID).await;
    let repository = TimeEntryRepository::new(
        Arc::new(store),
        Arc::new(DocumentRelatedEntities::new(projects, activities)),
        Arc::new(FixedClock::new(at(13, 0))),
        &Settings::default(),
    );
    let result = create(&repository, at(9, 0), Some(at(10, 0))).await;
    let error = result.unwrap_err();
    assert_eq!(error.status_code(), 503);
    assert!(error.to_string().contains("Document store time_entry offline"));
}
