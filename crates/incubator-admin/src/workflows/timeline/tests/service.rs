use super::common::*;
use std::sync::Arc;

use crate::workflows::timeline::domain::{
    LinkDraft, LinkError, LinkLocator, StartupId, TimelineEventId, VerificationStatus,
};
use crate::workflows::timeline::repository::{
    RepositoryError, TimelineEventFilter, TimelineEventRepository,
};
use crate::workflows::timeline::service::{TimelineEventService, TimelineServiceError};

#[test]
fn create_registers_pending_event() {
    let (service, repository) = build_service();

    let event = service
        .create(new_event_input("acme"))
        .expect("event created");

    assert!(event.id.0.starts_with("te-"));
    assert_eq!(event.verification_status(), VerificationStatus::Pending);
    assert!(event.links.is_empty());
    assert_eq!(repository.stored(&event.id), event);
}

#[test]
fn verification_round_trip_is_persisted() {
    let (service, repository) = build_service();
    let event = service.create(new_event_input("acme")).expect("created");

    let verified = service.verify(&event.id, None).expect("verify succeeds");
    assert_eq!(verified.verification_status(), VerificationStatus::Verified);
    assert!(verified.verified_at().is_some());
    assert_eq!(repository.stored(&event.id), verified);

    let pending = service.unverify(&event.id, None).expect("unverify succeeds");
    assert_eq!(pending.verification_status(), VerificationStatus::Pending);
    assert!(pending.verified_at().is_none());

    let flagged = service
        .mark_needs_improvement(&event.id, None)
        .expect("flag succeeds");
    assert_eq!(
        repository.stored(&event.id).verification_status(),
        VerificationStatus::NeedsImprovement
    );
    assert_eq!(flagged.version, 3);
}

#[test]
fn link_operations_persist_whole_record() {
    let (service, repository) = build_service();
    let event = service.create(new_event_input("acme")).expect("created");

    service
        .add_link(&event.id, None, docs_link())
        .expect("docs added");
    service
        .add_link(&event.id, None, deck_link())
        .expect("deck added");
    service.verify(&event.id, None).expect("verified");

    let (updated, removed) = service
        .delete_link(&event.id, None, LinkLocator::Index(0))
        .expect("docs removed");

    assert_eq!(removed.title, "Docs");
    let stored = repository.stored(&event.id);
    assert_eq!(stored, updated);
    assert_eq!(stored.links.len(), 1);
    assert_eq!(stored.links[0].title, "Deck");
    assert_eq!(stored.verification_status(), VerificationStatus::Verified);
    assert_eq!(repository.write_count(), 4);
}

#[test]
fn edit_link_replaces_fields_at_position() {
    let (service, repository) = build_service();
    let event = service.create(new_event_input("acme")).expect("created");
    service.add_link(&event.id, None, docs_link()).expect("added");

    service
        .edit_link(
            &event.id,
            None,
            LinkLocator::Index(0),
            LinkDraft::new("Docs v2", "http://a2", true),
        )
        .expect("edited");

    let stored = repository.stored(&event.id);
    assert_eq!(stored.links[0].title, "Docs v2");
    assert_eq!(stored.links[0].url, "http://a2");
    assert!(stored.links[0].private);
}

#[test]
fn invalid_index_fails_without_saving() {
    let (service, repository) = build_service();
    let event = service.create(new_event_input("acme")).expect("created");
    service.add_link(&event.id, None, docs_link()).expect("added");
    let writes_before = repository.write_count();
    let before = repository.stored(&event.id);

    let edit = service.edit_link(&event.id, None, LinkLocator::Index(1), deck_link());
    assert!(matches!(
        edit,
        Err(TimelineServiceError::Link(LinkError::IndexOutOfRange { index: 1, len: 1 }))
    ));

    let delete = service.delete_link(&event.id, None, LinkLocator::Index(-1));
    assert!(matches!(
        delete,
        Err(TimelineServiceError::Link(LinkError::IndexOutOfRange { index: -1, len: 1 }))
    ));

    assert_eq!(repository.write_count(), writes_before);
    assert_eq!(repository.stored(&event.id), before);
}

#[test]
fn missing_event_reports_not_found() {
    let (service, _) = build_service();
    let missing = TimelineEventId("te-missing".to_string());

    assert!(matches!(
        service.verify(&missing, None),
        Err(TimelineServiceError::Repository(RepositoryError::NotFound))
    ));
    assert!(matches!(
        service.add_link(&missing, None, docs_link()),
        Err(TimelineServiceError::Repository(RepositoryError::NotFound))
    ));
}

#[test]
fn stale_expected_version_is_rejected() {
    let (service, repository) = build_service();
    let event = service.create(new_event_input("acme")).expect("created");

    let first = service
        .add_link(&event.id, Some(0), docs_link())
        .expect("first editor wins");
    assert_eq!(first.version, 1);

    let second = service.add_link(&event.id, Some(0), deck_link());
    assert!(matches!(
        second,
        Err(TimelineServiceError::Repository(
            RepositoryError::VersionMismatch {
                expected: 0,
                actual: 1
            }
        ))
    ));
    assert_eq!(repository.stored(&event.id).links.len(), 1);
}

#[test]
fn omitting_expected_version_keeps_last_writer_wins() {
    let (service, repository) = build_service();
    let event = service.create(new_event_input("acme")).expect("created");

    // Two editors load the same revision; without a version guard both writes land.
    let mut first_copy = repository.stored(&event.id);
    let mut second_copy = first_copy.clone();
    first_copy.add_link(docs_link());
    second_copy.add_link(deck_link());
    repository.update(first_copy, None).expect("first write");
    repository.update(second_copy, None).expect("second write");

    let stored = service.get(&event.id).expect("event exists");
    assert_eq!(stored.links.len(), 1);
    assert_eq!(stored.links[0].title, "Deck");
}

#[test]
fn repository_failures_surface_unchanged() {
    let event = pending_event();
    let id = event.id.clone();
    let service = TimelineEventService::new(Arc::new(ReadOnlyRepository { event }));

    let result = service.verify(&id, None);
    assert!(matches!(
        result,
        Err(TimelineServiceError::Repository(RepositoryError::Unavailable(reason))) if reason == "read only"
    ));
}

#[test]
fn list_filters_and_orders_by_most_recent_update() {
    let (service, _) = build_service();
    let first = service.create(new_event_input("acme")).expect("created");
    let second = service.create(new_event_input("acme")).expect("created");
    let other = service.create(new_event_input("globex")).expect("created");

    service.verify(&first.id, None).expect("verified");

    let acme = service
        .list(&TimelineEventFilter {
            startup_id: Some(StartupId("acme".to_string())),
            status: None,
        })
        .expect("listed");
    let ids: Vec<_> = acme.iter().map(|event| event.id.clone()).collect();
    assert_eq!(ids, vec![first.id.clone(), second.id.clone()]);

    let verified = service
        .list(&TimelineEventFilter {
            startup_id: None,
            status: Some(VerificationStatus::Verified),
        })
        .expect("listed");
    assert_eq!(verified.len(), 1);
    assert_eq!(verified[0].id, first.id);

    let everything = service.list(&TimelineEventFilter::default()).expect("listed");
    assert_eq!(everything.len(), 3);
    assert!(everything.iter().any(|event| event.id == other.id));
}
