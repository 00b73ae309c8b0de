use std::{collections::HashSet, sync::Arc};

use repolayer::{memory::InMemoryClient, prelude::*};
use serde::{Deserialize, Serialize};

#[derive(Document, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[document(collection = "sessions")]
struct Session {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<bson::Uuid>,
    user: String,
    #[document(redact)]
    token: String,
    seat: i32,
}

fn session(user: &str, seat: i32) -> Session {
    Session {
        id: None,
        user: user.to_string(),
        token: format!("tok-{user}-{seat}"),
        seat,
    }
}

fn repository() -> Repository<Session> {
    Repository::new(Arc::new(InMemoryClient::new()))
}

#[tokio::test]
async fn create_assigns_an_id_and_round_trips() {
    let sessions = repository();

    let created = sessions.create(&session("alice", 1)).await.unwrap();
    assert!(created.id.is_some());

    let found = sessions
        .find_one(&Filter::eq("user", "alice"))
        .await
        .unwrap();
    assert_eq!(found, created);
}

#[tokio::test]
async fn create_rejects_an_input_that_already_has_an_id() {
    let sessions = repository();
    let mut input = session("alice", 1);
    input.id = Some(bson::Uuid::new());

    let err = sessions.create(&input).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Validation(_)));
}

#[tokio::test]
async fn find_one_with_no_match_is_not_found() {
    let sessions = repository();

    let err = sessions
        .find_one(&Filter::eq("user", "nobody"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn pagination_returns_the_requested_slice_and_full_total() {
    let sessions = repository();
    for seat in 0..25 {
        sessions.create(&session("alice", seat)).await.unwrap();
    }

    let page = sessions
        .find(&Filter::eq("user", "alice"), &PageRequest::new(2, 10))
        .await
        .unwrap();

    assert_eq!(page.data.len(), 10);
    assert_eq!(page.total, 25);
    assert_eq!(page.page, 2);
    assert!(!page.is_last());

    let tail = sessions
        .find(&Filter::eq("user", "alice"), &PageRequest::new(3, 10))
        .await
        .unwrap();
    assert_eq!(tail.data.len(), 5);
    assert!(tail.is_last());
}

#[tokio::test]
async fn pagination_over_zero_matches_is_an_empty_page() {
    let sessions = repository();

    let page = sessions
        .find(&Filter::eq("user", "nobody"), &PageRequest::default())
        .await
        .unwrap();

    assert!(page.data.is_empty());
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn invalid_page_parameters_are_rejected() {
    let sessions = repository();

    let err = sessions
        .find(&Filter::all(), &PageRequest::new(0, 10))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Validation(_)));

    let err = sessions
        .find(&Filter::all(), &PageRequest::new(1, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Validation(_)));
}

#[tokio::test]
async fn update_applies_named_fields_and_preserves_the_rest() {
    let sessions = repository();
    let created = sessions.create(&session("alice", 1)).await.unwrap();

    let updated = sessions
        .find_one_and_update(
            &Filter::eq("id", created.id.unwrap()),
            &UpdateSpec::new().set("seat", 7),
        )
        .await
        .unwrap();

    assert_eq!(updated.seat, 7);
    assert_eq!(updated.user, created.user);
    assert_eq!(updated.token, created.token);
    assert_eq!(updated.id, created.id);
}

#[tokio::test]
async fn update_with_no_match_is_not_found() {
    let sessions = repository();

    let err = sessions
        .find_one_and_update(
            &Filter::eq("user", "nobody"),
            &UpdateSpec::new().set("seat", 7),
        )
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn the_identifier_is_immutable() {
    let sessions = repository();
    sessions.create(&session("alice", 1)).await.unwrap();

    let err = sessions
        .find_one_and_update(
            &Filter::eq("user", "alice"),
            &UpdateSpec::new().set("id", bson::Uuid::new()),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Validation(_)));
}

#[tokio::test]
async fn delete_removes_and_returns_the_last_state() {
    let sessions = repository();
    let created = sessions.create(&session("alice", 1)).await.unwrap();

    let deleted = sessions
        .find_one_and_delete(&Filter::eq("user", "alice"))
        .await
        .unwrap();
    assert_eq!(deleted, created);

    let err = sessions
        .find_one(&Filter::eq("user", "alice"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn concurrent_creates_receive_distinct_identifiers() {
    let sessions = repository();

    let mut handles = Vec::new();
    for seat in 0..100 {
        let sessions = sessions.clone();
        handles.push(tokio::spawn(async move {
            sessions.create(&session("alice", seat)).await.unwrap()
        }));
    }

    let mut ids = HashSet::new();
    for handle in handles {
        let created = handle.await.unwrap();
        assert!(ids.insert(created.id.unwrap()));
    }
    assert_eq!(ids.len(), 100);

    let page = sessions
        .find(&Filter::all(), &PageRequest::new(1, 200))
        .await
        .unwrap();
    assert_eq!(page.total, 100);
}

#[tokio::test]
async fn the_persisted_document_is_detached_from_the_input() {
    let sessions = repository();
    let mut input = session("alice", 1);

    let created = sessions.create(&input).await.unwrap();

    // mutating the caller-held value afterwards must not reach the store
    input.user = "mallory".to_string();
    input.seat = 99;

    let stored = sessions
        .find_one(&Filter::eq("id", created.id.unwrap()))
        .await
        .unwrap();
    assert_eq!(stored.user, "alice");
    assert_eq!(stored.seat, 1);
}
