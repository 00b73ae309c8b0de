use bson::{doc, Uuid};
use repolayer_core::{client::StoreClient, filter::Filter, update::UpdateSpec};
use repolayer_memory::InMemoryClient;

#[tokio::test]
async fn insert_then_find_one_round_trips() {
    let client = InMemoryClient::new();
    let id = Uuid::new();
    client
        .insert("users", id, doc! { "id": id, "email": "alice@example.com" })
        .await
        .unwrap();

    let found = client
        .find_one("users", &Filter::eq("email", "alice@example.com"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.get_str("email").unwrap(), "alice@example.com");
}

#[tokio::test]
async fn missing_match_is_absence_not_failure() {
    let client = InMemoryClient::new();

    let found = client
        .find_one("users", &Filter::eq("email", "nobody@example.com"))
        .await
        .unwrap();
    assert!(found.is_none());

    let deleted = client
        .find_one_and_delete("users", &Filter::all())
        .await
        .unwrap();
    assert!(deleted.is_none());
}

#[tokio::test]
async fn string_matching_is_case_sensitive() {
    let client = InMemoryClient::new();
    let id = Uuid::new();
    client
        .insert("users", id, doc! { "id": id, "email": "alice@example.com" })
        .await
        .unwrap();

    let shouted = client
        .find_one("users", &Filter::contains("email", "ALICE"))
        .await
        .unwrap();
    assert!(shouted.is_none());

    let exact = client
        .find_one("users", &Filter::contains("email", "alice"))
        .await
        .unwrap();
    assert!(exact.is_some());
}

#[tokio::test]
async fn duplicate_identifier_is_rejected() {
    let client = InMemoryClient::new();
    let id = Uuid::new();
    client.insert("users", id, doc! { "id": id }).await.unwrap();

    let err = client.insert("users", id, doc! { "id": id }).await.unwrap_err();
    assert!(err.to_string().contains("already present"));
}

#[tokio::test]
async fn find_one_and_update_returns_post_update_state() {
    let client = InMemoryClient::new();
    let id = Uuid::new();
    client
        .insert("reservations", id, doc! { "id": id, "status": "pending" })
        .await
        .unwrap();

    let updated = client
        .find_one_and_update(
            "reservations",
            &Filter::eq("id", id),
            &UpdateSpec::new().set("status", "confirmed").set("payment.amount", 4200),
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.get_str("status").unwrap(), "confirmed");
    assert_eq!(
        updated.get_document("payment").unwrap().get_i32("amount").unwrap(),
        4200
    );

    // the stored copy changed too
    let stored = client
        .find_one("reservations", &Filter::eq("id", id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.get_str("status").unwrap(), "confirmed");
}

#[tokio::test]
async fn find_one_and_delete_removes_exactly_one() {
    let client = InMemoryClient::new();
    for _ in 0..3 {
        let id = Uuid::new();
        client
            .insert("sessions", id, doc! { "id": id, "active": true })
            .await
            .unwrap();
    }

    let deleted = client
        .find_one_and_delete("sessions", &Filter::eq("active", true))
        .await
        .unwrap();
    assert!(deleted.is_some());
    assert_eq!(client.len("sessions").await, 2);
}

#[tokio::test]
async fn find_pages_are_disjoint_and_count_is_unbounded() {
    let client = InMemoryClient::new();
    for i in 0..25 {
        let id = Uuid::new();
        client
            .insert("items", id, doc! { "id": id, "index": i })
            .await
            .unwrap();
    }

    let first = client.find("items", &Filter::all(), 0, 10).await.unwrap();
    let second = client.find("items", &Filter::all(), 10, 10).await.unwrap();
    let third = client.find("items", &Filter::all(), 20, 10).await.unwrap();

    assert_eq!(first.len(), 10);
    assert_eq!(second.len(), 10);
    assert_eq!(third.len(), 5);

    let mut seen = std::collections::HashSet::new();
    for page in [&first, &second, &third] {
        for document in page {
            assert!(seen.insert(document.get("id").cloned().unwrap()));
        }
    }

    let total = client.count_documents("items", &Filter::all()).await.unwrap();
    assert_eq!(total, 25);
}

#[tokio::test]
async fn concurrent_updates_never_interleave() {
    let client = InMemoryClient::new();
    let id = Uuid::new();
    client
        .insert("counters", id, doc! { "id": id, "value": 0 })
        .await
        .unwrap();

    // every task rewrites the whole document; atomicity means the final
    // state is exactly one task's write, never a blend
    let mut handles = Vec::new();
    for i in 0..16_i32 {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            client
                .find_one_and_update(
                    "counters",
                    &Filter::eq("id", id),
                    &UpdateSpec::new().set("value", i).set("shadow", i),
                )
                .await
                .unwrap()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let stored = client
        .find_one("counters", &Filter::eq("id", id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        stored.get_i32("value").unwrap(),
        stored.get_i32("shadow").unwrap()
    );
}
