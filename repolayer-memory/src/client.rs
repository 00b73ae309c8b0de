//! In-memory implementation of the store client.

use async_trait::async_trait;
use bson::{Document as RawDocument, Uuid};
use mea::rwlock::RwLock;
use std::{collections::BTreeMap, sync::Arc};

use repolayer_core::{
    client::StoreClient,
    error::{StoreError, StoreResult},
    filter::Expr,
    update::UpdateSpec,
};

use crate::evaluator::{apply_update, DocumentEvaluator};

type CollectionMap = BTreeMap<String, RawDocument>;
type StoreMap = BTreeMap<String, CollectionMap>;

/// Thread-safe in-memory document store.
///
/// Documents live in nested maps behind an async-aware read-write lock,
/// keyed by collection name and then by identifier. Identifier ordering
/// doubles as the result ordering, so repeated paginated reads over an
/// unchanged collection see a stable sequence.
///
/// Find-and-mutate operations hold the write lock for their whole
/// match-then-mutate step, which is what makes them atomic with respect to
/// every other call on the same store.
///
/// Clones share the same underlying data, so the store can be handed to any
/// number of repositories. Queries scan the whole collection; that is fine
/// for tests and small deployments, which is what this backend is for.
#[derive(Default, Clone, Debug)]
pub struct InMemoryClient {
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryClient {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently held in a collection.
    pub async fn len(&self, collection: &str) -> usize {
        self.store
            .read()
            .await
            .get(collection)
            .map(|col| col.len())
            .unwrap_or(0)
    }

    /// True when the collection holds no documents.
    pub async fn is_empty(&self, collection: &str) -> bool {
        self.len(collection).await == 0
    }
}

fn first_match<'a>(
    collection: &'a CollectionMap,
    filter: &Expr,
) -> StoreResult<Option<&'a String>> {
    for (key, document) in collection {
        if DocumentEvaluator::matches(document, filter)? {
            return Ok(Some(key));
        }
    }

    Ok(None)
}

#[async_trait]
impl StoreClient for InMemoryClient {
    async fn insert(&self, collection: &str, id: Uuid, document: RawDocument) -> StoreResult<()> {
        let mut store = self.store.write().await;
        let collection_map = store.entry(collection.to_string()).or_default();
        let key = id.to_string();

        if collection_map.contains_key(&key) {
            return Err(StoreError::unknown(format!(
                "identifier '{key}' already present in collection '{collection}'"
            )));
        }

        collection_map.insert(key, document);
        Ok(())
    }

    async fn find_one(&self, collection: &str, filter: &Expr) -> StoreResult<Option<RawDocument>> {
        let store = self.store.read().await;
        let Some(collection_map) = store.get(collection) else {
            return Ok(None);
        };

        Ok(first_match(collection_map, filter)?.map(|key| collection_map[key].clone()))
    }

    async fn find_one_and_update(
        &self,
        collection: &str,
        filter: &Expr,
        update: &UpdateSpec,
    ) -> StoreResult<Option<RawDocument>> {
        let mut store = self.store.write().await;
        let Some(collection_map) = store.get_mut(collection) else {
            return Ok(None);
        };

        let Some(key) = first_match(collection_map, filter)?.cloned() else {
            return Ok(None);
        };

        let document = collection_map
            .get_mut(&key)
            .ok_or_else(|| StoreError::unknown(format!("document '{key}' vanished mid-update")))?;
        apply_update(document, update);

        Ok(Some(document.clone()))
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Expr,
        skip: u64,
        limit: u64,
    ) -> StoreResult<Vec<RawDocument>> {
        let store = self.store.read().await;
        let Some(collection_map) = store.get(collection) else {
            return Ok(Vec::new());
        };

        let mut matches = Vec::new();
        for document in collection_map.values() {
            if DocumentEvaluator::matches(document, filter)? {
                matches.push(document.clone());
            }
        }

        Ok(matches
            .into_iter()
            .skip(skip as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count_documents(&self, collection: &str, filter: &Expr) -> StoreResult<u64> {
        let store = self.store.read().await;
        let Some(collection_map) = store.get(collection) else {
            return Ok(0);
        };

        let mut count = 0;
        for document in collection_map.values() {
            if DocumentEvaluator::matches(document, filter)? {
                count += 1;
            }
        }

        Ok(count)
    }

    async fn find_one_and_delete(
        &self,
        collection: &str,
        filter: &Expr,
    ) -> StoreResult<Option<RawDocument>> {
        let mut store = self.store.write().await;
        let Some(collection_map) = store.get_mut(collection) else {
            return Ok(None);
        };

        let Some(key) = first_match(collection_map, filter)?.cloned() else {
            return Ok(None);
        };

        Ok(collection_map.remove(&key))
    }
}
