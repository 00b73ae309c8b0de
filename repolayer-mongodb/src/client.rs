use async_trait::async_trait;
use bson::{doc, Document as RawDocument, Uuid};
use futures::TryStreamExt;
use mongodb::{
    error::{Error as MongoError, ErrorKind},
    options::{ClientOptions, ReturnDocument},
    Client, Collection,
};
use std::time::Duration;

use repolayer_core::{
    client::StoreClient,
    error::{StoreError, StoreResult},
    filter::{Expr, FilterVisitor},
    update::UpdateSpec,
};

use crate::query::MongoFilterTranslator;

/// MongoDB-backed implementation of the store client.
///
/// Wraps the driver's pooled [`Client`], so one instance serves the whole
/// process. Atomic find-and-mutate operations map directly onto MongoDB's
/// `findOneAndUpdate` / `findOneAndDelete` commands; this backend never
/// emulates them with separate reads and writes.
///
/// When an operation deadline is configured, every call is raced against it
/// and a loss surfaces as a [`Timeout`](repolayer_core::error::StoreErrorKind::Timeout)
/// failure. For mutating calls that means the outcome is unknown: the
/// command may still have been applied server-side.
#[derive(Debug)]
pub struct MongoClient {
    client: Client,
    database: String,
    operation_timeout: Option<Duration>,
}

impl MongoClient {
    /// Starts building a client for the given connection string and database.
    pub fn builder(uri: &str, database: &str) -> MongoClientBuilder {
        MongoClientBuilder::new(uri, database)
    }

    fn collection(&self, name: &str) -> Collection<RawDocument> {
        self.client.database(&self.database).collection(name)
    }

    fn translate(filter: &Expr) -> StoreResult<RawDocument> {
        MongoFilterTranslator.visit_expr(filter)
    }

    /// The stored form carries the identifier twice: as the application's
    /// `id` field and as MongoDB's `_id`, so the collection's primary index
    /// enforces uniqueness.
    fn prepare(id: Uuid, document: RawDocument) -> RawDocument {
        let mut prepared = document;
        prepared.insert("_id", id);
        prepared
    }

    fn restore(mut document: RawDocument) -> RawDocument {
        document.remove("_id");
        document
    }

    async fn deadline<T>(
        &self,
        future: impl Future<Output = Result<T, MongoError>>,
    ) -> StoreResult<T> {
        match self.operation_timeout {
            Some(limit) => match tokio::time::timeout(limit, future).await {
                Ok(result) => result.map_err(map_error),
                Err(_) => Err(StoreError::timeout(format!(
                    "no response from the document store within {limit:?}"
                ))),
            },
            None => future.await.map_err(map_error),
        }
    }
}

fn map_error(err: MongoError) -> StoreError {
    match &*err.kind {
        ErrorKind::Io(io_err) if io_err.kind() == std::io::ErrorKind::TimedOut => {
            StoreError::timeout(err.to_string())
        }
        ErrorKind::Io(_) | ErrorKind::ServerSelection { .. } => {
            StoreError::connection(err.to_string())
        }
        _ => StoreError::unknown(err.to_string()),
    }
}

#[async_trait]
impl StoreClient for MongoClient {
    async fn insert(&self, collection: &str, id: Uuid, document: RawDocument) -> StoreResult<()> {
        self.deadline(
            self.collection(collection)
                .insert_one(Self::prepare(id, document))
                .into_future(),
        )
        .await?;

        Ok(())
    }

    async fn find_one(&self, collection: &str, filter: &Expr) -> StoreResult<Option<RawDocument>> {
        let found = self
            .deadline(
                self.collection(collection)
                    .find_one(Self::translate(filter)?)
                    .into_future(),
            )
            .await?;

        Ok(found.map(Self::restore))
    }

    async fn find_one_and_update(
        &self,
        collection: &str,
        filter: &Expr,
        update: &UpdateSpec,
    ) -> StoreResult<Option<RawDocument>> {
        let updated = self
            .deadline(
                self.collection(collection)
                    .find_one_and_update(
                        Self::translate(filter)?,
                        doc! { "$set": update.to_raw() },
                    )
                    .return_document(ReturnDocument::After)
                    .into_future(),
            )
            .await?;

        Ok(updated.map(Self::restore))
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Expr,
        skip: u64,
        limit: u64,
    ) -> StoreResult<Vec<RawDocument>> {
        let query = Self::translate(filter)?;
        let documents = self
            .deadline(async {
                self.collection(collection)
                    .find(query)
                    .sort(doc! { "_id": 1 })
                    .skip(skip)
                    .limit(limit.min(i64::MAX as u64) as i64)
                    .await?
                    .try_collect::<Vec<RawDocument>>()
                    .await
            })
            .await?;

        Ok(documents.into_iter().map(Self::restore).collect())
    }

    async fn count_documents(&self, collection: &str, filter: &Expr) -> StoreResult<u64> {
        self.deadline(
            self.collection(collection)
                .count_documents(Self::translate(filter)?)
                .into_future(),
        )
        .await
    }

    async fn find_one_and_delete(
        &self,
        collection: &str,
        filter: &Expr,
    ) -> StoreResult<Option<RawDocument>> {
        let deleted = self
            .deadline(
                self.collection(collection)
                    .find_one_and_delete(Self::translate(filter)?)
                    .into_future(),
            )
            .await?;

        Ok(deleted.map(Self::restore))
    }
}

/// Configures and connects a [`MongoClient`].
///
/// ```ignore
/// use std::time::Duration;
/// use repolayer_mongodb::MongoClient;
///
/// let client = MongoClient::builder("mongodb://localhost:27017", "reservations")
///     .connect_timeout(Duration::from_secs(5))
///     .operation_timeout(Duration::from_secs(10))
///     .build()
///     .await?;
/// ```
pub struct MongoClientBuilder {
    uri: String,
    database: String,
    connect_timeout: Option<Duration>,
    operation_timeout: Option<Duration>,
}

impl MongoClientBuilder {
    pub fn new(uri: &str, database: &str) -> Self {
        Self {
            uri: uri.to_string(),
            database: database.to_string(),
            connect_timeout: None,
            operation_timeout: None,
        }
    }

    /// Deadline for establishing connections and selecting a server.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Deadline applied to every store operation. Unset means the driver's
    /// own defaults decide.
    pub fn operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = Some(timeout);
        self
    }

    pub async fn build(self) -> StoreResult<MongoClient> {
        let mut options = ClientOptions::parse(&self.uri)
            .await
            .map_err(|err| StoreError::connection(err.to_string()))?;

        if let Some(timeout) = self.connect_timeout {
            options.connect_timeout = Some(timeout);
            options.server_selection_timeout = Some(timeout);
        }

        let client = Client::with_options(options)
            .map_err(|err| StoreError::connection(err.to_string()))?;

        Ok(MongoClient {
            client,
            database: self.database,
            operation_timeout: self.operation_timeout,
        })
    }
}
