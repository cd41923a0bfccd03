//! MongoDB Guidance Store Adapter
//!
//! Implements the `GuidanceStore` port by counting documents in the guidance
//! service's message collection.

use async_trait::async_trait;
use mongodb::bson::{doc, Document};
use mongodb::{Client, Collection};
use tracing::{debug, instrument};

use crate::domain::ports::GuidanceStore;
use crate::error::{Error, Result};

/// Default collection holding guidance messages.
pub const DEFAULT_COLLECTION: &str = "messages";

/// Connection parameters for the guidance database.
#[derive(Debug, Clone)]
pub struct MongoConfig {
    /// Connection URI, e.g. `mongodb://mongo:27017/guidance_db`
    pub uri: String,
    /// Database name; falls back to the URI's default database
    pub database: Option<String>,
    /// Collection to count
    pub collection: String,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: "mongodb://localhost:27017/guidance_db".to_string(),
            database: None,
            collection: DEFAULT_COLLECTION.to_string(),
        }
    }
}

/// MongoDB-backed guidance store.
pub struct MongoGuidanceStore {
    collection: Collection<Document>,
}

impl MongoGuidanceStore {
    /// Parse the URI and build a client. No server round-trip happens until
    /// the first count.
    pub async fn connect(config: &MongoConfig) -> Result<Self> {
        let client = Client::with_uri_str(&config.uri)
            .await
            .map_err(document_error)?;

        let database = match &config.database {
            Some(name) => client.database(name),
            None => client.default_database().ok_or_else(|| {
                Error::Config(
                    "MongoDB URI has no default database and no database was configured"
                        .to_string(),
                )
            })?,
        };

        Ok(Self {
            collection: database.collection::<Document>(&config.collection),
        })
    }
}

impl std::fmt::Debug for MongoGuidanceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MongoGuidanceStore")
            .field("collection", &self.collection.name())
            .finish()
    }
}

#[async_trait]
impl GuidanceStore for MongoGuidanceStore {
    #[instrument(skip(self))]
    async fn count_messages(&self) -> Result<u64> {
        let count = self
            .collection
            .count_documents(doc! {})
            .await
            .map_err(document_error)?;

        debug!(count, collection = %self.collection.name(), "Counted guidance messages");
        Ok(count)
    }
}

fn document_error(e: mongodb::error::Error) -> Error {
    Error::Document(e.to_string())
}
