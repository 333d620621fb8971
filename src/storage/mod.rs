//! Storage boundary: documents live in a two-column table
//! (`_id`, `_document`) and are fetched with compiled queries.

mod config;
mod sqlite;

pub use config::{StoreConfig, StoreLocation};
pub use sqlite::SqliteStore;

use crate::core::Result;
use crate::sql::{CompiledQuery, Dialect, TableRef};
use async_trait::async_trait;
use uuid::Uuid;

/// A stored row before deserialization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub id: Uuid,
    pub json: String,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Dialect the store's queries must be compiled with
    fn dialect(&self) -> &dyn Dialect;

    fn config(&self) -> &StoreConfig;

    async fn ensure_table(&self, table: &TableRef) -> Result<()>;

    async fn insert(&self, table: &TableRef, document: RawDocument) -> Result<()>;

    async fn get(&self, table: &TableRef, id: Uuid) -> Result<Option<RawDocument>>;

    /// Returns whether a row was replaced
    async fn update(&self, table: &TableRef, document: RawDocument) -> Result<bool>;

    /// Returns whether a row was removed
    async fn delete(&self, table: &TableRef, id: Uuid) -> Result<bool>;

    async fn query(&self, compiled: &CompiledQuery) -> Result<Vec<RawDocument>>;

    async fn count(&self, compiled: &CompiledQuery) -> Result<u64>;
}
