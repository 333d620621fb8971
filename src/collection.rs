//! Typed collections over a [`DocumentStore`].

use crate::builder::QueryBuilder;
use crate::core::Result;
use crate::query::{Page, Query, Sorting};
use crate::schema::Schema;
use crate::sql::{CompiledQuery, QueryCompiler, TableRef};
use crate::storage::{DocumentStore, RawDocument};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// A document type that can be stored and queried
pub trait Document: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Table the collection lives in
    fn table_name() -> &'static str;

    /// Shape of the serialized document, used to resolve query paths
    fn schema() -> Result<Schema>;
}

/// A document together with its row id
#[derive(Debug, Clone, PartialEq)]
pub struct Stored<T> {
    pub id: Uuid,
    pub document: T,
}

pub struct Collection<T: Document> {
    store: Arc<dyn DocumentStore>,
    table: TableRef,
    schema: Schema,
    default_sort_by_id: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Document> Collection<T> {
    /// Open the collection in `T::table_name()`, creating the table if needed
    pub async fn open(store: Arc<dyn DocumentStore>) -> Result<Self> {
        let mut table = TableRef::new(T::table_name())?;
        if let Some(schema) = store.config().schema.clone() {
            table = table.in_schema(schema)?;
        }
        Self::with_table(store, table).await
    }

    pub async fn with_table(store: Arc<dyn DocumentStore>, table: TableRef) -> Result<Self> {
        let schema = T::schema()?;
        store.ensure_table(&table).await?;
        let default_sort_by_id = store.config().default_sort_by_id;

        Ok(Self {
            store,
            table,
            schema,
            default_sort_by_id,
            _marker: PhantomData,
        })
    }

    pub fn table(&self) -> &TableRef {
        &self.table
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    fn compiler(&self) -> QueryCompiler<'_> {
        QueryCompiler::new(&self.schema, self.store.dialect())
    }

    pub async fn insert(&self, document: &T) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let json = serde_json::to_string(document)?;
        self.store
            .insert(&self.table, RawDocument { id, json })
            .await?;
        Ok(id)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<T>> {
        match self.store.get(&self.table, id).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw.json)?)),
            None => Ok(None),
        }
    }

    /// Replace the document stored under `id`; false if there is none
    pub async fn update(&self, id: Uuid, document: &T) -> Result<bool> {
        let json = serde_json::to_string(document)?;
        self.store
            .update(&self.table, RawDocument { id, json })
            .await
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        self.store.delete(&self.table, id).await
    }

    /// Compile without running, with the same defaults as [`Collection::find`]
    pub fn compile(&self, query: Option<&Query>, sorting: &Sorting, page: Page) -> Result<CompiledQuery> {
        let sorting = if sorting.is_empty() && self.default_sort_by_id {
            Sorting::by_id()
        } else {
            sorting.clone()
        };
        self.compiler()
            .select(&self.table, query, sorting.keys(), page)
    }

    pub async fn find(
        &self,
        query: Option<&Query>,
        sorting: &Sorting,
        page: Page,
    ) -> Result<Vec<Stored<T>>> {
        let compiled = self.compile(query, sorting, page)?;
        let rows = self.store.query(&compiled).await?;
        debug!(table = self.table.name(), rows = rows.len(), "find");

        rows.into_iter()
            .map(|raw| {
                Ok(Stored {
                    id: raw.id,
                    document: serde_json::from_str(&raw.json)?,
                })
            })
            .collect()
    }

    pub async fn find_all(&self) -> Result<Vec<Stored<T>>> {
        self.find(None, &Sorting::new(), Page::all()).await
    }

    pub async fn find_first(&self, query: Option<&Query>, sorting: &Sorting) -> Result<Option<Stored<T>>> {
        let mut found = self.find(query, sorting, Page::first()).await?;
        Ok(if found.is_empty() {
            None
        } else {
            Some(found.swap_remove(0))
        })
    }

    pub async fn count(&self, query: Option<&Query>) -> Result<u64> {
        let compiled = self.compiler().count(&self.table, query)?;
        self.store.count(&compiled).await
    }

    /// [`Collection::find`] with a predicate such as `p => p.Author.Username == "admin"`.
    ///
    /// Use [`QueryBuilder`] directly when the predicate needs bound values.
    pub async fn find_where(&self, predicate: &str, sorting: &Sorting, page: Page) -> Result<Vec<Stored<T>>> {
        let query = QueryBuilder::new().build(predicate)?;
        self.find(Some(&query), sorting, page).await
    }

    pub async fn count_where(&self, predicate: &str) -> Result<u64> {
        let query = QueryBuilder::new().build(predicate)?;
        self.count(Some(&query)).await
    }
}
