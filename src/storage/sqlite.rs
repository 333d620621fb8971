use super::{DocumentStore, RawDocument, StoreConfig, StoreLocation};
use crate::core::{MapperError, Result, Value};
use crate::sql::dialect::SQLITE_DATETIME_FORMAT;
use crate::sql::{CompiledQuery, DOCUMENT_COLUMN, Dialect, ID_COLUMN, SqliteDialect, TableRef};
use async_trait::async_trait;
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OptionalExtension, ToSql, params};
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

/// Document store on a single SQLite connection.
///
/// rusqlite is synchronous, so every call runs on tokio's blocking pool.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    config: StoreConfig,
    dialect: SqliteDialect,
}

impl SqliteStore {
    pub fn open(config: StoreConfig) -> Result<Self> {
        let conn = match &config.location {
            StoreLocation::Memory => Connection::open_in_memory()?,
            StoreLocation::File(path) => Connection::open(path)?,
        };
        conn.busy_timeout(config.busy_timeout)?;
        debug!(location = ?config.location, "opened sqlite store");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            config,
            dialect: SqliteDialect,
        })
    }

    pub fn in_memory() -> Result<Self> {
        Self::open(StoreConfig::in_memory())
    }

    async fn run<F, T>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock()?;
            work(&guard)
        })
        .await?
    }

    fn named_parameters(&self, compiled: &CompiledQuery) -> Vec<(String, SqlValue)> {
        compiled
            .parameters
            .iter()
            .map(|p| (self.dialect.placeholder(p.index), to_sql_value(&p.value)))
            .collect()
    }
}

fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Integer(i) => SqlValue::Integer(*i),
        Value::Float(f) => SqlValue::Real(*f),
        Value::Text(s) => SqlValue::Text(s.clone()),
        Value::Boolean(b) => SqlValue::Integer(i64::from(*b)),
        Value::DateTime(dt) => SqlValue::Text(dt.format(SQLITE_DATETIME_FORMAT).to_string()),
        Value::Uuid(id) => SqlValue::Text(id.to_string()),
    }
}

fn parse_id(text: &str) -> Result<Uuid> {
    Uuid::parse_str(text)
        .map_err(|e| MapperError::StorageError(format!("Stored id '{}' is not a UUID: {}", text, e)))
}

fn read_rows(
    conn: &Connection,
    sql: &str,
    parameters: &[(String, SqlValue)],
) -> Result<Vec<RawDocument>> {
    let named: Vec<(&str, &dyn ToSql)> = parameters
        .iter()
        .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
        .collect();

    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(named.as_slice(), |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut documents = Vec::new();
    for row in rows {
        let (id, json) = row?;
        documents.push(RawDocument {
            id: parse_id(&id)?,
            json,
        });
    }
    Ok(documents)
}

#[async_trait]
impl DocumentStore for SqliteStore {
    fn dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    fn config(&self) -> &StoreConfig {
        &self.config
    }

    async fn ensure_table(&self, table: &TableRef) -> Result<()> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} ({} TEXT NOT NULL PRIMARY KEY, {} TEXT NOT NULL)",
            table.render(&self.dialect),
            ID_COLUMN,
            DOCUMENT_COLUMN
        );
        debug!(table = table.name(), "ensuring document table");
        self.run(move |conn| {
            conn.execute(&sql, [])?;
            Ok(())
        })
        .await
    }

    async fn insert(&self, table: &TableRef, document: RawDocument) -> Result<()> {
        let sql = format!(
            "INSERT INTO {} ({}, {}) VALUES (?1, ?2)",
            table.render(&self.dialect),
            ID_COLUMN,
            DOCUMENT_COLUMN
        );
        debug!(table = table.name(), id = %document.id, "inserting document");
        self.run(move |conn| {
            conn.execute(&sql, params![document.id.to_string(), document.json])?;
            Ok(())
        })
        .await
    }

    async fn get(&self, table: &TableRef, id: Uuid) -> Result<Option<RawDocument>> {
        let sql = format!(
            "SELECT {}, {} FROM {} WHERE {} = ?1",
            ID_COLUMN,
            DOCUMENT_COLUMN,
            table.render(&self.dialect),
            ID_COLUMN
        );
        self.run(move |conn| {
            let row = conn
                .query_row(&sql, params![id.to_string()], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })
                .optional()?;
            row.map(|(id, json)| Ok(RawDocument { id: parse_id(&id)?, json }))
                .transpose()
        })
        .await
    }

    async fn update(&self, table: &TableRef, document: RawDocument) -> Result<bool> {
        let sql = format!(
            "UPDATE {} SET {} = ?1 WHERE {} = ?2",
            table.render(&self.dialect),
            DOCUMENT_COLUMN,
            ID_COLUMN
        );
        debug!(table = table.name(), id = %document.id, "updating document");
        self.run(move |conn| {
            let changed = conn.execute(&sql, params![document.json, document.id.to_string()])?;
            Ok(changed > 0)
        })
        .await
    }

    async fn delete(&self, table: &TableRef, id: Uuid) -> Result<bool> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?1",
            table.render(&self.dialect),
            ID_COLUMN
        );
        debug!(table = table.name(), id = %id, "deleting document");
        self.run(move |conn| {
            let changed = conn.execute(&sql, params![id.to_string()])?;
            Ok(changed > 0)
        })
        .await
    }

    async fn query(&self, compiled: &CompiledQuery) -> Result<Vec<RawDocument>> {
        let sql = compiled.sql.clone();
        let parameters = self.named_parameters(compiled);
        debug!(sql = %sql, parameters = parameters.len(), "running query");
        self.run(move |conn| read_rows(conn, &sql, &parameters)).await
    }

    async fn count(&self, compiled: &CompiledQuery) -> Result<u64> {
        let sql = compiled.sql.clone();
        let parameters = self.named_parameters(compiled);
        debug!(sql = %sql, parameters = parameters.len(), "running count");
        self.run(move |conn| {
            let named: Vec<(&str, &dyn ToSql)> = parameters
                .iter()
                .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
                .collect();
            let count: i64 = conn.query_row(&sql, named.as_slice(), |row| row.get(0))?;
            Ok(u64::try_from(count).unwrap_or(0))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_sql_values() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 2, 10, 30, 0).unwrap();
        assert_eq!(
            to_sql_value(&Value::DateTime(dt)),
            SqlValue::Text("2024-01-02 10:30:00.000".to_string())
        );
        assert_eq!(to_sql_value(&Value::Boolean(true)), SqlValue::Integer(1));
    }

    #[tokio::test]
    async fn test_insert_get_update_delete() {
        let store = SqliteStore::in_memory().unwrap();
        let table = TableRef::new("Items").unwrap();
        store.ensure_table(&table).await.unwrap();

        let id = Uuid::new_v4();
        store
            .insert(&table, RawDocument { id, json: r#"{"Name":"a"}"#.into() })
            .await
            .unwrap();

        let fetched = store.get(&table, id).await.unwrap().unwrap();
        assert_eq!(fetched.json, r#"{"Name":"a"}"#);

        let replaced = store
            .update(&table, RawDocument { id, json: r#"{"Name":"b"}"#.into() })
            .await
            .unwrap();
        assert!(replaced);
        assert_eq!(store.get(&table, id).await.unwrap().unwrap().json, r#"{"Name":"b"}"#);

        assert!(store.delete(&table, id).await.unwrap());
        assert!(!store.delete(&table, id).await.unwrap());
        assert!(store.get(&table, id).await.unwrap().is_none());
    }
}
