//! Catalog browsing: databases, schemas, tables and columns of the data platform.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection, Statement, Value};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{DomainError, DomainResult};

/// Fully-qualified table reference, written `DB.SCHEMA.TABLE`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct TableRef {
    pub database: String,
    pub schema: String,
    pub table: String,
}

impl TableRef {
    pub fn new(
        database: impl Into<String>,
        schema: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            database: database.into(),
            schema: schema.into(),
            table: table.into(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.database, self.schema, self.table)
    }
}

impl FromStr for TableRef {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('.').map(str::trim).collect();
        match parts.as_slice() {
            [db, schema, table] if !db.is_empty() && !schema.is_empty() && !table.is_empty() => {
                Ok(Self::new(*db, *schema, *table))
            }
            _ => Err(DomainError::invalid_field(
                "table",
                format!("'{}' is not a fully-qualified DB.SCHEMA.TABLE reference", s),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
}

impl ColumnInfo {
    pub fn is_text(&self) -> bool {
        is_text_type(&self.data_type)
    }
}

/// Types eligible for text standardization.
pub fn is_text_type(data_type: &str) -> bool {
    let upper = data_type.trim().to_ascii_uppercase();
    ["VARCHAR", "TEXT", "STRING", "CHAR"]
        .iter()
        .any(|prefix| upper.starts_with(prefix))
}

#[async_trait]
pub trait CatalogBrowser: Send + Sync {
    async fn list_databases(&self) -> DomainResult<Vec<String>>;

    async fn list_schemas(&self, database: &str) -> DomainResult<Vec<String>>;

    async fn list_tables(&self, database: &str, schema: &str) -> DomainResult<Vec<String>>;

    /// Columns in ordinal order
    async fn list_columns(&self, table: &TableRef) -> DomainResult<Vec<ColumnInfo>>;

    async fn text_columns(&self, table: &TableRef) -> DomainResult<Vec<ColumnInfo>> {
        Ok(self
            .list_columns(table)
            .await?
            .into_iter()
            .filter(ColumnInfo::is_text)
            .collect())
    }
}

/// Catalog backed by `information_schema` on the platform connection.
pub struct SqlCatalog {
    db: DatabaseConnection,
}

impl SqlCatalog {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn statement(&self, sql: &str, values: Vec<Value>) -> Statement {
        let backend = self.db.get_database_backend();
        let sql = match backend {
            DatabaseBackend::Postgres => numbered_placeholders(sql),
            _ => sql.to_string(),
        };
        Statement::from_sql_and_values(backend, sql, values)
    }

    async fn names(&self, sql: &str, values: Vec<Value>) -> DomainResult<Vec<String>> {
        let rows = self.db.query_all(self.statement(sql, values)).await?;
        rows.iter()
            .map(|row| row.try_get_by_index::<String>(0).map_err(DomainError::from))
            .collect()
    }
}

/// Rewrite `?` placeholders as `$1, $2, ...`.
fn numbered_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut n = 0;
    for ch in sql.chars() {
        if ch == '?' {
            n += 1;
            out.push('$');
            out.push_str(&n.to_string());
        } else {
            out.push(ch);
        }
    }
    out
}

#[async_trait]
impl CatalogBrowser for SqlCatalog {
    async fn list_databases(&self) -> DomainResult<Vec<String>> {
        self.names(
            "SELECT DISTINCT catalog_name FROM information_schema.schemata ORDER BY catalog_name",
            vec![],
        )
        .await
    }

    async fn list_schemas(&self, database: &str) -> DomainResult<Vec<String>> {
        self.names(
            "SELECT schema_name FROM information_schema.schemata \
             WHERE catalog_name = ? ORDER BY schema_name",
            vec![database.into()],
        )
        .await
    }

    async fn list_tables(&self, database: &str, schema: &str) -> DomainResult<Vec<String>> {
        self.names(
            "SELECT table_name FROM information_schema.tables \
             WHERE table_catalog = ? AND table_schema = ? ORDER BY table_name",
            vec![database.into(), schema.into()],
        )
        .await
    }

    async fn list_columns(&self, table: &TableRef) -> DomainResult<Vec<ColumnInfo>> {
        let stmt = self.statement(
            "SELECT column_name, data_type FROM information_schema.columns \
             WHERE table_catalog = ? AND table_schema = ? AND table_name = ? \
             ORDER BY ordinal_position",
            vec![
                table.database.as_str().into(),
                table.schema.as_str().into(),
                table.table.as_str().into(),
            ],
        );
        let rows = self.db.query_all(stmt).await?;

        rows.iter()
            .map(|row| -> DomainResult<ColumnInfo> {
                Ok(ColumnInfo {
                    name: row.try_get_by_index(0)?,
                    data_type: row.try_get_by_index(1)?,
                })
            })
            .collect()
    }
}
