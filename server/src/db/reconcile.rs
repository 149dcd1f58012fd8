//! Schema reconciliation for declared entities.
//!
//! The live schema is compared against each [`TableSchema`]; missing tables,
//! columns and indexes are created. Nothing is dropped or altered, so running
//! a migration against an up-to-date database is a no-op.

use std::collections::HashSet;
use std::fmt;

use sqlx::PgConnection;
use storefront_domain::{ColumnDef, ColumnDefault, ColumnType, Entity, IndexDef, TableSchema, User};

use super::Pool;

/// Who asked for the migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationMode {
    /// Automatic migration during startup; failures abort the process.
    Startup,
    /// Operator-triggered migration; failures are reported to the caller.
    Manual,
}

impl fmt::Display for MigrationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Startup => f.write_str("startup"),
            Self::Manual => f.write_str("manual"),
        }
    }
}

/// Schema reconciliation failed.
#[derive(Debug, thiserror::Error)]
#[error("{mode} migration failed: {source}")]
pub struct MigrationError {
    pub mode: MigrationMode,
    pub source: sqlx::Error,
}

impl MigrationError {
    /// Startup migrations must stop the process; manual ones need not.
    pub fn is_fatal(&self) -> bool {
        self.mode == MigrationMode::Startup
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    CreateTable,
    AddColumn,
    CreateIndex,
}

/// One DDL statement planned against the live schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaChange {
    pub kind: ChangeKind,
    pub table: String,
    /// Column or index name; the table name for `CreateTable`
    pub object: String,
    pub sql: String,
}

impl fmt::Display for SchemaChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ChangeKind::CreateTable => write!(f, "create table {}", self.table),
            ChangeKind::AddColumn => write!(f, "add column {}.{}", self.table, self.object),
            ChangeKind::CreateIndex => write!(f, "create index {} on {}", self.object, self.table),
        }
    }
}

/// Changes applied by one migration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub mode: MigrationMode,
    pub changes: Vec<SchemaChange>,
}

impl MigrationReport {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// What introspection found for one table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExistingTable {
    pub exists: bool,
    pub columns: HashSet<String>,
    pub indexes: HashSet<String>,
}

/// Every table the application owns.
pub fn declared_tables() -> Vec<TableSchema> {
    vec![User::table_schema()]
}

/// Reconcile all declared tables.
pub async fn migrate(pool: &Pool, mode: MigrationMode) -> Result<MigrationReport, MigrationError> {
    migrate_tables(pool, &declared_tables(), mode).await
}

/// Reconcile the given tables inside a single transaction.
pub async fn migrate_tables(
    pool: &Pool,
    tables: &[TableSchema],
    mode: MigrationMode,
) -> Result<MigrationReport, MigrationError> {
    match mode {
        MigrationMode::Startup => tracing::info!("Starting database migration..."),
        MigrationMode::Manual => tracing::info!("Running manual migration..."),
    }

    let changes = apply(pool, tables)
        .await
        .map_err(|source| MigrationError { mode, source })?;

    for change in &changes {
        tracing::debug!("Applied schema change: {}", change);
    }
    tracing::info!(
        "Database migration completed successfully ({} change(s))",
        changes.len()
    );

    Ok(MigrationReport { mode, changes })
}

async fn apply(pool: &Pool, tables: &[TableSchema]) -> Result<Vec<SchemaChange>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut applied = Vec::new();

    for table in tables {
        let existing = introspect(&mut tx, &table.name).await?;
        for change in plan(table, &existing) {
            sqlx::query(&change.sql).execute(&mut *tx).await?;
            applied.push(change);
        }
    }

    tx.commit().await?;
    Ok(applied)
}

async fn introspect(conn: &mut PgConnection, table: &str) -> Result<ExistingTable, sqlx::Error> {
    let (exists,): (bool,) = sqlx::query_as(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM information_schema.tables
            WHERE table_schema = current_schema() AND table_name = $1
        )
        "#,
    )
    .bind(table)
    .fetch_one(&mut *conn)
    .await?;

    if !exists {
        return Ok(ExistingTable::default());
    }

    let columns: Vec<(String,)> = sqlx::query_as(
        r#"
        SELECT column_name::text
        FROM information_schema.columns
        WHERE table_schema = current_schema() AND table_name = $1
        "#,
    )
    .bind(table)
    .fetch_all(&mut *conn)
    .await?;

    let indexes: Vec<(String,)> = sqlx::query_as(
        r#"
        SELECT indexname::text
        FROM pg_indexes
        WHERE schemaname = current_schema() AND tablename = $1
        "#,
    )
    .bind(table)
    .fetch_all(&mut *conn)
    .await?;

    Ok(ExistingTable {
        exists: true,
        columns: columns.into_iter().map(|(name,)| name).collect(),
        indexes: indexes.into_iter().map(|(name,)| name).collect(),
    })
}

/// Plan the statements needed to bring `existing` up to `table`.
pub fn plan(table: &TableSchema, existing: &ExistingTable) -> Vec<SchemaChange> {
    let mut changes = Vec::new();

    if !existing.exists {
        changes.push(SchemaChange {
            kind: ChangeKind::CreateTable,
            table: table.name.clone(),
            object: table.name.clone(),
            sql: create_table_sql(table),
        });
    } else {
        for column in &table.columns {
            if !existing.columns.contains(&column.name) {
                changes.push(SchemaChange {
                    kind: ChangeKind::AddColumn,
                    table: table.name.clone(),
                    object: column.name.clone(),
                    sql: format!(
                        "ALTER TABLE {} ADD COLUMN IF NOT EXISTS {}",
                        quote_ident(&table.name),
                        column_sql(column)
                    ),
                });
            }
        }
    }

    for index in &table.indexes {
        if !existing.indexes.contains(&index.name) {
            changes.push(SchemaChange {
                kind: ChangeKind::CreateIndex,
                table: table.name.clone(),
                object: index.name.clone(),
                sql: create_index_sql(&table.name, index),
            });
        }
    }

    changes
}

fn create_table_sql(table: &TableSchema) -> String {
    let columns: Vec<String> = table.columns.iter().map(column_sql).collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote_ident(&table.name),
        columns.join(", ")
    )
}

fn create_index_sql(table: &str, index: &IndexDef) -> String {
    let columns: Vec<String> = index.columns.iter().map(|c| quote_ident(c)).collect();
    format!(
        "CREATE {}INDEX IF NOT EXISTS {} ON {} ({})",
        if index.unique { "UNIQUE " } else { "" },
        quote_ident(&index.name),
        quote_ident(table),
        columns.join(", ")
    )
}

fn column_sql(column: &ColumnDef) -> String {
    let mut sql = format!("{} {}", quote_ident(&column.name), pg_type(column.column_type));
    if column.primary_key {
        sql.push_str(" PRIMARY KEY");
    } else if !column.nullable {
        sql.push_str(" NOT NULL");
    }
    if let Some(default) = &column.default {
        sql.push_str(" DEFAULT ");
        sql.push_str(&default_sql(default));
    }
    sql
}

fn pg_type(column_type: ColumnType) -> String {
    match column_type {
        ColumnType::Serial => "BIGSERIAL".to_string(),
        ColumnType::Text { max_len } => format!("VARCHAR({})", max_len),
        ColumnType::Bool => "BOOLEAN".to_string(),
        ColumnType::Timestamp => "TIMESTAMPTZ".to_string(),
    }
}

fn default_sql(default: &ColumnDefault) -> String {
    match default {
        ColumnDefault::Bool(true) => "TRUE".to_string(),
        ColumnDefault::Bool(false) => "FALSE".to_string(),
        ColumnDefault::Text(value) => format!("'{}'", value.replace('\'', "''")),
        ColumnDefault::Now => "CURRENT_TIMESTAMP".to_string(),
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
