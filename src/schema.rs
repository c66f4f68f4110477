//! Startup DDL. Converges the database to the current table layout by creating
//! missing tables and adding missing columns. Nothing is ever dropped.

use sqlx::SqlitePool;

use crate::kinds::{RecordKind, DEFAULT_STATUS, OWNER_COLUMN, STATUS_COLUMN};

pub const ACCOUNTS_TABLE: &str = "usuarios";

struct TableDef {
    name: &'static str,
    /// `(column, declaration)` excluding the primary key.
    columns: Vec<(&'static str, String)>,
    owner_index: bool,
}

impl TableDef {
    fn create_sql(&self) -> String {
        let mut cols = vec!["id INTEGER PRIMARY KEY AUTOINCREMENT".to_owned()];
        cols.extend(self.columns.iter().map(|(name, decl)| format!("{name} {decl}")));
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
            self.name,
            cols.join(",\n    ")
        )
    }
}

fn accounts_table() -> TableDef {
    TableDef {
        name: ACCOUNTS_TABLE,
        columns: vec![
            ("nome", "TEXT".to_owned()),
            ("usuario", "TEXT NOT NULL UNIQUE".to_owned()),
            ("senha", "TEXT NOT NULL".to_owned()),
        ],
        owner_index: false,
    }
}

fn record_table(kind: RecordKind) -> TableDef {
    let mut columns = vec![(
        OWNER_COLUMN,
        format!("INTEGER REFERENCES {ACCOUNTS_TABLE}(id)"),
    )];
    columns.extend(
        kind.fields()
            .iter()
            .map(|f| (f.name, f.ty.sql_type().to_owned())),
    );
    columns.push((STATUS_COLUMN, format!("TEXT DEFAULT '{DEFAULT_STATUS}'")));
    TableDef {
        name: kind.table(),
        columns,
        owner_index: true,
    }
}

fn table_defs() -> Vec<TableDef> {
    let mut defs = vec![accounts_table()];
    defs.extend(RecordKind::ALL.iter().map(|k| record_table(*k)));
    defs
}

pub async fn table_exists(pool: &SqlitePool, table: &str) -> Result<bool, sqlx::Error> {
    let found: Option<String> =
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(table)
            .fetch_optional(pool)
            .await?;
    Ok(found.is_some())
}

pub async fn table_columns(pool: &SqlitePool, table: &str) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT name FROM pragma_table_info(?)")
        .bind(table)
        .fetch_all(pool)
        .await
}

/// Creates every table and back-fills columns added since the table was first
/// created. Safe to run on every start.
///
/// Fails only when a table that does not exist yet cannot be created; every
/// other DDL failure is logged and skipped so an already working database
/// keeps serving.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for def in table_defs() {
        if let Err(e) = sqlx::query(&def.create_sql()).execute(pool).await {
            if table_exists(pool, def.name).await.unwrap_or(false) {
                log::warn!("Could not verify table {}: {}", def.name, e);
            } else {
                log::error!("Failed to create table {}: {}", def.name, e);
                return Err(e);
            }
        }

        let existing = match table_columns(pool, def.name).await {
            Ok(cols) => cols,
            Err(e) => {
                log::warn!("Could not read columns of {}: {}", def.name, e);
                continue;
            }
        };

        for (column, decl) in &def.columns {
            if existing.iter().any(|c| c.eq_ignore_ascii_case(column)) {
                continue;
            }
            let alter = format!("ALTER TABLE {} ADD COLUMN {} {}", def.name, column, decl);
            match sqlx::query(&alter).execute(pool).await {
                Ok(_) => log::info!("Added column {}.{}", def.name, column),
                Err(e) => log::warn!("Could not add column {}.{}: {}", def.name, column, e),
            }
        }

        if def.owner_index {
            let index = format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_{OWNER_COLUMN} ON {table} ({OWNER_COLUMN})",
                table = def.name
            );
            if let Err(e) = sqlx::query(&index).execute(pool).await {
                log::warn!("Could not index {}.{}: {}", def.name, OWNER_COLUMN, e);
            }
        }
    }

    log::info!("Database schema verified");
    Ok(())
}
