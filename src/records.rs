//! Tenant-scoped CRUD over every record kind.
//!
//! Each operation is one statement. Reads and writes always filter on the
//! owning account, so a caller without an account, or asking for another
//! account's row, sees an empty list or zero affected rows.

use serde_json::{Map, Number, Value};
use sqlx::{
    query::Query,
    sqlite::{SqliteArguments, SqliteRow},
    Row, Sqlite,
};

use crate::{
    errors::AppError,
    kinds::{
        format_date, FieldType, FieldValue, RecordFields, RecordKind, DEFAULT_STATUS,
        OWNER_COLUMN, STATUS_COLUMN,
    },
    structs::Record,
    AppState,
};

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

fn bind_value<'q>(q: SqliteQuery<'q>, value: &'q FieldValue) -> SqliteQuery<'q> {
    match value {
        FieldValue::Text(s) => q.bind(s.as_deref()),
        FieldValue::Decimal(n) => q.bind(*n),
        FieldValue::Integer(n) => q.bind(*n),
        FieldValue::Date(d) => q.bind(d.map(format_date)),
    }
}

fn bind_fields<'q>(q: SqliteQuery<'q>, fields: &'q RecordFields) -> SqliteQuery<'q> {
    fields.values.iter().fold(q, bind_value)
}

/// Binds only the values whose key was present in the request body.
fn bind_provided<'q>(q: SqliteQuery<'q>, fields: &'q RecordFields) -> SqliteQuery<'q> {
    fields
        .values
        .iter()
        .zip(&fields.provided)
        .filter(|(_, provided)| **provided)
        .fold(q, |q, (value, _)| bind_value(q, value))
}

fn row_to_record(kind: RecordKind, row: &SqliteRow) -> Result<Record, sqlx::Error> {
    let mut fields = Map::new();
    for spec in kind.fields() {
        let value = match spec.ty {
            FieldType::Text | FieldType::Date => row
                .try_get::<Option<String>, _>(spec.name)?
                .map(Value::String)
                .unwrap_or(Value::Null),
            FieldType::Decimal => {
                let n = row.try_get::<Option<f64>, _>(spec.name)?.unwrap_or(0.0);
                Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
            }
            FieldType::Integer => {
                Value::from(row.try_get::<Option<i64>, _>(spec.name)?.unwrap_or(0))
            }
        };
        fields.insert(spec.name.to_owned(), value);
    }

    Ok(Record {
        id: row.try_get("id")?,
        usuario_id: row.try_get(OWNER_COLUMN)?,
        fields,
        status: row.try_get(STATUS_COLUMN)?,
    })
}

/// Records owned by `account`, newest first.
pub async fn list_records(
    state: &AppState,
    kind: RecordKind,
    account: Option<i64>,
) -> Result<Vec<Record>, AppError> {
    let Some(account_id) = account else {
        return Ok(Vec::new());
    };

    let sql = format!(
        "SELECT {} FROM {} WHERE {OWNER_COLUMN} = ? ORDER BY id DESC",
        kind.select_list(),
        kind.table()
    );
    let rows = sqlx::query(&sql)
        .bind(account_id)
        .fetch_all(&state.db_pool)
        .await?;

    rows.iter()
        .map(|row| row_to_record(kind, row).map_err(AppError::from))
        .collect()
}

/// Inserts a record owned by `account_id` and returns its id.
pub async fn create_record(
    state: &AppState,
    kind: RecordKind,
    account_id: i64,
    fields: &RecordFields,
) -> Result<i64, AppError> {
    let specs = kind.fields();
    let columns: Vec<&str> = specs.iter().map(|f| f.name).collect();
    let placeholders = vec!["?"; specs.len() + 2].join(", ");
    let sql = format!(
        "INSERT INTO {} ({OWNER_COLUMN}, {}, {STATUS_COLUMN}) VALUES ({}) RETURNING id",
        kind.table(),
        columns.join(", "),
        placeholders
    );

    let status = fields.status.as_deref().unwrap_or(DEFAULT_STATUS);
    let q = bind_fields(sqlx::query(&sql).bind(account_id), fields).bind(status);
    let row = match q.fetch_one(&state.db_pool).await {
        Ok(row) => row,
        Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
            return Err(AppError::Validation(format!(
                "Account {account_id} does not exist"
            )));
        }
        Err(e) => return Err(e.into()),
    };
    let id: i64 = row.try_get("id")?;

    log::info!("Created {} {} for account {}", kind, id, account_id);
    Ok(id)
}

/// Updates record `id` if `account` owns it. Returns the number of affected
/// rows (0 or 1). Only keys present in the body are written; an explicit
/// `null` resets a column to its default, an absent key keeps the stored value.
pub async fn update_record(
    state: &AppState,
    kind: RecordKind,
    account: Option<i64>,
    id: i64,
    fields: &RecordFields,
) -> Result<u64, AppError> {
    let Some(account_id) = account else {
        return Ok(0);
    };

    let mut assignments: Vec<String> = kind
        .fields()
        .iter()
        .zip(&fields.provided)
        .filter(|(_, provided)| **provided)
        .map(|(f, _)| format!("{} = ?", f.name))
        .collect();
    assignments.push(format!("{STATUS_COLUMN} = COALESCE(?, {STATUS_COLUMN})"));
    let sql = format!(
        "UPDATE {} SET {} WHERE id = ? AND {OWNER_COLUMN} = ?",
        kind.table(),
        assignments.join(", ")
    );

    let result = bind_provided(sqlx::query(&sql), fields)
        .bind(fields.status.as_deref())
        .bind(id)
        .bind(account_id)
        .execute(&state.db_pool)
        .await?;

    let affected = result.rows_affected();
    log::info!(
        "Updated {} {} for account {} ({} row(s))",
        kind,
        id,
        account_id,
        affected
    );
    Ok(affected)
}

/// Deletes record `id` if `account` owns it. Deleting a missing or foreign
/// record is not an error and reports zero rows.
pub async fn delete_record(
    state: &AppState,
    kind: RecordKind,
    account: Option<i64>,
    id: i64,
) -> Result<u64, AppError> {
    let Some(account_id) = account else {
        return Ok(0);
    };

    let sql = format!(
        "DELETE FROM {} WHERE id = ? AND {OWNER_COLUMN} = ?",
        kind.table()
    );
    let result = sqlx::query(&sql)
        .bind(id)
        .bind(account_id)
        .execute(&state.db_pool)
        .await?;

    let affected = result.rows_affected();
    log::info!(
        "Deleted {} {} for account {} ({} row(s))",
        kind,
        id,
        account_id,
        affected
    );
    Ok(affected)
}
