use actix_web::error::ErrorBadRequest;
use chrono::NaiveDate;
use serde_json::Value;
use sqlx::MySqlPool;

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, PartialEq)]
pub enum SqlValue {
    String(String),
    U64(u64),
    F64(f64),
    Date(NaiveDate),
    Null,
}

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
    /// Columns present in the SET clause, in order.
    pub columns: Vec<String>,
}

/// Column kinds accepted by [`build_update_sql`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnKind {
    Text,
    NullableText,
    Amount,
    NullableDate,
}

/// ===============================
/// Build dynamic UPDATE SQL
/// ===============================
///
/// Only keys listed in `columns` are accepted; anything else is rejected so
/// a payload can never name an arbitrary column.
pub fn build_update_sql(
    table: &str,
    columns: &[(&str, ColumnKind)],
    payload: &Value,
    id_column: &str,
    id_value: u64,
) -> Result<SqlUpdate, actix_web::Error> {
    let obj = payload
        .as_object()
        .ok_or_else(|| ErrorBadRequest("Payload must be a JSON object"))?;

    if obj.is_empty() {
        return Err(ErrorBadRequest("No fields provided for update"));
    }

    let mut set_columns = Vec::with_capacity(obj.len());
    let mut values = Vec::with_capacity(obj.len() + 1);

    for (key, value) in obj {
        let kind = columns
            .iter()
            .find(|(name, _)| *name == key.as_str())
            .map(|(_, kind)| *kind)
            .ok_or_else(|| ErrorBadRequest(format!("Field `{}` cannot be updated", key)))?;

        values.push(to_sql_value(key, kind, value)?);
        set_columns.push(key.clone());
    }

    let set_clause = set_columns
        .iter()
        .map(|k| format!("{} = ?", k))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!("UPDATE {} SET {} WHERE {} = ?", table, set_clause, id_column);

    // WHERE id = ?
    values.push(SqlValue::U64(id_value));

    Ok(SqlUpdate {
        sql,
        values,
        columns: set_columns,
    })
}

fn to_sql_value(key: &str, kind: ColumnKind, value: &Value) -> Result<SqlValue, actix_web::Error> {
    let invalid = || ErrorBadRequest(format!("Invalid value for `{}`", key));

    match (kind, value) {
        (ColumnKind::Text | ColumnKind::NullableText, Value::String(s)) => {
            Ok(SqlValue::String(s.trim().to_string()))
        }
        (ColumnKind::NullableText | ColumnKind::NullableDate, Value::Null) => Ok(SqlValue::Null),
        (ColumnKind::Amount, Value::Number(n)) => n
            .as_f64()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(SqlValue::F64)
            .ok_or_else(invalid),
        (ColumnKind::Amount, Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(SqlValue::F64)
            .ok_or_else(invalid),
        (ColumnKind::NullableDate, Value::String(s)) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(SqlValue::Date)
            .map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update(pool: &MySqlPool, update: SqlUpdate) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::U64(v) => query.bind(v),
            SqlValue::F64(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
            SqlValue::Null => query.bind(None::<String>),
        };
    }

    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}
