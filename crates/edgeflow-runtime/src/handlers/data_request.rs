//! `data_request`: read rows from a table through the data-query service.
//!
//! Every failure is node-local: a missing table, an unreachable service or a
//! non-2xx response all produce `{ success: false, error, data: [], rowCount: 0 }`.

use serde_json::{Value, json};
use tracing::warn;

use super::{NodeConfig, into_bag};
use crate::input::Bag;
use crate::query::{DataQuery, DataQueryService};

pub(super) async fn execute(config: &NodeConfig<'_>, service: &dyn DataQueryService) -> Bag {
  match run(config, service).await {
    Ok(output) => output,
    Err(message) => {
      warn!(node_id = %config.node().id, error = %message, "data request failed");
      failure(message)
    }
  }
}

async fn run(config: &NodeConfig<'_>, service: &dyn DataQueryService) -> Result<Bag, String> {
  let query = build_query(config)?;

  let response = service.query(&query).await.map_err(|e| e.to_string())?;

  if !response.is_success() {
    return Err(error_text(response.status, &response.body));
  }

  let rows = match &response.body {
    Value::Array(rows) => rows.clone(),
    body => body
      .get("data")
      .or_else(|| body.get("rows"))
      .and_then(Value::as_array)
      .cloned()
      .unwrap_or_default(),
  };
  let row_count = rows.len();
  let total = response
    .body
    .get("total")
    .and_then(Value::as_u64)
    .unwrap_or(row_count as u64);

  Ok(into_bag(json!({
    "success": true,
    "data": rows,
    "rowCount": row_count,
    "total": total,
  })))
}

fn build_query(config: &NodeConfig<'_>) -> Result<DataQuery, String> {
  let table = config
    .get_string("table")
    .map_err(|e| e.to_string())?
    .ok_or_else(|| "Table is required".to_string())?;

  let mut query = DataQuery::new(table);

  if let Some(fields) = config.get("fields").map_err(|e| e.to_string())? {
    let columns = select_columns(&fields);
    if !columns.is_empty() {
      query.select = columns.join(",");
    }
  }

  query.limit = config
    .get("limit")
    .map_err(|e| e.to_string())?
    .and_then(|limit| match limit {
      Value::Number(n) => n.as_u64(),
      Value::String(s) => s.trim().parse().ok(),
      _ => None,
    });

  if let Some(conditions) = config.get("whereConditions").map_err(|e| e.to_string())? {
    query.filters = filters(&conditions);
  }

  Ok(query)
}

/// Column keys from a `fields` value: a list of names, a list of
/// `{ key | name }` objects, an object keyed by column, or a comma list.
fn select_columns(fields: &Value) -> Vec<String> {
  match fields {
    Value::Array(items) => items
      .iter()
      .filter_map(|item| match item {
        Value::String(s) => Some(s.clone()),
        Value::Object(field) => field
          .get("key")
          .or_else(|| field.get("name"))
          .and_then(Value::as_str)
          .map(String::from),
        _ => None,
      })
      .filter(|s| !s.is_empty())
      .collect(),
    Value::Object(map) => map.keys().cloned().collect(),
    Value::String(s) => s
      .split(',')
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(String::from)
      .collect(),
    _ => Vec::new(),
  }
}

/// Equality filters from `whereConditions`: a list of
/// `{ field | column | key, value }` objects, or an object of column to value.
fn filters(conditions: &Value) -> Vec<(String, String)> {
  match conditions {
    Value::Array(items) => items
      .iter()
      .filter_map(|item| {
        let column = item
          .get("field")
          .or_else(|| item.get("column"))
          .or_else(|| item.get("key"))
          .and_then(Value::as_str)?;
        let value = filter_value(item.get("value")?)?;
        Some((column.to_string(), value))
      })
      .collect(),
    Value::Object(map) => map
      .iter()
      .filter_map(|(column, value)| Some((column.clone(), filter_value(value)?)))
      .collect(),
    _ => Vec::new(),
  }
}

fn filter_value(value: &Value) -> Option<String> {
  match value {
    Value::Null => None,
    Value::String(s) => Some(s.clone()),
    other => Some(other.to_string()),
  }
}

fn error_text(status: u16, body: &Value) -> String {
  match body {
    Value::String(s) if !s.is_empty() => s.clone(),
    Value::Object(map) => map
      .get("error")
      .or_else(|| map.get("message"))
      .and_then(Value::as_str)
      .map(String::from)
      .unwrap_or_else(|| body.to_string()),
    _ => format!("data query failed with status {}", status),
  }
}

fn failure(message: String) -> Bag {
  into_bag(json!({
    "success": false,
    "error": message,
    "data": [],
    "rowCount": 0,
  }))
}
