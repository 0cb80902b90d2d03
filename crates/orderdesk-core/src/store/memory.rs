//! In-process record store.
//!
//! A table map that answers [`Select`] queries with the same filter,
//! order, embed, and single-row semantics as the REST client. Tests
//! run the full fetch and cache stack against it, and it doubles as a
//! fixture backend for previews.

use std::cmp::Ordering as CmpOrdering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{Direction, Embed, Filter, RecordStore, Select, StoreError};

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Vec<Value>>>,
    next_id: AtomicU64,
    fetch_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a table's rows.
    pub async fn seed(&self, table: &str, rows: Vec<Value>) {
        self.tables.write().await.insert(table.to_string(), rows);
    }

    /// Snapshot a table's current rows.
    pub async fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .read()
            .await
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of select calls answered so far (single-row ones
    /// included). Lets tests assert how many remote fetches a cached
    /// path actually performed.
    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    async fn run(&self, query: &Select) -> Vec<Value> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Value> = tables
            .get(&query.table)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|row| matches_filters(row, &query.filters))
            .collect();

        if let Some((column, direction)) = &query.order {
            rows.sort_by(|a, b| {
                let ordering = compare(field(a, column), field(b, column));
                match direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                }
            });
        }

        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }

        for row in &mut rows {
            for embed in &query.embeds {
                attach_embed(&tables, row, embed);
            }
        }

        rows
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn fetch(&self, query: &Select) -> Result<Vec<Value>, StoreError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.run(query).await)
    }

    async fn fetch_one(&self, query: &Select) -> Result<Value, StoreError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.run(query).await;
        if rows.len() != 1 {
            return Err(StoreError::no_rows(rows.len()));
        }
        Ok(rows.remove(0))
    }

    async fn insert(
        &self,
        table: &str,
        row: &Value,
        returning: &[Embed],
    ) -> Result<Value, StoreError> {
        let mut stored = match row {
            Value::Object(fields) => fields.clone(),
            _ => return Err(StoreError::new("Insert payload must be an object")),
        };

        // The store owns identifiers and creation timestamps.
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        stored
            .entry("id")
            .or_insert_with(|| Value::String(format!("{}-{}", table, n)));
        stored
            .entry("created_at")
            .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));
        let stored = Value::Object(stored);

        let mut tables = self.tables.write().await;
        tables
            .entry(table.to_string())
            .or_default()
            .push(stored.clone());

        let mut returned = stored;
        for embed in returning {
            attach_embed(&tables, &mut returned, embed);
        }
        Ok(returned)
    }
}

fn field<'a>(row: &'a Value, column: &str) -> &'a Value {
    row.get(column).unwrap_or(&Value::Null)
}

fn matches_filters(row: &Value, filters: &[Filter]) -> bool {
    filters.iter().all(|filter| match filter {
        Filter::Eq(column, expected) => value_eq(field(row, column), expected),
        Filter::IsNull(column) => field(row, column).is_null(),
    })
}

fn value_eq(value: &Value, expected: &str) -> bool {
    match value {
        Value::String(s) => s == expected,
        Value::Number(n) => n.to_string() == expected,
        Value::Bool(b) => b.to_string() == expected,
        _ => false,
    }
}

/// Compare two row fields for ordering. Numbers compare numerically,
/// strings lexically (ISO dates and timestamps sort correctly that
/// way), nulls and missing columns sort last.
fn compare(a: &Value, b: &Value) -> CmpOrdering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(CmpOrdering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Null, Value::Null) => CmpOrdering::Equal,
        (Value::Null, _) => CmpOrdering::Greater,
        (_, Value::Null) => CmpOrdering::Less,
        _ => CmpOrdering::Equal,
    }
}

fn attach_embed(tables: &HashMap<String, Vec<Value>>, row: &mut Value, embed: &Embed) {
    let fk = field(row, &embed.via).clone();
    let resolved = if fk.is_null() {
        Value::Null
    } else {
        tables
            .get(&embed.table)
            .and_then(|rows| rows.iter().find(|candidate| candidate.get("id") == Some(&fk)))
            .cloned()
            .unwrap_or(Value::Null)
    };
    if let Value::Object(fields) = row {
        fields.insert(embed.alias.clone(), resolved);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_eq_filter_and_descending_order() {
        let store = MemoryStore::new();
        store
            .seed(
                "orders",
                vec![
                    json!({"id": "o1", "dealer_id": "d1", "created_at": "2024-06-01T10:00:00Z"}),
                    json!({"id": "o2", "dealer_id": "d2", "created_at": "2024-06-02T10:00:00Z"}),
                    json!({"id": "o3", "dealer_id": "d1", "created_at": "2024-06-03T10:00:00Z"}),
                ],
            )
            .await;

        let query = Select::new("orders")
            .eq("dealer_id", "d1")
            .order_by("created_at", Direction::Desc);
        let rows = store.fetch(&query).await.expect("fetch failed");

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["id"], "o3");
        assert_eq!(rows[1]["id"], "o1");
    }

    #[tokio::test]
    async fn test_is_null_filter() {
        let store = MemoryStore::new();
        store
            .seed(
                "price_chart_items",
                vec![
                    json!({"id": "i1", "expiry_date": null}),
                    json!({"id": "i2", "expiry_date": "2024-05-01"}),
                    json!({"id": "i3"}),
                ],
            )
            .await;

        let rows = store
            .fetch(&Select::new("price_chart_items").is_null("expiry_date"))
            .await
            .expect("fetch failed");

        // Both explicit null and missing column count as null.
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_one_requires_exactly_one_row() {
        let store = MemoryStore::new();
        store
            .seed(
                "dealers",
                vec![
                    json!({"id": "d1", "code": "A"}),
                    json!({"id": "d2", "code": "A"}),
                ],
            )
            .await;

        let none = store
            .fetch_one(&Select::new("dealers").eq("code", "missing"))
            .await
            .expect_err("expected no-rows error");
        assert!(none.is_no_rows());

        let two = store
            .fetch_one(&Select::new("dealers").eq("code", "A"))
            .await
            .expect_err("expected no-rows error");
        assert!(two.is_no_rows());

        let one = store
            .fetch_one(&Select::new("dealers").eq("id", "d1"))
            .await
            .expect("fetch_one failed");
        assert_eq!(one["code"], "A");
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_created_at() {
        let store = MemoryStore::new();
        let created = store
            .insert("orders", &json!({"dealer_id": "d1"}), &[])
            .await
            .expect("insert failed");

        assert_eq!(created["id"], "orders-1");
        assert!(created["created_at"].is_string());
        assert_eq!(store.rows("orders").await.len(), 1);
    }

    #[tokio::test]
    async fn test_embed_resolves_related_row() {
        let store = MemoryStore::new();
        store
            .seed("products", vec![json!({"id": "p1", "name": "Widget"})])
            .await;
        store
            .seed(
                "price_chart_items",
                vec![
                    json!({"id": "i1", "product_id": "p1"}),
                    json!({"id": "i2", "product_id": "p-missing"}),
                ],
            )
            .await;

        let rows = store
            .fetch(&Select::new("price_chart_items").embed("product", "products", "product_id"))
            .await
            .expect("fetch failed");

        assert_eq!(rows[0]["product"]["name"], "Widget");
        assert!(rows[1]["product"].is_null());
    }

    #[tokio::test]
    async fn test_fetch_calls_counted() {
        let store = MemoryStore::new();
        store.seed("dealers", vec![json!({"id": "d1"})]).await;

        let _ = store.fetch(&Select::new("dealers")).await;
        let _ = store.fetch_one(&Select::new("dealers").eq("id", "d1")).await;
        assert_eq!(store.fetch_calls(), 2);
    }
}
