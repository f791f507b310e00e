//! In-process engine backed by a `DashMap` of tables.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use crate::entity::TableSchema;
use crate::error::{StoreError, StoreResult};
use crate::store::{Connection, Document, Engine, Statement};

#[derive(Debug, Default)]
struct MemoryTable {
    rows: Vec<(u64, Document)>,
    next_id: u64,
    unique: Vec<String>,
}

/// In-memory engine.
///
/// Cloning shares the underlying tables, so every connection handed out by
/// one engine (or its clones) sees the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryEngine {
    tables: Arc<DashMap<String, MemoryTable>>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the synchronised tables, sorted.
    pub fn tables(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.iter().map(|t| t.key().clone()).collect();
        names.sort();
        names
    }

    /// Number of rows in `table`, or `None` if it was never synchronised.
    pub fn row_count(&self, table: &str) -> Option<usize> {
        self.tables.get(table).map(|t| t.rows.len())
    }
}

#[async_trait]
impl Engine for MemoryEngine {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn connect(&self) -> StoreResult<Box<dyn Connection>> {
        Ok(Box::new(MemoryConnection {
            tables: Arc::clone(&self.tables),
        }))
    }
}

/// Connection handed out by [`MemoryEngine`].
pub struct MemoryConnection {
    tables: Arc<DashMap<String, MemoryTable>>,
}

/// Text a unique index compares, mirroring PostgreSQL's `data ->> 'field'`.
fn index_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Paging bounds beyond the address space select everything.
fn saturating_usize(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

fn check_unique<'a>(
    table: &str,
    unique: &[String],
    rows: impl Iterator<Item = &'a Document> + Clone,
) -> StoreResult<()> {
    for field in unique {
        let mut seen = HashSet::new();
        for row in rows.clone() {
            if let Some(text) = row.get(field).and_then(index_text) {
                if !seen.insert(text.clone()) {
                    return Err(StoreError::Duplicate {
                        table: table.to_string(),
                        field: field.clone(),
                        value: text,
                    });
                }
            }
        }
    }
    Ok(())
}

#[async_trait]
impl Connection for MemoryConnection {
    async fn find(&mut self, stmt: &Statement) -> StoreResult<Vec<Document>> {
        let table = self
            .tables
            .get(&stmt.table)
            .ok_or_else(|| StoreError::table_not_found(&stmt.table))?;

        let mut matched: Vec<&Document> = table
            .rows
            .iter()
            .filter(|(_, doc)| stmt.matches(doc))
            .map(|(_, doc)| doc)
            .collect();
        if stmt.descending {
            matched.reverse();
        }

        let offset = stmt.offset.map_or(0, saturating_usize);
        let limit = stmt.limit.map_or(usize::MAX, saturating_usize);
        Ok(matched
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn insert(&mut self, table: &str, rows: Vec<Document>) -> StoreResult<u64> {
        let mut entry = self
            .tables
            .get_mut(table)
            .ok_or_else(|| StoreError::table_not_found(table))?;

        let existing = entry.rows.iter().map(|(_, doc)| doc);
        check_unique(table, &entry.unique, existing.chain(rows.iter()))?;

        let inserted = rows.len() as u64;
        for doc in rows {
            entry.next_id += 1;
            let id = entry.next_id;
            entry.rows.push((id, doc));
        }
        Ok(inserted)
    }

    async fn update(&mut self, stmt: &Statement, patch: Document) -> StoreResult<u64> {
        let mut entry = self
            .tables
            .get_mut(&stmt.table)
            .ok_or_else(|| StoreError::table_not_found(&stmt.table))?;
        if patch.is_empty() {
            return Err(StoreError::nothing_to_update(&stmt.table));
        }

        let mut updated = 0u64;
        let mut rows = entry.rows.clone();
        for (_, doc) in rows.iter_mut().filter(|(_, doc)| stmt.matches(doc)) {
            for (key, value) in &patch {
                doc.insert(key.clone(), value.clone());
            }
            updated += 1;
        }

        check_unique(&stmt.table, &entry.unique, rows.iter().map(|(_, doc)| doc))?;
        entry.rows = rows;
        Ok(updated)
    }

    async fn delete(&mut self, stmt: &Statement) -> StoreResult<u64> {
        let mut entry = self
            .tables
            .get_mut(&stmt.table)
            .ok_or_else(|| StoreError::table_not_found(&stmt.table))?;

        let before = entry.rows.len();
        entry.rows.retain(|(_, doc)| !stmt.matches(doc));
        Ok((before - entry.rows.len()) as u64)
    }

    async fn count(&mut self, stmt: &Statement) -> StoreResult<u64> {
        let table = self
            .tables
            .get(&stmt.table)
            .ok_or_else(|| StoreError::table_not_found(&stmt.table))?;

        Ok(table.rows.iter().filter(|(_, doc)| stmt.matches(doc)).count() as u64)
    }

    async fn sync(&mut self, schema: &TableSchema) -> StoreResult<()> {
        let mut entry = self.tables.entry(schema.name.clone()).or_default();

        let mut unique = entry.unique.clone();
        for field in &schema.unique {
            if !unique.contains(field) {
                unique.push(field.clone());
            }
        }
        check_unique(&schema.name, &unique, entry.rows.iter().map(|(_, doc)| doc))?;
        entry.unique = unique;
        Ok(())
    }

    async fn close(self: Box<Self>) -> StoreResult<()> {
        Ok(())
    }
}
