//! Table bindings for single-query compilation.
//!
//! Each entity touched by a metric or question is bound to a `FROM`/`JOIN`
//! table reference and a qualifier used for its columns. The qualifier is the
//! bare table name (`orders.total_amount`); when two entities share a table
//! name the later one gets an alias (`orders_2`).

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::model::Model;
use crate::sql::{table_col, Expr, TableRef};

use super::error::{CompileError, CompileResult};

/// Split `schema.table` on the last dot.
pub(crate) fn split_source(source: &str) -> (Option<&str>, &str) {
    match source.rsplit_once('.') {
        Some((schema, table)) if !schema.is_empty() && !table.is_empty() => (Some(schema), table),
        _ => (None, source),
    }
}

/// Table reference for a physical source, without alias.
pub(crate) fn source_table(source: &str) -> TableRef {
    let (schema, table) = split_source(source);
    let table_ref = TableRef::new(table);
    match schema {
        Some(s) => table_ref.with_schema(s),
        None => table_ref,
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Binding {
    pub table: TableRef,
}

impl Binding {
    pub fn qualifier(&self) -> &str {
        self.table.qualifier()
    }
}

/// Entities bound so far, in first-touch order.
#[derive(Debug, Default)]
pub(crate) struct QueryScope {
    bindings: IndexMap<String, Binding>,
    qualifiers: HashSet<String>,
}

impl QueryScope {
    /// Bind `entity` if it is not bound yet.
    pub fn bind(&mut self, model: &Model, entity: &str) -> CompileResult<&Binding> {
        if !self.bindings.contains_key(entity) {
            let source = &model
                .entity(entity)
                .ok_or_else(|| CompileError::UnknownEntity(entity.into()))?
                .source;
            let mut table = source_table(source);
            if self.qualifiers.contains(&table.table) {
                let mut n = 2;
                while self.qualifiers.contains(&format!("{}_{}", table.table, n)) {
                    n += 1;
                }
                let alias = format!("{}_{}", table.table, n);
                table = table.with_alias(&alias);
            }
            self.qualifiers.insert(table.qualifier().to_string());
            self.bindings.insert(entity.to_string(), Binding { table });
        }
        Ok(&self.bindings[entity])
    }

    pub fn binding(&self, entity: &str) -> Option<&Binding> {
        self.bindings.get(entity)
    }

    /// Bound entity names in first-touch order.
    pub fn entities(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    pub fn table_ref(&self, entity: &str) -> CompileResult<TableRef> {
        self.binding(entity)
            .map(|b| b.table.clone())
            .ok_or_else(|| CompileError::UnknownEntity(entity.into()))
    }

    /// Qualified column for an entity field, binding the entity on first use.
    pub fn field_column(&mut self, model: &Model, entity: &str, field: &str) -> CompileResult<Expr> {
        let column = model
            .entity(entity)
            .ok_or_else(|| CompileError::UnknownEntity(entity.into()))?
            .field(field)
            .ok_or_else(|| CompileError::UnknownField {
                entity: entity.into(),
                field: field.into(),
            })?
            .source_column
            .clone();
        let binding = self.bind(model, entity)?;
        Ok(table_col(binding.qualifier(), &column))
    }

    /// Display names of the tables bound for `entities`.
    pub fn table_names<'a>(&self, entities: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        entities
            .into_iter()
            .filter_map(|e| self.binding(e))
            .map(|b| b.qualifier().to_string())
            .collect()
    }
}
