//! Schema inspector: catalog to prompt-ready schema text.
//!
//! One line per table, `table(col TYPE, ...)`, in catalog order, followed by
//! foreign keys as SQL comments and any operator notes.

use crate::error::PipelineError;
use crate::store::{SqlStore, TableSchema};
use tracing::debug;

/// Read the catalog and render it; fails if nothing can be described
pub fn inspect(store: &dyn SqlStore, notes: Option<&str>) -> Result<String, PipelineError> {
    let tables = store
        .catalog()
        .map_err(|e| PipelineError::SchemaUnavailable(e.to_string()))?;

    if tables.is_empty() {
        return Err(PipelineError::SchemaUnavailable(
            "no tables found in the database".to_string(),
        ));
    }

    debug!("Schema inspector: {} tables", tables.len());
    Ok(render_schema(&tables, notes))
}

pub fn render_schema(tables: &[TableSchema], notes: Option<&str>) -> String {
    let mut lines: Vec<String> = tables.iter().map(render_table).collect();

    for table in tables {
        for fk in &table.foreign_keys {
            let target = match &fk.to {
                Some(column) => format!("{}({})", fk.table, column),
                None => fk.table.clone(),
            };
            lines.push(format!("-- {}.{} references {}", table.name, fk.from, target));
        }
    }

    let mut text = lines.join("\n");
    if let Some(notes) = notes.map(str::trim).filter(|n| !n.is_empty()) {
        text.push_str("\n\n");
        text.push_str(notes);
    }
    text
}

fn render_table(table: &TableSchema) -> String {
    let columns: Vec<String> = table
        .columns
        .iter()
        .map(|c| match &c.declared_type {
            Some(ty) => format!("{} {}", c.name, ty),
            None => c.name.clone(),
        })
        .collect();
    format!("{}({})", table.name, columns.join(", "))
}
