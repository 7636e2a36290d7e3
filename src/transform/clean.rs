// src/transform/clean.rs

use std::collections::HashSet;

use super::{chunk::Batch, coerce};
use crate::config::Settings;
use crate::schema::{TableSchema, NULL_SENTINEL};

/// Registration status "situação cadastral ATIVA".
const REGULAR_STATUS_CODE: &str = "02";
const STATUS_COLUMN: &str = "cod_situacao_cadastral";
const ESTABLISHMENT_TABLE: &str = "estabelecimento";

/// Run one batch through the full cleaning pipeline.
///
/// Step order matters: cells are trimmed before null-sentinel substitution,
/// and both happen before dedup, so rows differing only by whitespace or by
/// an untrimmed empty cell collapse into one.
pub fn clean_batch(batch: &mut Batch, schema: &TableSchema, settings: &Settings) {
    coerce::apply_types(batch, schema);
    trim_cells(batch);
    normalize_nulls(batch);
    drop_duplicate_rows(batch);

    if settings.estabelecimentos_apta_only && schema.name == ESTABLISHMENT_TABLE {
        retain_regular_establishments(batch, schema);
    }
}

/// Strip leading/trailing whitespace from every cell, independent of the
/// declared type. Catches columns the coercion left as raw text.
fn trim_cells(batch: &mut Batch) {
    for row in &mut batch.rows {
        for cell in row {
            let trimmed = cell.trim();
            if trimmed.len() != cell.len() {
                *cell = trimmed.to_string();
            }
        }
    }
}

/// Rewrite empty (missing) cells to the loader's null sentinel.
fn normalize_nulls(batch: &mut Batch) {
    for row in &mut batch.rows {
        for cell in row {
            if cell.is_empty() {
                *cell = NULL_SENTINEL.to_string();
            }
        }
    }
}

/// Drop exact duplicate rows, keeping the first occurrence in order.
fn drop_duplicate_rows(batch: &mut Batch) {
    let mut seen: HashSet<Vec<String>> = HashSet::with_capacity(batch.rows.len());
    batch.rows.retain(|row| seen.insert(row.clone()));
}

/// Keep only rows whose registration status is ATIVA. A no-op when the
/// schema has no status column, so drift cannot crash the pipeline.
fn retain_regular_establishments(batch: &mut Batch, schema: &TableSchema) {
    let Some(idx) = schema.column_index(STATUS_COLUMN) else {
        return;
    };
    batch.rows.retain(|row| row[idx] == REGULAR_STATUS_CODE);
}
