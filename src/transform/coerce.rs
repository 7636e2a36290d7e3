// src/transform/coerce.rs

use tracing::warn;

use super::chunk::Batch;
use crate::schema::TableSchema;

/// Coerce every cell of `batch` to its declared column type, positionally.
///
/// Values that cannot be represented in their declared type become missing
/// (empty) cells; the cleaning step later rewrites those to the loader's
/// null sentinel. A chunk is never aborted over bad values — failures are
/// counted and reported once per column.
pub fn apply_types(batch: &mut Batch, schema: &TableSchema) {
    debug_assert_eq!(batch.width, schema.width());

    let mut missing = vec![0u64; schema.width()];
    for row in &mut batch.rows {
        for (idx, (_, ty)) in schema.fields.iter().enumerate() {
            match ty.coerce(&row[idx]) {
                Some(value) => row[idx] = value,
                None => {
                    row[idx].clear();
                    missing[idx] += 1;
                }
            }
        }
    }

    for (idx, &count) in missing.iter().enumerate() {
        if count > 0 {
            let (column, ty) = schema.fields[idx];
            warn!(
                table = schema.name,
                column,
                ty = ?ty,
                count,
                "values could not be coerced, left missing"
            );
        }
    }
}
