use super::column::object_to_string;
use crate::adapter::hooks::{PostSaveHook, SavedRecord};
use crate::adapter::Adapter;
use crate::connection::LargeObject;
use crate::error::Result;
use crate::types::ColumnType;

/// Writes `*LOB` column values after a record is saved.
///
/// Inserts and updates bind `empty_clob()`/`empty_blob()` for these columns,
/// so the real content is streamed afterwards keyed by the primary key.
#[derive(Debug, Default)]
pub struct OracleLobHook;

impl PostSaveHook for OracleLobHook {
    fn name(&self) -> &str {
        "oracle_lob"
    }

    fn after_save(&self, adapter: &mut Adapter, record: &SavedRecord) -> Result<()> {
        let pk_column = record
            .columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(&record.primary_key));
        let id = adapter.quote(&record.id, pk_column);

        for column in record.columns.iter().filter(|c| c.is_lob()) {
            let Some(raw) = record.values.get_ci(&column.name) else {
                continue;
            };
            let binary = column.column_type == ColumnType::Binary;
            let value = if binary {
                raw.clone()
            } else {
                object_to_string(raw)
            };
            if value.is_blank() {
                continue;
            }
            log::debug!(
                "Writing {} for {}.{} ({} = {})",
                if binary { "BLOB" } else { "CLOB" },
                record.table_name,
                column.name,
                record.primary_key,
                id
            );
            adapter.write_large_object(&LargeObject {
                binary,
                column: column.name.clone(),
                table: record.table_name.clone(),
                primary_key: record.primary_key.clone(),
                id: id.clone(),
                value,
            })?;
        }
        Ok(())
    }
}
