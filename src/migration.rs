//! Table creation for declared schemas

use active_record::{ActiveRecordError, Model};
use tracing::info;

use crate::core::RowHaus;
use crate::errors::RowHausError;

impl RowHaus {
    /// Create `M`'s table from its declared schema.
    ///
    /// Uses `CREATE TABLE IF NOT EXISTS`, so running it against an existing
    /// table is a no-op. With `recreate` the table is dropped first.
    pub fn auto_migrate<M: Model>(&self, recreate: bool) -> Result<(), RowHausError> {
        let ctx = self.context(self.alias_for::<M>())?;
        let table = M::table();

        if recreate {
            let drop_sql = format!("DROP TABLE IF EXISTS {}", table.name);
            info!("Dropping table with SQL: {}", drop_sql);
            ctx.executor()
                .execute(&drop_sql, &[])
                .map_err(|e| ActiveRecordError::query_execution(&table.name, &drop_sql, e))?;
        }

        if !ctx.create_table::<M>()? {
            return Err(ActiveRecordError::configuration(format!(
                "model for '{}' declares no schema to migrate",
                table.name
            ))
            .into());
        }
        info!("Created table {} if missing", table.name);
        Ok(())
    }
}
