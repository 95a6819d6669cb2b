use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

use super::schema_gen::{generate_create_table, generate_indexes, generate_insert};
use super::value::{
    building_row, climate_rows, emission_factor_rows, parcel_row, population_rows, SqlRow,
};
use crate::dataset::Dashboard;
use crate::schema::{
    TableSchema, ABSORPTION_PARCELS, ALL_TABLES, BUILDINGS, CLIMATE_SCENARIOS, EMISSION_FACTORS,
    POPULATION_RATIO,
};
use crate::ui::{Phase, Ui};

const BATCH_SIZE: usize = 1000;

pub struct SqliteWriter {
    conn: Connection,
}

impl SqliteWriter {
    pub fn new(db_path: &Path) -> Result<Self> {
        // Remove existing database if present
        if db_path.exists() {
            std::fs::remove_file(db_path).context("Failed to remove existing database")?;
        }

        let conn = Connection::open(db_path).context("Failed to create database")?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -64000;",
        )?;

        Ok(Self { conn })
    }

    /// Create all tables for the given schemas
    pub fn create_tables(&self, schemas: &[&TableSchema]) -> Result<()> {
        for schema in schemas {
            let sql = generate_create_table(schema);
            self.conn
                .execute(&sql, [])
                .with_context(|| format!("Failed to create table: {}", schema.name))?;

            for index_sql in generate_indexes(schema) {
                self.conn
                    .execute(&index_sql, [])
                    .with_context(|| format!("Failed to create index for: {}", schema.name))?;
            }
        }

        Ok(())
    }

    /// Insert rows for a single table in one transaction
    pub fn insert_rows(
        &mut self,
        schema: &TableSchema,
        rows: impl IntoIterator<Item = Result<SqlRow>>,
        ui: &mut impl Ui,
    ) -> Result<u64> {
        let insert_sql = generate_insert(schema);
        let tx = self.conn.transaction()?;
        let mut count: u64 = 0;
        let mut batch: Vec<SqlRow> = Vec::with_capacity(BATCH_SIZE);

        for row in rows {
            batch.push(row.with_context(|| format!("Failed to build row for {}", schema.name))?);

            if batch.len() >= BATCH_SIZE {
                insert_batch(&tx, &insert_sql, &batch)
                    .with_context(|| format!("Failed to insert into {}", schema.name))?;
                count += batch.len() as u64;
                ui.set_progress(count, 0, schema.name);
                batch.clear();
            }
        }

        // Insert remaining batch
        if !batch.is_empty() {
            insert_batch(&tx, &insert_sql, &batch)
                .with_context(|| format!("Failed to insert into {}", schema.name))?;
            count += batch.len() as u64;
        }

        tx.commit()?;
        ui.clear_progress();
        ui.log(format!("{}: {} records", schema.name, count));

        Ok(count)
    }

    pub fn finalize(self) -> Result<()> {
        self.conn.execute_batch("PRAGMA optimize;")?;
        Ok(())
    }
}

/// Insert a batch of rows into the database
fn insert_batch(tx: &rusqlite::Transaction, sql: &str, batch: &[SqlRow]) -> Result<()> {
    let mut stmt = tx.prepare_cached(sql)?;

    for row in batch {
        for (idx, value) in row.iter().enumerate() {
            value.bind_to(idx + 1, &mut stmt)?;
        }
        stmt.raw_execute()?;
    }

    Ok(())
}

/// Write every dashboard table to a fresh SQLite database
pub fn export_to_sqlite(dashboard: &Dashboard, output_db: &Path, ui: &mut impl Ui) -> Result<u64> {
    ui.set_phase(Phase::Exporting);
    ui.set_info(format!("Writing {:?}", output_db));

    let mut writer = SqliteWriter::new(output_db)?;
    writer.create_tables(ALL_TABLES)?;

    let mut total_records: u64 = 0;

    total_records +=
        writer.insert_rows(&EMISSION_FACTORS, emission_factor_rows(dashboard).into_iter().map(Ok), ui)?;
    total_records += writer.insert_rows(
        &BUILDINGS,
        dashboard.buildings.buildings.iter().map(building_row),
        ui,
    )?;
    total_records += writer.insert_rows(
        &ABSORPTION_PARCELS,
        dashboard.parcels.iter().map(parcel_row),
        ui,
    )?;
    total_records +=
        writer.insert_rows(&POPULATION_RATIO, population_rows(dashboard).into_iter().map(Ok), ui)?;
    total_records +=
        writer.insert_rows(&CLIMATE_SCENARIOS, climate_rows(dashboard).into_iter().map(Ok), ui)?;

    writer.finalize()?;

    Ok(total_records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimate::{estimate_building, EmissionFactors, RawBuilding};
    use crate::ui::SilentUi;

    #[test]
    fn test_overflowing_area_stored_as_null() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = SqliteWriter::new(&dir.path().join("overflow.db")).unwrap();
        writer.create_tables(&[&BUILDINGS]).unwrap();

        let huge = estimate_building(
            RawBuilding {
                category: Some("공장".to_string()),
                gross_area: f64::MAX,
                floors_above: 10.0,
                ..Default::default()
            },
            &EmissionFactors::standard(),
        );
        assert!(huge.proportional_area.is_infinite());

        let count = writer
            .insert_rows(&BUILDINGS, [building_row(&huge)], &mut SilentUi::new())
            .unwrap();
        assert_eq!(count, 1);

        let (area, emissions): (Option<f64>, Option<f64>) = writer
            .conn
            .query_row(
                "SELECT proportional_area, emissions FROM buildings",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(area, None);
        assert_eq!(emissions, None);
    }
}
