//! Table schema definitions for the exported dashboard database

use super::types::*;

pub static EMISSION_FACTORS: TableSchema = TableSchema {
    name: "emission_factors",
    description: "Emission coefficient per usage category",
    columns: &[
        Column::required("category", ColumnType::Text),
        Column::required("coefficient", ColumnType::Real),
    ],
    indexes: &[Index::unique(&["category"])],
};

pub static BUILDINGS: TableSchema = TableSchema {
    name: "buildings",
    description: "Building footprints with emission estimates",
    columns: &[
        Column::required("id", ColumnType::Integer),
        Column::required("category", ColumnType::Text),
        Column::required("gross_area", ColumnType::Real),
        Column::required("floors_above", ColumnType::Real),
        Column::required("floors_below", ColumnType::Real),
        Column::new("construction_year", ColumnType::Integer),
        Column::new("total_floors", ColumnType::Real),
        Column::new("proportional_area", ColumnType::Real),
        Column::required("age_adjustment", ColumnType::Real),
        Column::required("coefficient", ColumnType::Real),
        Column::new("emissions", ColumnType::Real),
        Column::required("usage_tier", ColumnType::Text),
        Column::required("green_roof", ColumnType::Boolean),
        Column::required("xs", ColumnType::Json),
        Column::required("ys", ColumnType::Json),
    ],
    indexes: &[Index::on(&["category"]), Index::on(&["usage_tier"])],
};

pub static ABSORPTION_PARCELS: TableSchema = TableSchema {
    name: "absorption_parcels",
    description: "Qualifying green-zone parcels with absorption estimates",
    columns: &[
        Column::required("id", ColumnType::Integer),
        Column::required("zone", ColumnType::Text),
        Column::required("area_sqm", ColumnType::Real),
        Column::required("area_ha", ColumnType::Real),
        Column::required("absorption", ColumnType::Real),
        Column::required("xs", ColumnType::Json),
        Column::required("ys", ColumnType::Json),
    ],
    indexes: &[Index::on(&["zone"])],
};

pub static POPULATION_RATIO: TableSchema = TableSchema {
    name: "population_ratio",
    description: "Residency and elderly-growth ratios by district",
    columns: &[
        Column::required("dong", ColumnType::Text),
        Column::new("popu_ratio", ColumnType::Real),
        Column::new("old_ratio", ColumnType::Real),
    ],
    indexes: &[],
};

pub static CLIMATE_SCENARIOS: TableSchema = TableSchema {
    name: "climate_scenarios",
    description: "Temperature anomaly and discomfort index by scenario and year",
    columns: &[
        Column::required("scenario", ColumnType::Text),
        Column::required("year", ColumnType::Integer),
        Column::new("tas", ColumnType::Real),
        Column::new("di", ColumnType::Real),
    ],
    indexes: &[Index::on(&["scenario", "year"])],
};

/// All tables in creation order
pub static ALL_TABLES: &[&TableSchema] = &[
    &EMISSION_FACTORS,
    &BUILDINGS,
    &ABSORPTION_PARCELS,
    &POPULATION_RATIO,
    &CLIMATE_SCENARIOS,
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_table_names_unique() {
        let names: Vec<_> = ALL_TABLES.iter().map(|t| t.name).collect();
        let unique: HashSet<_> = names.iter().collect();
        assert_eq!(names.len(), unique.len());
    }

    #[test]
    fn test_indexes_reference_columns() {
        for table in ALL_TABLES {
            let columns = table.column_names();
            for index in table.indexes {
                for col in index.columns {
                    assert!(columns.contains(col), "{}.{} not found", table.name, col);
                }
            }
        }
    }
}
