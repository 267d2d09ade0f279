use serde::Serialize;

use crate::models::{EmissionsRecord, RawRow, Record, WellbeingRecord};
use crate::variant::{
    Variant, ANXIETY_COLUMN, CODE_COLUMN, DEPRESSION_COLUMN, EMISSIONS_COLUMN, ENTITY_COLUMN,
    SCREEN_TIME_COLUMN, YEAR_COLUMN,
};

/// Entities in the emissions data that are groupings rather than countries.
const AGGREGATE_ENTITIES: &[&str] = &[
    "World",
    "Africa",
    "Asia",
    "Europe",
    "North America",
    "South America",
    "Oceania",
    "European Union (27)",
    "International transport",
];

#[derive(Debug, Clone, Serialize)]
pub struct Normalized {
    pub records: Vec<Record>,
    pub dropped: usize,
}

pub fn normalize(variant: Variant, rows: &[RawRow]) -> Normalized {
    let records: Vec<Record> = rows
        .iter()
        .filter_map(|row| normalize_row(variant, row))
        .collect();

    Normalized {
        dropped: rows.len() - records.len(),
        records,
    }
}

pub fn normalize_row(variant: Variant, row: &RawRow) -> Option<Record> {
    match variant {
        Variant::DigitalDiet => Some(Record::Wellbeing(WellbeingRecord {
            screen_time: number(row, SCREEN_TIME_COLUMN)?,
            anxiety: number(row, ANXIETY_COLUMN)?,
            depression: number(row, DEPRESSION_COLUMN)?,
        })),
        Variant::Emissions => {
            let country = text(row, ENTITY_COLUMN)?;
            let code = text(row, CODE_COLUMN)?;
            if !is_country_code(code) || is_aggregate_entity(country) {
                return None;
            }

            let year = number(row, YEAR_COLUMN)?;
            if year.fract() != 0.0 || year < i32::MIN as f64 || year > i32::MAX as f64 {
                return None;
            }

            Some(Record::Emissions(EmissionsRecord {
                country: country.to_string(),
                code: code.to_string(),
                year: year as i32,
                emissions: number(row, EMISSIONS_COLUMN)?,
            }))
        }
    }
}

/// Numeric coercion: missing, empty or unparseable input counts as not-a-number.
fn number(row: &RawRow, column: &str) -> Option<f64> {
    let value: f64 = row.get(column)?.trim().parse().ok()?;
    value.is_finite().then_some(value)
}

fn text<'a>(row: &'a RawRow, column: &str) -> Option<&'a str> {
    let value = row.get(column)?.trim();
    (!value.is_empty()).then_some(value)
}

fn is_country_code(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic())
}

fn is_aggregate_entity(name: &str) -> bool {
    AGGREGATE_ENTITIES.contains(&name) || name.contains("income") || name.contains("(excl.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn wellbeing_row(screen_time: &str, anxiety: &str, depression: &str) -> RawRow {
        RawRow::from([
            (SCREEN_TIME_COLUMN.to_string(), screen_time.to_string()),
            (ANXIETY_COLUMN.to_string(), anxiety.to_string()),
            (DEPRESSION_COLUMN.to_string(), depression.to_string()),
        ])
    }

    fn emissions_row(entity: &str, code: &str, year: &str, emissions: &str) -> RawRow {
        RawRow::from([
            (ENTITY_COLUMN.to_string(), entity.to_string()),
            (CODE_COLUMN.to_string(), code.to_string()),
            (YEAR_COLUMN.to_string(), year.to_string()),
            (EMISSIONS_COLUMN.to_string(), emissions.to_string()),
        ])
    }

    #[test]
    fn coerces_numeric_fields() {
        let result = normalize(Variant::DigitalDiet, &[wellbeing_row(" 4.5", "1", "0")]);
        assert_eq!(result.dropped, 0);
        assert_eq!(
            result.records,
            vec![Record::Wellbeing(WellbeingRecord {
                screen_time: 4.5,
                anxiety: 1.0,
                depression: 0.0,
            })]
        );
    }

    #[test]
    fn drops_rows_with_empty_or_non_numeric_fields() {
        let rows = vec![
            wellbeing_row("3", "1", "1"),
            wellbeing_row("", "1", "1"),
            wellbeing_row("2", "yes", "0"),
            wellbeing_row("NaN", "0", "0"),
            wellbeing_row("6", "0", "1"),
        ];
        let result = normalize(Variant::DigitalDiet, &rows);
        assert_eq!(result.records.len(), 2);
        assert_eq!(result.dropped, 3);
    }

    #[test]
    fn preserves_input_order() {
        let rows = vec![
            wellbeing_row("9", "0", "0"),
            wellbeing_row("1", "0", "0"),
            wellbeing_row("5", "0", "0"),
        ];
        let order: Vec<f64> = normalize(Variant::DigitalDiet, &rows)
            .records
            .iter()
            .filter_map(|r| r.value(crate::models::Field::ScreenTime))
            .collect();
        assert_eq!(order, vec![9.0, 1.0, 5.0]);
    }

    #[test]
    fn emissions_excludes_pseudo_countries() {
        let rows = vec![
            emissions_row("Mexico", "MEX", "1990", "295000000"),
            emissions_row("World", "OWID_WRL", "1990", "22700000000"),
            emissions_row("World", "WLD", "1990", "22700000000"),
            emissions_row("High-income countries", "", "1990", "1"),
            emissions_row("Upper-middle-income countries", "UMC", "1990", "1"),
            emissions_row("Chile", "CHL", "1990.5", "1"),
            emissions_row("", "ABC", "1990", "1"),
        ];
        let result = normalize(Variant::Emissions, &rows);
        assert_eq!(result.dropped, 6);
        assert_eq!(result.records[0].country(), Some("Mexico"));
        assert_eq!(result.records[0].year(), Some(1990));
    }

    #[test]
    fn missing_column_drops_row() {
        let mut row = wellbeing_row("3", "1", "1");
        row.remove(DEPRESSION_COLUMN);
        assert!(normalize_row(Variant::DigitalDiet, &row).is_none());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_rejected_rows_shrink_dataset_exactly(
            valid in proptest::collection::vec(0.0f64..24.0, 0..20),
            invalid in proptest::collection::vec("[a-z]{0,4}", 0..20),
        ) {
            let mut rows: Vec<RawRow> = valid
                .iter()
                .map(|v| wellbeing_row(&v.to_string(), "1", "0"))
                .collect();
            rows.extend(invalid.iter().map(|s| wellbeing_row(s, "1", "0")));

            let result = normalize(Variant::DigitalDiet, &rows);
            prop_assert_eq!(result.records.len(), rows.len() - invalid.len());
            prop_assert_eq!(result.dropped, invalid.len());
        }
    }
}
