use std::collections::HashMap;

use crate::models::{Aggregate, Field, Record, Summary};

pub type ValueFn<'a> = &'a dyn Fn(&Record) -> Option<f64>;

/// Groups records by `key_fn` and reduces each group with every `value_fns` entry.
///
/// A record contributes to its bin only if the key and every value are present
/// and finite, so each emitted bin has at least one record behind it. Output is
/// sorted by key ascending.
pub fn aggregate<K, F>(records: &[Record], key_fn: F, value_fns: &[ValueFn<'_>]) -> Vec<Aggregate<K>>
where
    K: Ord + Clone + std::hash::Hash,
    F: Fn(&Record) -> Option<K>,
{
    let mut keys: Vec<K> = Vec::new();
    let mut bins: HashMap<K, (usize, Vec<f64>)> = HashMap::new();

    for record in records {
        let Some(key) = key_fn(record) else {
            continue;
        };
        let Some(values) = value_fns
            .iter()
            .map(|value_fn| value_fn(record).filter(|v| v.is_finite()))
            .collect::<Option<Vec<f64>>>()
        else {
            continue;
        };

        let entry = bins.entry(key.clone()).or_insert_with(|| {
            keys.push(key);
            (0, vec![0.0; value_fns.len()])
        });
        entry.0 += 1;
        for (total, value) in entry.1.iter_mut().zip(values) {
            *total += value;
        }
    }

    keys.sort();
    keys.into_iter()
        .filter_map(|key| {
            let (count, totals) = bins.remove(&key)?;
            (count > 0).then(|| Aggregate {
                summaries: totals
                    .into_iter()
                    .map(|sum| Summary {
                        mean: sum / count as f64,
                        sum,
                    })
                    .collect(),
                key,
                count,
            })
        })
        .collect()
}

/// Integer floor of `field` divided by `width`, scaled back to the bin start.
pub fn floor_bin(field: Field, width: i64) -> impl Fn(&Record) -> Option<i64> {
    let width = width.max(1);
    move |record| {
        let value = record.value(field)?;
        let bin = (value / width as f64).floor();
        (bin.is_finite() && bin.abs() < i64::MAX as f64).then(|| bin as i64 * width)
    }
}

pub fn field_value(field: Field) -> impl Fn(&Record) -> Option<f64> {
    move |record| record.value(field)
}

pub fn country_key(record: &Record) -> Option<String> {
    record.country().map(str::to_string)
}

pub fn year_key(record: &Record) -> Option<i32> {
    record.year()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EmissionsRecord, WellbeingRecord};
    use proptest::prelude::*;

    fn wellbeing(screen_time: f64, anxiety: f64) -> Record {
        Record::Wellbeing(WellbeingRecord {
            screen_time,
            anxiety,
            depression: 0.0,
        })
    }

    fn emissions(country: &str, year: i32, emissions: f64) -> Record {
        Record::Emissions(EmissionsRecord {
            country: country.to_string(),
            code: "XXX".to_string(),
            year,
            emissions,
        })
    }

    #[test]
    fn averages_per_unit_bin() {
        let records = vec![wellbeing(2.0, 8.0), wellbeing(2.0, 6.0), wellbeing(5.0, 3.0)];
        let mood = field_value(Field::Anxiety);
        let result = aggregate(&records, floor_bin(Field::ScreenTime, 1), &[&mood]);

        let pairs: Vec<(i64, f64)> = result.iter().map(|a| (a.key, a.mean(0))).collect();
        assert_eq!(pairs, vec![(2, 7.0), (5, 3.0)]);
        assert_eq!(result[0].count, 2);
    }

    #[test]
    fn floors_fractional_values() {
        let records = vec![wellbeing(2.9, 1.0), wellbeing(2.1, 0.0), wellbeing(0.4, 1.0)];
        let anxiety = field_value(Field::Anxiety);
        let keys: Vec<i64> = aggregate(&records, floor_bin(Field::ScreenTime, 1), &[&anxiety])
            .into_iter()
            .map(|a| a.key)
            .collect();
        assert_eq!(keys, vec![0, 2]);
    }

    #[test]
    fn groups_by_discrete_key_with_sum() {
        let records = vec![
            emissions("Mexico", 1990, 10.0),
            emissions("Chile", 1990, 5.0),
            emissions("Mexico", 1991, 12.0),
        ];
        let value = field_value(Field::Emissions);

        let by_year = aggregate(&records, year_key, &[&value]);
        assert_eq!(by_year.len(), 2);
        assert_eq!(by_year[0].key, 1990);
        assert_eq!(by_year[0].sum(0), 15.0);

        let by_country = aggregate(&records, country_key, &[&value]);
        let keys: Vec<&str> = by_country.iter().map(|a| a.key.as_str()).collect();
        assert_eq!(keys, vec!["Chile", "Mexico"]);
        assert_eq!(by_country[1].mean(0), 11.0);
    }

    #[test]
    fn decade_bins_start_on_boundary() {
        let records = vec![emissions("Mexico", 1969, 1.0), emissions("Mexico", 1970, 3.0)];
        let value = field_value(Field::Emissions);
        let keys: Vec<i64> = aggregate(&records, floor_bin(Field::Year, 10), &[&value])
            .into_iter()
            .map(|a| a.key)
            .collect();
        assert_eq!(keys, vec![1960, 1970]);
    }

    #[test]
    fn records_without_a_value_do_not_open_a_bin() {
        let records = vec![wellbeing(1.0, 0.5), emissions("Mexico", 1990, 1.0)];
        let value = field_value(Field::Anxiety);
        let result = aggregate(&records, floor_bin(Field::ScreenTime, 1), &[&value]);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let value = field_value(Field::Anxiety);
        assert!(aggregate(&[], floor_bin(Field::ScreenTime, 1), &[&value]).is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_aggregate_is_deterministic_and_complete(
            points in proptest::collection::vec((0.0f64..12.0, 0.0f64..1.0), 0..60),
        ) {
            let records: Vec<Record> = points.iter().map(|(s, a)| wellbeing(*s, *a)).collect();
            let value = field_value(Field::Anxiety);

            let first = aggregate(&records, floor_bin(Field::ScreenTime, 1), &[&value]);
            let second = aggregate(&records, floor_bin(Field::ScreenTime, 1), &[&value]);
            prop_assert_eq!(&first, &second);

            prop_assert!(first.windows(2).all(|w| w[0].key < w[1].key));
            prop_assert!(first.iter().all(|a| a.count > 0 && a.mean(0).is_finite()));
            prop_assert_eq!(first.iter().map(|a| a.count).sum::<usize>(), records.len());
        }
    }
}
