use std::fmt::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::aggregate::{aggregate, field_value, floor_bin, year_key};
use crate::models::{Aggregate, Field, Record};
use crate::normalize::Normalized;
use crate::render::format_quantity;
use crate::variant::Variant;

#[derive(Debug, Clone, Serialize)]
pub struct ValueSummary {
    pub field: Field,
    pub mean: f64,
    pub sum: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BinSummary {
    pub key: String,
    pub count: usize,
    pub values: Vec<ValueSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub variant: Variant,
    pub source: String,
    pub generated_at: DateTime<Utc>,
    pub kept: usize,
    pub dropped: usize,
    pub bin_label: &'static str,
    pub bins: Vec<BinSummary>,
}

pub fn summarize(variant: Variant, source: &str, normalized: &Normalized) -> DatasetSummary {
    let (bin_label, bins) = match variant {
        Variant::DigitalDiet => {
            let fields = [Field::Anxiety, Field::Depression];
            let anxiety = field_value(Field::Anxiety);
            let depression = field_value(Field::Depression);
            let bins = aggregate(
                &normalized.records,
                floor_bin(Field::ScreenTime, 1),
                &[&anxiety, &depression],
            );
            ("Screen time (h)", bin_summaries(bins, &fields))
        }
        Variant::Emissions => {
            let emissions = field_value(Field::Emissions);
            let bins = aggregate(&normalized.records, year_key, &[&emissions]);
            ("Year", bin_summaries(bins, &[Field::Emissions]))
        }
    };

    DatasetSummary {
        variant,
        source: source.to_string(),
        generated_at: Utc::now(),
        kept: normalized.records.len(),
        dropped: normalized.dropped,
        bin_label,
        bins,
    }
}

fn bin_summaries<K: ToString>(bins: Vec<Aggregate<K>>, fields: &[Field]) -> Vec<BinSummary> {
    bins.into_iter()
        .map(|bin| BinSummary {
            key: bin.key.to_string(),
            count: bin.count,
            values: fields
                .iter()
                .zip(&bin.summaries)
                .map(|(field, summary)| ValueSummary {
                    field: *field,
                    mean: summary.mean,
                    sum: summary.sum,
                })
                .collect(),
        })
        .collect()
}

pub fn build_report(summary: &DatasetSummary, records: &[Record]) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Dataset Summary");
    let _ = writeln!(
        output,
        "Generated {} from {}",
        summary.generated_at.format("%Y-%m-%d %H:%M UTC"),
        summary.source
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Rows");
    let _ = writeln!(output, "- kept: {}", summary.kept);
    let _ = writeln!(output, "- dropped: {}", summary.dropped);

    if let Some((first, last)) = year_span(records) {
        let _ = writeln!(output, "- years: {first}–{last}");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Bins by {}", summary.bin_label);

    if summary.bins.is_empty() {
        let _ = writeln!(output, "No data available.");
        return output;
    }

    for bin in &summary.bins {
        let values: Vec<String> = bin
            .values
            .iter()
            .map(|v| match v.field {
                Field::Emissions => format!(
                    "total {} t, mean {} t",
                    format_quantity(v.sum),
                    format_quantity(v.mean)
                ),
                _ => format!("{} {:.0}%", v.field.label().to_lowercase(), v.mean * 100.0),
            })
            .collect();
        let _ = writeln!(
            output,
            "- {}: {} records ({})",
            bin.key,
            bin.count,
            values.join(", ")
        );
    }

    output
}

fn year_span(records: &[Record]) -> Option<(i32, i32)> {
    let years = records.iter().filter_map(Record::year);
    years.clone().min().zip(years.max())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EmissionsRecord, WellbeingRecord};

    fn wellbeing(screen_time: f64, anxiety: f64, depression: f64) -> Record {
        Record::Wellbeing(WellbeingRecord {
            screen_time,
            anxiety,
            depression,
        })
    }

    #[test]
    fn summary_counts_kept_and_dropped_rows() {
        let normalized = Normalized {
            records: vec![
                wellbeing(2.0, 1.0, 0.0),
                wellbeing(2.5, 0.0, 0.0),
                wellbeing(5.0, 1.0, 1.0),
            ],
            dropped: 2,
        };
        let summary = summarize(Variant::DigitalDiet, "survey.csv", &normalized);
        assert_eq!(summary.kept, 3);
        assert_eq!(summary.dropped, 2);
        assert_eq!(summary.bins.len(), 2);
        assert_eq!(summary.bins[0].key, "2");
        assert_eq!(summary.bins[0].values[0].mean, 0.5);

        let report = build_report(&summary, &normalized.records);
        assert!(report.contains("- dropped: 2"));
        assert!(report.contains("- 2: 2 records (anxiety 50%, depression 0%)"));
        assert!(!report.contains("years:"));
    }

    #[test]
    fn emissions_report_lists_yearly_totals() {
        let records: Vec<Record> = [("Mexico", 2000, 3000.0), ("Chile", 2000, 1000.0), ("Chile", 2001, 500.0)]
            .iter()
            .map(|(country, year, emissions)| {
                Record::Emissions(EmissionsRecord {
                    country: country.to_string(),
                    code: "XXX".to_string(),
                    year: *year,
                    emissions: *emissions,
                })
            })
            .collect();
        let normalized = Normalized { records, dropped: 0 };
        let summary = summarize(Variant::Emissions, "co2.csv", &normalized);
        let report = build_report(&summary, &normalized.records);

        assert!(report.contains("- years: 2000–2001"));
        assert!(report.contains("- 2000: 2 records (total 4k t, mean 2k t)"));
        assert!(report.contains("## Bins by Year"));
    }

    #[test]
    fn empty_dataset_reports_no_data() {
        let normalized = Normalized {
            records: Vec::new(),
            dropped: 7,
        };
        let summary = summarize(Variant::DigitalDiet, "survey.csv", &normalized);
        let report = build_report(&summary, &normalized.records);
        assert!(report.contains("No data available."));
        assert!(serde_json::to_string(&summary).unwrap().contains("\"dropped\":7"));
    }
}
