use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

/// One parsed CSV row, keyed by the header text.
pub type RawRow = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WellbeingRecord {
    pub screen_time: f64,
    pub anxiety: f64,
    pub depression: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmissionsRecord {
    pub country: String,
    pub code: String,
    pub year: i32,
    pub emissions: f64,
}

/// A validated row. Every numeric field is finite.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    Wellbeing(WellbeingRecord),
    Emissions(EmissionsRecord),
}

impl Record {
    pub fn value(&self, field: Field) -> Option<f64> {
        match (self, field) {
            (Record::Wellbeing(r), Field::ScreenTime) => Some(r.screen_time),
            (Record::Wellbeing(r), Field::Anxiety) => Some(r.anxiety),
            (Record::Wellbeing(r), Field::Depression) => Some(r.depression),
            (Record::Emissions(r), Field::Year) => Some(r.year as f64),
            (Record::Emissions(r), Field::Emissions) => Some(r.emissions),
            _ => None,
        }
    }

    pub fn country(&self) -> Option<&str> {
        match self {
            Record::Emissions(r) => Some(r.country.as_str()),
            Record::Wellbeing(_) => None,
        }
    }

    pub fn year(&self) -> Option<i32> {
        match self {
            Record::Emissions(r) => Some(r.year),
            Record::Wellbeing(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    ScreenTime,
    Anxiety,
    Depression,
    Year,
    Emissions,
}

impl Field {
    pub fn label(&self) -> &'static str {
        match self {
            Field::ScreenTime => "Screen Time",
            Field::Anxiety => "Anxiety",
            Field::Depression => "Depression",
            Field::Year => "Year",
            Field::Emissions => "CO₂ emissions",
        }
    }
}

/// Options offered by the metric picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Metric {
    Anxiety,
    Depression,
}

impl Metric {
    pub fn field(&self) -> Field {
        match self {
            Metric::Anxiety => Field::Anxiety,
            Metric::Depression => Field::Depression,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "anxiety" => Some(Metric::Anxiety),
            "depression" => Some(Metric::Depression),
            _ => None,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field().label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CountryFilter {
    All,
    Only(String),
}

impl CountryFilter {
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            CountryFilter::All => true,
            CountryFilter::Only(name) => record.country() == Some(name.as_str()),
        }
    }
}

impl fmt::Display for CountryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountryFilter::All => f.write_str("all"),
            CountryFilter::Only(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub mean: f64,
    pub sum: f64,
}

/// A bin reduced to one summary per requested value function.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregate<K> {
    pub key: K,
    pub count: usize,
    pub summaries: Vec<Summary>,
}

impl<K> Aggregate<K> {
    pub fn mean(&self, index: usize) -> f64 {
        self.summaries.get(index).map_or(f64::NAN, |s| s.mean)
    }

    pub fn sum(&self, index: usize) -> f64 {
        self.summaries.get(index).map_or(f64::NAN, |s| s.sum)
    }
}
