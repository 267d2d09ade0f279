use clap::ValueEnum;
use serde::Serialize;

use crate::models::{Field, Metric};

pub const SCREEN_TIME_COLUMN: &str = "Daily Screen Time (hours)";
pub const ANXIETY_COLUMN: &str = "Do you often feel anxious or stressed? (0 - No, 1 - Yes)";
pub const DEPRESSION_COLUMN: &str = "Have you ever felt symptoms of depression? (0 - No, 1 - Yes)";

pub const ENTITY_COLUMN: &str = "Entity";
pub const CODE_COLUMN: &str = "Code";
pub const YEAR_COLUMN: &str = "Year";
pub const EMISSIONS_COLUMN: &str = "Annual CO₂ emissions (tonnes)";

/// A fixed dataset schema together with the presentation built on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    DigitalDiet,
    Emissions,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Series {
    pub field: Field,
    pub label: &'static str,
    pub color: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Chart {
    /// Count of records per unit-width bin of `field` over `domain`.
    Histogram { field: Field, domain: (f64, f64) },
    /// Mean of each series per floor(`field`) bin, as side-by-side bars.
    GroupedBars { field: Field, series: &'static [Series] },
    /// One circle per record, `x` against the selected metric.
    MetricScatter { x: Field, x_domain: (f64, f64) },
    /// Sum of `value` per `key`, as a line.
    TotalLine { key: Field, value: Field },
    /// The `limit` largest countries by `value` in the latest year.
    TopBars { value: Field, limit: usize },
    /// Mean of `value` per `width`-year bin.
    PeriodBars { value: Field, width: i64 },
    /// Country filter plus year bound over raw records.
    Explore,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnchorX {
    Value(f64),
    Band(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnchorY {
    Value(f64),
    /// Top of the tallest mark in the scene.
    Peak,
}

/// Static narrative callout, positioned in data coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Annotation {
    pub title: &'static str,
    pub label: &'static str,
    pub x: AnchorX,
    pub y: AnchorY,
    pub dx: f64,
    pub dy: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneSpec {
    pub title: &'static str,
    pub chart: Chart,
    pub annotations: &'static [Annotation],
    pub metric_picker: bool,
}

const WELLBEING_SERIES: &[Series] = &[
    Series {
        field: Field::Anxiety,
        label: "Anxiety",
        color: "#f44336",
    },
    Series {
        field: Field::Depression,
        label: "Depression",
        color: "#9c27b0",
    },
];

const DIGITAL_DIET_SCENES: &[SceneSpec] = &[
    SceneSpec {
        title: "How much time do we spend on screens?",
        chart: Chart::Histogram {
            field: Field::ScreenTime,
            domain: (0.0, 12.0),
        },
        annotations: &[Annotation {
            title: "Heavy Usage",
            label: "Majority over 4 hours daily",
            x: AnchorX::Value(5.0),
            y: AnchorY::Peak,
            dx: 40.0,
            dy: -70.0,
        }],
        metric_picker: false,
    },
    SceneSpec {
        title: "Anxiety and depression by daily screen time",
        chart: Chart::GroupedBars {
            field: Field::ScreenTime,
            series: WELLBEING_SERIES,
        },
        annotations: &[Annotation {
            title: "Risk Threshold",
            label: "Symptoms increase beyond 4h",
            x: AnchorX::Band("5"),
            y: AnchorY::Value(0.4),
            dx: 50.0,
            dy: -60.0,
        }],
        metric_picker: false,
    },
    SceneSpec {
        title: "Explore individual responses",
        chart: Chart::MetricScatter {
            x: Field::ScreenTime,
            x_domain: (0.0, 12.0),
        },
        annotations: &[],
        metric_picker: true,
    },
];

const EMISSIONS_SCENES: &[SceneSpec] = &[
    SceneSpec {
        title: "Global CO₂ emissions per year",
        chart: Chart::TotalLine {
            key: Field::Year,
            value: Field::Emissions,
        },
        annotations: &[Annotation {
            title: "Post-war Growth",
            label: "Emissions accelerate after 1950",
            x: AnchorX::Value(1950.0),
            y: AnchorY::Peak,
            dx: -60.0,
            dy: 40.0,
        }],
        metric_picker: false,
    },
    SceneSpec {
        title: "Largest emitters in the latest year",
        chart: Chart::TopBars {
            value: Field::Emissions,
            limit: 10,
        },
        annotations: &[],
        metric_picker: false,
    },
    SceneSpec {
        title: "Average emissions per country by decade",
        chart: Chart::PeriodBars {
            value: Field::Emissions,
            width: 10,
        },
        annotations: &[],
        metric_picker: false,
    },
    SceneSpec {
        title: "Explore a country's history",
        chart: Chart::Explore,
        annotations: &[],
        metric_picker: false,
    },
];

impl Variant {
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            Variant::DigitalDiet => &[SCREEN_TIME_COLUMN, ANXIETY_COLUMN, DEPRESSION_COLUMN],
            Variant::Emissions => &[ENTITY_COLUMN, CODE_COLUMN, YEAR_COLUMN, EMISSIONS_COLUMN],
        }
    }

    pub fn scenes(&self) -> &'static [SceneSpec] {
        match self {
            Variant::DigitalDiet => DIGITAL_DIET_SCENES,
            Variant::Emissions => EMISSIONS_SCENES,
        }
    }

    pub fn max_scene(&self) -> u8 {
        self.scenes().len() as u8
    }

    /// Whether scenes can be entered directly instead of only by advancing.
    pub fn allows_jump(&self) -> bool {
        matches!(self, Variant::Emissions)
    }

    pub fn metrics(&self) -> &'static [Metric] {
        match self {
            Variant::DigitalDiet => &[Metric::Anxiety, Metric::Depression],
            Variant::Emissions => &[],
        }
    }

    pub fn default_metric(&self) -> Option<Metric> {
        self.metrics().first().copied()
    }

    /// Scene at a 1-based index.
    pub fn scene(&self, index: u8) -> Option<&'static SceneSpec> {
        let position = usize::from(index).checked_sub(1)?;
        self.scenes().get(position)
    }
}
