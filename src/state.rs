use log::{error, info, warn};
use serde::Serialize;

use crate::config::VizConfig;
use crate::errors::{InteractionError, LoadError};
use crate::models::{CountryFilter, Metric, Record};
use crate::normalize::Normalized;
use crate::render::{render, Frame};
use crate::scene::SceneSelector;
use crate::surface::Surface;
use crate::variant::{Chart, Variant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoadStatus {
    Loading,
    Ready,
    Failed,
}

/// User choices that feed the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UiSelection {
    pub metric: Option<Metric>,
    pub country: CountryFilter,
    /// Inclusive upper bound on year.
    pub year: Option<i32>,
}

impl UiSelection {
    pub fn for_variant(variant: Variant) -> Self {
        Self {
            metric: variant.default_metric(),
            country: CountryFilter::All,
            year: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearSlider {
    pub min: i32,
    pub max: i32,
    pub value: i32,
}

/// What the page controls show for the current state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Controls {
    pub next_enabled: bool,
    pub metric_picker_visible: bool,
    pub explore_visible: bool,
    pub country_options: Vec<String>,
    pub year_slider: Option<YearSlider>,
}

pub struct AppState {
    variant: Variant,
    config: VizConfig,
    status: LoadStatus,
    dataset: Vec<Record>,
    dropped: usize,
    scenes: SceneSelector,
    selection: UiSelection,
    country_options: Vec<String>,
    year_range: Option<(i32, i32)>,
    surface: Surface,
}

impl AppState {
    /// A session waiting for its data, showing the loading notice.
    pub fn new(variant: Variant, config: VizConfig) -> Self {
        let mut state = Self {
            variant,
            config,
            status: LoadStatus::Loading,
            dataset: Vec::new(),
            dropped: 0,
            scenes: SceneSelector::new(variant.max_scene(), variant.allows_jump()),
            selection: UiSelection::for_variant(variant),
            country_options: Vec::new(),
            year_range: None,
            surface: Surface::new(config.width, config.height),
        };
        state.redraw();
        state
    }

    /// Replaces any previous dataset and resets selections to their defaults.
    pub fn load_complete(&mut self, normalized: Normalized) {
        info!(
            "Loaded {} records ({} rows dropped)",
            normalized.records.len(),
            normalized.dropped
        );

        let mut countries: Vec<String> = normalized
            .records
            .iter()
            .filter_map(|r| r.country().map(str::to_string))
            .collect();
        countries.sort();
        countries.dedup();

        let years = normalized.records.iter().filter_map(Record::year);
        self.year_range = years.clone().min().zip(years.max());
        self.country_options = countries;
        self.dataset = normalized.records;
        self.dropped = normalized.dropped;
        self.selection = UiSelection::for_variant(self.variant);
        self.selection.year = self.year_range.map(|(_, max)| max);
        self.status = LoadStatus::Ready;
        self.redraw();
    }

    pub fn load_failed(&mut self, err: &LoadError) {
        error!("Failed to load data: {err}");
        self.status = LoadStatus::Failed;
        self.dataset.clear();
        self.dropped = 0;
        self.selection = UiSelection::for_variant(self.variant);
        self.country_options.clear();
        self.year_range = None;
        self.redraw();
    }

    pub fn advance_scene(&mut self) -> Result<bool, InteractionError> {
        self.ensure_ready()?;
        if !self.scenes.advance() {
            return Ok(false);
        }
        self.redraw();
        Ok(true)
    }

    pub fn go_to_scene(&mut self, scene: u32) -> Result<bool, InteractionError> {
        self.ensure_ready()?;
        let changed = self.scenes.go_to(scene)?;
        if changed {
            self.redraw();
        }
        Ok(changed)
    }

    pub fn set_metric(&mut self, metric: Metric) -> Result<(), InteractionError> {
        self.ensure_ready()?;
        if !self.variant.metrics().contains(&metric) {
            return Err(InteractionError::UnknownMetric {
                name: metric.to_string(),
            });
        }
        self.selection.metric = Some(metric);
        self.redraw();
        Ok(())
    }

    pub fn set_country(&mut self, country: CountryFilter) -> Result<(), InteractionError> {
        self.ensure_ready()?;
        if let CountryFilter::Only(name) = &country {
            if self.country_options.binary_search(name).is_err() {
                return Err(InteractionError::UnknownCountry { name: name.clone() });
            }
        }
        self.selection.country = country;
        self.redraw();
        Ok(())
    }

    /// Moves the year slider, clamping into the observed range. Returns the applied value.
    pub fn set_year(&mut self, year: i32) -> Result<i32, InteractionError> {
        self.ensure_ready()?;
        let (min, max) = self.year_range.ok_or(InteractionError::NoYearRange)?;
        let applied = year.clamp(min, max);
        self.selection.year = Some(applied);
        self.redraw();
        Ok(applied)
    }

    pub fn pointer_enter(&mut self, id: &str, x: f64, y: f64) -> Result<(), InteractionError> {
        self.surface.pointer_enter(id, x, y)
    }

    pub fn pointer_leave(&mut self, id: &str) -> bool {
        self.surface.pointer_leave(id)
    }

    pub fn controls(&self) -> Controls {
        let spec = self.variant.scene(self.scenes.current());
        let ready = self.status == LoadStatus::Ready;
        Controls {
            next_enabled: ready && !self.scenes.is_terminal(),
            metric_picker_visible: spec.is_some_and(|s| s.metric_picker),
            explore_visible: ready && spec.is_some_and(|s| s.chart == Chart::Explore),
            country_options: self.country_options.clone(),
            year_slider: self.year_range.map(|(min, max)| YearSlider {
                min,
                max,
                value: self.selection.year.unwrap_or(max),
            }),
        }
    }

    pub fn status(&self) -> LoadStatus {
        self.status
    }

    pub fn scene(&self) -> u8 {
        self.scenes.current()
    }

    pub fn max_scene(&self) -> u8 {
        self.scenes.max()
    }

    pub fn selection(&self) -> &UiSelection {
        &self.selection
    }

    pub fn dataset(&self) -> &[Record] {
        &self.dataset
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    fn ensure_ready(&self) -> Result<(), InteractionError> {
        if self.status == LoadStatus::Ready {
            Ok(())
        } else {
            warn!("Ignoring interaction while data is {:?}", self.status);
            Err(InteractionError::NotLoaded)
        }
    }

    fn redraw(&mut self) {
        let Some(spec) = self.variant.scene(self.scenes.current()) else {
            return;
        };
        let frame = Frame {
            status: self.status,
            scene: self.scenes.current(),
            spec,
            records: &self.dataset,
            selection: &self.selection,
        };
        render(&frame, &self.config, &mut self.surface);
    }
}
