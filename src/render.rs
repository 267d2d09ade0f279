use log::debug;

use crate::aggregate::{aggregate, country_key, field_value, floor_bin, ValueFn};
use crate::config::VizConfig;
use crate::models::{CountryFilter, Field, Metric, Record};
use crate::scale::{BandScale, LinearScale, SequentialColor};
use crate::state::{LoadStatus, UiSelection};
use crate::surface::{fmt_num, Mark, MarkKind, Surface};
use crate::variant::{AnchorX, AnchorY, Annotation, Chart, SceneSpec, Series};

pub const LOADING_TEXT: &str = "Loading data…";
pub const LOAD_FAILED_TEXT: &str = "Data could not be loaded. Please try again later.";
pub const NO_DATA_TEXT: &str = "No data available";

/// Everything a scene needs to draw itself.
pub struct Frame<'a> {
    pub status: LoadStatus,
    pub scene: u8,
    pub spec: &'a SceneSpec,
    pub records: &'a [Record],
    pub selection: &'a UiSelection,
}

/// Clears `surface` and draws the scene described by `frame`.
pub fn render(frame: &Frame<'_>, config: &VizConfig, surface: &mut Surface) {
    surface.clear();
    surface.push(
        "title",
        Mark::new(MarkKind::Text, "title")
            .num("x", config.width / 2.0)
            .num("y", config.margin.top / 2.0)
            .attr("text-anchor", "middle")
            .attr("font-size", 18)
            .text(frame.spec.title),
    );

    match frame.status {
        LoadStatus::Loading => placeholder(surface, config, LOADING_TEXT),
        LoadStatus::Failed => placeholder(surface, config, LOAD_FAILED_TEXT),
        LoadStatus::Ready => {
            let mut chart = ChartCtx {
                surface: &mut *surface,
                config,
                annotations: frame.spec.annotations,
            };
            match frame.spec.chart {
                Chart::Histogram { field, domain } => chart.histogram(frame.records, field, domain),
                Chart::GroupedBars { field, series } => {
                    chart.grouped_bars(frame.records, field, series)
                }
                Chart::MetricScatter { x, x_domain } => {
                    let metric = frame.selection.metric.unwrap_or(Metric::Anxiety);
                    chart.metric_scatter(frame.records, x, x_domain, metric)
                }
                Chart::TotalLine { key, value } => chart.total_line(frame.records, key, value),
                Chart::TopBars { value, limit } => chart.top_bars(frame.records, value, limit),
                Chart::PeriodBars { value, width } => {
                    chart.period_bars(frame.records, value, width)
                }
                Chart::Explore => chart.explore(frame.records, frame.selection),
            }
        }
    }

    debug!(
        "Rendered scene {} with {} marks ({} data)",
        frame.scene,
        surface.marks().len(),
        surface.data_marks().count()
    );
}

fn placeholder(surface: &mut Surface, config: &VizConfig, message: &str) {
    surface.push(
        "placeholder",
        Mark::new(MarkKind::Text, "placeholder")
            .num("x", config.width / 2.0)
            .num("y", config.height / 2.0)
            .attr("text-anchor", "middle")
            .attr("font-size", 16)
            .attr("fill", "#666666")
            .text(message),
    );
}

struct ChartCtx<'a> {
    surface: &'a mut Surface,
    config: &'a VizConfig,
    annotations: &'a [Annotation],
}

impl ChartCtx<'_> {
    fn x_range(&self) -> (f64, f64) {
        (self.config.plot_left(), self.config.plot_right())
    }

    fn y_range(&self) -> (f64, f64) {
        (self.config.plot_bottom(), self.config.plot_top())
    }

    fn no_data(&mut self) {
        placeholder(self.surface, self.config, NO_DATA_TEXT);
    }

    fn histogram(&mut self, records: &[Record], field: Field, domain: (f64, f64)) {
        let last = (domain.1.ceil() as i64 - 1).max(0);
        let bin = floor_bin(field, 1);
        let clamped = |record: &Record| bin(record).map(|k| k.clamp(0, last));
        let bins = aggregate(records, clamped, &[]);
        if bins.is_empty() {
            return self.no_data();
        }

        let peak = bins.iter().map(|b| b.count).max().unwrap_or(0) as f64;
        let x = LinearScale::new(domain, self.x_range());
        let y = LinearScale::new((0.0, peak), self.y_range());

        self.axis_bottom(&x, 12, fmt_num);
        self.axis_left(&y, 10, fmt_num);

        for b in &bins {
            let x0 = x.map(b.key as f64);
            let x1 = x.map(b.key as f64 + 1.0);
            let top = y.map(b.count as f64);
            let bar = Mark::new(MarkKind::Rect, "bar datum")
                .num("x", x0 + 1.0)
                .num("y", top)
                .num("width", (x1 - x0 - 2.0).max(0.0))
                .num("height", y.map(0.0) - top)
                .attr("fill", "#2196f3");
            let text = format!(
                "{}: {}–{}h\nRespondents: {}",
                field.label(),
                b.key,
                b.key + 1,
                b.count
            );
            self.surface.push_hoverable("bar", bar, text);
        }

        self.annotate(
            |anchor| match anchor {
                AnchorX::Value(v) => Some(x.map(v)),
                AnchorX::Band(_) => None,
            },
            |anchor| match anchor {
                AnchorY::Value(v) => y.map(v),
                AnchorY::Peak => y.map(peak),
            },
        );
    }

    fn grouped_bars(&mut self, records: &[Record], field: Field, series: &[Series]) {
        let getters: Vec<_> = series.iter().map(|s| field_value(s.field)).collect();
        let value_fns: Vec<ValueFn<'_>> = getters.iter().map(|g| g as ValueFn<'_>).collect();
        let bins = aggregate(records, floor_bin(field, 1), &value_fns);
        if bins.is_empty() {
            return self.no_data();
        }

        let labels: Vec<String> = bins.iter().map(|b| b.key.to_string()).collect();
        let x = BandScale::new(labels, self.x_range(), 0.2);
        let y = LinearScale::new((0.0, 1.0), self.y_range());

        self.axis_band(&x, false, |label| format!("{label}h"));
        self.axis_left(&y, 10, |v| format!("{:.0}%", v * 100.0));

        let width = x.bandwidth() / series.len().max(1) as f64;
        for b in &bins {
            let label = b.key.to_string();
            let Some(left) = x.position(&label) else {
                continue;
            };
            for (i, s) in series.iter().enumerate() {
                let mean = b.mean(i);
                let top = y.map(mean);
                let bar = Mark::new(
                    MarkKind::Rect,
                    &format!("bar {} datum", s.label.to_ascii_lowercase()),
                )
                .num("x", left + width * i as f64)
                .num("y", top)
                .num("width", width)
                .num("height", y.map(0.0) - top)
                .attr("fill", s.color);
                let text = format!(
                    "{}h: {} {:.0}%\nRespondents: {}",
                    b.key,
                    s.label,
                    mean * 100.0,
                    b.count
                );
                self.surface.push_hoverable("bar", bar, text);
            }
        }

        self.legend(series);
        self.annotate(
            |anchor| match anchor {
                AnchorX::Band(label) => x.position(label),
                AnchorX::Value(v) => x.position(&fmt_num(v)),
            },
            |anchor| match anchor {
                AnchorY::Value(v) => y.map(v),
                AnchorY::Peak => y.map(1.0),
            },
        );
    }

    fn metric_scatter(
        &mut self,
        records: &[Record],
        x_field: Field,
        x_domain: (f64, f64),
        metric: Metric,
    ) {
        let points: Vec<(f64, f64)> = records
            .iter()
            .filter_map(|r| Some((r.value(x_field)?, r.value(metric.field())?)))
            .collect();
        if points.is_empty() {
            return self.no_data();
        }

        let x = LinearScale::new(x_domain, self.x_range());
        let y = LinearScale::new((0.0, 1.0), self.y_range());
        self.axis_bottom(&x, 12, fmt_num);
        self.axis_left(&y, 10, fmt_num);

        for (px, py) in points {
            let dot = Mark::new(MarkKind::Circle, "dot datum")
                .num("cx", x.map(px))
                .num("cy", y.map(py))
                .num("r", 4.0)
                .attr("fill", "#4caf50")
                .attr("fill-opacity", 0.6);
            let text = format!("Screen Time: {}h\n{}: {}", fmt_num(px), metric, fmt_num(py));
            self.surface.push_hoverable("dot", dot, text);
        }
    }

    fn total_line(&mut self, records: &[Record], key: Field, value: Field) {
        let getter = field_value(value);
        let key_fn = floor_bin(key, 1);
        let totals = aggregate(records, key_fn, &[&getter]);
        if totals.is_empty() {
            return self.no_data();
        }

        let first = totals[0].key as f64;
        let last = totals[totals.len() - 1].key as f64;
        let peak = totals.iter().map(|t| t.sum(0)).fold(0.0, f64::max);
        let x = LinearScale::new((first, last), self.x_range());
        let y = LinearScale::new((0.0, peak), self.y_range()).nice(10);

        self.axis_bottom(&x, 10, |v| format!("{v:.0}"));
        self.axis_left(&y, 10, format_quantity);

        let points: Vec<(f64, f64)> = totals
            .iter()
            .map(|t| (x.map(t.key as f64), y.map(t.sum(0))))
            .collect();
        self.surface.push(
            "line",
            Mark::new(MarkKind::Path, "line datum")
                .attr("d", path_data(&points))
                .attr("fill", "none")
                .attr("stroke", "#d84315")
                .attr("stroke-width", 2),
        );
        for (t, (px, py)) in totals.iter().zip(points) {
            let dot = Mark::new(MarkKind::Circle, "dot datum")
                .num("cx", px)
                .num("cy", py)
                .num("r", 2.5)
                .attr("fill", "#d84315");
            let text = format!("{}: {}\nTotal: {} t", key.label(), t.key, format_quantity(t.sum(0)));
            self.surface.push_hoverable("dot", dot, text);
        }

        self.annotate(
            |anchor| match anchor {
                AnchorX::Value(v) => (first..=last).contains(&v).then(|| x.map(v)),
                AnchorX::Band(_) => None,
            },
            |anchor| match anchor {
                AnchorY::Value(v) => y.map(v),
                AnchorY::Peak => y.map(peak),
            },
        );
    }

    fn top_bars(&mut self, records: &[Record], value: Field, limit: usize) {
        let Some(latest) = records.iter().filter_map(Record::year).max() else {
            return self.no_data();
        };
        let current: Vec<Record> = records
            .iter()
            .filter(|r| r.year() == Some(latest))
            .cloned()
            .collect();
        let getter = field_value(value);
        let mut totals = aggregate(&current, country_key, &[&getter]);
        totals.sort_by(|a, b| b.sum(0).total_cmp(&a.sum(0)).then_with(|| a.key.cmp(&b.key)));
        totals.truncate(limit);
        if totals.is_empty() {
            return self.no_data();
        }

        let peak = totals[0].sum(0).max(0.0);
        let labels: Vec<String> = totals.iter().map(|t| t.key.clone()).collect();
        let x = BandScale::new(labels, self.x_range(), 0.2);
        let y = LinearScale::new((0.0, peak), self.y_range()).nice(10);
        let color = SequentialColor::blues((0.0, peak));

        self.axis_band(&x, true, str::to_string);
        self.axis_left(&y, 10, format_quantity);

        for t in &totals {
            let Some(left) = x.position(&t.key) else {
                continue;
            };
            let total = t.sum(0);
            let top = y.map(total);
            let bar = Mark::new(MarkKind::Rect, "bar datum")
                .num("x", left)
                .num("y", top)
                .num("width", x.bandwidth())
                .num("height", y.map(0.0) - top)
                .attr("fill", color.color(total));
            let text = format!("{} ({latest})\n{} t", t.key, format_quantity(total));
            self.surface.push_hoverable("bar", bar, text);
        }
    }

    fn period_bars(&mut self, records: &[Record], value: Field, width: i64) {
        let getter = field_value(value);
        let periods = aggregate(records, floor_bin(Field::Year, width), &[&getter]);
        if periods.is_empty() {
            return self.no_data();
        }

        let peak = periods.iter().map(|p| p.mean(0)).fold(0.0, f64::max);
        let labels: Vec<String> = periods.iter().map(|p| format!("{}s", p.key)).collect();
        let x = BandScale::new(labels, self.x_range(), 0.2);
        let y = LinearScale::new((0.0, peak), self.y_range()).nice(10);

        self.axis_band(&x, false, str::to_string);
        self.axis_left(&y, 10, format_quantity);

        for p in &periods {
            let label = format!("{}s", p.key);
            let Some(left) = x.position(&label) else {
                continue;
            };
            let mean = p.mean(0);
            let top = y.map(mean);
            let bar = Mark::new(MarkKind::Rect, "bar datum")
                .num("x", left)
                .num("y", top)
                .num("width", x.bandwidth())
                .num("height", y.map(0.0) - top)
                .attr("fill", "#607d8b");
            let text = format!(
                "{label}\nMean: {} t\nCountry-years: {}",
                format_quantity(mean),
                p.count
            );
            self.surface.push_hoverable("bar", bar, text);
        }
    }

    fn explore(&mut self, records: &[Record], selection: &UiSelection) {
        let mut visible: Vec<&Record> = records
            .iter()
            .filter(|r| selection.country.matches(r))
            .filter(|r| match (selection.year, r.year()) {
                (Some(bound), Some(year)) => year <= bound,
                (None, _) => true,
                (Some(_), None) => false,
            })
            .collect();

        let caption = match selection.year {
            Some(bound) => format!("Country: {} · Years up to {bound}", selection.country),
            None => format!("Country: {}", selection.country),
        };
        self.surface.push(
            "caption",
            Mark::new(MarkKind::Text, "caption")
                .num("x", self.config.plot_left())
                .num("y", self.config.plot_top() - 8.0)
                .attr("font-size", 12)
                .text(caption),
        );

        if visible.is_empty() {
            return self.no_data();
        }
        visible.sort_by_key(|r| r.year());

        let years = visible.iter().filter_map(|r| r.year());
        let first = years.clone().min().unwrap_or(0) as f64;
        let last = years.max().unwrap_or(0) as f64;
        let peak = visible
            .iter()
            .filter_map(|r| r.value(Field::Emissions))
            .fold(0.0, f64::max);
        let x = LinearScale::new((first, last), self.x_range());
        let y = LinearScale::new((0.0, peak), self.y_range()).nice(10);

        self.axis_bottom(&x, 10, |v| format!("{v:.0}"));
        self.axis_left(&y, 10, format_quantity);

        let points: Vec<(f64, f64, &Record)> = visible
            .iter()
            .filter_map(|r| {
                let year = r.value(Field::Year)?;
                let value = r.value(Field::Emissions)?;
                Some((x.map(year), y.map(value), *r))
            })
            .collect();

        if let CountryFilter::Only(_) = selection.country {
            let path: Vec<(f64, f64)> = points.iter().map(|(px, py, _)| (*px, *py)).collect();
            self.surface.push(
                "line",
                Mark::new(MarkKind::Path, "line datum")
                    .attr("d", path_data(&path))
                    .attr("fill", "none")
                    .attr("stroke", "#ff7043")
                    .attr("stroke-width", 1.5),
            );
        }

        for (px, py, record) in points {
            let dot = Mark::new(MarkKind::Circle, "dot datum")
                .num("cx", px)
                .num("cy", py)
                .num("r", 3.0)
                .attr("fill", "#ff7043");
            let text = format!(
                "{}, {}\n{} t",
                record.country().unwrap_or_default(),
                record.year().unwrap_or_default(),
                format_quantity(record.value(Field::Emissions).unwrap_or_default())
            );
            self.surface.push_hoverable("dot", dot, text);
        }
    }

    fn axis_bottom(&mut self, x: &LinearScale, count: usize, format: impl Fn(f64) -> String) {
        let baseline = self.config.plot_bottom();
        self.axis_line(x.range.0, baseline, x.range.1, baseline);
        for tick in x.ticks(count) {
            self.tick_x(x.map(tick), baseline, format(tick), false);
        }
    }

    fn axis_band(&mut self, x: &BandScale, rotate: bool, format: impl Fn(&str) -> String) {
        let baseline = self.config.plot_bottom();
        self.axis_line(x.range.0, baseline, x.range.1, baseline);
        for label in &x.domain {
            if let Some(center) = x.center(label) {
                self.tick_x(center, baseline, format(label), rotate);
            }
        }
    }

    fn axis_left(&mut self, y: &LinearScale, count: usize, format: impl Fn(f64) -> String) {
        let edge = self.config.plot_left();
        self.axis_line(edge, y.range.0, edge, y.range.1);
        for tick in y.ticks(count) {
            let py = y.map(tick);
            self.surface.push(
                "tick",
                Mark::new(MarkKind::Line, "axis tick")
                    .num("x1", edge - 6.0)
                    .num("y1", py)
                    .num("x2", edge)
                    .num("y2", py)
                    .attr("stroke", "#000000"),
            );
            self.surface.push(
                "tick-label",
                Mark::new(MarkKind::Text, "axis label")
                    .num("x", edge - 9.0)
                    .num("y", py + 4.0)
                    .attr("text-anchor", "end")
                    .attr("font-size", 10)
                    .text(format(tick)),
            );
        }
    }

    fn axis_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        self.surface.push(
            "axis",
            Mark::new(MarkKind::Line, "axis domain")
                .num("x1", x1)
                .num("y1", y1)
                .num("x2", x2)
                .num("y2", y2)
                .attr("stroke", "#000000"),
        );
    }

    fn tick_x(&mut self, px: f64, baseline: f64, label: String, rotate: bool) {
        self.surface.push(
            "tick",
            Mark::new(MarkKind::Line, "axis tick")
                .num("x1", px)
                .num("y1", baseline)
                .num("x2", px)
                .num("y2", baseline + 6.0)
                .attr("stroke", "#000000"),
        );
        let mut text = Mark::new(MarkKind::Text, "axis label")
            .num("x", px)
            .num("y", baseline + 18.0)
            .attr("font-size", 10);
        text = if rotate {
            text.attr("text-anchor", "end").attr(
                "transform",
                format!("rotate(-30 {} {})", fmt_num(px), fmt_num(baseline + 18.0)),
            )
        } else {
            text.attr("text-anchor", "middle")
        };
        self.surface.push("tick-label", text.text(label));
    }

    fn legend(&mut self, series: &[Series]) {
        let left = self.config.plot_right() - 110.0;
        for (i, s) in series.iter().enumerate() {
            let top = self.config.plot_top() + i as f64 * 18.0;
            self.surface.push(
                "legend",
                Mark::new(MarkKind::Rect, "legend swatch")
                    .num("x", left)
                    .num("y", top)
                    .num("width", 12.0)
                    .num("height", 12.0)
                    .attr("fill", s.color),
            );
            self.surface.push(
                "legend-label",
                Mark::new(MarkKind::Text, "legend label")
                    .num("x", left + 18.0)
                    .num("y", top + 10.0)
                    .attr("font-size", 12)
                    .text(s.label),
            );
        }
    }

    /// Draws each callout whose anchor resolves on the current scales.
    fn annotate(
        &mut self,
        resolve_x: impl Fn(AnchorX) -> Option<f64>,
        resolve_y: impl Fn(AnchorY) -> f64,
    ) {
        for note in self.annotations {
            let Some(px) = resolve_x(note.x) else {
                continue;
            };
            let py = resolve_y(note.y);
            let (lx, ly) = (px + note.dx, py + note.dy);
            self.surface.push(
                "annotation",
                Mark::new(MarkKind::Line, "annotation connector")
                    .num("x1", px)
                    .num("y1", py)
                    .num("x2", lx)
                    .num("y2", ly)
                    .attr("stroke", "#333333"),
            );
            self.surface.push(
                "annotation",
                Mark::new(MarkKind::Text, "annotation title")
                    .num("x", lx)
                    .num("y", ly - 16.0)
                    .attr("font-weight", "bold")
                    .attr("font-size", 12)
                    .text(note.title),
            );
            self.surface.push(
                "annotation",
                Mark::new(MarkKind::Text, "annotation label")
                    .num("x", lx)
                    .num("y", ly - 2.0)
                    .attr("font-size", 12)
                    .text(note.label),
            );
        }
    }
}

fn path_data(points: &[(f64, f64)]) -> String {
    let mut d = String::new();
    for (i, (x, y)) in points.iter().enumerate() {
        let command = if i == 0 { 'M' } else { 'L' };
        d.push_str(&format!("{command}{},{}", fmt_num(*x), fmt_num(*y)));
    }
    d
}

/// Compact human-readable magnitude, e.g. `1.2B` or `350M`.
pub fn format_quantity(value: f64) -> String {
    let magnitude = value.abs();
    let (scaled, suffix) = if magnitude >= 1e12 {
        (value / 1e12, "T")
    } else if magnitude >= 1e9 {
        (value / 1e9, "B")
    } else if magnitude >= 1e6 {
        (value / 1e6, "M")
    } else if magnitude >= 1e3 {
        (value / 1e3, "k")
    } else {
        (value, "")
    };
    let text = format!("{scaled:.1}");
    let text = text.strip_suffix(".0").unwrap_or(&text);
    format!("{text}{suffix}")
}
