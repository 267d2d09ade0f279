use std::io;

use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum LoadError {
    #[snafu(display("Unable to read data file {path}"))]
    ReadFile { path: String, source: io::Error },
    #[snafu(display("Unable to fetch data from {url}"))]
    Fetch { url: String, source: reqwest::Error },
    #[snafu(display("Data request to {url} failed with status {status}"))]
    HttpStatus { url: String, status: u16 },
    #[snafu(display("Malformed CSV data"))]
    Parse { source: csv::Error },
    #[snafu(display("Missing required column: {column}"))]
    MissingColumn { column: String },
}

#[derive(Debug, Snafu, PartialEq)]
pub enum InteractionError {
    #[snafu(display("Scene {scene} is outside 1..={max}"))]
    SceneOutOfRange { scene: u32, max: u8 },
    #[snafu(display("This presentation only advances sequentially"))]
    JumpUnsupported,
    #[snafu(display("Metric {name} is not offered here"))]
    UnknownMetric { name: String },
    #[snafu(display("No data for country {name}"))]
    UnknownCountry { name: String },
    #[snafu(display("No year range available for this dataset"))]
    NoYearRange,
    #[snafu(display("Navigation is disabled until data loads"))]
    NotLoaded,
    #[snafu(display("Unknown mark {id}"))]
    UnknownMark { id: String },
    #[snafu(display("Unrecognized command: {line}"))]
    UnknownCommand { line: String },
}
