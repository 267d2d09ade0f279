use std::fmt;
use std::path::PathBuf;

use snafu::{ensure, ResultExt};

use crate::errors::{
    FetchSnafu, HttpStatusSnafu, LoadError, MissingColumnSnafu, ParseSnafu, ReadFileSnafu,
};
use crate::models::RawRow;
use crate::variant::Variant;

/// Where the CSV resource lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Path(PathBuf),
    Url(String),
}

impl DataSource {
    pub fn parse(value: &str) -> Self {
        if value.starts_with("http://") || value.starts_with("https://") {
            DataSource::Url(value.to_string())
        } else {
            DataSource::Path(PathBuf::from(value))
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Path(path) => write!(f, "{}", path.display()),
            DataSource::Url(url) => f.write_str(url),
        }
    }
}

/// Fetches the resource and parses it into raw rows for `variant`.
pub async fn load(source: &DataSource, variant: Variant) -> Result<Vec<RawRow>, LoadError> {
    let body = fetch(source).await?;
    parse_rows(&body, variant)
}

async fn fetch(source: &DataSource) -> Result<String, LoadError> {
    match source {
        DataSource::Path(path) => tokio::fs::read_to_string(path).await.context(ReadFileSnafu {
            path: path.display().to_string(),
        }),
        DataSource::Url(url) => {
            let response = reqwest::get(url).await.context(FetchSnafu { url: url.clone() })?;
            let status = response.status();
            ensure!(
                status.is_success(),
                HttpStatusSnafu {
                    url: url.clone(),
                    status: status.as_u16(),
                }
            );
            response.text().await.context(FetchSnafu { url: url.clone() })
        }
    }
}

/// Parses CSV text, checking the header row against the variant's schema.
pub fn parse_rows(body: &str, variant: Variant) -> Result<Vec<RawRow>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers = reader.headers().context(ParseSnafu)?.clone();
    for column in variant.required_columns() {
        ensure!(
            headers.iter().any(|h| h.trim() == *column),
            MissingColumnSnafu {
                column: column.to_string(),
            }
        );
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.context(ParseSnafu)?;
        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .map(|(header, value)| (header.trim().to_string(), value.to_string()))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}
