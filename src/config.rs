use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margin {
    fn default() -> Self {
        Self {
            top: 50.0,
            right: 40.0,
            bottom: 50.0,
            left: 60.0,
        }
    }
}

/// Drawing surface geometry.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct VizConfig {
    pub width: f64,
    pub height: f64,
    pub margin: Margin,
}

impl Default for VizConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 500.0,
            margin: Margin::default(),
        }
    }
}

impl VizConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("could not open config file {}", path.display()))?;
        let config: VizConfig = serde_json::from_reader(file)
            .with_context(|| format!("could not parse config file {}", path.display()))?;
        anyhow::ensure!(
            config.plot_width() > 0.0 && config.plot_height() > 0.0,
            "margins leave no room to plot in a {}x{} surface",
            config.width,
            config.height
        );
        Ok(config)
    }

    pub fn plot_left(&self) -> f64 {
        self.margin.left
    }

    pub fn plot_right(&self) -> f64 {
        self.width - self.margin.right
    }

    pub fn plot_top(&self) -> f64 {
        self.margin.top
    }

    pub fn plot_bottom(&self) -> f64 {
        self.height - self.margin.bottom
    }

    pub fn plot_width(&self) -> f64 {
        self.plot_right() - self.plot_left()
    }

    pub fn plot_height(&self) -> f64 {
        self.plot_bottom() - self.plot_top()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"height": 600, "margin": {{"left": 80}}}}"#).unwrap();

        let config = VizConfig::from_file(file.path()).unwrap();
        assert_eq!(config.width, 800.0);
        assert_eq!(config.height, 600.0);
        assert_eq!(config.margin.left, 80.0);
        assert_eq!(config.margin.top, 50.0);
        assert_eq!(config.plot_bottom(), 550.0);
    }

    #[test]
    fn rejects_margins_wider_than_surface() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"width": 90}}"#).unwrap();

        assert!(VizConfig::from_file(file.path()).is_err());
    }
}
