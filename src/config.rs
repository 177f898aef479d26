// SPDX: CC0-1.0

use crate::{Number, Window};
use anyhow::Context;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "TERMCALC_CONFIG";
pub const CONFIG_FILE: &str = "termcalc.json";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Free variable used by calculus operations and plots.
    pub variable: String,
    pub history: PathBuf,
    pub color: bool,
    pub plot: PlotConfig,
    /// How many recent entries the history command shows.
    pub history_shown: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    pub x_min: Number,
    pub x_max: Number,
    pub width: usize,
    pub height: usize,
    pub glyph: char,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            variable: String::from("x"),
            history: PathBuf::from("history.json"),
            color: true,
            plot: PlotConfig::default(),
            history_shown: 10,
        }
    }
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            x_min: -10.0,
            x_max: 10.0,
            width: 50,
            height: 15,
            glyph: '█',
        }
    }
}

impl PlotConfig {
    pub fn window(&self) -> Window {
        Window {
            x: self.x_min..self.x_max,
            width: self.width,
            height: self.height,
        }
    }
}

impl Config {
    /// `$TERMCALC_CONFIG`, else `termcalc.json` in the working directory.
    pub fn path() -> PathBuf {
        std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
    }

    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::path())
    }

    /// A missing file yields the defaults.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        info!("loaded configuration from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_gives_defaults() {
        let config = Config::load_from(Path::new("/nonexistent/termcalc.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.plot.window().x, -10.0..10.0);
    }

    #[test]
    fn partial_files_fill_in_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"variable": "t", "plot": {"width": 30}}"#).unwrap();
        assert_eq!(config.variable, "t");
        assert_eq!(config.plot.width, 30);
        assert_eq!(config.plot.height, 15);
        assert!(config.color);
    }

    #[test]
    fn malformed_files_are_errors() {
        let path = std::env::temp_dir().join(format!("termcalc-{}-config.json", std::process::id()));
        std::fs::write(&path, "{ \"width\": ").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().starts_with("invalid config file"));
        let _ = std::fs::remove_file(&path);
    }
}
