use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::analysis::SolverOptions;
use crate::error::EvError;

/// Longest forecast the projection will extrapolate.
pub const MAX_HORIZON: u32 = 100;

/// Image format for rendered charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChartFormat {
    #[default]
    Svg,
    Png,
}

impl ChartFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ChartFormat::Svg => "svg",
            ChartFormat::Png => "png",
        }
    }
}

/// How many entries each ranked aggregate keeps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TopN {
    /// Counties whose cities are ranked
    pub counties: usize,
    /// Cities shown across those counties
    pub cities: usize,
    /// Makes shown in the popularity ranking
    pub makes: usize,
    /// Makes whose models are ranked
    pub model_makes: usize,
    /// Models shown across those makes
    pub models: usize,
}

impl Default for TopN {
    fn default() -> Self {
        Self {
            counties: 3,
            cities: 10,
            makes: 10,
            model_makes: 3,
            models: 10,
        }
    }
}

/// Forecast settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Last model year used for fitting; later (partial) years are ignored
    pub cutoff_year: Option<i32>,
    /// Years projected past the last historical year
    pub horizon: u32,
    pub solver: SolverOptions,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            cutoff_year: Some(2023),
            horizon: 6,
            solver: SolverOptions::default(),
        }
    }
}

/// Chart output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub output_dir: PathBuf,
    pub format: ChartFormat,
    pub width: u32,
    pub height: u32,
    /// Histogram bins for the electric range distribution
    pub range_bins: usize,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("charts"),
            format: ChartFormat::Svg,
            width: 1200,
            height: 800,
            range_bins: 30,
        }
    }
}

/// Complete analysis configuration, loadable from TOML.
///
/// Every section is optional in the file; missing keys take their defaults.
///
/// ```toml
/// [forecast]
/// cutoff_year = 2023
/// horizon = 6
///
/// [charts]
/// format = "png"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub top: TopN,
    pub forecast: ForecastConfig,
    pub charts: ChartConfig,
}

impl AnalysisConfig {
    /// Parse a TOML document and validate it.
    pub fn from_toml_str(content: &str) -> Result<Self, EvError> {
        let config: AnalysisConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, EvError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(EvError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Reject settings that would make an aggregate or chart meaningless.
    pub fn validate(&self) -> Result<(), EvError> {
        let top = &self.top;
        for (name, value) in [
            ("top.counties", top.counties),
            ("top.cities", top.cities),
            ("top.makes", top.makes),
            ("top.model_makes", top.model_makes),
            ("top.models", top.models),
            ("charts.range_bins", self.charts.range_bins),
        ] {
            if value == 0 {
                return Err(EvError::Config(format!("{name} must be at least 1")));
            }
        }
        if self.forecast.horizon == 0 {
            return Err(EvError::Config(
                "forecast.horizon must be at least 1".to_string(),
            ));
        }
        if self.forecast.horizon > MAX_HORIZON {
            return Err(EvError::Config(format!(
                "forecast.horizon must be at most {MAX_HORIZON}, got {}",
                self.forecast.horizon
            )));
        }
        if self.forecast.solver.max_iterations == 0 {
            return Err(EvError::Config(
                "forecast.solver.max_iterations must be at least 1".to_string(),
            ));
        }
        if self.charts.width < 200 || self.charts.height < 200 {
            return Err(EvError::Config(format!(
                "chart size {}x{} is too small (minimum 200x200)",
                self.charts.width, self.charts.height
            )));
        }
        Ok(())
    }
}
