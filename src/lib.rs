//! Exploratory analysis of electric vehicle registration data.
//!
//! Loads a registration CSV, computes adoption and market aggregates,
//! fits an exponential growth curve to yearly registrations and renders
//! static charts of the results.

pub mod analysis;
pub mod config;
pub mod error;
pub mod io;
pub mod models;
pub mod visualization;

pub use analysis::{Analyzer, Forecast, MarketReport};
pub use config::{AnalysisConfig, ChartFormat};
pub use error::EvError;
pub use io::{CsvFormat, DatasetReader};
pub use models::{EvDataset, EvRecord, VehicleType};
