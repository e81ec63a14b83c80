use serde::{Deserialize, Serialize};

use crate::analysis::{
    county_counts, counts_by_year, forecast_growth, make_counts, mean_range_by_year,
    top_cities_in_top_counties, top_models_by_mean_range, top_models_in_top_makes,
    vehicle_type_counts, CategoryCount, Forecast, GroupedCount, GroupedMean, RangeDistribution,
    YearlyCounts, YearlyMean,
};
use crate::config::AnalysisConfig;
use crate::error::EvError;
use crate::models::EvDataset;

/// Every aggregate of the standard market report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketReport {
    pub dataset_name: String,
    pub rows_read: usize,
    pub rows_dropped: usize,
    pub adoption_by_year: YearlyCounts,
    pub top_counties: Vec<CategoryCount>,
    pub top_cities: Vec<GroupedCount>,
    pub vehicle_types: Vec<CategoryCount>,
    pub top_makes: Vec<CategoryCount>,
    pub top_models: Vec<GroupedCount>,
    pub range_distribution: RangeDistribution,
    pub range_by_year: Vec<YearlyMean>,
    pub top_models_by_range: Vec<GroupedMean>,
}

/// Unified analysis API over a cleaned dataset.
pub struct Analyzer<'a> {
    dataset: &'a EvDataset,
    config: &'a AnalysisConfig,
}

impl<'a> Analyzer<'a> {
    /// Create a new Analyzer for the given dataset and settings.
    pub fn new(dataset: &'a EvDataset, config: &'a AnalysisConfig) -> Self {
        Self { dataset, config }
    }

    pub fn adoption_by_year(&self) -> YearlyCounts {
        counts_by_year(&self.dataset.records)
    }

    /// Counties ranked by registrations, limited to the configured top counties.
    pub fn top_counties(&self) -> Vec<CategoryCount> {
        let mut counts = county_counts(&self.dataset.records);
        counts.truncate(self.config.top.counties);
        counts
    }

    pub fn top_cities(&self) -> Vec<GroupedCount> {
        top_cities_in_top_counties(
            &self.dataset.records,
            self.config.top.counties,
            self.config.top.cities,
        )
    }

    pub fn vehicle_types(&self) -> Vec<CategoryCount> {
        vehicle_type_counts(&self.dataset.records)
    }

    pub fn top_makes(&self) -> Vec<CategoryCount> {
        let mut counts = make_counts(&self.dataset.records);
        counts.truncate(self.config.top.makes);
        counts
    }

    pub fn top_models(&self) -> Vec<GroupedCount> {
        top_models_in_top_makes(
            &self.dataset.records,
            self.config.top.model_makes,
            self.config.top.models,
        )
    }

    pub fn range_distribution(&self) -> RangeDistribution {
        RangeDistribution::from_records(&self.dataset.records, self.config.charts.range_bins)
    }

    pub fn range_by_year(&self) -> Vec<YearlyMean> {
        mean_range_by_year(&self.dataset.records)
    }

    pub fn top_models_by_range(&self) -> Vec<GroupedMean> {
        top_models_by_mean_range(
            &self.dataset.records,
            self.config.top.model_makes,
            self.config.top.models,
        )
    }

    /// Fit the growth curve to yearly registrations and project forward.
    pub fn forecast(&self) -> Result<Forecast, EvError> {
        let forecast = &self.config.forecast;
        forecast_growth(
            &self.adoption_by_year(),
            forecast.cutoff_year,
            forecast.horizon,
            &forecast.solver,
        )
    }

    /// Compute every descriptive aggregate.
    pub fn report(&self) -> MarketReport {
        MarketReport {
            dataset_name: self.dataset.name.clone(),
            rows_read: self.dataset.rows_read,
            rows_dropped: self.dataset.rows_dropped,
            adoption_by_year: self.adoption_by_year(),
            top_counties: self.top_counties(),
            top_cities: self.top_cities(),
            vehicle_types: self.vehicle_types(),
            top_makes: self.top_makes(),
            top_models: self.top_models(),
            range_distribution: self.range_distribution(),
            range_by_year: self.range_by_year(),
            top_models_by_range: self.top_models_by_range(),
        }
    }
}
