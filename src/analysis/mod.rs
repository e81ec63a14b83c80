mod aggregate;
mod analyzer;
mod distribution;
mod forecast;

pub use aggregate::{
    counts_by_year, county_counts, grouped_counts, grouped_means, make_counts,
    mean_range_by_year, records_in_top_counties, records_in_top_makes, top_cities_in_top_counties,
    top_labels, top_models_by_mean_range, top_models_in_top_makes, value_counts,
    vehicle_type_counts, CategoryCount, GroupedCount, GroupedMean, YearCount, YearlyCounts,
    YearlyMean,
};
pub use analyzer::{Analyzer, MarketReport};
pub use distribution::{DensityPoint, RangeBin, RangeDistribution};
pub use forecast::{
    fit_exponential, forecast_growth, ExponentialFit, FitParameters, Forecast, ProjectedCount,
    SolverOptions,
};
