mod charts;
mod tables;

pub use charts::{ChartRenderer, Palette};
pub use tables::{
    format_category_table, format_dataset_summary, format_forecast_table, format_grouped_table,
    format_range_ranking, format_range_summary, format_yearly_counts, print_category_table,
    print_dataset_summary, print_forecast_table, print_grouped_table, print_range_ranking,
    print_range_summary, print_yearly_counts,
};
