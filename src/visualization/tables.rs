use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, ContentArrangement, Table};

use crate::analysis::{
    CategoryCount, Forecast, GroupedCount, GroupedMean, MarketReport, RangeDistribution,
    YearlyCounts, YearlyMean,
};

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn heading(title: &str, rule: usize) -> String {
    format!("\n{}\n{}\n", title.bold().green(), "=".repeat(rule))
}

fn percent(count: u64, total: u64) -> String {
    if total == 0 {
        return "0.0%".to_string();
    }
    format!("{:.1}%", count as f64 / total as f64 * 100.0)
}

/// Format the dataset overview as a string.
pub fn format_dataset_summary(report: &MarketReport) -> String {
    let mut output = heading("Dataset Summary", 50);

    let mut table = new_table(vec!["Metric", "Value"]);
    table.add_row(vec![Cell::new("Dataset"), Cell::new(&report.dataset_name)]);
    table.add_row(vec![
        Cell::new("Rows Read"),
        Cell::new(format!("{}", report.rows_read)),
    ]);
    table.add_row(vec![
        Cell::new("Rows Dropped (missing values)"),
        Cell::new(format!("{}", report.rows_dropped)),
    ]);
    table.add_row(vec![
        Cell::new("Vehicles Analyzed"),
        Cell::new(format!("{}", report.adoption_by_year.total())),
    ]);
    if let (Some(first), Some(last)) = (
        report.adoption_by_year.first_year(),
        report.adoption_by_year.last_year(),
    ) {
        table.add_row(vec![
            Cell::new("Model Years"),
            Cell::new(format!("{first}-{last}")),
        ]);
    }
    let dist = &report.range_distribution;
    table.add_row(vec![
        Cell::new("Mean Electric Range"),
        Cell::new(format!("{:.2} miles", dist.mean)),
    ]);

    output.push_str(&format!("{table}"));
    output
}

/// Print the dataset overview.
pub fn print_dataset_summary(report: &MarketReport) {
    print!("{}", format_dataset_summary(report));
}

/// Format registrations per model year as a string.
pub fn format_yearly_counts(counts: &YearlyCounts) -> String {
    let mut output = heading("EV Adoption Over Time", 50);
    let total = counts.total();

    let mut table = new_table(vec!["Model Year", "Vehicles", "% of Total"]);
    for entry in counts.entries() {
        table.add_row(vec![
            Cell::new(format!("{}", entry.year)),
            Cell::new(format!("{}", entry.count)),
            Cell::new(percent(entry.count, total)),
        ]);
    }

    output.push_str(&format!("{table}"));
    output
}

pub fn print_yearly_counts(counts: &YearlyCounts) {
    print!("{}", format_yearly_counts(counts));
}

/// Format a ranked single-key count table as a string.
pub fn format_category_table(title: &str, column: &str, counts: &[CategoryCount]) -> String {
    let mut output = heading(title, 50);
    let total: u64 = counts.iter().map(|c| c.count).sum();

    let mut table = new_table(vec!["#", column, "Vehicles", "Share"]);
    for (rank, c) in counts.iter().enumerate() {
        table.add_row(vec![
            Cell::new(format!("{}", rank + 1)),
            Cell::new(&c.label),
            Cell::new(format!("{}", c.count)),
            Cell::new(percent(c.count, total)),
        ]);
    }

    output.push_str(&format!("{table}"));
    output
}

pub fn print_category_table(title: &str, column: &str, counts: &[CategoryCount]) {
    print!("{}", format_category_table(title, column, counts));
}

/// Format a ranked (group, label) count table as a string.
pub fn format_grouped_table(
    title: &str,
    group_column: &str,
    label_column: &str,
    counts: &[GroupedCount],
) -> String {
    let mut output = heading(title, 60);

    let mut table = new_table(vec!["#", group_column, label_column, "Vehicles"]);
    for (rank, c) in counts.iter().enumerate() {
        table.add_row(vec![
            Cell::new(format!("{}", rank + 1)),
            Cell::new(&c.group),
            Cell::new(&c.label),
            Cell::new(format!("{}", c.count)),
        ]);
    }

    output.push_str(&format!("{table}"));
    output
}

pub fn print_grouped_table(
    title: &str,
    group_column: &str,
    label_column: &str,
    counts: &[GroupedCount],
) {
    print!(
        "{}",
        format_grouped_table(title, group_column, label_column, counts)
    );
}

/// Format models ranked by mean electric range as a string.
pub fn format_range_ranking(models: &[GroupedMean]) -> String {
    let mut output = heading("Top Models by Average Electric Range", 60);

    let mut table = new_table(vec!["#", "Make", "Model", "Mean Range (mi)", "Vehicles"]);
    for (rank, m) in models.iter().enumerate() {
        table.add_row(vec![
            Cell::new(format!("{}", rank + 1)),
            Cell::new(&m.group),
            Cell::new(&m.label),
            Cell::new(format!("{:.1}", m.mean)),
            Cell::new(format!("{}", m.count)),
        ]);
    }

    output.push_str(&format!("{table}"));
    output
}

pub fn print_range_ranking(models: &[GroupedMean]) {
    print!("{}", format_range_ranking(models));
}

/// Format the electric range distribution summary as a string.
pub fn format_range_summary(dist: &RangeDistribution, by_year: &[YearlyMean]) -> String {
    let mut output = heading("Electric Range", 50);

    let mut table = new_table(vec!["Statistic", "Value"]);
    table.add_row(vec![
        Cell::new("Vehicles"),
        Cell::new(format!("{}", dist.sample_size)),
    ]);
    table.add_row(vec![Cell::new("Mean"), Cell::new(format!("{:.2} mi", dist.mean))]);
    table.add_row(vec![
        Cell::new("Std Dev"),
        Cell::new(format!("{:.2} mi", dist.std_dev)),
    ]);
    table.add_row(vec![Cell::new("Min"), Cell::new(format!("{:.0} mi", dist.min))]);
    table.add_row(vec![Cell::new("Max"), Cell::new(format!("{:.0} mi", dist.max))]);
    table.add_row(vec![
        Cell::new("Histogram"),
        Cell::new(format!(
            "{} bins of {:.1} mi",
            dist.bins.len(),
            dist.bin_width()
        )),
    ]);
    output.push_str(&format!("{table}\n"));

    if !by_year.is_empty() {
        let mut years = new_table(vec!["Model Year", "Mean Range (mi)", "Vehicles"]);
        for m in by_year {
            years.add_row(vec![
                Cell::new(format!("{}", m.year)),
                Cell::new(format!("{:.1}", m.mean)),
                Cell::new(format!("{}", m.count)),
            ]);
        }
        output.push_str(&format!("{years}"));
    }
    output
}

pub fn print_range_summary(dist: &RangeDistribution, by_year: &[YearlyMean]) {
    print!("{}", format_range_summary(dist, by_year));
}

/// Format the fitted growth curve and its projections as a string.
pub fn format_forecast_table(forecast: &Forecast) -> String {
    let fit = &forecast.fit;
    let mut output = String::new();
    output.push_str(&format!("\n{}\n", "Market Size Forecast".bold().green()));
    output.push_str(&format!(
        "{}\n",
        format!(
            "y = a * exp(b * (year - {})) | fitted on {} years | RSS {:.1}",
            forecast.base_year, fit.sample_size, fit.rss
        )
        .dimmed()
    ));
    output.push_str(&format!("{}\n", "=".repeat(60)));

    let mut params = new_table(vec!["Parameter", "Estimate", "Std Error"]);
    let (se_a, se_b) = match fit.std_errors() {
        Some((a, b)) => (format!("{a:.4}"), format!("{b:.4}")),
        None => ("n/a".to_string(), "n/a".to_string()),
    };
    params.add_row(vec![
        Cell::new("a (base-year level)"),
        Cell::new(format!("{:.4}", fit.params.a)),
        Cell::new(se_a),
    ]);
    params.add_row(vec![
        Cell::new("b (growth rate)"),
        Cell::new(format!("{:.4}", fit.params.b)),
        Cell::new(se_b),
    ]);
    params.add_row(vec![
        Cell::new("Annual growth"),
        Cell::new(format!("{:.1}%", fit.annual_growth_percent())),
        Cell::new(""),
    ]);
    if let Ok((lo, hi)) = fit.growth_rate_interval(0.95) {
        params.add_row(vec![
            Cell::new("b 95% CI"),
            Cell::new(format!("{lo:.4} to {hi:.4}")),
            Cell::new(""),
        ]);
    }
    output.push_str(&format!("{params}\n"));

    let mut table = new_table(vec!["Year", "Registrations", "Source"]);
    for h in &forecast.historical {
        table.add_row(vec![
            Cell::new(format!("{}", h.year)),
            Cell::new(format!("{}", h.count)),
            Cell::new("historical"),
        ]);
    }
    for p in &forecast.projected {
        table.add_row(vec![
            Cell::new(format!("{}", p.year)),
            Cell::new(format!("{:.0}", p.predicted)),
            Cell::new("forecast"),
        ]);
    }

    output.push_str(&format!("{table}"));
    output
}

/// Print the forecast tables.
pub fn print_forecast_table(forecast: &Forecast) {
    print!("{}", format_forecast_table(forecast));
}
