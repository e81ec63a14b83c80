//! Static chart rendering with [`plotters`].
//!
//! Every chart is written to the renderer's output directory as SVG or PNG.
//! Text is laid out with the system `sans-serif` font; a missing font is a
//! [`EvError::Render`], not a panic.

use std::path::{Path, PathBuf};

use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::{debug, info};

use crate::analysis::{
    CategoryCount, Forecast, GroupedCount, GroupedMean, MarketReport, RangeDistribution,
    YearlyCounts, YearlyMean,
};
use crate::config::{ChartConfig, ChartFormat};
use crate::error::EvError;

const CAPTION_FONT: (&str, u32) = ("sans-serif", 32);
const LABEL_FONT: (&str, u32) = ("sans-serif", 16);
const DESC_FONT: (&str, u32) = ("sans-serif", 20);

const HISTORICAL_COLOR: RGBColor = RGBColor(31, 119, 180);
const FORECAST_COLOR: RGBColor = RGBColor(214, 39, 40);
const RANGE_LINE_COLOR: RGBColor = RGBColor(44, 160, 44);
const HISTOGRAM_COLOR: RGBColor = RGBColor(31, 119, 180);
const MEAN_LINE_COLOR: RGBColor = RGBColor(214, 39, 40);

const VIRIDIS: [RGBColor; 10] = [
    RGBColor(68, 1, 84),
    RGBColor(72, 40, 120),
    RGBColor(62, 74, 137),
    RGBColor(49, 104, 142),
    RGBColor(38, 130, 142),
    RGBColor(31, 158, 137),
    RGBColor(53, 183, 121),
    RGBColor(109, 205, 89),
    RGBColor(180, 222, 44),
    RGBColor(253, 231, 37),
];

const MAGMA: [RGBColor; 9] = [
    RGBColor(0, 0, 4),
    RGBColor(28, 16, 68),
    RGBColor(79, 18, 123),
    RGBColor(129, 37, 129),
    RGBColor(181, 54, 122),
    RGBColor(229, 80, 100),
    RGBColor(251, 135, 97),
    RGBColor(254, 194, 135),
    RGBColor(252, 253, 191),
];

const COOLWARM: [RGBColor; 9] = [
    RGBColor(59, 76, 192),
    RGBColor(98, 130, 234),
    RGBColor(141, 176, 254),
    RGBColor(184, 208, 249),
    RGBColor(221, 221, 221),
    RGBColor(245, 196, 173),
    RGBColor(244, 154, 123),
    RGBColor(222, 96, 77),
    RGBColor(180, 4, 38),
];

const COOL: [RGBColor; 5] = [
    RGBColor(0, 255, 255),
    RGBColor(64, 191, 255),
    RGBColor(128, 128, 255),
    RGBColor(191, 64, 255),
    RGBColor(255, 0, 255),
];

/// Sequential colour schemes used for bar fills and hue groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Palette {
    Viridis,
    Magma,
    Coolwarm,
    Cool,
}

impl Palette {
    fn colors(&self) -> &'static [RGBColor] {
        match self {
            Palette::Viridis => &VIRIDIS,
            Palette::Magma => &MAGMA,
            Palette::Coolwarm => &COOLWARM,
            Palette::Cool => &COOL,
        }
    }

    /// Colour for item `index` of `count`, spread evenly across the scheme.
    pub fn pick(&self, index: usize, count: usize) -> RGBColor {
        let colors = self.colors();
        if count <= 1 {
            return colors[colors.len() / 2];
        }
        let pos = index.min(count - 1) * (colors.len() - 1) / (count - 1);
        colors[pos]
    }
}

fn render_err<E: std::fmt::Display>(e: E) -> EvError {
    EvError::Render(e.to_string())
}

/// Label a tick only when it sits on an integer position.
fn integer_tick(v: f64) -> Option<i64> {
    ((v - v.round()).abs() < 1e-6).then(|| v.round() as i64)
}

/// Split a polyline into short segments, dropping every other one.
fn dashed(points: &[(f64, f64)], dashes_per_segment: usize, style: ShapeStyle) -> Vec<PathElement<(f64, f64)>> {
    let pieces = (dashes_per_segment * 2).max(2);
    let mut dashes = Vec::new();
    for pair in points.windows(2) {
        let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
        for k in (0..pieces).step_by(2) {
            let t0 = k as f64 / pieces as f64;
            let t1 = (k + 1) as f64 / pieces as f64;
            dashes.push(PathElement::new(
                vec![
                    (x0 + (x1 - x0) * t0, y0 + (y1 - y0) * t0),
                    (x0 + (x1 - x0) * t1, y0 + (y1 - y0) * t1),
                ],
                style,
            ));
        }
    }
    dashes
}

/// Something that can draw itself onto any plotters backend.
trait Chart {
    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> Result<(), EvError>;
}

/// One bar of a categorical bar chart; `group` selects the hue.
#[derive(Debug, Clone)]
struct Bar {
    label: String,
    group: Option<String>,
    value: f64,
}

struct VerticalBars<'a> {
    title: &'a str,
    x_desc: &'a str,
    y_desc: &'a str,
    /// (integer x position, value)
    bars: Vec<(i64, f64)>,
    palette: Palette,
}

impl Chart for VerticalBars<'_> {
    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> Result<(), EvError> {
        root.fill(&WHITE).map_err(render_err)?;

        let x_min = self.bars.iter().map(|b| b.0).min().unwrap_or(0) as f64 - 0.5;
        let x_max = self.bars.iter().map(|b| b.0).max().unwrap_or(0) as f64 + 0.5;
        let y_max = self.bars.iter().map(|b| b.1).fold(0.0, f64::max).max(1.0) * 1.1;

        let mut chart = ChartBuilder::on(root)
            .caption(self.title, CAPTION_FONT)
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(90)
            .build_cartesian_2d(x_min..x_max, 0.0..y_max)
            .map_err(render_err)?;

        let x_fmt = |v: &f64| integer_tick(*v).map(|i| i.to_string()).unwrap_or_default();
        chart
            .configure_mesh()
            .disable_x_mesh()
            .bold_line_style(BLACK.mix(0.15).stroke_width(1))
            .x_labels(self.bars.len().clamp(2, 40))
            .x_label_formatter(&x_fmt)
            .x_desc(self.x_desc)
            .y_desc(self.y_desc)
            .label_style(LABEL_FONT)
            .axis_desc_style(DESC_FONT)
            .draw()
            .map_err(render_err)?;

        let n = self.bars.len();
        chart
            .draw_series(self.bars.iter().enumerate().map(|(i, &(x, value))| {
                let x = x as f64;
                Rectangle::new([(x - 0.4, 0.0), (x + 0.4, value)], self.palette.pick(i, n).filled())
            }))
            .map_err(render_err)?;

        Ok(())
    }
}

struct HorizontalBars<'a> {
    title: &'a str,
    x_desc: &'a str,
    y_desc: &'a str,
    /// Ranked bars, first drawn at the top
    bars: Vec<Bar>,
    palette: Palette,
}

impl HorizontalBars<'_> {
    /// Distinct hue groups in order of first appearance.
    fn groups(&self) -> Vec<String> {
        let mut groups: Vec<String> = Vec::new();
        for bar in &self.bars {
            if let Some(g) = &bar.group {
                if !groups.contains(g) {
                    groups.push(g.clone());
                }
            }
        }
        groups
    }
}

impl Chart for HorizontalBars<'_> {
    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> Result<(), EvError> {
        root.fill(&WHITE).map_err(render_err)?;

        let n = self.bars.len();
        let x_max = self.bars.iter().map(|b| b.value).fold(0.0, f64::max).max(1.0) * 1.1;
        let label_width = self
            .bars
            .iter()
            .map(|b| b.label.chars().count())
            .max()
            .unwrap_or(0) as u32;

        let mut chart = ChartBuilder::on(root)
            .caption(self.title, CAPTION_FONT)
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size((label_width * 9 + 30).clamp(80, 420))
            .build_cartesian_2d(0.0..x_max, -0.5..(n as f64 - 0.5))
            .map_err(render_err)?;

        // Rank 0 sits at the top of the axis
        let position = |rank: usize| (n - 1 - rank) as f64;
        let y_fmt = |v: &f64| {
            integer_tick(*v)
                .filter(|&p| p >= 0 && (p as usize) < n)
                .map(|p| self.bars[n - 1 - p as usize].label.clone())
                .unwrap_or_default()
        };

        chart
            .configure_mesh()
            .disable_y_mesh()
            .bold_line_style(BLACK.mix(0.15).stroke_width(1))
            .y_labels(n.max(1))
            .y_label_formatter(&y_fmt)
            .x_desc(self.x_desc)
            .y_desc(self.y_desc)
            .label_style(LABEL_FONT)
            .axis_desc_style(DESC_FONT)
            .draw()
            .map_err(render_err)?;

        let groups = self.groups();
        if groups.is_empty() {
            chart
                .draw_series(self.bars.iter().enumerate().map(|(rank, bar)| {
                    let y = position(rank);
                    Rectangle::new(
                        [(0.0, y - 0.4), (bar.value, y + 0.4)],
                        self.palette.pick(rank, n).filled(),
                    )
                }))
                .map_err(render_err)?;
            return Ok(());
        }

        for (gi, group) in groups.iter().enumerate() {
            let color = self.palette.pick(gi, groups.len());
            chart
                .draw_series(
                    self.bars
                        .iter()
                        .enumerate()
                        .filter(|(_, bar)| bar.group.as_deref() == Some(group.as_str()))
                        .map(|(rank, bar)| {
                            let y = position(rank);
                            Rectangle::new([(0.0, y - 0.4), (bar.value, y + 0.4)], color.filled())
                        }),
                )
                .map_err(render_err)?
                .label(group.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 6), (x + 14, y + 6)], color.filled()));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::MiddleRight)
            .background_style(WHITE.mix(0.85))
            .border_style(BLACK)
            .label_font(LABEL_FONT)
            .draw()
            .map_err(render_err)?;

        Ok(())
    }
}

struct RangeHistogram<'a> {
    dist: &'a RangeDistribution,
}

impl Chart for RangeHistogram<'_> {
    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> Result<(), EvError> {
        root.fill(&WHITE).map_err(render_err)?;
        let dist = self.dist;

        let pad = ((dist.max - dist.min) * 0.02).max(1.0);
        let y_max = dist
            .bins
            .iter()
            .map(|b| b.count as f64)
            .chain(dist.density.iter().map(|p| p.count))
            .fold(0.0, f64::max)
            .max(1.0)
            * 1.1;

        let mut chart = ChartBuilder::on(root)
            .caption("Distribution of Electric Vehicle Ranges", CAPTION_FONT)
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(90)
            .build_cartesian_2d((dist.min - pad)..(dist.max + pad), 0.0..y_max)
            .map_err(render_err)?;

        chart
            .configure_mesh()
            .bold_line_style(BLACK.mix(0.15).stroke_width(1))
            .x_desc("Electric Range (miles)")
            .y_desc("Number of Vehicles")
            .label_style(LABEL_FONT)
            .axis_desc_style(DESC_FONT)
            .draw()
            .map_err(render_err)?;

        chart
            .draw_series(dist.bins.iter().map(|b| {
                // A zero-width bin (no spread) still gets a visible bar
                let (lo, hi) = if b.upper > b.lower {
                    (b.lower, b.upper)
                } else {
                    (b.lower - pad, b.upper + pad)
                };
                Rectangle::new([(lo, 0.0), (hi, b.count as f64)], HISTOGRAM_COLOR.mix(0.45).filled())
            }))
            .map_err(render_err)?;
        chart
            .draw_series(dist.bins.iter().filter(|b| b.count > 0).map(|b| {
                Rectangle::new([(b.lower, 0.0), (b.upper, b.count as f64)], HISTOGRAM_COLOR.stroke_width(1))
            }))
            .map_err(render_err)?;

        if !dist.density.is_empty() {
            chart
                .draw_series(LineSeries::new(
                    dist.density.iter().map(|p| (p.x, p.count)),
                    HISTOGRAM_COLOR.stroke_width(2),
                ))
                .map_err(render_err)?;
        }

        let mean_style = MEAN_LINE_COLOR.stroke_width(2);
        chart
            .draw_series(dashed(&[(dist.mean, 0.0), (dist.mean, y_max)], 20, mean_style))
            .map_err(render_err)?
            .label(format!("Mean Range: {:.2} miles", dist.mean))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], mean_style));

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.85))
            .border_style(BLACK)
            .label_font(LABEL_FONT)
            .draw()
            .map_err(render_err)?;

        Ok(())
    }
}

struct YearLine<'a> {
    title: &'a str,
    y_desc: &'a str,
    points: Vec<(f64, f64)>,
    color: RGBColor,
}

impl Chart for YearLine<'_> {
    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> Result<(), EvError> {
        root.fill(&WHITE).map_err(render_err)?;

        let x_min = self.points.iter().map(|p| p.0).fold(f64::INFINITY, f64::min) - 0.5;
        let x_max = self.points.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max) + 0.5;
        let y_max = self.points.iter().map(|p| p.1).fold(0.0, f64::max).max(1.0) * 1.1;

        let mut chart = ChartBuilder::on(root)
            .caption(self.title, CAPTION_FONT)
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(90)
            .build_cartesian_2d(x_min..x_max, 0.0..y_max)
            .map_err(render_err)?;

        let x_fmt = |v: &f64| integer_tick(*v).map(|i| i.to_string()).unwrap_or_default();
        chart
            .configure_mesh()
            .disable_x_mesh()
            .bold_line_style(BLACK.mix(0.15).stroke_width(1))
            .x_labels(self.points.len().clamp(2, 40))
            .x_label_formatter(&x_fmt)
            .x_desc("Model Year")
            .y_desc(self.y_desc)
            .label_style(LABEL_FONT)
            .axis_desc_style(DESC_FONT)
            .draw()
            .map_err(render_err)?;

        chart
            .draw_series(LineSeries::new(self.points.iter().copied(), self.color.stroke_width(2)))
            .map_err(render_err)?;
        chart
            .draw_series(self.points.iter().map(|&p| Circle::new(p, 5, self.color.filled())))
            .map_err(render_err)?;

        Ok(())
    }
}

struct ForecastPlot<'a> {
    forecast: &'a Forecast,
}

impl Chart for ForecastPlot<'_> {
    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> Result<(), EvError> {
        root.fill(&WHITE).map_err(render_err)?;

        let historical: Vec<(f64, f64)> = self
            .forecast
            .historical
            .iter()
            .map(|h| (h.year as f64, h.count as f64))
            .collect();
        let projected: Vec<(f64, f64)> = self
            .forecast
            .projected
            .iter()
            .map(|p| (p.year as f64, p.predicted))
            .collect();

        let all = historical.iter().chain(&projected);
        let x_min = all.clone().map(|p| p.0).fold(f64::INFINITY, f64::min) - 0.5;
        let x_max = all.clone().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max) + 0.5;
        let y_max = all
            .map(|p| p.1)
            .filter(|v| v.is_finite())
            .fold(0.0, f64::max)
            .max(1.0)
            * 1.1;

        let first = self.forecast.projected.first().map(|p| p.year).unwrap_or_default();
        let last = self.forecast.projected.last().map(|p| p.year).unwrap_or_default();
        let title = format!("Market Size Growth and Projection for Electric Vehicles ({first}-{last})");

        let mut chart = ChartBuilder::on(root)
            .caption(title, CAPTION_FONT)
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(100)
            .build_cartesian_2d(x_min..x_max, 0.0..y_max)
            .map_err(render_err)?;

        let x_fmt = |v: &f64| integer_tick(*v).map(|i| i.to_string()).unwrap_or_default();
        chart
            .configure_mesh()
            .disable_x_mesh()
            .bold_line_style(BLACK.mix(0.15).stroke_width(1))
            .x_labels((historical.len() + projected.len()).clamp(2, 40))
            .x_label_formatter(&x_fmt)
            .x_desc("Year")
            .y_desc("Number of Vehicles Registered")
            .label_style(LABEL_FONT)
            .axis_desc_style(DESC_FONT)
            .draw()
            .map_err(render_err)?;

        let hist_style = HISTORICAL_COLOR.stroke_width(2);
        chart
            .draw_series(LineSeries::new(historical.iter().copied(), hist_style))
            .map_err(render_err)?
            .label("Historical Data")
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], hist_style));
        chart
            .draw_series(historical.iter().map(|&p| Circle::new(p, 5, HISTORICAL_COLOR.filled())))
            .map_err(render_err)?;

        let fc_style = FORECAST_COLOR.stroke_width(2);
        chart
            .draw_series(dashed(&projected, 3, fc_style))
            .map_err(render_err)?
            .label("Forecasted Data")
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], fc_style));
        chart
            .draw_series(projected.iter().map(|&p| Circle::new(p, 5, FORECAST_COLOR.filled())))
            .map_err(render_err)?;

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.85))
            .border_style(BLACK)
            .label_font(LABEL_FONT)
            .draw()
            .map_err(render_err)?;

        Ok(())
    }
}

/// Writes charts for the market report into one output directory.
pub struct ChartRenderer {
    output_dir: PathBuf,
    format: ChartFormat,
    size: (u32, u32),
}

impl ChartRenderer {
    pub fn new(output_dir: impl Into<PathBuf>, format: ChartFormat, size: (u32, u32)) -> Self {
        Self {
            output_dir: output_dir.into(),
            format,
            size,
        }
    }

    pub fn from_config(config: &ChartConfig) -> Self {
        Self::new(
            config.output_dir.clone(),
            config.format,
            (config.width, config.height),
        )
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn render<C: Chart>(&self, stem: &str, chart: &C) -> Result<PathBuf, EvError> {
        std::fs::create_dir_all(&self.output_dir)?;
        let path = self
            .output_dir
            .join(format!("{stem}.{}", self.format.extension()));

        match self.format {
            ChartFormat::Svg => {
                let root = SVGBackend::new(&path, self.size).into_drawing_area();
                chart.draw(&root)?;
                root.present().map_err(render_err)?;
            }
            ChartFormat::Png => {
                let root = BitMapBackend::new(&path, self.size).into_drawing_area();
                chart.draw(&root)?;
                root.present().map_err(render_err)?;
            }
        }

        debug!(path = %path.display(), "rendered chart");
        Ok(path)
    }

    /// Bar chart of registrations per model year.
    pub fn adoption_by_year(&self, counts: &YearlyCounts) -> Result<PathBuf, EvError> {
        if counts.is_empty() {
            return Err(EvError::InsufficientData(
                "No model years to chart".to_string(),
            ));
        }
        let chart = VerticalBars {
            title: "EV Adoption Over Time",
            x_desc: "Model Year",
            y_desc: "Number of EVs Registered",
            bars: counts
                .entries()
                .iter()
                .map(|e| (e.year as i64, e.count as f64))
                .collect(),
            palette: Palette::Viridis,
        };
        self.render("ev_adoption_by_year", &chart)
    }

    fn category_bars(
        &self,
        stem: &str,
        title: &str,
        y_desc: &str,
        counts: &[CategoryCount],
        palette: Palette,
    ) -> Result<PathBuf, EvError> {
        if counts.is_empty() {
            return Err(EvError::InsufficientData(format!("Nothing to chart for '{title}'")));
        }
        let chart = HorizontalBars {
            title,
            x_desc: "Number of Vehicles",
            y_desc,
            bars: counts
                .iter()
                .map(|c| Bar {
                    label: c.label.clone(),
                    group: None,
                    value: c.count as f64,
                })
                .collect(),
            palette,
        };
        self.render(stem, &chart)
    }

    fn grouped_bars(&self, stem: &str, chart: HorizontalBars<'_>) -> Result<PathBuf, EvError> {
        if chart.bars.is_empty() {
            return Err(EvError::InsufficientData(format!(
                "Nothing to chart for '{}'",
                chart.title
            )));
        }
        self.render(stem, &chart)
    }

    /// Cities with the most registrations across the top counties, coloured by county.
    pub fn top_cities(&self, cities: &[GroupedCount]) -> Result<PathBuf, EvError> {
        self.grouped_bars(
            "top_cities_top_counties",
            HorizontalBars {
                title: "Top Cities in Top Counties by EV Registrations",
                x_desc: "Number of Vehicles Registered",
                y_desc: "City",
                bars: grouped_count_bars(cities),
                palette: Palette::Magma,
            },
        )
    }

    pub fn vehicle_types(&self, types: &[CategoryCount]) -> Result<PathBuf, EvError> {
        self.category_bars(
            "vehicle_types",
            "Distribution of Electric Vehicle Types",
            "EV Types",
            types,
            Palette::Coolwarm,
        )
    }

    pub fn top_makes(&self, makes: &[CategoryCount]) -> Result<PathBuf, EvError> {
        let title = format!("Top {} Most Popular Makes", makes.len());
        self.category_bars("top_makes", &title, "Make", makes, Palette::Viridis)
    }

    /// Most registered models across the top makes, coloured by make.
    pub fn top_models(&self, models: &[GroupedCount]) -> Result<PathBuf, EvError> {
        self.grouped_bars(
            "top_models_top_makes",
            HorizontalBars {
                title: "Top Models in Top Makes by EV Registrations",
                x_desc: "Number of Vehicles Registered",
                y_desc: "Model",
                bars: grouped_count_bars(models),
                palette: Palette::Viridis,
            },
        )
    }

    /// Histogram of electric range with density curve and mean marker.
    pub fn range_distribution(&self, dist: &RangeDistribution) -> Result<PathBuf, EvError> {
        if dist.bins.is_empty() {
            return Err(EvError::InsufficientData(
                "No electric range values to chart".to_string(),
            ));
        }
        self.render("electric_range_distribution", &RangeHistogram { dist })
    }

    pub fn range_by_year(&self, means: &[YearlyMean]) -> Result<PathBuf, EvError> {
        if means.is_empty() {
            return Err(EvError::InsufficientData(
                "No model years to chart".to_string(),
            ));
        }
        let chart = YearLine {
            title: "Average Electric Range by Model Year",
            y_desc: "Average Electric Range (miles)",
            points: means.iter().map(|m| (m.year as f64, m.mean)).collect(),
            color: RANGE_LINE_COLOR,
        };
        self.render("mean_range_by_year", &chart)
    }

    /// Models with the longest mean range across the top makes, coloured by make.
    pub fn top_models_by_range(&self, models: &[GroupedMean]) -> Result<PathBuf, EvError> {
        self.grouped_bars(
            "top_models_by_range",
            HorizontalBars {
                title: "Top Models by Average Electric Range in Top Makes",
                x_desc: "Average Electric Range (miles)",
                y_desc: "Model",
                bars: models
                    .iter()
                    .map(|m| Bar {
                        label: m.label.clone(),
                        group: Some(m.group.clone()),
                        value: m.mean,
                    })
                    .collect(),
                palette: Palette::Cool,
            },
        )
    }

    /// Historical registrations (solid) and the fitted projection (dashed).
    pub fn forecast(&self, forecast: &Forecast) -> Result<PathBuf, EvError> {
        if forecast.historical.is_empty() {
            return Err(EvError::InsufficientData(
                "No historical years to chart".to_string(),
            ));
        }
        self.render("market_forecast", &ForecastPlot { forecast })
    }

    /// Render the eight descriptive charts of a report.
    pub fn render_descriptive(&self, report: &MarketReport) -> Result<Vec<PathBuf>, EvError> {
        let paths = vec![
            self.adoption_by_year(&report.adoption_by_year)?,
            self.top_cities(&report.top_cities)?,
            self.vehicle_types(&report.vehicle_types)?,
            self.top_makes(&report.top_makes)?,
            self.top_models(&report.top_models)?,
            self.range_distribution(&report.range_distribution)?,
            self.range_by_year(&report.range_by_year)?,
            self.top_models_by_range(&report.top_models_by_range)?,
        ];
        info!(
            charts = paths.len(),
            dir = %self.output_dir.display(),
            "rendered descriptive charts"
        );
        Ok(paths)
    }

    /// Render every report chart followed by the forecast chart.
    pub fn render_report(
        &self,
        report: &MarketReport,
        forecast: &Forecast,
    ) -> Result<Vec<PathBuf>, EvError> {
        let mut paths = self.render_descriptive(report)?;
        paths.push(self.forecast(forecast)?);
        Ok(paths)
    }
}

fn grouped_count_bars(counts: &[GroupedCount]) -> Vec<Bar> {
    counts
        .iter()
        .map(|c| Bar {
            label: c.label.clone(),
            group: Some(c.group.clone()),
            value: c.count as f64,
        })
        .collect()
}
