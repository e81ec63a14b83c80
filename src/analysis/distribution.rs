use serde::{Deserialize, Serialize};
use statrs::distribution::{Continuous, Normal};
use statrs::statistics::Statistics;

use crate::models::EvRecord;

/// Number of points the density curve is sampled at.
const KDE_POINTS: usize = 200;

/// A single histogram bin of electric range values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeBin {
    /// Lower bound of the bin (inclusive)
    pub lower: f64,
    /// Upper bound of the bin (exclusive, except for the last bin)
    pub upper: f64,
    /// Number of vehicles in this bin
    pub count: u64,
}

/// One sample of the kernel density curve, scaled to histogram counts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DensityPoint {
    pub x: f64,
    pub count: f64,
}

/// Distribution of electric range across the fleet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeDistribution {
    pub sample_size: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub bins: Vec<RangeBin>,
    /// Gaussian KDE (Scott's rule), empty when the values have no spread
    pub density: Vec<DensityPoint>,
}

impl RangeDistribution {
    /// Build an equal-width histogram with `bin_count` bins plus a density estimate.
    ///
    /// # Arguments
    /// * `records` - Cleaned registration records
    /// * `bin_count` - Number of histogram bins (30 in the standard report)
    pub fn from_records(records: &[EvRecord], bin_count: usize) -> Self {
        let values: Vec<f64> = records.iter().map(|r| r.electric_range).collect();
        Self::from_values(&values, bin_count)
    }

    pub fn from_values(values: &[f64], bin_count: usize) -> Self {
        let n = values.len();
        if n == 0 || bin_count == 0 {
            return RangeDistribution {
                sample_size: n,
                mean: 0.0,
                std_dev: 0.0,
                min: 0.0,
                max: 0.0,
                bins: Vec::new(),
                density: Vec::new(),
            };
        }

        let mean = values.iter().mean();
        let std_dev = if n > 1 { values.iter().std_dev() } else { 0.0 };
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        // All values identical: one bin holding everything
        if max <= min {
            return RangeDistribution {
                sample_size: n,
                mean,
                std_dev,
                min,
                max,
                bins: vec![RangeBin {
                    lower: min,
                    upper: max,
                    count: n as u64,
                }],
                density: Vec::new(),
            };
        }

        let width = (max - min) / bin_count as f64;
        let mut counts = vec![0u64; bin_count];
        for &v in values {
            let idx = (((v - min) / width).floor() as usize).min(bin_count - 1);
            counts[idx] += 1;
        }

        let bins = counts
            .into_iter()
            .enumerate()
            .map(|(i, count)| RangeBin {
                lower: min + i as f64 * width,
                upper: min + (i + 1) as f64 * width,
                count,
            })
            .collect();

        let density = kernel_density(values, std_dev, min, max, width);

        RangeDistribution {
            sample_size: n,
            mean,
            std_dev,
            min,
            max,
            bins,
            density,
        }
    }

    /// Width of each bin (0.0 when there is no spread).
    pub fn bin_width(&self) -> f64 {
        self.bins.first().map(|b| b.upper - b.lower).unwrap_or(0.0)
    }

    /// Total vehicles counted across all bins.
    pub fn total_count(&self) -> u64 {
        self.bins.iter().map(|b| b.count).sum()
    }
}

/// Gaussian KDE over `[min, max]`, scaled so the curve overlays a histogram of `bin_width`.
fn kernel_density(values: &[f64], std_dev: f64, min: f64, max: f64, bin_width: f64) -> Vec<DensityPoint> {
    let n = values.len() as f64;
    if !(std_dev > 0.0) || values.len() < 2 {
        return Vec::new();
    }
    let Ok(kernel) = Normal::new(0.0, 1.0) else {
        return Vec::new();
    };

    let bandwidth = std_dev * n.powf(-0.2);
    let step = (max - min) / (KDE_POINTS - 1) as f64;
    let scale = bin_width / bandwidth;

    (0..KDE_POINTS)
        .map(|i| {
            let x = min + i as f64 * step;
            let sum: f64 = values.iter().map(|&v| kernel.pdf((x - v) / bandwidth)).sum();
            DensityPoint { x, count: sum * scale }
        })
        .collect()
}
