use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};
use tracing::{debug, info};

use super::aggregate::{YearCount, YearlyCounts};
use crate::error::EvError;

/// Parameters of the growth curve `count(x) = a * e^(b * x)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitParameters {
    pub a: f64,
    pub b: f64,
}

impl FitParameters {
    /// Evaluate the curve at offset `x` (years since the base year).
    pub fn evaluate(&self, x: f64) -> f64 {
        self.a * (self.b * x).exp()
    }

    /// Residual sum of squares against paired observations.
    pub fn residual_sum_of_squares(&self, x: &[f64], y: &[f64]) -> f64 {
        x.iter()
            .zip(y)
            .map(|(&xi, &yi)| (self.evaluate(xi) - yi).powi(2))
            .sum()
    }
}

/// Levenberg-Marquardt stopping rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    /// Iterations (accepted or rejected steps) allowed per starting point
    pub max_iterations: usize,
    /// Relative reduction in the sum of squares below which the fit is converged
    pub ftol: f64,
    /// Relative step size below which the fit is converged
    pub xtol: f64,
    /// Gradient magnitude below which the fit is converged
    pub gtol: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            ftol: 1e-12,
            xtol: 1e-12,
            gtol: 1e-12,
        }
    }
}

/// Result of fitting the growth curve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExponentialFit {
    pub params: FitParameters,
    /// Residual sum of squares at the solution
    pub rss: f64,
    /// Number of data points the curve was fitted to
    pub sample_size: usize,
    /// Solver iterations used by the winning starting point
    pub iterations: usize,
    /// Parameter covariance `[[var(a), cov(a,b)], [cov(a,b), var(b)]]`,
    /// absent when there are no residual degrees of freedom
    pub covariance: Option<[[f64; 2]; 2]>,
}

impl ExponentialFit {
    /// Standard errors of `(a, b)`.
    pub fn std_errors(&self) -> Option<(f64, f64)> {
        self.covariance
            .map(|c| (c[0][0].max(0.0).sqrt(), c[1][1].max(0.0).sqrt()))
    }

    /// Two-sided confidence interval for the growth rate `b`.
    pub fn growth_rate_interval(&self, confidence: f64) -> Result<(f64, f64), EvError> {
        if !(confidence > 0.0 && confidence < 1.0) {
            return Err(EvError::Config(format!(
                "confidence level must be between 0 and 1 (exclusive), got {confidence}"
            )));
        }
        let (_, se_b) = self.std_errors().ok_or_else(|| {
            EvError::InsufficientData(
                "Need more than 2 years for a growth rate interval".to_string(),
            )
        })?;
        let df = (self.sample_size - 2) as f64;
        let t_dist = StudentsT::new(0.0, 1.0, df).map_err(|e| EvError::Fit(e.to_string()))?;
        let t_value = t_dist.inverse_cdf(1.0 - (1.0 - confidence) / 2.0);
        let margin = t_value * se_b;
        Ok((self.params.b - margin, self.params.b + margin))
    }

    /// Annual growth implied by `b`, as a percentage.
    pub fn annual_growth_percent(&self) -> f64 {
        (self.params.b.exp() - 1.0) * 100.0
    }
}

/// A single forecast year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectedCount {
    pub year: i32,
    pub predicted: f64,
}

/// Fitted curve plus its historical inputs and projected outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forecast {
    /// Year mapped to `x = 0`
    pub base_year: i32,
    pub fit: ExponentialFit,
    pub historical: Vec<YearCount>,
    pub projected: Vec<ProjectedCount>,
}

/// Sum of squares, JᵀJ and Jᵀr at `p`.
struct Linearization {
    cost: f64,
    jtj: [[f64; 2]; 2],
    jtr: [f64; 2],
}

fn linearize(p: &FitParameters, x: &[f64], y: &[f64]) -> Linearization {
    let mut lin = Linearization {
        cost: 0.0,
        jtj: [[0.0; 2]; 2],
        jtr: [0.0; 2],
    };
    for (&xi, &yi) in x.iter().zip(y) {
        let e = (p.b * xi).exp();
        let r = p.a * e - yi;
        let ja = e;
        let jb = p.a * xi * e;
        lin.cost += r * r;
        lin.jtj[0][0] += ja * ja;
        lin.jtj[0][1] += ja * jb;
        lin.jtj[1][1] += jb * jb;
        lin.jtr[0] += ja * r;
        lin.jtr[1] += jb * r;
    }
    lin.jtj[1][0] = lin.jtj[0][1];
    lin
}

/// Solve a symmetric 2x2 system, `None` when it is numerically singular.
fn solve_2x2(m: [[f64; 2]; 2], rhs: [f64; 2]) -> Option<[f64; 2]> {
    let det = m[0][0] * m[1][1] - m[0][1] * m[1][0];
    let scale = (m[0][0] * m[1][1]).abs().max((m[0][1] * m[1][0]).abs());
    if !det.is_finite() || det.abs() <= f64::EPSILON * scale || det == 0.0 {
        return None;
    }
    let s0 = (rhs[0] * m[1][1] - rhs[1] * m[0][1]) / det;
    let s1 = (m[0][0] * rhs[1] - m[1][0] * rhs[0]) / det;
    (s0.is_finite() && s1.is_finite()).then_some([s0, s1])
}

fn invert_2x2(m: [[f64; 2]; 2]) -> Option<[[f64; 2]; 2]> {
    let c0 = solve_2x2(m, [1.0, 0.0])?;
    let c1 = solve_2x2(m, [0.0, 1.0])?;
    Some([[c0[0], c1[0]], [c0[1], c1[1]]])
}

/// Damped Gauss-Newton iterations from a single starting point.
fn levenberg_marquardt(
    start: FitParameters,
    x: &[f64],
    y: &[f64],
    options: &SolverOptions,
) -> Result<(FitParameters, f64, usize), EvError> {
    let mut p = start;
    let mut lin = linearize(&p, x, y);
    if !lin.cost.is_finite() {
        return Err(EvError::Fit(format!(
            "residuals are not finite at starting point a={}, b={}",
            start.a, start.b
        )));
    }

    let mut lambda: f64 = 1e-3;

    for iteration in 1..=options.max_iterations {
        if lin.jtr[0].abs().max(lin.jtr[1].abs()) <= options.gtol {
            return Ok((p, lin.cost, iteration));
        }

        // Marquardt scaling: damp along the diagonal of JᵀJ
        let damped = [
            [lin.jtj[0][0] * (1.0 + lambda), lin.jtj[0][1]],
            [lin.jtj[1][0], lin.jtj[1][1] * (1.0 + lambda)],
        ];
        let step = solve_2x2(damped, [-lin.jtr[0], -lin.jtr[1]]).ok_or_else(|| {
            EvError::Fit(format!(
                "singular Jacobian at a={:.6e}, b={:.6e} after {iteration} iterations",
                p.a, p.b
            ))
        })?;

        let trial = FitParameters {
            a: p.a + step[0],
            b: p.b + step[1],
        };
        let param_norm = (p.a * p.a + p.b * p.b).sqrt();
        let step_norm = (step[0] * step[0] + step[1] * step[1]).sqrt();
        let small_step = step_norm <= options.xtol * (param_norm + options.xtol);

        let trial_lin = linearize(&trial, x, y);
        if trial_lin.cost.is_finite() && trial_lin.cost < lin.cost {
            let reduction = lin.cost - trial_lin.cost;
            p = trial;
            lin = trial_lin;
            lambda = (lambda / 10.0).max(1e-300);
            if reduction <= options.ftol * lin.cost.max(f64::MIN_POSITIVE) || small_step {
                return Ok((p, lin.cost, iteration));
            }
        } else {
            if small_step {
                return Ok((p, lin.cost, iteration));
            }
            lambda *= 10.0;
        }
    }

    Err(EvError::Fit(format!(
        "did not converge within {} iterations",
        options.max_iterations
    )))
}

/// Starting points tried in order: log-linear estimate, then the constant mean.
fn starting_points(x: &[f64], y: &[f64]) -> Vec<FitParameters> {
    let n = y.len() as f64;
    let mean_y = y.iter().sum::<f64>() / n;
    let mut starts = Vec::with_capacity(2);

    if y.iter().all(|&v| v > 0.0) {
        let ln_y: Vec<f64> = y.iter().map(|v| v.ln()).collect();
        let mean_x = x.iter().sum::<f64>() / n;
        let mean_ln = ln_y.iter().sum::<f64>() / n;
        let sxx: f64 = x.iter().map(|xi| (xi - mean_x).powi(2)).sum();
        let sxy: f64 = x
            .iter()
            .zip(&ln_y)
            .map(|(xi, li)| (xi - mean_x) * (li - mean_ln))
            .sum();
        if sxx > 0.0 {
            let b = sxy / sxx;
            let a = (mean_ln - b * mean_x).exp();
            if a.is_finite() && b.is_finite() {
                starts.push(FitParameters { a, b });
            }
        }
    }

    starts.push(FitParameters { a: mean_y, b: 0.0 });
    starts
}

/// Fit `y = a * e^(b * x)` by nonlinear least squares.
///
/// Fails when fewer than two distinct `x` values exist or when no starting
/// point converges. The returned fit never has a larger residual sum of
/// squares than the constant-mean model.
pub fn fit_exponential(
    x: &[f64],
    y: &[f64],
    options: &SolverOptions,
) -> Result<ExponentialFit, EvError> {
    if x.len() != y.len() {
        return Err(EvError::Fit(format!(
            "x and y lengths differ ({} vs {})",
            x.len(),
            y.len()
        )));
    }
    if x.iter().chain(y).any(|v| !v.is_finite()) {
        return Err(EvError::Fit("input contains non-finite values".to_string()));
    }

    let mut distinct: Vec<f64> = x.to_vec();
    distinct.sort_by(f64::total_cmp);
    distinct.dedup();
    if distinct.len() < 2 {
        return Err(EvError::Fit(format!(
            "need at least 2 distinct data points to fit 2 parameters, got {}",
            distinct.len()
        )));
    }

    let mut best: Option<(FitParameters, f64, usize)> = None;
    let mut first_error: Option<EvError> = None;

    for start in starting_points(x, y) {
        match levenberg_marquardt(start, x, y, options) {
            Ok(candidate) => {
                debug!(a = candidate.0.a, b = candidate.0.b, rss = candidate.1, "candidate fit");
                if best.as_ref().map_or(true, |b| candidate.1 < b.1) {
                    best = Some(candidate);
                }
            }
            Err(e) => {
                debug!(a = start.a, b = start.b, error = %e, "starting point failed");
                first_error.get_or_insert(e);
            }
        }
    }

    let Some((params, rss, iterations)) = best else {
        return Err(first_error.unwrap_or_else(|| EvError::Fit("no starting point".to_string())));
    };

    if !params.a.is_finite() || !params.b.is_finite() {
        return Err(EvError::Fit("fitted parameters are not finite".to_string()));
    }

    let n = x.len();
    let covariance = if n > 2 {
        let lin = linearize(&params, x, y);
        invert_2x2(lin.jtj).map(|inv| {
            let s2 = rss / (n - 2) as f64;
            [[inv[0][0] * s2, inv[0][1] * s2], [inv[1][0] * s2, inv[1][1] * s2]]
        })
    } else {
        None
    };

    Ok(ExponentialFit {
        params,
        rss,
        sample_size: n,
        iterations,
        covariance,
    })
}

/// Fit yearly registrations up to `cutoff` and project `horizon` years past the last one.
///
/// # Examples
///
/// ```
/// use ev_market_analyzer::analysis::{forecast_growth, SolverOptions, YearlyCounts};
///
/// let counts = YearlyCounts::from_pairs(vec![(2015, 10), (2016, 20), (2017, 45), (2018, 90)]);
/// let forecast = forecast_growth(&counts, None, 6, &SolverOptions::default()).unwrap();
/// assert!(forecast.fit.params.b > 0.0);
/// assert_eq!(forecast.projected[0].year, 2019);
/// assert!(forecast.projected[0].predicted > 90.0);
/// ```
pub fn forecast_growth(
    counts: &YearlyCounts,
    cutoff: Option<i32>,
    horizon: u32,
    options: &SolverOptions,
) -> Result<Forecast, EvError> {
    let history = match cutoff {
        Some(year) => counts.up_to(year),
        None => counts.clone(),
    };

    let (Some(base_year), Some(last_year)) = (history.first_year(), history.last_year()) else {
        return Err(EvError::Fit(
            "no yearly counts available to fit".to_string(),
        ));
    };

    let x_data: Vec<f64> = history
        .entries()
        .iter()
        .map(|e| (e.year - base_year) as f64)
        .collect();
    let y_data: Vec<f64> = history.entries().iter().map(|e| e.count as f64).collect();

    let fit = fit_exponential(&x_data, &y_data, options)?;

    let end_year = i32::try_from(horizon)
        .ok()
        .and_then(|h| last_year.checked_add(h))
        .ok_or_else(|| {
            EvError::Config(format!(
                "forecast horizon of {horizon} years past {last_year} is out of range"
            ))
        })?;

    let projected: Vec<ProjectedCount> = (last_year + 1..=end_year)
        .map(|year| ProjectedCount {
            year,
            predicted: fit.params.evaluate((year - base_year) as f64),
        })
        .collect();

    info!(
        a = fit.params.a,
        b = fit.params.b,
        base_year,
        last_year,
        horizon,
        "fitted exponential growth curve"
    );

    Ok(Forecast {
        base_year,
        fit,
        historical: history.entries().to_vec(),
        projected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> SolverOptions {
        SolverOptions::default()
    }

    fn constant_mean_rss(y: &[f64]) -> f64 {
        let mean = y.iter().sum::<f64>() / y.len() as f64;
        y.iter().map(|v| (v - mean).powi(2)).sum()
    }

    #[test]
    fn test_recovers_exact_exponential() {
        let x: Vec<f64> = (0..8).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|&xi| 50.0 * (0.3 * xi).exp()).collect();
        let fit = fit_exponential(&x, &y, &opts()).unwrap();
        assert!((fit.params.a - 50.0).abs() < 1e-6);
        assert!((fit.params.b - 0.3).abs() < 1e-9);
        assert!(fit.rss < 1e-12);
    }

    #[test]
    fn test_growth_scenario() {
        let counts = YearlyCounts::from_pairs(vec![(2015, 10), (2016, 20), (2017, 45), (2018, 90)]);
        let forecast = forecast_growth(&counts, None, 6, &opts()).unwrap();
        assert!(forecast.fit.params.b > 0.0);
        assert_eq!(forecast.base_year, 2015);
        assert_eq!(forecast.projected[0].year, 2019);
        assert!(forecast.projected[0].predicted > 90.0);
    }

    #[test]
    fn test_forecast_years_contiguous() {
        let counts = YearlyCounts::from_pairs(vec![(2015, 10), (2016, 20), (2017, 45), (2018, 90)]);
        let forecast = forecast_growth(&counts, None, 6, &opts()).unwrap();
        let years: Vec<i32> = forecast.projected.iter().map(|p| p.year).collect();
        assert_eq!(years, vec![2019, 2020, 2021, 2022, 2023, 2024]);
        for p in &forecast.projected {
            let expected = forecast.fit.params.a
                * (forecast.fit.params.b * (p.year - forecast.base_year) as f64).exp();
            assert_eq!(p.predicted, expected);
        }
    }

    #[test]
    fn test_cutoff_excludes_later_years() {
        let counts = YearlyCounts::from_pairs(vec![
            (2020, 100),
            (2021, 180),
            (2022, 350),
            (2023, 700),
            (2024, 40),
        ]);
        let forecast = forecast_growth(&counts, Some(2023), 6, &opts()).unwrap();
        assert_eq!(forecast.historical.last().unwrap().year, 2023);
        assert_eq!(forecast.projected.first().unwrap().year, 2024);
        assert_eq!(forecast.projected.last().unwrap().year, 2029);
        assert_eq!(forecast.projected.len(), 6);
    }

    #[test]
    fn test_single_year_is_fit_error() {
        let counts = YearlyCounts::from_pairs(vec![(2020, 100)]);
        let err = forecast_growth(&counts, None, 6, &opts()).unwrap_err();
        assert!(matches!(err, EvError::Fit(_)));
    }

    #[test]
    fn test_empty_after_cutoff_is_fit_error() {
        let counts = YearlyCounts::from_pairs(vec![(2024, 100), (2025, 200)]);
        let err = forecast_growth(&counts, Some(2023), 6, &opts()).unwrap_err();
        assert!(matches!(err, EvError::Fit(_)));
    }

    #[test]
    fn test_duplicate_x_only_is_fit_error() {
        let err = fit_exponential(&[1.0, 1.0, 1.0], &[2.0, 3.0, 4.0], &opts()).unwrap_err();
        assert!(err.to_string().contains("distinct"));
    }

    #[test]
    fn test_mismatched_lengths() {
        assert!(fit_exponential(&[0.0, 1.0], &[1.0], &opts()).is_err());
    }

    #[test]
    fn test_all_zero_counts_has_no_covariance() {
        let fit = fit_exponential(&[0.0, 1.0, 2.0], &[0.0, 0.0, 0.0], &opts()).unwrap();
        assert_eq!(fit.params.a, 0.0);
        assert_eq!(fit.rss, 0.0);
        // b is unidentifiable when a = 0
        assert!(fit.covariance.is_none());
    }

    #[test]
    fn test_non_finite_input_is_fit_error() {
        let err = fit_exponential(&[0.0, 1.0], &[1.0, f64::NAN], &opts()).unwrap_err();
        assert!(matches!(err, EvError::Fit(_)));
    }

    #[test]
    fn test_zero_count_is_passed_through() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0];
        let y = [0.0, 20.0, 45.0, 90.0, 200.0];
        let fit = fit_exponential(&x, &y, &opts()).unwrap();
        assert!(fit.params.b > 0.0);
        assert!(fit.rss <= constant_mean_rss(&y));
    }

    #[test]
    fn test_two_points_exact_without_covariance() {
        let fit = fit_exponential(&[0.0, 1.0], &[10.0, 30.0], &opts()).unwrap();
        assert!((fit.params.a - 10.0).abs() < 1e-6);
        assert!((fit.params.b - 3f64.ln()).abs() < 1e-6);
        assert!(fit.covariance.is_none());
        assert!(fit.growth_rate_interval(0.95).is_err());
    }

    #[test]
    fn test_iteration_limit_is_fit_error() {
        let options = SolverOptions {
            max_iterations: 1,
            ftol: 0.0,
            xtol: 0.0,
            gtol: 0.0,
        };
        let x = [0.0, 1.0, 2.0, 3.0, 4.0];
        let y = [5.0, 40.0, 12.0, 90.0, 33.0];
        let err = fit_exponential(&x, &y, &options).unwrap_err();
        assert!(err.to_string().contains("did not converge"));
    }

    #[test]
    fn test_deterministic() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [12.0, 19.0, 41.0, 77.0, 160.0, 290.0];
        let first = fit_exponential(&x, &y, &opts()).unwrap();
        let second = fit_exponential(&x, &y, &opts()).unwrap();
        assert_eq!(first.params, second.params);
    }

    #[test]
    fn test_covariance_and_interval() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [12.0, 19.0, 41.0, 77.0, 160.0, 290.0];
        let fit = fit_exponential(&x, &y, &opts()).unwrap();
        let (se_a, se_b) = fit.std_errors().unwrap();
        assert!(se_a > 0.0 && se_b > 0.0);
        let (lo, hi) = fit.growth_rate_interval(0.95).unwrap();
        assert!(lo < fit.params.b && fit.params.b < hi);
        let (lo90, hi90) = fit.growth_rate_interval(0.90).unwrap();
        assert!(hi90 - lo90 < hi - lo);
    }

    #[test]
    fn test_interval_rejects_confidence_outside_unit_range() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [12.0, 19.0, 41.0, 77.0, 160.0, 290.0];
        let fit = fit_exponential(&x, &y, &opts()).unwrap();
        for level in [1.5, 1.0, 0.0, -0.2, f64::NAN] {
            let err = fit.growth_rate_interval(level).unwrap_err();
            assert!(matches!(err, EvError::Config(_)), "level {level}");
        }
    }

    #[test]
    fn test_horizon_beyond_year_range_is_rejected() {
        let counts = YearlyCounts::from_pairs(vec![(2015, 10), (2016, 20), (2017, 45)]);
        let err = forecast_growth(&counts, None, 3_000_000_000, &opts()).unwrap_err();
        assert!(matches!(err, EvError::Config(_)));
        let err = forecast_growth(&counts, None, i32::MAX as u32, &opts()).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_annual_growth_percent() {
        let fit = fit_exponential(&[0.0, 1.0], &[100.0, 150.0], &opts()).unwrap();
        assert!((fit.annual_growth_percent() - 50.0).abs() < 1e-4);
    }

    #[test]
    fn test_decline_gives_negative_rate() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [800.0, 400.0, 210.0, 95.0];
        let fit = fit_exponential(&x, &y, &opts()).unwrap();
        assert!(fit.params.b < 0.0);
        assert!(fit.params.a > 0.0);
    }

    #[test]
    fn test_forecast_json_roundtrip() {
        let counts = YearlyCounts::from_pairs(vec![(2015, 10), (2016, 20), (2017, 45), (2018, 90)]);
        let forecast = forecast_growth(&counts, None, 3, &opts()).unwrap();
        let json = serde_json::to_string(&forecast).unwrap();
        let back: Forecast = serde_json::from_str(&json).unwrap();
        assert_eq!(back.projected.len(), 3);
        assert_eq!(back.fit.params, forecast.fit.params);
    }
}
