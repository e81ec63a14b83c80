#![no_main]

use ev_market_analyzer::analysis::{forecast_growth, SolverOptions, YearlyCounts};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|pairs: Vec<(u8, u32)>| {
    let counts = YearlyCounts::from_pairs(
        pairs
            .into_iter()
            .map(|(offset, count)| (2000 + offset as i32, count as u64)),
    );
    if let Ok(forecast) = forecast_growth(&counts, None, 6, &SolverOptions::default()) {
        assert!(forecast.fit.params.a.is_finite());
        assert_eq!(forecast.projected.len(), 6);
    }
});
