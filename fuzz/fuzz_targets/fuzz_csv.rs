#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(ds) = ev_market_analyzer::io::read_csv_from_bytes(data, "fuzz") {
        assert_eq!(ds.len() + ds.rows_dropped, ds.rows_read);
    }
});
