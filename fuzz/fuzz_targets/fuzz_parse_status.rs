#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary response bodies must map to a state or an error, never panic
    if let Ok(state) = gridwatch::grid::parse_status_body(data) {
        let _ = state.as_str();
    }
});
