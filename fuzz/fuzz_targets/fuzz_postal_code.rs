#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(raw) = std::str::from_utf8(data) {
        let accepted = gridwatch::zip::PostalCode::parse(raw).is_ok();
        assert_eq!(accepted, gridwatch::zip::is_valid_format(raw));
        if accepted {
            assert_eq!(raw.len(), gridwatch::zip::ZIP_CODE_LEN);
        }
    }
});
