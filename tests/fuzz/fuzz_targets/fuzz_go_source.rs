#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Declaration extraction must fail cleanly, never panic.
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = gocobertura::source::parse_declarations("fuzz.go", s);
    }
});
