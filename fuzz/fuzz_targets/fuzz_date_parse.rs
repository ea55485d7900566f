#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&selector, rest)) = data.split_first() else {
        return;
    };
    let Ok(text) = std::str::from_utf8(rest) else {
        return;
    };
    let code = match selector % 5 {
        0 => None,
        1 => Some("102"),
        2 => Some("610"),
        3 => Some("616"),
        _ => Some("999"),
    };
    // Errors are fine, panics are bugs.
    let _ = zugferd_codec::date::parse_date(text, code);
});
