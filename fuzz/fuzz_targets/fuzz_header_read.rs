#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(header) = zugferd_codec::xml::read_header(s) {
            if let Some(urn) = header.guideline_urn.as_deref() {
                let _ = zugferd_codec::profile::profile_from_urn(header.version, urn);
            }
        }
    }
});
