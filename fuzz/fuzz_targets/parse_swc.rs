#![no_main]

use libfuzzer_sys::fuzz_target;
use neurite_core::swc::{parse_swc, to_swc_string};
use neurite_core::validate::validate_fields;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(morphology) = parse_swc(text) else {
        return;
    };
    // NaN never compares equal.
    if validate_fields(&morphology).is_ok() {
        let written = to_swc_string(&morphology);
        let reparsed = parse_swc(&written).expect("written SWC must parse");
        assert_eq!(reparsed, morphology);
    }
});
