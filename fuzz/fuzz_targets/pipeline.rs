#![no_main]

use libfuzzer_sys::fuzz_target;
use neurite_core::swc::parse_swc;
use neurite_graph::Pipeline;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(morphology) = parse_swc(text) else {
        return;
    };
    // Errors are fine; panics and non-partitioning output are not.
    if let Ok(out) = Pipeline::default().run(&morphology, None) {
        let interior: usize = out.records.iter().map(|r| r.points.len() - 1).sum();
        assert_eq!(interior + 1, out.repair.morphology.len());
    }
});
