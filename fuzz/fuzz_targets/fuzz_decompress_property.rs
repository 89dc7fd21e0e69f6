#![no_main]
use libfuzzer_sys::fuzz_target;
use isf_codec::{AlgoModule, CodecOptions, EofPolicy};

fuzz_target!(|data: &[u8]| {
    // Should never panic
    let _ = AlgoModule::new().decompress_property_data(data);

    let legacy = CodecOptions::default().with_eof_policy(EofPolicy::LegacySentinel);
    let _ = AlgoModule::with_options(legacy).decompress_property_data(data);
});
