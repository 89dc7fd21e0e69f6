#![no_main]
use libfuzzer_sys::fuzz_target;
use isf_codec::{AlgoModule, CodecOptions, EofPolicy};

// First byte picks the output length, the rest is the block.
fuzz_target!(|data: &[u8]| {
    let Some((&len, block)) = data.split_first() else {
        return;
    };
    let mut out = vec![0i32; usize::from(len) + 1];

    let _ = AlgoModule::new().decompress_packet_data(block, &mut out);

    let legacy = CodecOptions::default().with_eof_policy(EofPolicy::LegacySentinel);
    let _ = AlgoModule::with_options(legacy).decompress_packet_data(block, &mut out);
});
