#![no_main]
use libfuzzer_sys::fuzz_target;
use isf_codec::{AlgoModule, DEFAULT_COMPRESSION};

// First byte is the requested descriptor, the rest little-endian samples.
fuzz_target!(|data: &[u8]| {
    let Some((&requested, rest)) = data.split_first() else {
        return;
    };
    let samples: Vec<i32> = rest
        .chunks_exact(4)
        .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    if samples.is_empty() {
        return;
    }

    let mut algo = AlgoModule::new();
    for requested in [requested, DEFAULT_COMPRESSION] {
        let Ok(packed) = algo.compress_packet_data(&samples, requested) else {
            continue;
        };
        let mut out = vec![0i32; samples.len()];
        let consumed = algo
            .decompress_packet_data(&packed, &mut out)
            .expect("compressed block must decode");
        assert_eq!(out, samples);
        assert_eq!(consumed, packed.len());
    }
});
