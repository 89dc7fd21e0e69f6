use super::varint::{
    decode_signed, decode_unsigned, encode_signed, encode_unsigned, var_size, VarIntReader,
};
use super::*;
use crate::config::EofPolicy;
use proptest::prelude::*;

prop_compose! {
    /// Smooth pen trace: a random walk whose step drifts slowly.
    fn arb_trace()(
        start in -100_000i32..100_000,
        steps in prop::collection::vec(-8i32..=8, 1..400),
    ) -> Vec<i32> {
        let mut velocity = 0i32;
        let mut pos = start;
        steps
            .into_iter()
            .map(|accel| {
                velocity = (velocity + accel).clamp(-500, 500);
                pos = pos.saturating_add(velocity);
                pos
            })
            .collect()
    }
}

fn arb_samples() -> impl Strategy<Value = Vec<i32>> {
    prop_oneof![
        arb_trace(),
        prop::collection::vec(any::<i32>(), 1..64),
        prop::collection::vec(prop_oneof![Just(i32::MIN), Just(i32::MAX), Just(0)], 1..16),
    ]
}

proptest! {
    /// Property: unsigned varints decode to the value and length written
    #[test]
    fn prop_varint_unsigned(v in any::<u32>()) {
        let mut buf = Vec::new();
        let written = encode_unsigned(&mut buf, v).unwrap();
        prop_assert_eq!(written, var_size(v));
        let decoded = decode_unsigned(&mut buf.as_slice(), EofPolicy::Strict).unwrap();
        prop_assert_eq!(decoded, (v, var_size(v)));
    }

    /// Property: signed varints round-trip over the whole i32 range
    #[test]
    fn prop_varint_signed(v in prop_oneof![any::<i32>(), Just(i32::MIN), Just(i32::MAX)]) {
        let mut buf = Vec::new();
        let written = encode_signed(&mut buf, v).unwrap();
        let (decoded, read) = decode_signed(&mut buf.as_slice(), EofPolicy::Strict).unwrap();
        prop_assert_eq!(decoded, v);
        prop_assert_eq!(read, written);

        let mut reader = VarIntReader::new(&buf, EofPolicy::Strict);
        prop_assert_eq!(reader.read_signed().unwrap(), v);
        prop_assert_eq!(reader.position(), buf.len());
    }

    /// Property: delta-delta inverse undoes the forward transform
    #[test]
    fn prop_delta_delta_inverse(values in prop::collection::vec(any::<i32>(), 0..128)) {
        let mut forward = DeltaDelta::new();
        let mut inverse = DeltaDelta::new();
        for &v in &values {
            let t = forward.transform(v);
            prop_assert_eq!(inverse.inverse_transform(t.xf_data, t.extra).unwrap(), v);
        }
    }

    /// Property: every width reads back the low bits written
    #[test]
    fn prop_bit_stream(fields in prop::collection::vec((1u32..=32, any::<u32>()), 1..64)) {
        let mut buf = Vec::new();
        let mut writer = BitWriter::new(&mut buf);
        for &(width, value) in &fields {
            writer.write(value, width);
        }
        writer.finish();

        let mut reader = BitReader::new(&buf);
        for &(width, value) in &fields {
            let mask = if width == 32 { u32::MAX } else { (1 << width) - 1 };
            prop_assert_eq!(reader.read_bits(width).unwrap(), value & mask);
        }
    }

    /// Property: packet blocks round-trip under every request class
    #[test]
    fn prop_packet_round_trip(
        samples in arb_samples(),
        requested in prop_oneof![
            Just(DEFAULT_COMPRESSION),
            Just(NO_COMPRESSION),
            Just(DELTA_DELTA_FLAG),
            (0u8..DEFAULT_CODEC_COUNT as u8).prop_map(|i| INDEXED_HUFFMAN | i),
        ],
    ) {
        let mut algo = AlgoModule::new();
        let packed = algo.compress_packet_data(&samples, requested).unwrap();
        prop_assert_ne!(packed[0] & CLASS_MASK, DEFAULT_COMPRESSION);

        let mut out = vec![0i32; samples.len()];
        let consumed = algo.decompress_packet_data(&packed, &mut out).unwrap();
        prop_assert_eq!(&out, &samples);
        prop_assert_eq!(consumed, packed.len());
    }

    /// Property: property blocks round-trip for any length
    #[test]
    fn prop_property_round_trip(bytes in prop::collection::vec(any::<u8>(), 1..256)) {
        let mut algo = AlgoModule::new();
        let packed = algo.compress_property_data(&bytes, DEFAULT_COMPRESSION).unwrap();
        prop_assert_eq!(algo.decompress_property_data(&packed).unwrap(), bytes);
    }

    /// Property: long delta-delta packed strokes round-trip
    #[test]
    fn prop_long_delta_delta_stroke(
        steps in prop::collection::vec(-3i32..=3, 3..4000),
        start in any::<i32>(),
    ) {
        let mut velocity = 0i32;
        let mut pos = start / 2;
        let samples: Vec<i32> = steps
            .into_iter()
            .map(|accel| {
                velocity = (velocity + accel).clamp(-64, 64);
                pos = pos.saturating_add(velocity);
                pos
            })
            .collect();

        let mut algo = AlgoModule::new();
        let packed = algo.compress_packet_data(&samples, DELTA_DELTA_FLAG).unwrap();
        let mut out = vec![0i32; samples.len()];
        let consumed = algo.decompress_packet_data(&packed, &mut out).unwrap();
        prop_assert_eq!(out, samples);
        prop_assert_eq!(consumed, packed.len());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2048))]

    /// Property: decoders return a typed result for garbage under both policies
    #[test]
    fn prop_decode_garbage(
        input in prop::collection::vec(any::<u8>(), 0..64),
        len in 1usize..32,
        legacy in any::<bool>(),
    ) {
        let mut algo = AlgoModule::with_options(policy_options(legacy));
        let mut out = vec![0i32; len];
        if let Ok(consumed) = algo.decompress_packet_data(&input, &mut out) {
            prop_assert!(consumed <= input.len());
        }
        let _ = algo.decompress_property_data(&input);
    }

    /// Property: prefix blocks with arbitrary extra words never panic
    #[test]
    fn prop_decode_hostile_extra_words(
        index in 0u8..DEFAULT_CODEC_COUNT as u8,
        pairs in prop::collection::vec((any::<i32>(), any::<i32>()), 1..64),
        legacy in any::<bool>(),
    ) {
        let codec = HuffCodec::new(index).unwrap();
        let mut block = vec![INDEXED_HUFFMAN | index];
        let mut writer = BitWriter::new(&mut block);
        for &(data, extra) in &pairs {
            codec.encode(data & 0x7FFF_FFFF, extra, &mut writer);
        }
        writer.finish();

        let mut algo = AlgoModule::with_options(policy_options(legacy));
        let mut out = vec![0i32; pairs.len()];
        match algo.decompress_packet_data(&block, &mut out) {
            Ok(consumed) => prop_assert!(consumed <= block.len()),
            Err(e) => prop_assert!(matches!(e, crate::IsfError::MalformedStream(_))),
        }
    }

    /// Property: delta-delta fixed-width garbage never panics
    #[test]
    fn prop_decode_delta_delta_garbage(
        width in 0u8..32,
        payload in prop::collection::vec(any::<u8>(), 1..512),
        len in 1usize..2048,
        legacy in any::<bool>(),
    ) {
        let mut block = vec![DELTA_DELTA_FLAG | width];
        block.extend_from_slice(&payload);
        let mut algo = AlgoModule::with_options(policy_options(legacy));
        let mut out = vec![0i32; len];
        let _ = algo.decompress_packet_data(&block, &mut out);
    }
}

fn policy_options(legacy: bool) -> crate::CodecOptions {
    let policy = if legacy {
        EofPolicy::LegacySentinel
    } else {
        EofPolicy::Strict
    };
    crate::CodecOptions::default().with_eof_policy(policy)
}
