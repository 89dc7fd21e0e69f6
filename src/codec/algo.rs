//! Codec selection and dispatch.
//!
//! [`AlgoModule`] is the entry point for packet and property blocks. On the
//! way in it resolves the requested descriptor to a concrete codec, runs it and
//! prepends the resolved descriptor byte. On the way out it reads that byte
//! back and hands the payload to the matching decoder.

use tracing::{debug, trace};

use super::delta_delta::{DataTransform, DeltaDelta};
use super::descriptor::{
    Descriptor, CLASS_MASK, DEFAULT_COMPRESSION, INDEXED_HUFFMAN, LEMPEL_ZIV, NO_COMPRESSION,
};
use super::gorilla;
use super::huffman::HuffModule;
use super::lz::LzDecoder;
use super::varint::{encode_signed_into, VarIntReader};
use crate::config::CodecOptions;
use crate::error::{IsfError, Result};

/// Variance thresholds for picking a default prefix codec.
const DEFAULT_FIRST_SQUARE_ROOT: [f64; 8] = [1.0, 1.0, 1.0, 4.0, 9.0, 16.0, 36.0, 49.0];

/// Scale applied to the delta-delta sum of squares.
const VARIANCE_SCALE: f64 = 0.205625;

/// Compression dispatcher.
///
/// Owns one instance of every codec. The delta-delta state is reset at the
/// start of every call, so a module can be reused across strokes but must not
/// be shared between concurrent decodes.
///
/// ```rust
/// use isf_codec::{AlgoModule, DEFAULT_COMPRESSION};
///
/// let mut algo = AlgoModule::new();
/// let xs = [100, 102, 105, 109, 114, 120];
/// let packed = algo.compress_packet_data(&xs, DEFAULT_COMPRESSION).unwrap();
///
/// let mut out = [0i32; 6];
/// let consumed = algo.decompress_packet_data(&packed, &mut out).unwrap();
/// assert_eq!(out, xs);
/// assert_eq!(consumed, packed.len());
/// ```
pub struct AlgoModule {
    options: CodecOptions,
    huff: HuffModule,
    delta_delta: DataTransform,
    lz: LzDecoder,
}

impl AlgoModule {
    pub fn new() -> Self {
        Self::with_options(CodecOptions::default())
    }

    pub fn with_options(options: CodecOptions) -> Self {
        Self {
            options,
            huff: HuffModule::new(),
            delta_delta: DataTransform::delta_delta(),
            lz: LzDecoder::new(options.eof_policy),
        }
    }

    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    /// Pick the default prefix codec whose bucket layout suits `samples`.
    ///
    /// Needs at least three samples; shorter input gets [`NO_COMPRESSION`].
    pub fn get_best_default_huffman(&self, samples: &[i32]) -> u8 {
        if samples.len() < 3 {
            return NO_COMPRESSION;
        }

        let mut dd = DeltaDelta::new();
        dd.transform(samples[0]);
        dd.transform(samples[1]);

        let mut sum_sq = 0.0f64;
        for &sample in &samples[2..] {
            let t = dd.transform(sample);
            if t.extra == 0 {
                let v = t.xf_data as u32;
                sum_sq += f64::from(v.wrapping_mul(v));
            }
        }
        sum_sq *= VARIANCE_SCALE / (samples.len() as f64 - 1.0);

        let mut i = DEFAULT_FIRST_SQUARE_ROOT.len() - 2;
        while i > 0 {
            if sum_sq > DEFAULT_FIRST_SQUARE_ROOT[i] {
                break;
            }
            i -= 1;
        }

        INDEXED_HUFFMAN | (i as u8 + 1)
    }

    /// Compress one packet channel (for example every X of a stroke).
    ///
    /// `requested` is a descriptor or [`DEFAULT_COMPRESSION`]. The returned
    /// buffer starts with the descriptor that was actually used.
    pub fn compress_packet_data(&mut self, samples: &[i32], requested: u8) -> Result<Vec<u8>> {
        if samples.is_empty() {
            return Err(IsfError::InvalidArgument("no packet samples to compress"));
        }

        let mut algo = requested;
        let mut descriptor = Descriptor::parse(algo);
        if descriptor == Descriptor::Default {
            algo = self.get_best_default_huffman(samples);
            descriptor = Descriptor::parse(algo);
            debug!(requested, resolved = algo, count = samples.len(), "resolved packet codec");
        }

        let mut out = Vec::with_capacity(samples.len() * 4 + 1);
        // Descriptor slot, patched once the codec is final.
        out.push(0);

        let fixed_width = match descriptor {
            Descriptor::Indexed { .. } => {
                let (codec, xf) = self.huff.codec_and_transform(algo)?;
                codec.compress(Some(xf), samples, &mut out);
                if ((out.len() - 1) >> 2) > samples.len() {
                    debug!(
                        algo,
                        packed = out.len() - 1,
                        count = samples.len(),
                        "prefix codec larger than raw, packing instead"
                    );
                    out.truncate(1);
                    Some(false)
                } else {
                    None
                }
            }
            Descriptor::Uncompressed { delta_delta, .. } => Some(delta_delta),
            Descriptor::Default | Descriptor::Reserved(_) => {
                return Err(IsfError::UnsupportedEncode(requested))
            }
        };

        // Fixed-width packing, requested or as the Huffman fallback.
        if let Some(try_delta_delta) = fixed_width {
            algo = gorilla::find_packet_algo_byte(samples, try_delta_delta);
            let (bit_count, delta_delta) = match Descriptor::parse(algo) {
                Descriptor::Uncompressed {
                    bit_count,
                    delta_delta,
                } => (bit_count, delta_delta),
                _ => return Err(IsfError::UnsupportedEncode(algo)),
            };

            let mut start = 0;
            let transform = if delta_delta {
                let xf = &mut self.delta_delta;
                xf.reset_state();
                for &sample in &samples[..2] {
                    encode_signed_into(&mut out, xf.transform(sample).xf_data);
                }
                start = 2;
                Some(xf)
            } else {
                None
            };

            gorilla::compress(u32::from(bit_count), samples, start, transform, &mut out)?;
        }

        out[0] = algo;
        trace!(algo, count = samples.len(), bytes = out.len(), "packet block compressed");
        Ok(out)
    }

    /// Decompress one packet block into `out`, which must be sized to the
    /// expected number of samples. Returns the bytes of `input` consumed,
    /// descriptor included.
    pub fn decompress_packet_data(&mut self, input: &[u8], out: &mut [i32]) -> Result<usize> {
        if input.len() < 2 {
            return Err(IsfError::TruncatedInput {
                needed: 2,
                have: input.len(),
            });
        }
        if out.is_empty() {
            return Err(IsfError::InvalidArgument("packet output buffer is empty"));
        }

        let algo = input[0];
        let payload = &input[1..];
        let policy = self.options.eof_policy;

        match Descriptor::parse(algo) {
            Descriptor::Indexed { .. } => {
                let (codec, xf) = self.huff.codec_and_transform(algo)?;
                let consumed = codec.uncompress(Some(xf), payload, out, policy)?;
                Ok(1 + consumed)
            }
            Descriptor::Uncompressed {
                bit_count,
                delta_delta,
            } => {
                let bit_count = u32::from(bit_count);
                if !delta_delta {
                    let consumed = gorilla::uncompress(bit_count, payload, None, out, policy)?;
                    return Ok(1 + consumed);
                }

                if input.len() < 3 {
                    return Err(IsfError::TruncatedInput {
                        needed: 3,
                        have: input.len(),
                    });
                }

                let xf = &mut self.delta_delta;
                xf.reset_state();
                let mut lead = VarIntReader::new(payload, policy);
                let filled = out.len().min(2);
                for slot in &mut out[..filled] {
                    *slot = xf.inverse_transform(lead.read_signed()?, 0)?;
                }

                let head = lead.position();
                let consumed = gorilla::uncompress(
                    bit_count,
                    &payload[head..],
                    Some(xf),
                    &mut out[filled..],
                    policy,
                )?;
                Ok(1 + head + consumed)
            }
            Descriptor::Default | Descriptor::Reserved(_) => {
                debug!(algo, "packet descriptor has an invalid class");
                Err(IsfError::MalformedStream("invalid packet descriptor class"))
            }
        }
    }

    /// Compress a property value. The legacy LZ class cannot be requested.
    pub fn compress_property_data(&mut self, bytes: &[u8], requested: u8) -> Result<Vec<u8>> {
        if bytes.is_empty() {
            return Err(IsfError::InvalidArgument("no property bytes to compress"));
        }

        let mut algo = requested;
        if algo & CLASS_MASK == DEFAULT_COMPRESSION {
            algo = gorilla::find_prop_algo_byte(bytes);
            debug!(requested, resolved = algo, len = bytes.len(), "resolved property codec");
        }
        if algo & LEMPEL_ZIV != 0 {
            return Err(IsfError::UnsupportedEncode(algo));
        }

        let layout = gorilla::property_bit_count(algo);
        let units = bytes.len() / layout.encoding.unit_bytes();
        // An explicit request may carry the wrong pad count for this length.
        let algo = gorilla::property_descriptor(layout.encoding, layout.bit_count, units);

        let mut out = Vec::with_capacity(bytes.len() + 1);
        out.push(algo);
        gorilla::compress_property(layout.bit_count, bytes, layout.encoding, &mut out)?;
        trace!(algo, len = bytes.len(), bytes = out.len(), "property block compressed");
        Ok(out)
    }

    /// Decompress a property block, including legacy LZ blocks.
    pub fn decompress_property_data(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        if input.len() < 2 {
            return Err(IsfError::TruncatedInput {
                needed: 2,
                have: input.len(),
            });
        }

        let algo = input[0];
        let payload = &input[1..];

        if algo & LEMPEL_ZIV != 0 {
            if algo != LEMPEL_ZIV {
                debug!(algo, "property descriptor mixes LZ with other bits");
                return Err(IsfError::MalformedStream("invalid property descriptor"));
            }
            return self.lz.uncompress(payload);
        }

        gorilla::uncompress_property(payload, gorilla::property_bit_count(algo))
    }
}

impl Default for AlgoModule {
    fn default() -> Self {
        Self::new()
    }
}
