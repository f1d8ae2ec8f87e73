//! Byte-exact PCM → WAV (RIFF/WAVE) encoding.
//!
//! The container layout is the interop format consumed by the transcription
//! services:
//!
//! ```text
//! "RIFF" | u32 total-size (36 + data) | "WAVE"
//! "fmt " | u32 16 | u16 format-tag=1 | u16 channels | u32 sample-rate
//!        | u32 byte-rate | u16 block-align | u16 bits-per-sample
//! "data" | u32 data-size | <PCM payload>
//! ```
//!
//! All multi-byte integers are little-endian. Only 16-bit PCM is supported.

use super::AudioError;

/// Size of the fmt subchunk body for plain PCM.
const FMT_CHUNK_SIZE: u32 = 16;

/// PCM format tag.
const FORMAT_PCM: u16 = 1;

// ---------------------------------------------------------------------------
// encode_wav
// ---------------------------------------------------------------------------

/// Wrap raw little-endian PCM bytes in a WAV container.
///
/// `sample_rate` and `channels` must describe the actual layout of `pcm`;
/// nothing is resampled or remixed here.
///
/// # Errors
///
/// Returns [`AudioError::EncodingFailed`] when `bit_depth != 16` — the only
/// depth the accumulator produces.
pub fn encode_wav(
    pcm: &[u8],
    sample_rate: u32,
    channels: u16,
    bit_depth: u16,
) -> Result<Vec<u8>, AudioError> {
    if bit_depth != 16 {
        return Err(AudioError::EncodingFailed(format!(
            "only 16-bit PCM is supported, got {bit_depth}-bit"
        )));
    }

    let data_size = pcm.len() as u32;
    let byte_rate = sample_rate * u32::from(channels) * u32::from(bit_depth / 8);
    let block_align = channels * (bit_depth / 8);

    let mut wav = Vec::with_capacity(44 + pcm.len());

    // RIFF chunk descriptor
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_size).to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    // fmt sub-chunk
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&FMT_CHUNK_SIZE.to_le_bytes());
    wav.extend_from_slice(&FORMAT_PCM.to_le_bytes());
    wav.extend_from_slice(&channels.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&bit_depth.to_le_bytes());

    // data sub-chunk
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_size.to_le_bytes());
    wav.extend_from_slice(pcm);

    Ok(wav)
}

// ---------------------------------------------------------------------------
// WavFormat
// ---------------------------------------------------------------------------

/// Header fields recovered from a WAV byte buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavFormat {
    pub format_tag: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bit_depth: u16,
    /// Length of the data payload in bytes.
    pub data_len: usize,
}

impl WavFormat {
    /// Parse the RIFF/fmt/data headers of a WAV buffer produced by
    /// [`encode_wav`].
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::EncodingFailed`] when any header byte deviates
    /// from the layout above.
    pub fn parse(wav: &[u8]) -> Result<Self, AudioError> {
        let bad = |what: &str| AudioError::EncodingFailed(format!("malformed WAV: {what}"));

        if wav.len() < 44 {
            return Err(bad("shorter than the 44-byte header"));
        }
        if &wav[0..4] != b"RIFF" || &wav[8..12] != b"WAVE" {
            return Err(bad("missing RIFF/WAVE magic"));
        }
        if &wav[12..16] != b"fmt " {
            return Err(bad("missing fmt subchunk"));
        }
        if u32::from_le_bytes([wav[16], wav[17], wav[18], wav[19]]) != FMT_CHUNK_SIZE {
            return Err(bad("unexpected fmt chunk size"));
        }
        if &wav[36..40] != b"data" {
            return Err(bad("missing data subchunk"));
        }

        let data_len = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]) as usize;
        if wav.len() != 44 + data_len {
            return Err(bad("data size does not match payload length"));
        }

        Ok(Self {
            format_tag: u16::from_le_bytes([wav[20], wav[21]]),
            channels: u16::from_le_bytes([wav[22], wav[23]]),
            sample_rate: u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]),
            byte_rate: u32::from_le_bytes([wav[28], wav[29], wav[30], wav[31]]),
            block_align: u16::from_le_bytes([wav[32], wav[33]]),
            bit_depth: u16::from_le_bytes([wav[34], wav[35]]),
            data_len,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_layout_is_byte_exact() {
        let pcm = [0x01_u8, 0x02, 0x03, 0x04];
        let wav = encode_wav(&pcm, 48_000, 1, 16).unwrap();

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(u32::from_le_bytes(wav[4..8].try_into().unwrap()), 36 + 4);
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(u32::from_le_bytes(wav[16..20].try_into().unwrap()), 16);
        // format tag = 1 (PCM)
        assert_eq!(u16::from_le_bytes(wav[20..22].try_into().unwrap()), 1);
        assert_eq!(u16::from_le_bytes(wav[22..24].try_into().unwrap()), 1);
        assert_eq!(u32::from_le_bytes(wav[24..28].try_into().unwrap()), 48_000);
        // byte rate = 48000 * 1 * 2
        assert_eq!(u32::from_le_bytes(wav[28..32].try_into().unwrap()), 96_000);
        // block align = 1 * 2
        assert_eq!(u16::from_le_bytes(wav[32..34].try_into().unwrap()), 2);
        assert_eq!(u16::from_le_bytes(wav[34..36].try_into().unwrap()), 16);
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(u32::from_le_bytes(wav[40..44].try_into().unwrap()), 4);
        assert_eq!(&wav[44..], &pcm);
    }

    #[test]
    fn round_trip_recovers_format() {
        let pcm: Vec<u8> = (0..=255).collect();
        let wav = encode_wav(&pcm, 44_100, 2, 16).unwrap();

        let fmt = WavFormat::parse(&wav).unwrap();
        assert_eq!(fmt.format_tag, 1);
        assert_eq!(fmt.channels, 2);
        assert_eq!(fmt.sample_rate, 44_100);
        assert_eq!(fmt.byte_rate, 44_100 * 2 * 2);
        assert_eq!(fmt.block_align, 4);
        assert_eq!(fmt.bit_depth, 16);
        assert_eq!(fmt.data_len, pcm.len());
    }

    #[test]
    fn total_length_is_header_plus_payload() {
        let pcm = vec![0_u8; 1000];
        let wav = encode_wav(&pcm, 16_000, 1, 16).unwrap();
        assert_eq!(wav.len(), 44 + 1000);
    }

    #[test]
    fn empty_pcm_encodes_with_zero_data_size() {
        let wav = encode_wav(&[], 16_000, 1, 16).unwrap();
        assert_eq!(wav.len(), 44);
        assert_eq!(WavFormat::parse(&wav).unwrap().data_len, 0);
    }

    #[test]
    fn non_16_bit_depth_is_rejected() {
        for depth in [8_u16, 24, 32] {
            let err = encode_wav(&[0, 0], 16_000, 1, depth).unwrap_err();
            assert!(matches!(err, AudioError::EncodingFailed(_)), "{depth}-bit");
        }
    }

    #[test]
    fn parse_rejects_truncated_buffer() {
        let wav = encode_wav(&[0, 0], 16_000, 1, 16).unwrap();
        assert!(WavFormat::parse(&wav[..40]).is_err());
    }

    #[test]
    fn parse_rejects_wrong_magic() {
        let mut wav = encode_wav(&[0, 0], 16_000, 1, 16).unwrap();
        wav[0] = b'X';
        assert!(WavFormat::parse(&wav).is_err());
    }
}
