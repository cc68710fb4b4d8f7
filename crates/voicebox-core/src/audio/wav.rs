//! WAV codec.
//!
//! Mono, 16-bit little-endian PCM in a RIFF container. This is the only audio
//! representation used on the wire and on disk.

use std::io::Cursor;
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use super::AudioBuffer;
use crate::error::{VoiceboxError, VoiceboxResult};

/// Positive-side scale between normalized floats and int16 samples
pub const PCM_SCALE: f32 = 32767.0;

const CHANNELS: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;

fn pcm_spec(sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: CHANNELS,
        sample_rate,
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: SampleFormat::Int,
    }
}

/// Quantize one normalized sample, clipping to [-1, 1] and truncating toward zero
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn quantize(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * PCM_SCALE) as i16
}

/// Encode normalized samples as a WAV byte stream
///
/// # Errors
///
/// Returns `AudioFormat` if the sample rate is zero or the container cannot
/// be written.
pub fn encode(samples: &[f32], sample_rate: u32) -> VoiceboxResult<Vec<u8>> {
    if sample_rate == 0 {
        return Err(VoiceboxError::audio_format("Sample rate must be greater than 0"));
    }

    // 44-byte canonical header plus two bytes per sample
    let mut cursor = Cursor::new(Vec::with_capacity(44 + samples.len() * 2));
    {
        let mut writer = WavWriter::new(&mut cursor, pcm_spec(sample_rate))?;
        let mut pcm = writer.get_i16_writer(u32::try_from(samples.len()).map_err(|_| {
            VoiceboxError::audio_format("Too many samples for a single WAV container")
        })?);
        for &sample in samples {
            pcm.write_sample(quantize(sample));
        }
        pcm.flush()?;
        writer.finalize()?;
    }

    Ok(cursor.into_inner())
}

/// Decode a WAV byte stream back to normalized samples
///
/// # Errors
///
/// Returns `AudioFormat` for malformed containers and for anything other than
/// mono 16-bit integer PCM.
pub fn decode(bytes: &[u8]) -> VoiceboxResult<AudioBuffer> {
    let reader = WavReader::new(Cursor::new(bytes))?;
    read_pcm(reader)
}

/// Decode a WAV file produced by an external engine
///
/// # Errors
///
/// Returns `PersistenceFailure` if the file cannot be opened and
/// `AudioFormat` if its contents are not mono 16-bit PCM.
pub fn decode_file(path: &Path) -> VoiceboxResult<AudioBuffer> {
    let file = std::fs::File::open(path).map_err(|e| {
        VoiceboxError::persistence(format!("Failed to open {}: {e}", path.display()))
    })?;
    let reader = WavReader::new(std::io::BufReader::new(file))?;
    read_pcm(reader)
}

fn read_pcm<R: std::io::Read>(reader: WavReader<R>) -> VoiceboxResult<AudioBuffer> {
    let spec = reader.spec();
    if spec.channels != CHANNELS
        || spec.bits_per_sample != BITS_PER_SAMPLE
        || spec.sample_format != SampleFormat::Int
    {
        return Err(VoiceboxError::audio_format(format!(
            "Unsupported WAV layout: {} channel(s), {}-bit {:?}; expected mono 16-bit PCM",
            spec.channels, spec.bits_per_sample, spec.sample_format
        )));
    }

    let samples = reader
        .into_samples::<i16>()
        .map(|sample| sample.map(|s| f32::from(s) / PCM_SCALE))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(AudioBuffer::new(samples, spec.sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_header_fields() {
        let bytes = encode(&[0.0, 0.5, -0.5], 24_000).unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
        // channels, sample rate, bits per sample
        assert_eq!(u16::from_le_bytes([bytes[22], bytes[23]]), 1);
        assert_eq!(
            u32::from_le_bytes([bytes[24], bytes[25], bytes[26], bytes[27]]),
            24_000
        );
        assert_eq!(u16::from_le_bytes([bytes[34], bytes[35]]), 16);
        assert_eq!(bytes.len(), 44 + 6);
    }

    #[test]
    fn test_quantize_clips_and_truncates() {
        assert_eq!(quantize(1.0), 32767);
        assert_eq!(quantize(4.2), 32767);
        assert_eq!(quantize(-1.0), -32767);
        assert_eq!(quantize(-7.0), -32767);
        assert_eq!(quantize(0.0), 0);
        // 0.99999 * 32767 = 32766.67..., truncated toward zero
        assert_eq!(quantize(0.99999), 32766);
        assert_eq!(quantize(-0.99999), -32766);
    }

    #[test]
    fn test_empty_buffer() {
        let bytes = encode(&[], 16_000).unwrap();
        let audio = decode(&bytes).unwrap();
        assert!(audio.samples.is_empty());
        assert_eq!(audio.sample_rate, 16_000);
    }

    #[test]
    fn test_zero_sample_rate_rejected() {
        assert!(matches!(
            encode(&[0.1], 0),
            Err(VoiceboxError::AudioFormat { .. })
        ));
    }

    #[test]
    fn test_rejects_stereo() {
        let spec = WavSpec {
            channels: 2,
            sample_rate: 8_000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
            writer.write_sample(0i16).unwrap();
            writer.write_sample(0i16).unwrap();
            writer.finalize().unwrap();
        }
        let err = decode(&cursor.into_inner()).unwrap_err();
        assert!(matches!(err, VoiceboxError::AudioFormat { .. }));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            decode(b"definitely not a wav file"),
            Err(VoiceboxError::AudioFormat { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_roundtrip_within_quantization_error(
            samples in proptest::collection::vec(-1.0f32..=1.0, 0..512),
            sample_rate in 8_000u32..48_000,
        ) {
            let audio = decode(&encode(&samples, sample_rate).unwrap()).unwrap();
            prop_assert_eq!(audio.sample_rate, sample_rate);
            prop_assert_eq!(audio.samples.len(), samples.len());
            for (original, restored) in samples.iter().zip(&audio.samples) {
                prop_assert!((original - restored).abs() <= 1.0 / PCM_SCALE + f32::EPSILON);
            }
        }
    }
}
