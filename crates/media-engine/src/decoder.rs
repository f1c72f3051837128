//! Raw PCM narration decoding

use crate::error::{EngineError, EngineResult};
use base64::{engine::general_purpose, Engine as _};

/// Sample rate of synthesized narration
pub const NARRATION_SAMPLE_RATE: u32 = 24_000;

/// Channel count of synthesized narration
pub const NARRATION_CHANNELS: u16 = 1;

const BYTES_PER_SAMPLE: usize = 2;
const PCM16_SCALE: f32 = 32768.0;

/// Decoded, de-interleaved floating point audio
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
    frames: usize,
}

impl AudioBuffer {
    /// Builds a buffer from per-channel sample vectors of equal length
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> EngineResult<Self> {
        if sample_rate == 0 {
            return Err(EngineError::DecodeError("Sample rate must be positive".to_string()));
        }
        let frames = match channels.first() {
            Some(first) => first.len(),
            None => return Err(EngineError::DecodeError("Buffer needs at least one channel".to_string())),
        };
        if channels.iter().any(|c| c.len() != frames) {
            return Err(EngineError::DecodeError("Channels differ in length".to_string()));
        }

        Ok(Self {
            sample_rate,
            channels,
            frames,
        })
    }

    /// Silent buffer of the given length, mostly useful in tests
    pub fn silence(sample_rate: u32, channel_count: u16, frames: usize) -> EngineResult<Self> {
        Self::new(sample_rate, vec![vec![0.0; frames]; channel_count as usize])
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Length in seconds
    pub fn duration(&self) -> f64 {
        self.frames as f64 / self.sample_rate as f64
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// Sample at `frame` for output channel `channel`; channels beyond the
    /// buffer's own repeat its last channel
    pub fn sample(&self, channel: usize, frame: usize) -> f32 {
        let source = channel.min(self.channels.len().saturating_sub(1));
        self.channels
            .get(source)
            .and_then(|c| c.get(frame))
            .copied()
            .unwrap_or(0.0)
    }
}

/// Decodes signed 16-bit little-endian interleaved PCM
///
/// Each sample is divided by 32768. The byte length must be a whole number
/// of frames; an empty input yields an empty buffer.
pub fn decode_pcm16(bytes: &[u8], sample_rate: u32, channels: u16) -> EngineResult<AudioBuffer> {
    if channels == 0 {
        return Err(EngineError::DecodeError("Channel count must be positive".to_string()));
    }

    let frame_width = BYTES_PER_SAMPLE * channels as usize;
    if bytes.len() % frame_width != 0 {
        return Err(EngineError::DecodeError(format!(
            "{} bytes is not a whole number of {}-byte frames",
            bytes.len(),
            frame_width
        )));
    }

    let frames = bytes.len() / frame_width;
    let mut data = vec![Vec::with_capacity(frames); channels as usize];

    for frame in bytes.chunks_exact(frame_width) {
        for (channel, sample) in frame.chunks_exact(BYTES_PER_SAMPLE).enumerate() {
            let value = i16::from_le_bytes([sample[0], sample[1]]);
            data[channel].push(value as f32 / PCM16_SCALE);
        }
    }

    AudioBuffer::new(sample_rate, data)
}

/// Decodes base64 text carrying 16-bit PCM
pub fn decode_base64_pcm(encoded: &str, sample_rate: u32, channels: u16) -> EngineResult<AudioBuffer> {
    let bytes = general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| EngineError::DecodeError(format!("Invalid base64 audio: {}", e)))?;

    decode_pcm16(&bytes, sample_rate, channels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pcm(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    #[test]
    fn test_decode_normalizes_samples() {
        let buffer = decode_pcm16(&pcm(&[0, 16384, -32768, 32767]), NARRATION_SAMPLE_RATE, 1).unwrap();

        let samples = buffer.channel(0).unwrap();
        assert_eq!(samples[0], 0.0);
        assert_eq!(samples[1], 0.5);
        assert_eq!(samples[2], -1.0);
        assert!(samples[3] < 1.0 && samples[3] > 0.9999);
    }

    #[test]
    fn test_decode_empty_input() {
        let buffer = decode_pcm16(&[], NARRATION_SAMPLE_RATE, NARRATION_CHANNELS).unwrap();
        assert_eq!(buffer.frames(), 0);
        assert_eq!(buffer.duration(), 0.0);
    }

    #[test]
    fn test_decode_deinterleaves_stereo() {
        let buffer = decode_pcm16(&pcm(&[100, -100, 200, -200]), 8000, 2).unwrap();
        assert_eq!(buffer.frames(), 2);
        assert_eq!(buffer.channel(0).unwrap(), &[100.0 / 32768.0, 200.0 / 32768.0]);
        assert_eq!(buffer.channel(1).unwrap(), &[-100.0 / 32768.0, -200.0 / 32768.0]);
    }

    #[test]
    fn test_partial_frame_is_rejected() {
        let result = decode_pcm16(&[0, 0, 0], NARRATION_SAMPLE_RATE, 1);
        assert!(matches!(result, Err(EngineError::DecodeError(_))));

        // Whole samples but not whole stereo frames
        let result = decode_pcm16(&pcm(&[1, 2, 3]), NARRATION_SAMPLE_RATE, 2);
        assert!(matches!(result, Err(EngineError::DecodeError(_))));
    }

    #[test]
    fn test_zero_channels_or_rate_rejected() {
        assert!(decode_pcm16(&pcm(&[1]), NARRATION_SAMPLE_RATE, 0).is_err());
        assert!(decode_pcm16(&pcm(&[1]), 0, 1).is_err());
    }

    #[test]
    fn test_duration_from_frames_and_rate() {
        let buffer = decode_pcm16(&vec![0u8; 48_000], NARRATION_SAMPLE_RATE, 1).unwrap();
        assert_eq!(buffer.frames(), 24_000);
        assert!((buffer.duration() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_base64_payload_decodes() {
        let encoded = general_purpose::STANDARD.encode(pcm(&[0, 16384]));
        let buffer = decode_base64_pcm(&encoded, NARRATION_SAMPLE_RATE, 1).unwrap();
        assert_eq!(buffer.channel(0).unwrap(), &[0.0, 0.5]);
    }

    #[test]
    fn test_invalid_base64_is_decode_error() {
        let result = decode_base64_pcm("not base64!!", NARRATION_SAMPLE_RATE, 1);
        assert!(matches!(result, Err(EngineError::DecodeError(_))));
    }

    #[test]
    fn test_sample_upmixes_mono() {
        let buffer = AudioBuffer::new(8000, vec![vec![0.25, 0.5]]).unwrap();
        assert_eq!(buffer.sample(0, 1), 0.5);
        assert_eq!(buffer.sample(1, 1), 0.5);
        assert_eq!(buffer.sample(0, 5), 0.0);
    }

    #[test]
    fn test_mismatched_channels_rejected() {
        assert!(AudioBuffer::new(8000, vec![vec![0.0; 2], vec![0.0; 3]]).is_err());
        assert!(AudioBuffer::new(8000, Vec::new()).is_err());
    }
}
