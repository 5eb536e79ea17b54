use std::path::PathBuf;

use crate::error::{AudioError, Result};

/// Decoded PCM audio with interleaved samples
#[derive(Debug, Clone, PartialEq)]
pub struct AudioData {
    /// Interleaved samples in [-1.0, 1.0]
    pub samples: Vec<f32>,

    /// Sample rate (Hz)
    pub sample_rate: u32,

    /// Number of channels
    pub channels: u16,

    /// Source file the samples were decoded from
    pub file_path: PathBuf,
}

impl AudioData {
    /// Number of sample frames (one sample per channel)
    pub fn frame_count(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    /// Playable duration in seconds, `None` when the stream parameters are unknown
    pub fn duration(&self) -> Option<f64> {
        if self.sample_rate == 0 || self.channels == 0 {
            return None;
        }
        Some(self.frame_count() as f64 / self.sample_rate as f64)
    }

    fn frames_for(&self, seconds: f64) -> usize {
        (seconds * self.sample_rate as f64).round().max(0.0) as usize
    }

    /// Keep only the first `seconds` of audio
    pub fn trimmed(mut self, seconds: f64) -> Self {
        let frames = self.frames_for(seconds).min(self.frame_count());
        self.samples.truncate(frames * self.channels as usize);
        self
    }

    /// Repeat the audio end to end until it lasts exactly `seconds`
    pub fn looped(&self, seconds: f64) -> Result<Self> {
        let source_frames = self.frame_count();
        if source_frames == 0 {
            return Err(AudioError::LoopFailed {
                reason: format!("{:?} contains no samples", self.file_path),
            }
            .into());
        }
        if !seconds.is_finite() {
            return Err(AudioError::LoopFailed {
                reason: format!("cannot loop to {} seconds", seconds),
            }
            .into());
        }

        let target_len = self.frames_for(seconds) * self.channels as usize;
        let samples: Vec<f32> = self.samples.iter().copied().cycle().take(target_len).collect();

        Ok(Self {
            samples,
            sample_rate: self.sample_rate,
            channels: self.channels,
            file_path: self.file_path.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stereo_ramp(seconds: u32, sample_rate: u32) -> AudioData {
        let frames = (seconds * sample_rate) as usize;
        AudioData {
            samples: (0..frames * 2).map(|i| (i % 100) as f32 / 100.0).collect(),
            sample_rate,
            channels: 2,
            file_path: PathBuf::from("ramp.wav"),
        }
    }

    #[test]
    fn test_duration() {
        let audio = stereo_ramp(3, 1000);
        assert_eq!(audio.frame_count(), 3000);
        assert_eq!(audio.duration(), Some(3.0));
    }

    #[test]
    fn test_unknown_duration() {
        let audio = AudioData { sample_rate: 0, ..stereo_ramp(1, 1000) };
        assert_eq!(audio.duration(), None);
    }

    #[test]
    fn test_trim_keeps_prefix() {
        let audio = stereo_ramp(3, 1000);
        let prefix = audio.samples[..200].to_vec();
        let trimmed = audio.trimmed(1.5);
        assert_eq!(trimmed.duration(), Some(1.5));
        assert_eq!(&trimmed.samples[..200], prefix.as_slice());
    }

    #[test]
    fn test_loop_repeats_from_start() {
        let audio = stereo_ramp(1, 1000);
        let looped = audio.looped(2.5).unwrap();
        assert_eq!(looped.duration(), Some(2.5));
        assert_eq!(looped.samples[2000..2010], audio.samples[..10]);
    }

    #[test]
    fn test_loop_of_empty_audio_fails() {
        let audio = AudioData { samples: Vec::new(), ..stereo_ramp(1, 1000) };
        assert!(audio.looped(5.0).is_err());
    }
}
