use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

use crate::audio::types::AudioData;
use crate::error::{AudioError, Result};

/// Extensions considered background-music candidates (lower-case, no dot)
pub const SUPPORTED_AUDIO_EXTENSIONS: &[&str] = &["mp3", "m4a", "aac", "wav", "flac", "ogg", "opus"];

/// Audio file loader supporting multiple formats
pub struct AudioLoader;

impl AudioLoader {
    /// Load an audio file and return raw audio data
    pub fn load<P: AsRef<Path>>(path: P) -> Result<AudioData> {
        let path = path.as_ref();
        let extension = Self::detect_format(path).unwrap_or_default();

        match extension.as_str() {
            "wav" => Self::load_wav(path),
            ext if Self::is_format_supported(ext) => Self::load_with_symphonia(path),
            _ => Err(AudioError::UnsupportedFormat { format: extension }.into()),
        }
    }

    /// Load WAV files using the hound crate (most reliable for WAV)
    fn load_wav(path: &Path) -> Result<AudioData> {
        let load_failed = || AudioError::LoadFailed { path: path.display().to_string() };

        let reader = hound::WavReader::open(path).map_err(|_| load_failed())?;
        let spec = reader.spec();

        let samples = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|_| load_failed())?,
            hound::SampleFormat::Int => {
                let bit_depth = spec.bits_per_sample;
                reader
                    .into_samples::<i32>()
                    .map(|sample| sample.map(|s| Self::int_to_float(s, bit_depth)))
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(|_| load_failed())?
            }
        };

        Ok(AudioData {
            samples,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            file_path: path.to_path_buf(),
        })
    }

    /// Load compressed formats using Symphonia
    fn load_with_symphonia(path: &Path) -> Result<AudioData> {
        let load_failed = || AudioError::LoadFailed { path: path.display().to_string() };

        let file = File::open(path).map_err(|_| load_failed())?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
            hint.with_extension(extension);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|_| load_failed())?;
        let mut format = probed.format;

        // First audio track with a decodable codec
        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(load_failed)?;
        let track_id = track.id;

        let sample_rate = track.codec_params.sample_rate.ok_or_else(|| AudioError::InvalidParameters {
            details: "No sample rate found".to_string(),
        })?;
        let channels = track
            .codec_params
            .channels
            .ok_or_else(|| AudioError::InvalidParameters {
                details: "No channel information found".to_string(),
            })?
            .count() as u16;

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|_| load_failed())?;

        let mut samples = Vec::new();
        let mut sample_buf: Option<SampleBuffer<f32>> = None;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::ResetRequired) => {
                    decoder.reset();
                    continue;
                }
                // End of stream
                Err(_) => break,
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let needed = decoded.capacity() * decoded.spec().channels.count();
                    if sample_buf.as_ref().map_or(true, |buf| buf.capacity() < needed) {
                        sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, *decoded.spec()));
                    }
                    if let Some(buf) = sample_buf.as_mut() {
                        buf.copy_interleaved_ref(decoded);
                        samples.extend_from_slice(buf.samples());
                    }
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    debug!("Skipping undecodable packet in {:?}: {}", path, e);
                    continue;
                }
                Err(_) => break,
            }
        }

        if samples.is_empty() {
            return Err(load_failed().into());
        }

        Ok(AudioData {
            samples,
            sample_rate,
            channels,
            file_path: path.to_path_buf(),
        })
    }

    /// Write audio as 16-bit PCM WAV
    pub fn write_wav<P: AsRef<Path>>(audio: &AudioData, path: P) -> Result<()> {
        let path = path.as_ref();
        let write_failed = || AudioError::WriteFailed { path: path.display().to_string() };

        let spec = hound::WavSpec {
            channels: audio.channels,
            sample_rate: audio.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut writer = hound::WavWriter::create(path, spec).map_err(|_| write_failed())?;
        for sample in &audio.samples {
            let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer.write_sample(value).map_err(|_| write_failed())?;
        }
        writer.finalize().map_err(|_| write_failed())?;
        Ok(())
    }

    /// Convert a signed integer sample to float based on bit depth
    fn int_to_float(sample: i32, bit_depth: u16) -> f32 {
        let full_scale = (1u64 << (bit_depth.clamp(1, 32) - 1)) as f32;
        sample as f32 / full_scale
    }

    /// Detect audio format from file extension
    pub fn detect_format<P: AsRef<Path>>(path: P) -> Option<String> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
    }

    /// Check if a file format is supported
    pub fn is_format_supported(extension: &str) -> bool {
        SUPPORTED_AUDIO_EXTENSIONS.contains(&extension.to_lowercase().as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompositorError;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_format_detection() {
        assert_eq!(AudioLoader::detect_format("test.wav"), Some("wav".to_string()));
        assert_eq!(AudioLoader::detect_format("test.MP3"), Some("mp3".to_string()));
        assert_eq!(AudioLoader::detect_format("test"), None);
    }

    #[test]
    fn test_format_support() {
        for ext in ["wav", "mp3", "FLAC", "m4a", "aac", "ogg", "opus"] {
            assert!(AudioLoader::is_format_supported(ext), "{ext}");
        }
        assert!(!AudioLoader::is_format_supported("xyz"));
        assert!(!AudioLoader::is_format_supported("mid"));
    }

    #[test]
    fn test_int_to_float_conversion() {
        assert_eq!(AudioLoader::int_to_float(0, 16), 0.0);
        assert_eq!(AudioLoader::int_to_float(32767, 16), 32767.0 / 32768.0);
        assert_eq!(AudioLoader::int_to_float(-32768, 16), -1.0);

        // hound hands out 8-bit samples already re-centered around zero
        assert_eq!(AudioLoader::int_to_float(0, 8), 0.0);
        assert_eq!(AudioLoader::int_to_float(-128, 8), -1.0);
        assert_eq!(AudioLoader::int_to_float(-8388608, 24), -1.0);
    }

    #[test]
    fn test_unsupported_format() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("test.xyz");
        File::create(&file_path).unwrap().write_all(b"dummy content").unwrap();

        match AudioLoader::load(&file_path) {
            Err(CompositorError::Audio(AudioError::UnsupportedFormat { format })) => {
                assert_eq!(format, "xyz");
            }
            other => panic!("Expected UnsupportedFormat error, got {:?}", other),
        }
    }

    #[test]
    fn test_wav_write_then_load() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("tone.wav");
        let audio = AudioData {
            samples: (0..8000).map(|i| ((i as f32) * 0.05).sin() * 0.5).collect(),
            sample_rate: 8000,
            channels: 1,
            file_path: file_path.clone(),
        };

        AudioLoader::write_wav(&audio, &file_path).unwrap();
        let loaded = AudioLoader::load(&file_path).unwrap();

        assert_eq!(loaded.sample_rate, 8000);
        assert_eq!(loaded.channels, 1);
        assert_eq!(loaded.duration(), Some(1.0));
        assert!((loaded.samples[100] - audio.samples[100]).abs() < 1e-3);
    }

    #[test]
    fn test_garbage_mp3_fails_to_load() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("broken.mp3");
        std::fs::write(&file_path, vec![0u8; 64]).unwrap();
        assert!(AudioLoader::load(&file_path).is_err());
    }
}
