use std::fs::create_dir_all;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Output, Stdio};

use tracing::{debug, info, warn};

use crate::error::{Result, VideoError};
use crate::video::types::Frame;

pub const VIDEO_CODEC: &str = "libx264";
pub const AUDIO_CODEC: &str = "aac";
pub const FFMPEG_PROGRAM: &str = "ffmpeg";
const PRESET: &str = "medium";

/// Everything the encoder needs to know up front
#[derive(Debug, Clone)]
pub struct EncoderSettings {
    /// Encoder executable, looked up on `PATH` unless it is a path
    pub program: PathBuf,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub output_path: PathBuf,
    /// Optional audio input muxed as the only audio stream
    pub audio_path: Option<PathBuf>,
    /// Output is capped at this many seconds
    pub duration: f64,
}

impl EncoderSettings {
    /// ffmpeg arguments: raw `rgb24` frames on stdin, optional audio file input
    pub fn ffmpeg_args(&self) -> Vec<String> {
        let mut args: Vec<String> = [
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgb24",
            "-s",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        args.push(format!("{}x{}", self.width, self.height));
        args.extend(["-r".to_string(), self.fps.to_string()]);
        args.extend(["-i".to_string(), "pipe:0".to_string()]);

        if let Some(audio) = &self.audio_path {
            args.extend(["-i".to_string(), audio.display().to_string()]);
            args.extend(["-map", "0:v:0", "-map", "1:a:0"].iter().map(|s| s.to_string()));
        }

        args.extend(
            ["-c:v", VIDEO_CODEC, "-preset", PRESET, "-pix_fmt", "yuv420p"]
                .iter()
                .map(|s| s.to_string()),
        );
        args.extend(["-r".to_string(), self.fps.to_string()]);

        if self.audio_path.is_some() {
            args.extend(["-c:a", AUDIO_CODEC, "-b:a", "192k"].iter().map(|s| s.to_string()));
        } else {
            args.push("-an".to_string());
        }

        args.extend(["-t".to_string(), format!("{:.6}", self.duration)]);
        args.extend(["-movflags".to_string(), "+faststart".to_string()]);
        args.push(self.output_path.display().to_string());
        args
    }
}

/// Represents an encoded video output
#[derive(Debug, Clone)]
pub struct EncodedVideo {
    pub path: PathBuf,
    pub duration: f64,
    pub frame_count: usize,
    pub file_size: u64,
    pub has_audio: bool,
}

/// Streams frames into a system `ffmpeg` process
///
/// Dropping an encoder that was not finished kills the process and removes the
/// partial output file.
pub struct FfmpegEncoder {
    settings: EncoderSettings,
    child: Child,
    stdin: Option<ChildStdin>,
    frames_written: usize,
    finished: bool,
}

impl FfmpegEncoder {
    pub fn check_ffmpeg_available() -> bool {
        which::which(FFMPEG_PROGRAM).is_ok()
    }

    pub fn spawn(settings: EncoderSettings) -> Result<Self> {
        let program = which::which(&settings.program).map_err(|e| VideoError::EncoderUnavailable {
            reason: format!("{:?} not found ({}). Please install FFmpeg.", settings.program, e),
        })?;

        ensure_parent_dir(&settings.output_path)?;

        let args = settings.ffmpeg_args();
        debug!("Spawning {:?} {}", program, args.join(" "));

        let mut child = Command::new(&program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| VideoError::EncodingFailed {
                reason: format!("Failed to spawn FFmpeg process: {}", e),
            })?;

        let stdin = child.stdin.take().ok_or_else(|| VideoError::EncodingFailed {
            reason: "Failed to open FFmpeg stdin".to_string(),
        })?;

        Ok(Self {
            settings,
            child,
            stdin: Some(stdin),
            frames_written: 0,
            finished: false,
        })
    }

    pub fn write_frame(&mut self, rgb: &[u8]) -> Result<()> {
        let expected = Frame::byte_len(self.settings.width, self.settings.height);
        if rgb.len() != expected {
            return Err(VideoError::FrameProcessingFailed {
                reason: format!("frame has {} bytes, expected {}", rgb.len(), expected),
            }
            .into());
        }

        let stdin = self.stdin.as_mut().ok_or_else(|| VideoError::EncodingFailed {
            reason: "FFmpeg encoder is already finalized".to_string(),
        })?;

        stdin.write_all(rgb).map_err(|e| VideoError::EncodingFailed {
            reason: format!("Failed to write frame to FFmpeg: {}", e),
        })?;

        self.frames_written += 1;
        Ok(())
    }

    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    /// Close stdin, wait for ffmpeg and report the produced file
    pub fn finish(mut self) -> Result<EncodedVideo> {
        drop(self.stdin.take());

        let output = wait_for_output(&mut self.child)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VideoError::EncodingFailed {
                reason: format!("FFmpeg failed ({}): {}", output.status, stderr.trim()),
            }
            .into());
        }
        self.finished = true;

        let metadata = std::fs::metadata(&self.settings.output_path)?;
        let encoded = EncodedVideo {
            path: self.settings.output_path.clone(),
            duration: self.frames_written as f64 / self.settings.fps as f64,
            frame_count: self.frames_written,
            file_size: metadata.len(),
            has_audio: self.settings.audio_path.is_some(),
        };

        info!(
            "Encoded {} frames ({:.2}s) into {:?} ({} KB)",
            encoded.frame_count,
            encoded.duration,
            encoded.path,
            encoded.file_size / 1024
        );
        Ok(encoded)
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        drop(self.stdin.take());
        if let Err(e) = self.child.kill() {
            debug!("FFmpeg already exited: {}", e);
        }
        let _ = self.child.wait();

        if self.settings.output_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.settings.output_path) {
                warn!("Failed to remove partial output {:?}: {}", self.settings.output_path, e);
            }
        }
    }
}

/// Like `Child::wait_with_output`, without consuming the child the encoder still owns
fn wait_for_output(child: &mut Child) -> Result<Output> {
    let mut stderr = Vec::new();
    if let Some(mut pipe) = child.stderr.take() {
        pipe.read_to_end(&mut stderr)?;
    }
    let status = child.wait()?;
    Ok(Output { status, stdout: Vec::new(), stderr })
}

pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent)?;
        }
    }
    Ok(())
}
