use tracing::debug;

use crate::video::types::Frame;

/// One image on the timeline with its own duration and fade envelope
#[derive(Debug, Clone)]
pub struct Segment {
    pub frame: Frame,
    pub start: f64,
    pub duration: f64,
    /// Effective fade length, at most half the duration
    pub fade: f64,
}

impl Segment {
    /// Create a segment, clamping an overlong fade to half the duration
    pub fn new(frame: Frame, start: f64, duration: f64, fade: f64) -> Self {
        let max_fade = duration / 2.0;
        let fade = if fade > max_fade {
            debug!("Clamping fade {:.3}s to {:.3}s for a {:.3}s segment", fade, max_fade, duration);
            max_fade
        } else {
            fade.max(0.0)
        };

        Self { frame, start, duration, fade }
    }

    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    pub fn is_active(&self, time: f64) -> bool {
        time >= self.start && time < self.end()
    }

    /// Brightness factor at `time`: ramps 0→1 over the fade-in and 1→0 over the fade-out
    pub fn envelope(&self, time: f64) -> f32 {
        if !self.is_active(time) {
            return 0.0;
        }
        if self.fade <= 0.0 {
            return 1.0;
        }

        let local = time - self.start;
        let fade_in = local / self.fade;
        let fade_out = (self.duration - local) / self.fade;
        fade_in.min(fade_out).clamp(0.0, 1.0) as f32
    }
}

/// Ordered segments composited over a black background
///
/// Every output frame is the envelope-weighted sum of all segments active at
/// that instant, so fades at a shared boundary blend rather than cut.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    width: u32,
    height: u32,
    segments: Vec<Segment>,
}

impl Timeline {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, segments: Vec::new() }
    }

    /// Append a segment starting where the timeline currently ends
    pub fn push_sequential(&mut self, frame: Frame, duration: f64, fade: f64) {
        let start = self.duration();
        self.push(Segment::new(frame, start, duration, fade));
    }

    pub fn push(&mut self, segment: Segment) {
        debug_assert_eq!(segment.frame.dimensions(), (self.width, self.height));
        self.segments.push(segment);
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Drop every segment, releasing the decoded frames
    pub fn clear(&mut self) -> usize {
        let released = self.segments.len();
        self.segments.clear();
        released
    }

    /// Total visual duration in seconds
    pub fn duration(&self) -> f64 {
        self.segments.iter().map(Segment::end).fold(0.0, f64::max)
    }

    /// Number of frames needed to cover the timeline at `fps`
    pub fn frame_count(&self, fps: u32) -> usize {
        (self.duration() * fps as f64).round() as usize
    }

    /// Render the frame visible at `time` into `out` as `rgb24` bytes
    pub fn render_into(&self, time: f64, out: &mut Vec<u8>) {
        let len = Frame::byte_len(self.width, self.height);
        out.clear();

        let active: Vec<(&Segment, f32)> = self
            .segments
            .iter()
            .filter(|segment| segment.is_active(time))
            .map(|segment| (segment, segment.envelope(time)))
            .filter(|(_, weight)| *weight > 0.0)
            .collect();

        match active.as_slice() {
            [] => out.resize(len, 0),
            [(segment, weight)] if *weight >= 1.0 => {
                out.extend_from_slice(segment.frame.as_bytes());
            }
            [(segment, weight)] => {
                out.extend(
                    segment
                        .frame
                        .as_bytes()
                        .iter()
                        .map(|byte| (*byte as f32 * weight).round() as u8),
                );
            }
            _ => {
                out.resize(len, 0);
                for (index, byte) in out.iter_mut().enumerate() {
                    let value: f32 = active
                        .iter()
                        .map(|(segment, weight)| segment.frame.as_bytes()[index] as f32 * weight)
                        .sum();
                    *byte = value.round().min(255.0) as u8;
                }
            }
        }
    }
}
