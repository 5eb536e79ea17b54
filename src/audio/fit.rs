//! Background music selection and length fitting.
//!
//! Music is an optional enhancement: every failure here (missing directory,
//! no candidates, undecodable file, failed loop) degrades to "no music" or to
//! the untrimmed track, and never aborts a render.

use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::audio::loader::AudioLoader;
use crate::audio::types::AudioData;

/// List candidate tracks directly inside `music_dir`, sorted by path
///
/// A missing or unreadable directory yields no candidates.
pub fn find_music_tracks<P: AsRef<Path>>(music_dir: P) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(music_dir.as_ref()) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    let mut tracks: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .filter(|path| {
            AudioLoader::detect_format(path)
                .map(|ext| AudioLoader::is_format_supported(&ext))
                .unwrap_or(false)
        })
        .collect();
    tracks.sort();
    tracks
}

/// Pick a random track from `music_dir` and fit it to `target_duration`
pub fn select_and_fit<P: AsRef<Path>>(music_dir: P, target_duration: f64) -> Option<AudioData> {
    select_and_fit_with_rng(music_dir, target_duration, &mut rand::thread_rng())
}

/// [`select_and_fit`] with a caller-supplied random source
pub fn select_and_fit_with_rng<P, R>(music_dir: P, target_duration: f64, rng: &mut R) -> Option<AudioData>
where
    P: AsRef<Path>,
    R: Rng + ?Sized,
{
    let music_dir = music_dir.as_ref();
    if !music_dir.exists() {
        info!("Music directory {:?} does not exist, rendering without music", music_dir);
        return None;
    }

    let tracks = find_music_tracks(music_dir);
    let Some(selected) = tracks.choose(rng) else {
        info!("No music tracks in {:?}, rendering without music", music_dir);
        return None;
    };
    debug!("Selected {:?} out of {} tracks", selected, tracks.len());

    let source = match AudioLoader::load(selected) {
        Ok(source) => source,
        Err(e) => {
            info!("Could not open {:?} ({}), rendering without music", selected, e);
            return None;
        }
    };

    Some(fit_to_duration(source, target_duration))
}

/// Trim or loop `source` so it plays for `target_duration` seconds
pub fn fit_to_duration(source: AudioData, target_duration: f64) -> AudioData {
    if target_duration <= 0.0 {
        return source;
    }

    let Some(duration) = source.duration() else {
        debug!("Unknown duration for {:?}, using it as-is", source.file_path);
        return source;
    };

    if duration >= target_duration {
        debug!("Trimming {:?} from {:.2}s to {:.2}s", source.file_path, duration, target_duration);
        return source.trimmed(target_duration);
    }

    match source.looped(target_duration) {
        Ok(looped) => {
            debug!("Looped {:?} from {:.2}s to {:.2}s", source.file_path, duration, target_duration);
            looped
        }
        Err(e) => {
            warn!("{}; using the untrimmed track", e);
            source
        }
    }
}
