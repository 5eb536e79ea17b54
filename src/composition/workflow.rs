use std::path::{Path, PathBuf};

use tracing::info;

use crate::{
    composition::engine::{RenderRequest, VideoRenderer},
    config::RenderConfig,
    error::{CompositorError, Result},
    paths::list_image_files,
    timing::{resolve_image_duration, slideshow_image_durations, DEFAULT_FADE_DURATION},
};

/// Render every image in `image_dir` into one slideshow
///
/// Per-image duration comes from the pacing table (falling back to
/// `config.image_duration` only if the table were empty) and the fade is fixed
/// at [`DEFAULT_FADE_DURATION`].
pub fn build_video<R: VideoRenderer + ?Sized>(
    image_dir: &Path,
    output_path: &Path,
    renderer: &R,
    config: &RenderConfig,
) -> Result<PathBuf> {
    let images = list_image_files(image_dir)?;
    if images.is_empty() {
        return Err(CompositorError::invalid_input(format!(
            "no images found in {}",
            image_dir.display()
        )));
    }

    let image_duration = resolve_image_duration(
        images.len() as i64,
        &slideshow_image_durations(),
        config.image_duration,
    )?;
    info!(
        "{} images in {:?}: {:.2}s each",
        images.len(),
        image_dir,
        image_duration
    );

    let config = config
        .with_image_duration(image_duration)
        .with_fade_duration(DEFAULT_FADE_DURATION);

    let request = RenderRequest::new(images, output_path, config);
    renderer.render(&request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Records requests instead of encoding them
    #[derive(Default)]
    struct RecordingRenderer {
        requests: Mutex<Vec<RenderRequest>>,
    }

    impl VideoRenderer for RecordingRenderer {
        fn render(&self, request: &RenderRequest) -> Result<PathBuf> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(request.output_path.clone())
        }
    }

    #[test]
    fn test_build_video_resolves_timing_and_fade() {
        let dir = tempdir().unwrap();
        for name in ["05.png", "01.jpg", "03.jpeg", "02.png", "04.webp", "readme.md"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }

        let renderer = RecordingRenderer::default();
        let config = RenderConfig::default().with_fade_duration(0.9);
        let output = dir.path().join("out.mp4");

        let result = build_video(dir.path(), &output, &renderer, &config).unwrap();
        assert_eq!(result, output);

        let requests = renderer.requests.lock().unwrap();
        let request = &requests[0];
        assert_eq!(request.config.image_duration, 2.6);
        assert_eq!(request.config.fade_duration, DEFAULT_FADE_DURATION);
        assert_eq!(request.config.width, config.width);

        let names: Vec<String> = request
            .images
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["01.jpg", "02.png", "03.jpeg", "04.webp", "05.png"]);
    }

    #[test]
    fn test_build_video_with_empty_directory() {
        let dir = tempdir().unwrap();
        let renderer = RecordingRenderer::default();
        let err = build_video(dir.path(), &dir.path().join("o.mp4"), &renderer, &RenderConfig::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(renderer.requests.lock().unwrap().is_empty());
    }

    #[test]
    fn test_build_video_with_missing_directory() {
        let dir = tempdir().unwrap();
        let renderer = RecordingRenderer::default();
        let err = build_video(
            &dir.path().join("missing"),
            &dir.path().join("o.mp4"),
            &renderer,
            &RenderConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ResourceUnavailable);
    }
}
