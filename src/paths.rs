use std::path::{Path, PathBuf};

use crate::error::{CompositorError, Result};

/// Image extensions picked up from input directories (lower-case, no dot)
pub const SUPPORTED_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp", "tiff"];

/// Container extension of produced videos
pub const VIDEO_EXTENSION: &str = "mp4";

/// Check whether a path has a supported image extension
pub fn is_image_file<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// List the images directly inside `directory`, sorted by file name, case-insensitively
pub fn list_image_files<P: AsRef<Path>>(directory: P) -> Result<Vec<PathBuf>> {
    let directory = directory.as_ref();
    if !directory.exists() {
        return Err(CompositorError::ResourceUnavailable {
            path: directory.display().to_string(),
        });
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(directory)? {
        let path = entry?.path();
        if path.is_file() && is_image_file(&path) {
            files.push(path);
        }
    }

    files.sort_by_key(|path| {
        path.file_name()
            .map(|name| name.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    });
    Ok(files)
}

/// Turn free text into a folder name: alphanumerics, `-` and `_` only
pub fn safe_dir_name(value: &str) -> String {
    let cleaned: String = value
        .trim()
        .chars()
        .filter(|ch| ch.is_alphanumeric() || matches!(ch, ' ' | '-' | '_'))
        .map(|ch| if ch == ' ' { '-' } else { ch })
        .collect();
    let cleaned = cleaned.trim_matches(|ch| ch == '-' || ch == '_');

    if cleaned.is_empty() {
        "images".to_string()
    } else {
        cleaned.to_string()
    }
}

pub fn resolve_relative<P: AsRef<Path>>(path: P, root: &Path) -> PathBuf {
    let path = path.as_ref();
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Normalize an output location to an `.mp4` file
///
/// A path without an extension is treated as a directory and gets `render.mp4`
/// inside it; any other extension is replaced.
pub fn resolve_output_path<P: AsRef<Path>>(path: P) -> PathBuf {
    let path = path.as_ref();
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case(VIDEO_EXTENSION) => path.to_path_buf(),
        Some(_) => path.with_extension(VIDEO_EXTENSION),
        None => path.join(format!("render.{}", VIDEO_EXTENSION)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_output_path_normalization() {
        assert_eq!(
            resolve_output_path("outputs/render"),
            PathBuf::from("outputs/render/render.mp4")
        );
        assert_eq!(
            resolve_output_path("outputs/render.mov"),
            PathBuf::from("outputs/render.mp4")
        );
        assert_eq!(
            resolve_output_path("outputs/clip.MP4"),
            PathBuf::from("outputs/clip.MP4")
        );
    }

    #[test]
    fn test_safe_dir_name() {
        assert_eq!(safe_dir_name("  sunset beach "), "sunset-beach");
        assert_eq!(safe_dir_name("Köln / Dom!"), "Köln--Dom");
        assert_eq!(safe_dir_name("__hello__"), "hello");
        assert_eq!(safe_dir_name("?!"), "images");
    }

    #[test]
    fn test_resolve_relative() {
        let root = Path::new("/srv/app");
        assert_eq!(resolve_relative("assets", root), PathBuf::from("/srv/app/assets"));
        assert_eq!(resolve_relative("/tmp/x", root), PathBuf::from("/tmp/x"));
    }

    #[test]
    fn test_list_image_files_sorted_and_filtered() {
        let dir = tempdir().unwrap();
        for name in ["b.PNG", "A.jpg", "c.jpeg", "notes.txt", "song.mp3"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.png")).unwrap();

        let files = list_image_files(dir.path()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["A.jpg", "b.PNG", "c.jpeg"]);
    }

    #[test]
    fn test_list_missing_directory() {
        let dir = tempdir().unwrap();
        let result = list_image_files(dir.path().join("missing"));
        assert!(matches!(result, Err(CompositorError::ResourceUnavailable { .. })));
    }
}
