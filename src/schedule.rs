//! Content schedule kept as a CSV file
//!
//! Each row names a place; the `Has images` column records whether images
//! for it have been fetched.

use std::path::Path;

use tracing::{info, warn};

use crate::{
    error::{Result, ScheduleError},
    fetch::{fetch_images, ImageFetcher},
    paths::list_image_files,
};

pub const NAME_COLUMNS: &[&str] = &["Name"];
pub const HAS_IMAGES_COLUMNS: &[&str] = &["Has images", "Has Images", "HasImages"];
const MARKED: &str = "YES";

/// Header row plus data rows, each padded to the header width
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schedule {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Schedule {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let content = content.strip_prefix('\u{feff}').unwrap_or(&content);

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(ScheduleError::from)?
            .iter()
            .map(str::to_string)
            .collect();
        if headers.is_empty() {
            return Err(ScheduleError::NoHeaders { path: path.display().to_string() }.into());
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(ScheduleError::from)?;
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(headers.len(), String::new());
            rows.push(row);
        }

        Ok(Self { headers, rows })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::Writer::from_path(path).map_err(ScheduleError::from)?;
        writer.write_record(&self.headers).map_err(ScheduleError::from)?;
        for row in &self.rows {
            writer.write_record(row).map_err(ScheduleError::from)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Index of the first header matching one of `candidates`
    pub fn column(&self, candidates: &[&str]) -> Result<usize> {
        find_field(&self.headers, candidates)
    }
}

/// Lowercase and drop everything that is not alphanumeric
pub fn normalize_header(value: &str) -> String {
    value
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|ch| ch.is_alphanumeric())
        .collect()
}

/// Position of the header matching the earliest candidate, compared normalized
pub fn find_field<S: AsRef<str>>(headers: &[S], candidates: &[&str]) -> Result<usize> {
    candidates
        .iter()
        .map(|candidate| normalize_header(candidate))
        .find_map(|wanted| {
            headers
                .iter()
                .position(|header| normalize_header(header.as_ref()) == wanted)
        })
        .ok_or_else(|| ScheduleError::MissingColumn { candidates: candidates.join(", ") }.into())
}

pub fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "yes" | "true" | "1" | "y")
}

/// Fetch images for every scheduled row that does not have them yet
///
/// Rows whose folder under `output_base` already holds images are only marked.
/// A failing row is logged and left unmarked. The CSV is rewritten only when
/// something changed; the return value is the number of rows marked.
pub async fn fetch_missing_images<F: ImageFetcher + ?Sized>(
    csv_path: &Path,
    fetcher: &F,
    max_num: usize,
    output_base: &Path,
) -> Result<usize> {
    let mut schedule = Schedule::load(csv_path)?;
    let name_col = schedule.column(NAME_COLUMNS)?;
    let has_images_col = schedule.column(HAS_IMAGES_COLUMNS)?;

    let mut updated = 0;
    for row in schedule.rows.iter_mut() {
        let name = row[name_col].trim().to_string();
        if name.is_empty() || is_truthy(&row[has_images_col]) {
            continue;
        }

        let output_dir = output_base.join(&name);
        let existing = list_image_files(&output_dir).unwrap_or_default();
        if !existing.is_empty() {
            row[has_images_col] = MARKED.to_string();
            updated += 1;
            continue;
        }

        match fetch_images(&name, output_base, fetcher, max_num, Some(&name)).await {
            Ok(images) if !images.is_empty() => {
                row[has_images_col] = MARKED.to_string();
                updated += 1;
            }
            Ok(_) => warn!("No images found for '{}'", name),
            Err(e) => warn!("Failed to fetch images for '{}': {}", name, e),
        }
    }

    if updated > 0 {
        schedule.save(csv_path)?;
    }
    info!("Updated {} rows in {:?}", updated, csv_path);
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CompositorError, ErrorKind, FetchError};
    use crate::fetch::ImageFetchRequest;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Writes one image per query, except for queries listed as failing or empty
    #[derive(Default)]
    struct FakeFetcher {
        failing: Vec<&'static str>,
        empty: Vec<&'static str>,
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ImageFetcher for FakeFetcher {
        async fn fetch(&self, request: &ImageFetchRequest) -> crate::error::Result<Vec<PathBuf>> {
            self.queries.lock().unwrap().push(request.query.clone());
            if self.failing.contains(&request.query.as_str()) {
                return Err(FetchError::HttpStatus { url: "search".into(), status: 503 }.into());
            }
            if self.empty.contains(&request.query.as_str()) {
                return Ok(Vec::new());
            }
            std::fs::create_dir_all(&request.output_dir).unwrap();
            let path = request.output_dir.join("000001.jpg");
            std::fs::write(&path, b"x").unwrap();
            Ok(vec![path])
        }
    }

    #[test]
    fn test_header_helpers() {
        assert_eq!(normalize_header(" Has Images "), "hasimages");
        assert_eq!(normalize_header("has_images"), "hasimages");

        let headers = ["Date", "name", "has_images"];
        assert_eq!(find_field(&headers, NAME_COLUMNS).unwrap(), 1);
        assert_eq!(find_field(&headers, HAS_IMAGES_COLUMNS).unwrap(), 2);

        let err = find_field(&headers, &["Caption"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_truthy_tokens() {
        for value in ["yes", "YES", " true ", "1", "y"] {
            assert!(is_truthy(value), "{}", value);
        }
        for value in ["", "no", "0", "on", "nope"] {
            assert!(!is_truthy(value), "{}", value);
        }
    }

    #[test]
    fn test_load_strips_bom_and_pads_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("schedule.csv");
        std::fs::write(&path, "\u{feff}Name,Has images,Notes\nParis,,first\nRome\n").unwrap();

        let schedule = Schedule::load(&path).unwrap();
        assert_eq!(schedule.headers, vec!["Name", "Has images", "Notes"]);
        assert_eq!(schedule.rows[1], vec!["Rome", "", ""]);
    }

    #[test]
    fn test_load_without_headers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        std::fs::write(&path, "").unwrap();

        let err = Schedule::load(&path).unwrap_err();
        assert!(matches!(err, CompositorError::Schedule(ScheduleError::NoHeaders { .. })));
    }

    #[tokio::test]
    async fn test_fetch_missing_images_marks_rows() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("schedule.csv");
        let output_base = dir.path().join("images");
        std::fs::write(
            &csv_path,
            "Name,Has images\nParis,\nRome,yes\n,\nOslo,no\nLima,\nBern,\n",
        )
        .unwrap();

        // Oslo already has images on disk
        std::fs::create_dir_all(output_base.join("Oslo")).unwrap();
        std::fs::write(output_base.join("Oslo/1.png"), b"x").unwrap();

        let fetcher = FakeFetcher { failing: vec!["Lima"], empty: vec!["Bern"], ..Default::default() };
        let updated = fetch_missing_images(&csv_path, &fetcher, 5, &output_base).await.unwrap();
        assert_eq!(updated, 2);

        let queries = fetcher.queries.lock().unwrap().clone();
        assert_eq!(queries, vec!["Paris", "Lima", "Bern"]);

        let schedule = Schedule::load(&csv_path).unwrap();
        let marks: Vec<&str> = schedule.rows.iter().map(|row| row[1].as_str()).collect();
        assert_eq!(marks, vec!["YES", "yes", "", "YES", "", ""]);
        assert!(output_base.join("Paris/000001.jpg").exists());
    }

    #[tokio::test]
    async fn test_unchanged_schedule_is_not_rewritten() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("schedule.csv");
        let original = "\u{feff}Name,HasImages\r\nRome,YES\r\n";
        std::fs::write(&csv_path, original).unwrap();

        let fetcher = FakeFetcher::default();
        let updated = fetch_missing_images(&csv_path, &fetcher, 5, dir.path()).await.unwrap();
        assert_eq!(updated, 0);
        assert_eq!(std::fs::read_to_string(&csv_path).unwrap(), original);
    }
}
