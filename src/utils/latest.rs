use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Return the lexicographically maximal file in `dir` whose name starts
/// with `prefix` and ends with `extension`.
///
/// Filenames embed second-resolution timestamps, so the lexicographic
/// maximum is the most recently produced dataset regardless of
/// filesystem iteration order. A missing directory yields `None`.
pub fn latest_matching(dir: &Path, prefix: &str, extension: &str) -> Result<Option<PathBuf>> {
    if !dir.is_dir() {
        return Ok(None);
    }

    let mut latest: Option<(String, PathBuf)> = None;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };

        if !name.starts_with(prefix) || !name.ends_with(extension) {
            continue;
        }

        match &latest {
            Some((best, _)) if *best >= name => {}
            _ => latest = Some((name, path)),
        }
    }

    Ok(latest.map(|(_, path)| path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        File::create(dir.join(name)).unwrap();
    }

    #[test]
    fn test_latest_matching_picks_lexicographic_maximum() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "air_quality_transformed_20240601_090000.csv");
        touch(dir.path(), "air_quality_transformed_20240602_110000.csv");
        touch(dir.path(), "air_quality_transformed_20240602_083000.csv");

        let latest = latest_matching(dir.path(), "air_quality_transformed", ".csv")
            .unwrap()
            .unwrap();
        assert_eq!(
            latest.file_name().unwrap(),
            "air_quality_transformed_20240602_110000.csv"
        );
    }

    #[test]
    fn test_latest_matching_ignores_other_files() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "air_quality_transformed_20240601_090000.csv");
        touch(dir.path(), "delhi_raw_20240603_090000.json");
        touch(dir.path(), "notes.txt");

        let latest = latest_matching(dir.path(), "air_quality_transformed", ".csv")
            .unwrap()
            .unwrap();
        assert_eq!(
            latest.file_name().unwrap(),
            "air_quality_transformed_20240601_090000.csv"
        );
    }

    #[test]
    fn test_latest_matching_empty_and_missing_dirs() {
        let dir = TempDir::new().unwrap();
        assert!(latest_matching(dir.path(), "x", ".csv").unwrap().is_none());

        let missing = dir.path().join("does-not-exist");
        assert!(latest_matching(&missing, "x", ".csv").unwrap().is_none());
    }
}
