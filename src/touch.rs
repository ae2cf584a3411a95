use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, FixedOffset};
use filetime::FileTime;

/// Set both the modification and access time of `path` to `time`.
pub fn apply_time(path: &Path, time: DateTime<FixedOffset>) -> anyhow::Result<()> {
    let ft = FileTime::from_unix_time(time.timestamp(), 0);
    filetime::set_file_times(path, ft, ft)
        .with_context(|| format!("failed to set file times on {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exif_time::parse_exif_datetime;
    use std::fs::{self, File};

    #[test]
    fn test_apply_time_sets_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.jpg");
        File::create(&path).unwrap();

        let time = parse_exif_datetime("2023:05:01 10:00:00 +02:00").unwrap();
        apply_time(&path, time).unwrap();

        let meta = fs::metadata(&path).unwrap();
        let mtime = FileTime::from_last_modification_time(&meta);
        assert_eq!(mtime.unix_seconds(), time.timestamp());
    }

    #[test]
    fn test_apply_time_missing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let time = parse_exif_datetime("2023:05:01 10:00:00 +00:00").unwrap();
        assert!(apply_time(&dir.path().join("missing.jpg"), time).is_err());
    }
}
