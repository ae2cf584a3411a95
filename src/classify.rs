use std::fs;
use std::path::Path;

use anyhow::Context;

/// Literal extension variants, matched case-sensitively.
const IMAGE_EXTENSIONS: &[&str] = &[
    ".jpg", ".JPG", ".jpeg", ".JPEG", ".png", ".PNG", ".heic", ".HEIC",
];

/// Check if a path names a supported image type by its extension.
pub fn is_supported_image(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    IMAGE_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

/// Check if a path is a directory. Stat failure aborts the run.
pub fn is_dir(path: &Path) -> anyhow::Result<bool> {
    let meta = fs::metadata(path)
        .with_context(|| format!("failed to stat {}", path.display()))?;
    Ok(meta.is_dir())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_supported_extensions() {
        for name in [
            "a.jpg", "a.JPG", "a.jpeg", "a.JPEG", "a.png", "a.PNG", "a.heic", "a.HEIC",
        ] {
            assert!(is_supported_image(Path::new(name)), "{name}");
        }
    }

    #[test]
    fn test_unsupported_extensions() {
        for name in ["a.Jpg", "a.jPG", "a.gif", "a.tiff", "a.jpg.bak", "noext", "a."] {
            assert!(!is_supported_image(Path::new(name)), "{name}");
        }
    }

    #[test]
    fn test_is_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(is_dir(dir.path()).unwrap());

        let file = dir.path().join("x.jpg");
        std::fs::write(&file, b"").unwrap();
        assert!(!is_dir(&file).unwrap());

        assert!(is_dir(&dir.path().join("missing")).is_err());
    }
}
