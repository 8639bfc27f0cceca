//! Writing a buffer out as a real file.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Where downloads land: the user's download dir, else the working dir
pub fn download_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Write `content` as `file_name` inside `dir` and return the path.
///
/// An existing file is never overwritten; `name.js` becomes `name (1).js`
/// and so on.
pub fn save_to(dir: &Path, file_name: &str, content: &str) -> Result<PathBuf> {
    let path = free_path(dir, sanitize(file_name).as_str());
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("Downloaded {}", path.display());
    Ok(path)
}

fn sanitize(file_name: &str) -> String {
    let name: String = file_name
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    if name.trim_matches('.').is_empty() {
        "untitled.txt".to_string()
    } else {
        name
    }
}

fn free_path(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let (stem, ext) = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (file_name, None),
    };
    (1..)
        .map(|n| match ext {
            Some(ext) => dir.join(format!("{} ({}).{}", stem, n, ext)),
            None => dir.join(format!("{} ({})", stem, n)),
        })
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_to_writes_file() {
        let dir = TempDir::new().unwrap();
        let path = save_to(dir.path(), "index.js", "console.log(1)").unwrap();
        assert_eq!(path, dir.path().join("index.js"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "console.log(1)");
    }

    #[test]
    fn test_existing_file_is_kept() {
        let dir = TempDir::new().unwrap();
        save_to(dir.path(), "a.js", "first").unwrap();
        let second = save_to(dir.path(), "a.js", "second").unwrap();
        assert_eq!(second, dir.path().join("a (1).js"));
        assert_eq!(std::fs::read_to_string(dir.path().join("a.js")).unwrap(), "first");

        let third = save_to(dir.path(), "a.js", "third").unwrap();
        assert_eq!(third, dir.path().join("a (2).js"));
    }

    #[test]
    fn test_names_are_sanitized() {
        let dir = TempDir::new().unwrap();
        let path = save_to(dir.path(), "../evil.js", "x").unwrap();
        assert_eq!(path, dir.path().join(".._evil.js"));
        assert_eq!(sanitize(".."), "untitled.txt");
    }
}
