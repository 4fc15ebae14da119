//! Filename handling and the on-disk stores behind the file endpoints.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::Path;
use std::time::SystemTime;

const MAX_TITLE_CHARS: usize = 50;

/// Reduce a user-supplied name to a bare file name of `[A-Za-z0-9._-]`.
///
/// Path separators and whitespace become `_`, leading and trailing dots
/// are stripped. Returns `None` when nothing usable is left.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let spaced = name.replace(['/', '\\'], " ");
    let cleaned: String = spaced
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    let cleaned = cleaned.trim_matches(|c| c == '.' || c == '_');
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

/// `<YYYYMMDD_HHMMSS>_<title>_<8 hex>.pptx` for a generated deck.
pub fn output_filename(title: Option<&str>, now: DateTime<Local>) -> String {
    let project = title
        .and_then(sanitize_filename)
        .map(|t| t.chars().take(MAX_TITLE_CHARS).collect::<String>())
        .unwrap_or_else(|| "presentation".to_string());
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}_{}_{}.pptx",
        now.format("%Y%m%d_%H%M%S"),
        project,
        &suffix[..8]
    )
}

pub fn is_yaml_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.ends_with(".yaml") || lower.ends_with(".yml")
}

/// Saved names always carry a YAML extension.
pub fn saved_filename(name: &str) -> Option<String> {
    let name = sanitize_filename(name)?;
    if is_yaml_name(&name) {
        Some(name)
    } else {
        Some(format!("{}.yaml", name))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SavedFile {
    pub filename: String,
    pub size: u64,
    /// RFC 3339 modification time.
    pub modified: String,
}

/// YAML files in `dir`, newest first. A missing directory is empty.
pub fn list_saved(dir: &Path) -> std::io::Result<Vec<SavedFile>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files: Vec<(SystemTime, SavedFile)> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let metadata = entry.metadata()?;
        let filename = entry.file_name().to_string_lossy().into_owned();
        if !metadata.is_file() || !is_yaml_name(&filename) {
            continue;
        }
        let modified = metadata.modified()?;
        files.push((
            modified,
            SavedFile {
                filename,
                size: metadata.len(),
                modified: DateTime::<Local>::from(modified).to_rfc3339(),
            },
        ));
    }

    files.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.filename.cmp(&b.1.filename)));
    Ok(files.into_iter().map(|(_, file)| file).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sanitize_flattens_paths() {
        assert_eq!(sanitize_filename("../../etc/passwd").as_deref(), Some("etc_passwd"));
        assert_eq!(sanitize_filename("C:\\decks\\q1.yaml").as_deref(), Some("C_decks_q1.yaml"));
        assert_eq!(sanitize_filename("my deck (v2).yaml").as_deref(), Some("my_deck_v2.yaml"));
        assert_eq!(sanitize_filename(".hidden").as_deref(), Some("hidden"));
        assert_eq!(sanitize_filename("../"), None);
        assert_eq!(sanitize_filename("???"), None);
    }

    #[test]
    fn test_output_filename_shape() {
        let now = Local.with_ymd_and_hms(2025, 12, 25, 9, 30, 0).unwrap();
        let name = output_filename(Some("Q1 Review: Plans/Goals"), now);
        assert!(name.starts_with("20251225_093000_Q1_Review_Plans_Goals_"), "{}", name);
        assert!(name.ends_with(".pptx"));
        let suffix = &name["20251225_093000_Q1_Review_Plans_Goals_".len()..name.len() - 5];
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));

        let untitled = output_filename(None, now);
        assert!(untitled.starts_with("20251225_093000_presentation_"));
    }

    #[test]
    fn test_long_titles_are_cut() {
        let now = Local.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let name = output_filename(Some(&"x".repeat(80)), now);
        assert_eq!(name.len(), "20250101_000000_".len() + 50 + "_12345678.pptx".len());
    }

    #[test]
    fn test_two_generations_never_collide() {
        let now = Local::now();
        assert_ne!(output_filename(Some("Deck"), now), output_filename(Some("Deck"), now));
    }

    #[test]
    fn test_saved_filename_appends_extension() {
        assert_eq!(saved_filename("notes").as_deref(), Some("notes.yaml"));
        assert_eq!(saved_filename("notes.YML").as_deref(), Some("notes.YML"));
    }

    #[test]
    fn test_list_saved_filters_yaml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.yaml"), "slides: []").unwrap();
        std::fs::write(dir.path().join("b.txt"), "nope").unwrap();
        let files = list_saved(dir.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].filename, "a.yaml");
        assert_eq!(files[0].size, 10);

        assert!(list_saved(&dir.path().join("missing")).unwrap().is_empty());
    }
}
