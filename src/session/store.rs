use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::SavedLayout;
use crate::layout::LayoutError;

pub fn layouts_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("scriptbook")
        .join("layouts")
}

/// Where `name` is stored under `dir`. Names that are empty, hidden, or
/// contain path separators are refused.
pub fn layout_file(dir: &Path, name: &str) -> Result<PathBuf, LayoutError> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ' '));
    if !valid {
        return Err(LayoutError::InvalidName(name.to_string()));
    }
    Ok(dir.join(format!("{name}.json")))
}

pub fn load(name: &str) -> Result<SavedLayout, LayoutError> {
    load_from(&layout_file(&layouts_dir(), name)?)
}

pub fn list() -> Vec<String> {
    list_in(&layouts_dir())
}

// Path-parameterized variants for testability

pub fn save_to(layout: &SavedLayout, path: &Path) -> Result<(), LayoutError> {
    let io_err = |source| LayoutError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, layout.to_json()?).map_err(io_err)?;
    debug!(path = %path.display(), "saved layout");
    Ok(())
}

pub fn load_from(path: &Path) -> Result<SavedLayout, LayoutError> {
    let json = fs::read_to_string(path).map_err(|source| LayoutError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    SavedLayout::from_json(&json)
}

/// Names of the saved layouts in `dir`, sorted.
pub fn list_in(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .collect();
    names.sort();
    names
}
