//! Weekly menus loaded from JSON files.
//!
//! Each file in `{content_dir}/menus/` holds one [`WeekMenu`]. Files are read
//! once at startup; a file that fails to parse is logged and skipped so one
//! bad week does not take the site down.

use std::path::Path;

use secret_menu_core::menu::{MenuCatalog, WeekMenu};

/// Content loading errors
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Load every `*.json` week under `content_dir/menus`.
///
/// A missing directory yields an empty catalog.
///
/// # Errors
///
/// Returns an error if the directory cannot be read, or if the loaded weeks
/// conflict (duplicate ids, inverted dates).
pub fn load_menus(content_dir: &Path) -> Result<MenuCatalog, ContentError> {
    let dir = content_dir.join("menus");

    if !dir.exists() {
        tracing::warn!("Menus directory does not exist: {:?}", dir);
        return Ok(MenuCatalog::default());
    }

    let entries = std::fs::read_dir(&dir).map_err(|e| ContentError::Io(e.to_string()))?;

    let mut weeks = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            match load_week(&path) {
                Ok(week) => {
                    tracing::info!("Loaded menu: {}", week.id);
                    weeks.push(week);
                }
                Err(e) => {
                    tracing::error!("Failed to load menu {:?}: {}", path, e);
                }
            }
        }
    }

    MenuCatalog::new(weeks).map_err(|e| ContentError::Parse(e.to_string()))
}

fn load_week(path: &Path) -> Result<WeekMenu, ContentError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ContentError::Io(e.to_string()))?;
    parse_week(&raw)
}

/// Parse one week from JSON.
///
/// # Errors
///
/// Returns `ContentError::Parse` for malformed JSON or missing fields.
pub fn parse_week(raw: &str) -> Result<WeekMenu, ContentError> {
    serde_json::from_str(raw).map_err(|e| ContentError::Parse(e.to_string()))
}
