//! Room catalog: the rooms this process hosts.
//!
//! The catalog is a JSON array:
//!
//! ```json
//! [
//!   {
//!     "id": "kitchen",
//!     "name": "The Kitchen",
//!     "description": "Pots everywhere.",
//!     "doors": [{"direction": "n", "description": "a wooden door"}]
//!   }
//! ]
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::domain::{Door, RoomDefinition};
use crate::error::ConfigError;

/// One catalog entry as written in the file.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    /// Room id, also the name the directory knows it by.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Room description.
    #[serde(default)]
    pub description: String,
    /// Doors out of the room.
    #[serde(default)]
    pub doors: Vec<Door>,
}

impl From<CatalogEntry> for RoomDefinition {
    fn from(entry: CatalogEntry) -> Self {
        Self::new(entry.id, entry.name, entry.description, entry.doors)
    }
}

/// Reads and validates the catalog at `path`.
///
/// # Errors
///
/// Returns [`ConfigError::CatalogIo`] if the file cannot be read, otherwise
/// see [`parse_catalog`].
pub fn load_catalog(path: &Path) -> Result<Vec<RoomDefinition>, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::CatalogIo {
        path: path.to_path_buf(),
        source,
    })?;
    let rooms = parse_catalog(&text)?;
    tracing::info!(path = %path.display(), rooms = rooms.len(), "room catalog loaded");
    Ok(rooms)
}

/// Parses and validates catalog JSON.
///
/// # Errors
///
/// Returns [`ConfigError::CatalogFormat`] for malformed JSON and
/// [`ConfigError::InvalidRoom`] for an empty catalog, an empty or
/// duplicated id, or an id that cannot appear in a URL path segment.
pub fn parse_catalog(text: &str) -> Result<Vec<RoomDefinition>, ConfigError> {
    let entries: Vec<CatalogEntry> = serde_json::from_str(text)?;
    if entries.is_empty() {
        return Err(ConfigError::InvalidRoom(
            "catalog defines no rooms".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for entry in &entries {
        let id = entry.id.trim();
        if id.is_empty() {
            return Err(ConfigError::InvalidRoom("room id is empty".to_string()));
        }
        if id != entry.id || id.contains(['/', '?', '#']) {
            return Err(ConfigError::InvalidRoom(format!(
                "room id {:?} is not usable in a URL",
                entry.id
            )));
        }
        if !seen.insert(id) {
            return Err(ConfigError::InvalidRoom(format!(
                "room id {id:?} is defined twice"
            )));
        }
    }
    Ok(entries.into_iter().map(RoomDefinition::from).collect())
}
