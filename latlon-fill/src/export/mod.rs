//! Modules d'export (JSON, GeoJSON)
//!
//! La mise à jour en place de la table est faite par `Table::write`.

pub mod geojson;
pub mod json;

pub use self::geojson::write_centers_geojson;
pub use self::json::write_records_json;

use std::path::Path;

use anyhow::{Context, Result};

/// Crée le répertoire parent du fichier de sortie si nécessaire
pub(crate) fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .context(format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}
