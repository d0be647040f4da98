//! Export des lignes enrichies en JSON

use std::path::Path;

use anyhow::{Context, Result};
use mapcenter::Center;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::pipeline::EnrichedRecord;

/// Vue sérialisable d'une ligne: `center` ou `error`, jamais les deux
#[derive(serde::Serialize)]
struct RecordView<'a> {
    row: usize,
    name: &'a str,
    city: &'a str,
    link: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    mid: Option<&'a str>,
    fields: Fields<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    center: Option<&'a Center>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

/// Colonnes d'origine sérialisées dans l'ordre de l'en-tête
struct Fields<'a>(&'a [(String, String)]);

impl Serialize for Fields<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'a> From<&'a EnrichedRecord> for RecordView<'a> {
    fn from(record: &'a EnrichedRecord) -> Self {
        Self {
            row: record.row,
            name: &record.name,
            city: &record.city,
            link: &record.link,
            mid: record.mid.as_deref(),
            fields: Fields(&record.fields),
            center: record.outcome.center(),
            error: record.outcome.error(),
        }
    }
}

/// Sérialise les lignes en JSON indenté
pub fn records_to_json(records: &[EnrichedRecord]) -> Result<String> {
    let views: Vec<RecordView> = records.iter().map(RecordView::from).collect();
    serde_json::to_string_pretty(&views).context("Failed to serialize records")
}

/// Écrit les lignes enrichies dans un fichier JSON
pub fn write_records_json(records: &[EnrichedRecord], output_path: &Path) -> Result<()> {
    super::ensure_parent_dir(output_path)?;
    let json = records_to_json(records)?;
    std::fs::write(output_path, json)
        .context(format!("Failed to write file: {}", output_path.display()))
}
