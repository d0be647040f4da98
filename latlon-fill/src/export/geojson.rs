//! Export des centres résolus en GeoJSON (un Point par ligne résolue)

use std::path::Path;

use ::geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};
use anyhow::{Context, Result};

use crate::pipeline::EnrichedRecord;

/// Construit la FeatureCollection des lignes résolues
///
/// Les lignes sans centre sont omises.
pub fn centers_to_feature_collection(records: &[EnrichedRecord]) -> FeatureCollection {
    let features = records
        .iter()
        .filter_map(|record| {
            let center = record.outcome.center()?;

            let mut properties = JsonObject::new();
            properties.insert("row".into(), JsonValue::from(record.row));
            properties.insert("name".into(), JsonValue::from(record.name.as_str()));
            properties.insert("city".into(), JsonValue::from(record.city.as_str()));
            properties.insert("link".into(), JsonValue::from(record.link.as_str()));
            if let Some(mid) = &record.mid {
                properties.insert("mid".into(), JsonValue::from(mid.as_str()));
            }
            properties.insert("source".into(), JsonValue::from(center.source.as_str()));

            Some(Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Point(vec![center.lon, center.lat]))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            })
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// Écrit les centres résolus dans un fichier GeoJSON
pub fn write_centers_geojson(records: &[EnrichedRecord], output_path: &Path) -> Result<usize> {
    super::ensure_parent_dir(output_path)?;
    let collection = centers_to_feature_collection(records);
    let json = serde_json::to_string_pretty(&collection).context("Failed to serialize GeoJSON")?;
    std::fs::write(output_path, json)
        .context(format!("Failed to write file: {}", output_path.display()))?;
    Ok(collection.features.len())
}
