//! Cascade de résolution d'un calque à partir de son document KML

use tracing::debug;

use crate::types::{Center, CenterSource};
use crate::{bbox, kml, ResolveError};

/// Résout le centre d'un document KML
///
/// Ordre: `<LookAt>` (vue enregistrée), puis `<Camera>`, puis centre
/// d'emprise de toutes les géométries.
///
/// # Errors
///
/// `ResolveError::InvalidKml` si le document est illisible,
/// `ResolveError::NoGeometry` si aucune stratégie n'aboutit.
pub fn center_from_kml(text: &str) -> Result<Center, ResolveError> {
    let doc = kml::parse_document(text)?;

    if let Some((lon, lat)) = kml::viewpoint(&doc, "LookAt") {
        return Ok(Center::new(lat, lon, CenterSource::SavedViewpoint));
    }
    if let Some((lon, lat)) = kml::viewpoint(&doc, "Camera") {
        return Ok(Center::new(lat, lon, CenterSource::CameraViewpoint));
    }

    let collection = kml::to_feature_collection(&doc);
    debug!(features = collection.features.len(), "No viewpoint, falling back to bbox");
    bbox::bbox_center(&collection)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saved_viewpoint_wins_over_camera() {
        let kml = r#"<kml><Document>
            <Camera><longitude>1.0</longitude><latitude>2.0</latitude></Camera>
            <LookAt><longitude>18.4</longitude><latitude>43.8</latitude></LookAt>
            <Placemark><Point><coordinates>5,5</coordinates></Point></Placemark>
        </Document></kml>"#;
        let center = center_from_kml(kml).unwrap();
        assert_eq!(center.source, CenterSource::SavedViewpoint);
        assert_eq!(center.lat, 43.8);
        assert_eq!(center.lon, 18.4);
    }

    #[test]
    fn test_camera_before_bbox() {
        let kml = r#"<kml><Document>
            <Camera><longitude>17.0</longitude><latitude>44.0</latitude><altitude>500</altitude></Camera>
            <Placemark><Point><coordinates>5,5</coordinates></Point></Placemark>
        </Document></kml>"#;
        let center = center_from_kml(kml).unwrap();
        assert_eq!(center.source, CenterSource::CameraViewpoint);
        assert_eq!(center.lat, 44.0);
        assert_eq!(center.lon, 17.0);
    }

    #[test]
    fn test_bbox_fallback() {
        let kml = r#"<kml><Document>
            <Placemark><Point><coordinates>0,0</coordinates></Point></Placemark>
            <Placemark><Point><coordinates>2,2</coordinates></Point></Placemark>
            <Placemark><Point><coordinates>4,0</coordinates></Point></Placemark>
        </Document></kml>"#;
        let center = center_from_kml(kml).unwrap();
        assert_eq!(center.source, CenterSource::BoundingBox);
        assert_eq!(center.lon, 2.0);
        assert_eq!(center.lat, 1.0);
    }

    #[test]
    fn test_no_geometry() {
        let kml = r#"<kml><Document><name>Vide</name></Document></kml>"#;
        assert!(matches!(
            center_from_kml(kml),
            Err(ResolveError::NoGeometry)
        ));
    }
}
