//! Types de données pour le crate mapcenter

use serde::{Deserialize, Serialize};

/// Stratégie de la cascade ayant produit un centre
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CenterSource {
    /// `@lat,lon,zoom` dans le chemin de l'URL
    #[serde(rename = "@center")]
    AtCenter,

    /// Marqueurs `!3dLAT!4dLON`
    #[serde(rename = "!3d!4d")]
    DataMarker,

    /// Paramètre `q=lat,lon`
    #[serde(rename = "q")]
    Query,

    /// Bloc `<LookAt>` du KML
    #[serde(rename = "saved-viewpoint")]
    SavedViewpoint,

    /// Bloc `<Camera>` du KML
    #[serde(rename = "camera-viewpoint")]
    CameraViewpoint,

    /// Centre de l'emprise de toutes les géométries
    #[serde(rename = "bounding-box")]
    BoundingBox,
}

impl CenterSource {
    /// Tag de provenance tel qu'écrit dans les sorties
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AtCenter => "@center",
            Self::DataMarker => "!3d!4d",
            Self::Query => "q",
            Self::SavedViewpoint => "saved-viewpoint",
            Self::CameraViewpoint => "camera-viewpoint",
            Self::BoundingBox => "bounding-box",
        }
    }

    /// Vrai si le centre a nécessité le téléchargement d'un calque
    pub fn is_layer(&self) -> bool {
        matches!(
            self,
            Self::SavedViewpoint | Self::CameraViewpoint | Self::BoundingBox
        )
    }
}

impl std::fmt::Display for CenterSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Un centre résolu (degrés décimaux WGS84)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Center {
    pub lat: f64,
    pub lon: f64,

    /// Stratégie ayant produit ce centre
    pub source: CenterSource,

    /// URL du KML téléchargé (uniquement pour les calques)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kml: Option<String>,
}

impl Center {
    pub fn new(lat: f64, lon: f64, source: CenterSource) -> Self {
        Self {
            lat,
            lon,
            source,
            kml: None,
        }
    }

    /// Attache l'URL du document source
    pub fn with_kml(mut self, url: impl Into<String>) -> Self {
        self.kml = Some(url.into());
        self
    }

    /// Latitude dans [-90, 90] et longitude dans [-180, 180]
    pub fn is_in_range(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }
}
