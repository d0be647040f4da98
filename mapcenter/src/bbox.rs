//! Réduction d'un ensemble de géométries à son centre d'emprise
//!
//! Le centre retourné est le milieu des extrêmes (min+max)/2, pas un
//! centroïde: les valeurs doivent rester comparables d'une exécution à l'autre.

use geo::{Coord, Rect};
use geojson::{FeatureCollection, Value};

use crate::types::{Center, CenterSource};
use crate::ResolveError;

/// Emprise courante (min/max latitude et longitude)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl Default for Extent {
    fn default() -> Self {
        Self {
            min_lat: f64::INFINITY,
            max_lat: f64::NEG_INFINITY,
            min_lon: f64::INFINITY,
            max_lon: f64::NEG_INFINITY,
        }
    }
}

impl Extent {
    /// Ajoute une paire (lon, lat); les valeurs non finies sont ignorées
    pub fn push(&mut self, lon: f64, lat: f64) {
        if !(lon.is_finite() && lat.is_finite()) {
            return;
        }
        self.min_lat = self.min_lat.min(lat);
        self.max_lat = self.max_lat.max(lat);
        self.min_lon = self.min_lon.min(lon);
        self.max_lon = self.max_lon.max(lon);
    }

    /// Ajoute une position GeoJSON `[lon, lat, ...]`
    pub fn push_position(&mut self, position: &[f64]) {
        if let [lon, lat, ..] = *position {
            self.push(lon, lat);
        }
    }

    /// Parcourt récursivement une géométrie, quelle que soit sa profondeur
    pub fn push_value(&mut self, value: &Value) {
        match value {
            Value::Point(p) => self.push_position(p),
            Value::MultiPoint(points) | Value::LineString(points) => {
                points.iter().for_each(|p| self.push_position(p));
            }
            Value::MultiLineString(lines) | Value::Polygon(lines) => {
                lines.iter().flatten().for_each(|p| self.push_position(p));
            }
            Value::MultiPolygon(polygons) => {
                polygons
                    .iter()
                    .flatten()
                    .flatten()
                    .for_each(|p| self.push_position(p));
            }
            Value::GeometryCollection(geometries) => {
                geometries.iter().for_each(|g| self.push_value(&g.value));
            }
        }
    }

    /// Ajoute toutes les géométries d'une collection de features
    pub fn push_collection(&mut self, collection: &FeatureCollection) {
        for feature in &collection.features {
            if let Some(geometry) = &feature.geometry {
                self.push_value(&geometry.value);
            }
        }
    }

    /// Aucune paire valide rencontrée (min > max)
    pub fn is_empty(&self) -> bool {
        self.min_lat > self.max_lat || self.min_lon > self.max_lon
    }

    /// Rectangle `geo` (x = longitude, y = latitude)
    pub fn to_rect(&self) -> Option<Rect<f64>> {
        if self.is_empty() {
            return None;
        }
        Some(Rect::new(
            Coord {
                x: self.min_lon,
                y: self.min_lat,
            },
            Coord {
                x: self.max_lon,
                y: self.max_lat,
            },
        ))
    }
}

/// Centre d'emprise de toutes les géométries d'une collection
pub fn bbox_center(collection: &FeatureCollection) -> Result<Center, ResolveError> {
    let mut extent = Extent::default();
    extent.push_collection(collection);

    let rect = extent.to_rect().ok_or(ResolveError::NoGeometry)?;
    let center = rect.center();
    Ok(Center::new(center.y, center.x, CenterSource::BoundingBox))
}
