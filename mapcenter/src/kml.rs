//! Lecture des documents KML: points de vue enregistrés et géométries
//!
//! Les noms d'éléments sont comparés sur leur nom local (sans namespace),
//! sans tenir compte de la casse.

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};
use roxmltree::{Document, Node};

use crate::ResolveError;

/// Parse un document KML
pub fn parse_document(text: &str) -> Result<Document<'_>, ResolveError> {
    Document::parse(text).map_err(|e| ResolveError::InvalidKml(e.to_string()))
}

fn is_named(node: &Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name().eq_ignore_ascii_case(name)
}

fn child_element<'a, 'input>(node: &Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| is_named(n, name))
}

fn descendant_text<'a>(node: &Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.descendants().find(|n| is_named(n, name))?.text()
}

/// Paire (longitude, latitude) du premier bloc `block` qui en contient une
///
/// La longitude précède la latitude dans les blocs `<LookAt>` et `<Camera>`.
pub fn viewpoint(doc: &Document, block: &str) -> Option<(f64, f64)> {
    doc.descendants()
        .filter(|n| is_named(n, block))
        .find_map(|n| {
            let lon = crate::parse_number(descendant_text(&n, "longitude")?)?;
            let lat = crate::parse_number(descendant_text(&n, "latitude")?)?;
            (lon.is_finite() && lat.is_finite()).then_some((lon, lat))
        })
}

/// Convertit les `Placemark` d'un document en collection GeoJSON
pub fn to_feature_collection(doc: &Document) -> FeatureCollection {
    let features = doc
        .descendants()
        .filter(|n| is_named(n, "Placemark"))
        .map(|placemark| placemark_feature(&placemark))
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

fn placemark_feature(placemark: &Node) -> Feature {
    let geometry = placemark.children().find_map(|n| geometry(&n)).map(Geometry::new);

    let mut properties = JsonObject::new();
    for key in ["name", "description"] {
        if let Some(text) = child_element(placemark, key).and_then(|n| n.text()) {
            properties.insert(key.to_string(), JsonValue::String(text.trim().to_string()));
        }
    }

    Feature {
        bbox: None,
        geometry,
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Géométrie d'un élément KML, ou `None` si l'élément n'en est pas une
fn geometry(node: &Node) -> Option<Value> {
    if !node.is_element() {
        return None;
    }
    let name = node.tag_name().name();

    if name.eq_ignore_ascii_case("Point") {
        // Un point sans coordonnées reste une géométrie, ignorée par la réduction
        let position = coordinates(node).into_iter().next().unwrap_or_default();
        return Some(Value::Point(position));
    }
    if name.eq_ignore_ascii_case("LineString") || name.eq_ignore_ascii_case("LinearRing") {
        return Some(Value::LineString(coordinates(node)));
    }
    if name.eq_ignore_ascii_case("Polygon") {
        return Some(Value::Polygon(polygon_rings(node)));
    }
    if name.eq_ignore_ascii_case("Track") {
        return Some(Value::LineString(track_coords(node)));
    }
    if name.eq_ignore_ascii_case("MultiGeometry") || name.eq_ignore_ascii_case("MultiTrack") {
        let children = node
            .children()
            .filter_map(|n| geometry(&n))
            .map(Geometry::new)
            .collect();
        return Some(Value::GeometryCollection(children));
    }
    None
}

fn coordinates(node: &Node) -> Vec<Vec<f64>> {
    descendant_text(node, "coordinates")
        .map(parse_coordinates)
        .unwrap_or_default()
}

/// Anneaux d'un polygone: extérieur d'abord, puis intérieurs
fn polygon_rings(node: &Node) -> Vec<Vec<Vec<f64>>> {
    let mut rings = Vec::new();
    for boundary in ["outerBoundaryIs", "innerBoundaryIs"] {
        for b in node.children().filter(|n| is_named(n, boundary)) {
            rings.extend(
                b.descendants()
                    .filter(|n| is_named(n, "LinearRing"))
                    .map(|ring| coordinates(&ring)),
            );
        }
    }
    rings
}

/// `gx:coord` = "lon lat alt" séparés par des espaces
fn track_coords(node: &Node) -> Vec<Vec<f64>> {
    node.children()
        .filter(|n| is_named(n, "coord"))
        .filter_map(|n| n.text())
        .map(|text| text.split_whitespace().map(number_or_nan).collect())
        .collect()
}

/// Parse un bloc `<coordinates>`: tuples `lon,lat[,alt]` séparés par des blancs
///
/// Les valeurs illisibles deviennent NaN et sont ignorées par la réduction.
pub fn parse_coordinates(text: &str) -> Vec<Vec<f64>> {
    text.split_whitespace()
        .map(|tuple| tuple.split(',').map(number_or_nan).collect())
        .collect()
}

fn number_or_nan(s: &str) -> f64 {
    crate::parse_number(s).unwrap_or(f64::NAN)
}
