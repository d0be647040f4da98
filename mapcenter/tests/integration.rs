//! Tests d'intégration: liens réels et documents KML de type "My Maps"

use mapcenter::{center_from_kml, CenterSource, MapLink, ResolveError};

const MY_MAPS_KML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
  <Document>
    <name>Mjesna zajednica</name>
    <description/>
    <Style id="poly-000000-1200-77-nodesc-normal">
      <LineStyle><color>ff000000</color><width>1.2</width></LineStyle>
    </Style>
    <Folder>
      <name>Sloj bez naslova</name>
      <Placemark>
        <name>Granica</name>
        <styleUrl>#poly-000000-1200-77-nodesc</styleUrl>
        <Polygon>
          <outerBoundaryIs>
            <LinearRing>
              <tessellate>1</tessellate>
              <coordinates>
                18.3900,43.8500,0
                18.4300,43.8500,0
                18.4300,43.8700,0
                18.3900,43.8700,0
                18.3900,43.8500,0
              </coordinates>
            </LinearRing>
          </outerBoundaryIs>
        </Polygon>
      </Placemark>
    </Folder>
  </Document>
</kml>"#;

#[test]
fn test_layer_link_then_bbox() {
    let link = "https://www.google.com/maps/d/edit?mid=1X2y3Z&usp=sharing";
    let mid = match MapLink::classify(link) {
        Some(MapLink::Layer { mid }) => mid,
        other => panic!("Expected layer link, got {:?}", other),
    };
    assert_eq!(mid, "1X2y3Z");

    let center = center_from_kml(MY_MAPS_KML).unwrap();
    assert_eq!(center.source, CenterSource::BoundingBox);
    assert!((center.lat - 43.86).abs() < 1e-9);
    assert!((center.lon - 18.41).abs() < 1e-9);
    assert!(center.is_in_range());
}

#[test]
fn test_direct_links() {
    let cases = [
        (
            "https://www.google.com/maps/place/Ba%C5%A1%C4%8Dar%C5%A1ija/@43.8598,18.4313,17z/data=!3m1",
            43.8598,
            18.4313,
            CenterSource::AtCenter,
        ),
        (
            "https://www.google.com/maps/place/X/data=!4m6!3m5!1s0x0:0x0!8m2!3d44.0!4d17.5!16s",
            44.0,
            17.5,
            CenterSource::DataMarker,
        ),
        (
            "https://maps.google.com/?q=43.1,18.2",
            43.1,
            18.2,
            CenterSource::Query,
        ),
    ];

    for (link, lat, lon, source) in cases {
        match MapLink::classify(link) {
            Some(MapLink::Direct(center)) => {
                assert_eq!(center.lat, lat, "{}", link);
                assert_eq!(center.lon, lon, "{}", link);
                assert_eq!(center.source, source, "{}", link);
            }
            other => panic!("Expected direct link for {}, got {:?}", link, other),
        }
    }
}

#[test]
fn test_empty_document() {
    let kml = r#"<kml xmlns="http://www.opengis.net/kml/2.2"><Document/></kml>"#;
    assert!(matches!(center_from_kml(kml), Err(ResolveError::NoGeometry)));
}
