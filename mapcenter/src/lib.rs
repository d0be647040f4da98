//! # mapcenter
//!
//! Résolution d'un centre unique (latitude/longitude) à partir d'un lien de
//! carte ou du document KML d'un calque hébergé.
//!
//! ## Cascade
//!
//! - Lien direct: `@lat,lon,zoom`, puis `!3dLAT!4dLON`, puis `q=lat,lon`
//! - Calque (`mid`): `<LookAt>`, puis `<Camera>`, puis centre d'emprise
//!
//! Le centre d'emprise est le milieu des extrêmes, pas un centroïde.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mapcenter::{MapLink, center_from_kml};
//!
//! match MapLink::classify(link) {
//!     Some(MapLink::Direct(center)) => println!("{} {}", center.lat, center.lon),
//!     Some(MapLink::Layer { mid }) => {
//!         let kml = download(&mid)?;
//!         let center = center_from_kml(&kml)?;
//!     }
//!     None => {}
//! }
//! ```

pub mod bbox;
pub mod error;
pub mod kml;
pub mod link;
pub mod resolve;
pub mod types;

pub use bbox::{bbox_center, Extent};
pub use error::ResolveError;
pub use link::{extract_mid, parse_direct_link, MapLink};
pub use resolve::center_from_kml;
pub use types::{Center, CenterSource};

/// Parse un nombre décimal (fast-float)
#[inline]
pub(crate) fn parse_number(s: &str) -> Option<f64> {
    fast_float::parse(s.trim()).ok()
}
