//! Analyse des liens de carte: coordonnées directes et identifiants de calque
//!
//! Chaque stratégie retourne `Option`: l'absence de correspondance n'est pas
//! une erreur, on passe simplement à la stratégie suivante.

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

use crate::types::{Center, CenterSource};

/// Référence de carte dérivée d'un lien
#[derive(Debug, Clone, PartialEq)]
pub enum MapLink {
    /// Le lien encode directement un point
    Direct(Center),

    /// Le lien pointe vers un calque hébergé (téléchargement requis)
    Layer { mid: String },
}

impl MapLink {
    /// Classe un lien: coordonnée directe d'abord, sinon identifiant `mid`
    pub fn classify(link: &str) -> Option<Self> {
        let link = link.trim();
        if link.is_empty() {
            return None;
        }
        if let Some(center) = parse_direct_link(link) {
            return Some(Self::Direct(center));
        }
        extract_mid(link).map(|mid| Self::Layer { mid })
    }
}

fn at_center_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"@(-?\d+\.?\d*),(-?\d+\.?\d*),").expect("static regex"))
}

fn data_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"!3d(-?\d+\.?\d*)!4d(-?\d+\.?\d*)").expect("static regex"))
}

fn query_pair_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(-?\d+\.?\d*)[, ]+(-?\d+\.?\d*)").expect("static regex"))
}

/// Extrait une coordonnée encodée directement dans une URL de carte
///
/// Ordre: `@lat,lon,zoom` dans le chemin, puis `!3dLAT!4dLON` n'importe où,
/// puis `q=lat,lon` (virgule ou espace).
pub fn parse_direct_link(link: &str) -> Option<Center> {
    let url = Url::parse(link.trim()).ok()?;

    if let Some((lat, lon)) = capture_pair(at_center_re(), url.path()) {
        return Some(Center::new(lat, lon, CenterSource::AtCenter));
    }

    // !3d = latitude, !4d = longitude
    if let Some((lat, lon)) = capture_pair(data_marker_re(), url.as_str()) {
        return Some(Center::new(lat, lon, CenterSource::DataMarker));
    }

    let q = query_param(&url, "q")?;
    capture_pair(query_pair_re(), &q).map(|(lat, lon)| Center::new(lat, lon, CenterSource::Query))
}

/// Extrait l'identifiant de calque (`mid`) d'un lien
pub fn extract_mid(link: &str) -> Option<String> {
    let url = Url::parse(link.trim()).ok()?;
    query_param(&url, "mid").filter(|mid| !mid.is_empty())
}

fn query_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

fn capture_pair(re: &Regex, haystack: &str) -> Option<(f64, f64)> {
    let caps = re.captures(haystack)?;
    let first = crate::parse_number(caps.get(1)?.as_str())?;
    let second = crate::parse_number(caps.get(2)?.as_str())?;
    (first.is_finite() && second.is_finite()).then_some((first, second))
}
