//! Types d'erreurs pour le crate mapcenter

use thiserror::Error;

/// Erreurs pouvant survenir lors de la résolution d'un centre
///
/// Les stratégies "essayer la suivante" ne produisent jamais d'erreur:
/// seul l'épuisement de la cascade (ou un échec réseau) en est une.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Réponse HTTP non-succès lors du téléchargement du KML
    #[error("KML fetch failed {status}")]
    FetchFailed { status: u16 },

    /// Erreur de transport (DNS, TLS, timeout...)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Document KML illisible
    #[error("Invalid KML: {0}")]
    InvalidKml(String),

    /// Aucune géométrie exploitable dans le document
    #[error("No geometry found in KML")]
    NoGeometry,
}

impl ResolveError {
    /// Crée une erreur de fetch avec le code HTTP
    pub fn fetch_failed(status: u16) -> Self {
        Self::FetchFailed { status }
    }
}
