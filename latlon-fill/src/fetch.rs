//! Téléchargement des documents KML et politique de pause entre requêtes
//!
//! Les deux sont des traits pour pouvoir être remplacés dans les tests
//! (pas de réseau, pas d'attente réelle).

use std::future::Future;
use std::time::Duration;

use mapcenter::ResolveError;
use tracing::debug;
use url::Url;

/// Endpoint d'export KML de Google My Maps
pub const DEFAULT_KML_ENDPOINT: &str = "https://www.google.com/maps/d/kml";

/// User-Agent envoyé avec chaque requête
const USER_AGENT: &str = concat!("latlon-fill/", env!("CARGO_PKG_VERSION"));

/// URL d'export KML d'un calque (`?mid=<id>&forcekml=1`)
pub fn kml_export_url(endpoint: &str, mid: &str) -> Result<Url, url::ParseError> {
    Url::parse_with_params(endpoint, &[("mid", mid), ("forcekml", "1")])
}

/// Document KML téléchargé
#[derive(Debug, Clone)]
pub struct KmlDocument {
    /// URL effectivement demandée
    pub url: String,

    /// Corps de la réponse
    pub body: String,
}

/// Source de documents KML adressés par identifiant de calque
pub trait KmlFetcher: Send + Sync {
    /// Télécharge le KML d'un calque (une seule tentative)
    fn fetch_kml(&self, mid: &str) -> impl Future<Output = Result<KmlDocument, ResolveError>> + Send;
}

/// Implémentation HTTP avec reqwest
#[derive(Clone)]
pub struct HttpKmlFetcher {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpKmlFetcher {
    /// Crée un client avec un timeout par requête
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ResolveError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ResolveError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

impl KmlFetcher for HttpKmlFetcher {
    async fn fetch_kml(&self, mid: &str) -> Result<KmlDocument, ResolveError> {
        let url = kml_export_url(&self.endpoint, mid)
            .map_err(|e| ResolveError::Http(format!("Invalid KML URL: {}", e)))?;
        debug!(mid = mid, url = %url, "Fetching KML");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ResolveError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::fetch_failed(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ResolveError::Http(e.to_string()))?;

        Ok(KmlDocument {
            url: url.to_string(),
            body,
        })
    }
}

/// Politique d'attente appelée après chaque téléchargement
pub trait Pacer: Send + Sync {
    fn pause(&self) -> impl Future<Output = ()> + Send;
}

/// Pause fixe via `tokio::time::sleep`
#[derive(Debug, Clone, Copy)]
pub struct TokioPacer {
    delay: Duration,
}

impl TokioPacer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Pacer for TokioPacer {
    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

/// Aucune attente
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPause;

impl Pacer for NoPause {
    async fn pause(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kml_export_url() {
        let url = kml_export_url(DEFAULT_KML_ENDPOINT, "1AbC-d_E").unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.google.com/maps/d/kml?mid=1AbC-d_E&forcekml=1"
        );
    }

    #[test]
    fn test_kml_export_url_encodes_mid() {
        let url = kml_export_url("https://example.org/kml", "a&b=c").unwrap();
        assert_eq!(url.as_str(), "https://example.org/kml?mid=a%26b%3Dc&forcekml=1");
    }

    #[test]
    fn test_kml_export_url_invalid_endpoint() {
        assert!(kml_export_url("not an endpoint", "x").is_err());
    }

    #[tokio::test]
    async fn test_tokio_pacer_waits() {
        let pacer = TokioPacer::new(Duration::from_millis(20));
        let start = tokio::time::Instant::now();
        pacer.pause().await;
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[tokio::test]
    async fn test_no_pause() {
        NoPause.pause().await;
    }
}
