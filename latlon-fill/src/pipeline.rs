//! Enrichissement séquentiel des lignes
//!
//! Une ligne à la fois, dans l'ordre du fichier. Un échec de résolution est
//! enregistré sur la ligne concernée et n'interrompt jamais le traitement.

use std::collections::HashMap;

use mapcenter::{center_from_kml, Center, MapLink};
use tracing::{debug, info, warn};

use crate::fetch::{KmlFetcher, Pacer};
use crate::report::RunReport;
use crate::table::{Columns, Table};

/// Résultat de résolution d'une ligne
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Centre trouvé
    Resolved(Center),
    /// Résolution du calque en échec (message)
    Failed(String),
    /// Pas de lien exploitable: ni centre ni erreur
    Unresolved,
}

impl Outcome {
    pub fn center(&self) -> Option<&Center> {
        match self {
            Self::Resolved(center) => Some(center),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Ligne enrichie (forme typée d'une ligne de la table)
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    /// Index de la ligne (0 = première ligne de données)
    pub row: usize,
    pub name: String,
    pub city: String,
    pub link: String,
    /// Identifiant de calque si le lien en contient un
    pub mid: Option<String>,
    /// Colonnes d'origine, dans l'ordre de l'en-tête
    pub fields: Vec<(String, String)>,
    pub outcome: Outcome,
}

/// Résolution d'un lien
#[derive(Debug, Clone, PartialEq)]
pub struct LinkResolution {
    pub mid: Option<String>,
    pub outcome: Outcome,
}

/// Colonnes cibles du mode fill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetColumns {
    pub lat: usize,
    pub lon: usize,
}

/// Résout les liens; chaque `mid` n'est téléchargé qu'une fois par exécution
pub struct Resolver<F, P> {
    fetcher: F,
    pacer: P,
    layers: HashMap<String, Outcome>,
    fetches: usize,
    reused: usize,
}

impl<F: KmlFetcher, P: Pacer> Resolver<F, P> {
    pub fn new(fetcher: F, pacer: P) -> Self {
        Self {
            fetcher,
            pacer,
            layers: HashMap::new(),
            fetches: 0,
            reused: 0,
        }
    }

    /// Nombre de téléchargements effectués
    pub fn fetches(&self) -> usize {
        self.fetches
    }

    /// Nombre de résolutions réutilisées
    pub fn reused(&self) -> usize {
        self.reused
    }

    /// Résout un lien: coordonnée directe, sinon calque `mid`, sinon rien
    pub async fn resolve_link(&mut self, link: &str) -> LinkResolution {
        match MapLink::classify(link) {
            Some(MapLink::Direct(center)) => {
                warn_out_of_range(&center, link);
                LinkResolution {
                    mid: mapcenter::extract_mid(link),
                    outcome: Outcome::Resolved(center),
                }
            }
            Some(MapLink::Layer { mid }) => {
                let outcome = self.resolve_layer(&mid).await;
                LinkResolution {
                    mid: Some(mid),
                    outcome,
                }
            }
            None => LinkResolution {
                mid: None,
                outcome: Outcome::Unresolved,
            },
        }
    }

    /// Télécharge et résout un calque, ou réutilise un résultat déjà obtenu
    pub async fn resolve_layer(&mut self, mid: &str) -> Outcome {
        if let Some(outcome) = self.layers.get(mid) {
            self.reused += 1;
            debug!(mid = mid, "Reusing layer resolution");
            return outcome.clone();
        }

        let result = match self.fetcher.fetch_kml(mid).await {
            Ok(doc) => center_from_kml(&doc.body).map(|center| center.with_kml(doc.url)),
            Err(e) => Err(e),
        };
        self.fetches += 1;
        self.pacer.pause().await;

        let outcome = match result {
            Ok(center) => {
                warn_out_of_range(&center, mid);
                debug!(mid = mid, source = %center.source, "Layer resolved");
                Outcome::Resolved(center)
            }
            Err(e) => {
                warn!("mid={}: {}", mid, e);
                Outcome::Failed(e.to_string())
            }
        };

        self.layers.insert(mid.to_string(), outcome.clone());
        outcome
    }

    /// Enrichit toutes les lignes de la table (mode dataset)
    pub async fn enrich(
        &mut self,
        table: &Table,
        columns: &Columns,
        report: &mut RunReport,
    ) -> Vec<EnrichedRecord> {
        let mut records = Vec::with_capacity(table.rows.len());

        for row in 0..table.rows.len() {
            let link = table.cell(row, columns.link).trim().to_string();
            let resolution = self.resolve_link(&link).await;
            record_outcome(report, row, &resolution);

            records.push(EnrichedRecord {
                row,
                name: Columns::first_value(table, row, &columns.name).to_string(),
                city: Columns::first_value(table, row, &columns.city).to_string(),
                link,
                mid: resolution.mid,
                fields: table.fields(row),
                outcome: resolution.outcome,
            });
        }

        report.fetches = self.fetches;
        report.reused = self.reused;
        info!(records = records.len(), fetches = self.fetches, "Enrichment done");
        records
    }

    /// Remplit lat/lon dans la table (mode mise à jour)
    ///
    /// Sans `overwrite`, seules les lignes dont lat ou lon est vide sont
    /// traitées. Retourne le nombre de lignes dont une valeur a changé.
    pub async fn fill(
        &mut self,
        table: &mut Table,
        columns: &Columns,
        targets: TargetColumns,
        overwrite: bool,
        report: &mut RunReport,
    ) -> usize {
        let mut changed = 0;

        for row in 0..table.rows.len() {
            if !overwrite && !needs_fill(table, row, targets) {
                report.record_skipped();
                continue;
            }

            let link = table.cell(row, columns.link).trim().to_string();
            let resolution = self.resolve_link(&link).await;
            record_outcome(report, row, &resolution);

            if let Outcome::Resolved(center) = &resolution.outcome {
                let lat_changed = table.set_cell(row, targets.lat, format_coord(center.lat));
                let lon_changed = table.set_cell(row, targets.lon, format_coord(center.lon));
                if lat_changed || lon_changed {
                    changed += 1;
                }
            }
        }

        report.fetches = self.fetches;
        report.reused = self.reused;
        report.changed = changed;
        info!(changed = changed, fetches = self.fetches, "Fill done");
        changed
    }
}

/// Les centres hors plage sont conservés, mais signalés
fn warn_out_of_range(center: &Center, origin: &str) {
    if !center.is_in_range() {
        warn!(origin = origin, lat = center.lat, lon = center.lon, "Center out of range");
    }
}

fn record_outcome(report: &mut RunReport, row: usize, resolution: &LinkResolution) {
    match &resolution.outcome {
        Outcome::Resolved(center) => report.record_resolved(center.source),
        Outcome::Failed(message) => report.record_failure(row, resolution.mid.as_deref(), message),
        Outcome::Unresolved => report.record_unresolved(),
    }
}

/// Vrai si lat ou lon est vide
fn needs_fill(table: &Table, row: usize, targets: TargetColumns) -> bool {
    table.cell(row, targets.lat).trim().is_empty() || table.cell(row, targets.lon).trim().is_empty()
}

/// Représentation décimale la plus courte qui relit la même valeur
pub fn format_coord(value: f64) -> String {
    value.to_string()
}

/// Une ligne par calque (lignes sans `mid` exclues)
///
/// Chaque `mid` garde la position de sa première apparition, mais la ligne
/// retenue est la dernière qui le porte.
pub fn unique_layers(records: Vec<EnrichedRecord>) -> Vec<EnrichedRecord> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<EnrichedRecord> = Vec::new();

    for record in records {
        let Some(mid) = record.mid.clone() else {
            continue;
        };
        match positions.get(&mid) {
            Some(&index) => unique[index] = record,
            None => {
                positions.insert(mid, unique.len());
                unique.push(record);
            }
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{KmlDocument, NoPause};
    use mapcenter::{CenterSource, ResolveError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const LOOKAT_KML: &str = r#"<kml><Document><LookAt>
        <longitude>18.41</longitude><latitude>43.85</latitude>
    </LookAt></Document></kml>"#;

    struct StaticFetcher {
        calls: AtomicUsize,
    }

    impl StaticFetcher {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl KmlFetcher for StaticFetcher {
        async fn fetch_kml(&self, mid: &str) -> Result<KmlDocument, ResolveError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match mid {
                "private" => Err(ResolveError::fetch_failed(403)),
                "empty" => Ok(KmlDocument {
                    url: format!("mock://{}", mid),
                    body: "<kml><Document/></kml>".to_string(),
                }),
                _ => Ok(KmlDocument {
                    url: format!("mock://{}", mid),
                    body: LOOKAT_KML.to_string(),
                }),
            }
        }
    }

    #[tokio::test]
    async fn test_resolve_direct_link() {
        let mut resolver = Resolver::new(StaticFetcher::new(), NoPause);
        let resolution = resolver
            .resolve_link("https://maps.example/@43.85,18.41,15z")
            .await;
        let center = resolution.outcome.center().unwrap();
        assert_eq!(center.source, CenterSource::AtCenter);
        assert_eq!(center.kml, None);
        assert_eq!(resolver.fetches(), 0);
    }

    #[tokio::test]
    async fn test_resolve_layer_once_per_mid() {
        let mut resolver = Resolver::new(StaticFetcher::new(), NoPause);
        let link = "https://www.google.com/maps/d/viewer?mid=abc";
        let first = resolver.resolve_link(link).await;
        let second = resolver.resolve_link(link).await;

        assert_eq!(first, second);
        assert_eq!(resolver.fetches(), 1);
        assert_eq!(resolver.reused(), 1);
        assert_eq!(resolver.fetcher.calls.load(Ordering::SeqCst), 1);

        let center = first.outcome.center().unwrap();
        assert_eq!(center.source, CenterSource::SavedViewpoint);
        assert_eq!(center.kml.as_deref(), Some("mock://abc"));
    }

    #[tokio::test]
    async fn test_failures_are_outcomes() {
        let mut resolver = Resolver::new(StaticFetcher::new(), NoPause);

        let private = resolver.resolve_layer("private").await;
        assert_eq!(private.error(), Some("KML fetch failed 403"));

        let empty = resolver.resolve_layer("empty").await;
        assert_eq!(empty.error(), Some("No geometry found in KML"));
    }

    #[tokio::test]
    async fn test_unusable_link() {
        let mut resolver = Resolver::new(StaticFetcher::new(), NoPause);
        for link in ["", "not a link", "https://maps.example/?q=Sarajevo"] {
            let resolution = resolver.resolve_link(link).await;
            assert_eq!(resolution.outcome, Outcome::Unresolved);
            assert_eq!(resolution.mid, None);
        }
        assert_eq!(resolver.fetches(), 0);
    }

    #[test]
    fn test_format_coord() {
        assert_eq!(format_coord(43.85), "43.85");
        assert_eq!(format_coord(-18.0), "-18");
        assert_eq!(format_coord(1.0 / 3.0), "0.3333333333333333");
    }

    #[test]
    fn test_unique_layers() {
        let record = |row: usize, mid: Option<&str>| EnrichedRecord {
            row,
            name: String::new(),
            city: String::new(),
            link: String::new(),
            mid: mid.map(String::from),
            fields: Vec::new(),
            outcome: Outcome::Unresolved,
        };
        let records = vec![
            record(0, Some("a")),
            record(1, None),
            record(2, Some("b")),
            record(3, Some("a")),
        ];
        let rows: Vec<usize> = unique_layers(records).iter().map(|r| r.row).collect();
        // position de la première apparition, contenu de la dernière
        assert_eq!(rows, vec![3, 2]);
    }

    #[test]
    fn test_unique_layers_keeps_last_record_of_layer() {
        let record = |row: usize, name: &str| EnrichedRecord {
            row,
            name: name.to_string(),
            city: String::new(),
            link: String::new(),
            mid: Some("a".to_string()),
            fields: Vec::new(),
            outcome: Outcome::Unresolved,
        };
        let unique = unique_layers(vec![record(0, "Prva"), record(1, "Druga")]);
        assert_eq!(unique.len(), 1);
        assert_eq!((unique[0].row, unique[0].name.as_str()), (1, "Druga"));
    }

    #[tokio::test]
    async fn test_out_of_range_direct_link_is_kept() {
        let mut resolver = Resolver::new(StaticFetcher::new(), NoPause);
        let resolution = resolver
            .resolve_link("https://maps.example/@95,200,15z")
            .await;
        let center = resolution.outcome.center().unwrap();
        assert_eq!((center.lat, center.lon), (95.0, 200.0));
        assert!(!center.is_in_range());
        assert_eq!(resolver.fetches(), 0);
    }

    fn fill_table(lat: &str, lon: &str) -> (Table, Columns, TargetColumns) {
        let table = Table {
            headers: vec!["Link".into(), "lat".into(), "lon".into()],
            rows: vec![vec![
                "https://maps.example/@43.85,18.41,15z".into(),
                lat.into(),
                lon.into(),
            ]],
        };
        let columns = Columns {
            link: 0,
            name: Vec::new(),
            city: Vec::new(),
        };
        (table, columns, TargetColumns { lat: 1, lon: 2 })
    }

    #[tokio::test]
    async fn test_fill_half_empty_row_rewrites_both() {
        let mut resolver = Resolver::new(StaticFetcher::new(), NoPause);
        let (mut table, columns, targets) = fill_table("", "17.0");
        let mut report = RunReport::new("fill");

        let changed = resolver
            .fill(&mut table, &columns, targets, false, &mut report)
            .await;
        assert_eq!(changed, 1);
        assert_eq!(table.cell(0, 1), "43.85");
        assert_eq!(table.cell(0, 2), "18.41");
    }

    #[tokio::test]
    async fn test_fill_complete_row_is_skipped() {
        let mut resolver = Resolver::new(StaticFetcher::new(), NoPause);
        let (mut table, columns, targets) = fill_table("44.0", "17.0");
        let mut report = RunReport::new("fill");

        let changed = resolver
            .fill(&mut table, &columns, targets, false, &mut report)
            .await;
        assert_eq!(changed, 0);
        assert_eq!(table.cell(0, 1), "44.0");
        assert_eq!(report.skipped, 1);
    }
}
