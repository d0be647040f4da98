//! # latlon-fill
//!
//! Enrichissement d'un tableur de lieux avec les coordonnées du centre de
//! la carte liée à chaque ligne.
//!
//! ## Features
//!
//! - Découverte de la colonne du lien par noms candidats
//! - Liens directs (`@lat,lon`, `!3d!4d`, `q=`) sans réseau
//! - Calques My Maps (`mid`): un téléchargement KML par identifiant, pause polie
//! - Export JSON/GeoJSON ou mise à jour en place des colonnes lat/lon
//!
//! ## Usage CLI
//!
//! ```bash
//! # Dataset des centres
//! latlon-fill centers --input export.csv --output data/centers.json
//!
//! # Mise à jour de lat/lon dans le tableur
//! latlon-fill fill --input export.csv
//! ```

pub mod cli;
pub mod config;
pub mod export;
pub mod fetch;
pub mod pipeline;
pub mod report;
pub mod table;

pub use config::Config;
pub use fetch::{HttpKmlFetcher, KmlFetcher, NoPause, Pacer, TokioPacer};
pub use pipeline::{EnrichedRecord, Outcome, Resolver};
pub use report::{RunReport, RunStatus};
pub use table::{Columns, Table, TableError};
