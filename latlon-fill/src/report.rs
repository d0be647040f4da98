//! Rapport d'exécution avec graceful degradation
//!
//! Ce module collecte les résultats de résolution ligne par ligne
//! (succès par stratégie, échecs, lignes ignorées) et les affiche.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use mapcenter::CenterSource;
use serde::Serialize;

/// Statut global de l'exécution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunStatus {
    /// Toutes les lignes avec un lien exploitable ont été résolues
    Success,
    /// Certaines résolutions ont échoué
    PartialSuccess,
    /// Aucune résolution n'a abouti malgré des échecs
    Failed,
}

/// Échec de résolution d'une ligne
#[derive(Debug, Clone, Serialize)]
pub struct RecordError {
    /// Index de la ligne (0 = première ligne de données)
    pub row: usize,
    /// Identifiant de calque concerné (optionnel)
    pub mid: Option<String>,
    /// Message d'erreur
    pub message: String,
}

/// Rapport complet d'une exécution
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Commande exécutée (centers, fill)
    pub command: String,
    /// Durée de l'exécution
    pub duration_secs: f64,
    /// Statut global
    pub status: RunStatus,

    /// Nombre de lignes lues
    pub records: usize,
    /// Nombre de lignes résolues
    pub resolved: usize,
    /// Nombre de lignes en échec
    pub failed: usize,
    /// Lignes sans lien exploitable
    pub unresolved: usize,
    /// Lignes déjà renseignées (fill sans overwrite)
    pub skipped: usize,
    /// Téléchargements KML effectués
    pub fetches: usize,
    /// Résolutions réutilisées pour un `mid` déjà vu
    pub reused: usize,
    /// Lignes dont la valeur écrite a changé
    pub changed: usize,

    /// Résolutions par stratégie
    pub by_source: BTreeMap<CenterSource, usize>,

    /// Liste des erreurs
    pub errors: Vec<RecordError>,
}

impl Default for RunReport {
    fn default() -> Self {
        Self {
            command: String::new(),
            duration_secs: 0.0,
            status: RunStatus::Success,
            records: 0,
            resolved: 0,
            failed: 0,
            unresolved: 0,
            skipped: 0,
            fetches: 0,
            reused: 0,
            changed: 0,
            by_source: BTreeMap::new(),
            errors: Vec::new(),
        }
    }
}

impl RunReport {
    /// Crée un nouveau rapport pour une commande
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            ..Default::default()
        }
    }

    /// Enregistre une ligne résolue
    pub fn record_resolved(&mut self, source: CenterSource) {
        self.records += 1;
        self.resolved += 1;
        *self.by_source.entry(source).or_default() += 1;
    }

    /// Enregistre une ligne en échec
    pub fn record_failure(&mut self, row: usize, mid: Option<&str>, message: &str) {
        self.records += 1;
        self.failed += 1;
        self.errors.push(RecordError {
            row,
            mid: mid.map(String::from),
            message: message.to_string(),
        });
    }

    /// Enregistre une ligne sans lien exploitable
    pub fn record_unresolved(&mut self) {
        self.records += 1;
        self.unresolved += 1;
    }

    /// Enregistre une ligne déjà renseignée
    pub fn record_skipped(&mut self) {
        self.records += 1;
        self.skipped += 1;
    }

    /// Définit la durée de l'exécution
    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_secs = duration.as_secs_f64();
    }

    /// Détermine le statut final basé sur les erreurs
    pub fn finalize(&mut self) {
        self.status = if self.failed == 0 {
            RunStatus::Success
        } else if self.resolved > 0 {
            RunStatus::PartialSuccess
        } else {
            RunStatus::Failed
        };
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        println!("\n{}", "=".repeat(60));
        println!("RUN REPORT - {}", self.command);
        println!("{}", "=".repeat(60));

        println!("\nStatus: {:?}", self.status);
        println!("Duration: {:.2}s", self.duration_secs);

        println!("\n--- SUMMARY ---");
        println!(
            "Records: {} resolved, {} failed, {} without link, {} already filled",
            self.resolved, self.failed, self.unresolved, self.skipped
        );
        println!(
            "KML: {} fetched, {} reused",
            self.fetches, self.reused
        );

        if !self.by_source.is_empty() {
            println!("\n--- BY SOURCE ---");
            for (source, count) in &self.by_source {
                println!("  {}: {}", source, count);
            }
        }

        if !self.errors.is_empty() {
            println!("\n--- ERRORS ({}) ---", self.errors.len());
            for e in self.errors.iter().take(20) {
                let location = match &e.mid {
                    Some(mid) => format!("[row {}:{}]", e.row, mid),
                    None => format!("[row {}]", e.row),
                };
                println!("  {} {}", location, e.message);
            }
            if self.errors.len() > 20 {
                println!("  ... and {} more", self.errors.len() - 20);
            }
        }

        println!("\n{}", "=".repeat(60));
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Affichage compact pour le résumé
    pub fn summary(&self) -> String {
        format!(
            "{}: {} records, {} resolved, {} failed, {} unresolved",
            self.command, self.records, self.resolved, self.failed, self.unresolved
        )
    }
}
