//! Lecture et écriture du fichier tabulaire (CSV avec en-tête)
//!
//! Les lignes restent non typées (chaînes ordonnées selon l'en-tête) jusqu'à
//! la résolution: voir `pipeline::EnrichedRecord` pour la forme typée.

use std::path::Path;

use thiserror::Error;
use tracing::warn;

use crate::config::Config;

/// Erreurs du fichier tabulaire
#[derive(Debug, Error)]
pub enum TableError {
    /// Erreur d'I/O
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Table malformée ou vide
    #[error("Parse error in {file}: {reason}")]
    Parse { file: String, reason: String },

    /// Aucune colonne de lien identifiable
    #[error("No link column found in {file} (headers: {headers})")]
    NoLinkColumn { file: String, headers: String },

    /// Erreur de sérialisation
    #[error("Write error: {0}")]
    Write(String),
}

impl TableError {
    /// Crée une erreur de parsing avec contexte
    pub fn parse_error(file: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            file: file.into(),
            reason: reason.into(),
        }
    }
}

/// Table en mémoire: en-tête + lignes de même largeur
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Lit un fichier tabulaire
    pub fn read(path: &Path, delimiter: u8) -> Result<Self, TableError> {
        let bytes = std::fs::read(path)?;
        Self::parse(&bytes, delimiter, &path.display().to_string())
    }

    /// Parse un contenu tabulaire (UTF-8, BOM retiré)
    ///
    /// `file` ne sert qu'aux messages d'erreur.
    pub fn parse(bytes: &[u8], delimiter: u8, file: &str) -> Result<Self, TableError> {
        let (text, had_errors) = encoding_rs::UTF_8.decode_with_bom_removal(bytes);
        if had_errors {
            warn!(file = file, "Invalid UTF-8 sequences replaced");
        }

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| TableError::parse_error(file, e.to_string()))?
            .iter()
            .map(String::from)
            .collect();

        if headers.iter().all(|h| h.trim().is_empty()) {
            return Err(TableError::parse_error(file, "empty table (no header row)"));
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| TableError::parse_error(file, e.to_string()))?;
            rows.push(record.iter().map(String::from).collect());
        }

        Ok(Self { headers, rows })
    }

    /// Index d'une colonne par nom exact
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Index de la colonne, créée (vide) en fin d'en-tête si absente
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column(name) {
            return idx;
        }
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.push(String::new());
        }
        self.headers.len() - 1
    }

    /// Colonne du lien: premier en-tête présent dans les candidats,
    /// sinon premier en-tête contenant "link" (insensible à la casse)
    pub fn find_link_column(&self, candidates: &[String]) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| candidates.iter().any(|c| c == h))
            .or_else(|| {
                self.headers
                    .iter()
                    .position(|h| h.to_lowercase().contains("link"))
            })
    }

    /// Valeur d'une cellule (chaîne vide si hors limites)
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Écrit une cellule; retourne vrai si la valeur a changé
    pub fn set_cell(&mut self, row: usize, col: usize, value: String) -> bool {
        match self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            Some(cell) if *cell != value => {
                *cell = value;
                true
            }
            _ => false,
        }
    }

    /// Paires (en-tête, valeur) d'une ligne, dans l'ordre des colonnes
    pub fn fields(&self, row: usize) -> Vec<(String, String)> {
        self.headers
            .iter()
            .enumerate()
            .map(|(col, h)| (h.clone(), self.cell(row, col).to_string()))
            .collect()
    }

    /// Sérialise la table (en-tête inclus)
    pub fn to_bytes(&self, delimiter: u8) -> Result<Vec<u8>, TableError> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(Vec::new());

        writer
            .write_record(&self.headers)
            .map_err(|e| TableError::Write(e.to_string()))?;
        for row in &self.rows {
            writer
                .write_record(row)
                .map_err(|e| TableError::Write(e.to_string()))?;
        }

        writer
            .into_inner()
            .map_err(|e| TableError::Write(e.to_string()))
    }

    /// Écrit la table dans un fichier
    pub fn write(&self, path: &Path, delimiter: u8) -> Result<(), TableError> {
        let bytes = self.to_bytes(delimiter)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

/// Colonnes utiles d'une table
#[derive(Debug, Clone, PartialEq)]
pub struct Columns {
    /// Colonne du lien de carte
    pub link: usize,

    /// Colonnes candidates pour le nom (ordre de priorité)
    pub name: Vec<usize>,

    /// Colonnes candidates pour la ville (ordre de priorité)
    pub city: Vec<usize>,
}

impl Columns {
    /// Découvre les colonnes selon la configuration
    pub fn discover(table: &Table, config: &Config, file: &str) -> Result<Self, TableError> {
        let link = table
            .find_link_column(&config.link_columns)
            .ok_or_else(|| TableError::NoLinkColumn {
                file: file.to_string(),
                headers: table.headers.join(", "),
            })?;

        let lookup = |names: &[String]| -> Vec<usize> {
            names.iter().filter_map(|n| table.column(n)).collect()
        };

        Ok(Self {
            link,
            name: lookup(&config.name_columns),
            city: lookup(&config.city_columns),
        })
    }

    /// Première valeur non vide parmi les candidats
    pub fn first_value<'a>(table: &'a Table, row: usize, candidates: &[usize]) -> &'a str {
        candidates
            .iter()
            .map(|&col| table.cell(row, col))
            .find(|v| !v.is_empty())
            .unwrap_or("")
    }
}
