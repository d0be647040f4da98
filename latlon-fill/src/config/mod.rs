//! Configuration du système

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::fetch::DEFAULT_KML_ENDPOINT;

/// Configuration principale
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Noms de colonne reconnus pour le lien (par ordre de priorité)
    pub link_columns: Vec<String>,

    /// Colonnes candidates pour le nom du lieu
    pub name_columns: Vec<String>,

    /// Colonnes candidates pour la ville
    pub city_columns: Vec<String>,

    /// Colonne cible de la latitude
    pub lat_column: String,

    /// Colonne cible de la longitude
    pub lon_column: String,

    /// Écraser les lat/lon déjà renseignées
    pub overwrite: bool,

    /// Pause entre deux téléchargements KML (millisecondes)
    pub delay_ms: u64,

    /// Timeout d'un téléchargement KML (secondes)
    pub timeout_secs: u64,

    /// Endpoint d'export KML (reçoit `mid` et `forcekml=1`)
    pub kml_endpoint: String,

    /// Séparateur du fichier tabulaire
    pub delimiter: char,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            link_columns: [
                "Link_11_52",
                "Link ka generisanoj mapi sa oblikom",
                "Link ka mapi sa oblikom \"11-52\"",
                "Link",
                "Mapa",
                "URL",
            ]
            .map(String::from)
            .to_vec(),
            name_columns: ["Naziv_lokacije", "Naziv"].map(String::from).to_vec(),
            city_columns: ["Grad", "Grad (za dijasporu, navesti i državu)"]
                .map(String::from)
                .to_vec(),
            lat_column: "lat".into(),
            lon_column: "lon".into(),
            overwrite: false,
            delay_ms: 200,
            timeout_secs: 30,
            kml_endpoint: DEFAULT_KML_ENDPOINT.into(),
            delimiter: ',',
        }
    }
}

impl Config {
    /// Charge une configuration depuis un fichier JSON (champs absents = défaut)
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse config JSON")
    }

    /// Applique les variables d'environnement (`LATLON_*`)
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applique des surcharges depuis une source clé -> valeur
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(ms) = lookup("LATLON_DELAY_MS").and_then(|s| s.parse().ok()) {
            self.delay_ms = ms;
        }
        if let Some(secs) = lookup("LATLON_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            self.timeout_secs = secs;
        }
        if let Some(endpoint) = lookup("LATLON_KML_ENDPOINT").filter(|s| !s.trim().is_empty()) {
            self.kml_endpoint = endpoint.trim().to_string();
        }
        if let Some(overwrite) = lookup("LATLON_OVERWRITE").and_then(|s| parse_bool(&s)) {
            self.overwrite = overwrite;
        }
    }

    /// Vérifie la cohérence de la configuration
    pub fn validate(&self) -> Result<()> {
        if self.link_columns.is_empty() {
            anyhow::bail!("link_columns must not be empty");
        }
        if !self.delimiter.is_ascii() {
            anyhow::bail!("Delimiter must be an ASCII character, got {:?}", self.delimiter);
        }
        if self.lat_column.is_empty() || self.lon_column.is_empty() {
            anyhow::bail!("lat_column and lon_column must not be empty");
        }
        if self.timeout_secs == 0 {
            anyhow::bail!("timeout_secs must be > 0");
        }
        url::Url::parse(&self.kml_endpoint)
            .context(format!("Invalid KML endpoint: {}", self.kml_endpoint))?;
        Ok(())
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Séparateur en octet (validé ASCII par `validate`)
    pub fn delimiter_byte(&self) -> u8 {
        u8::try_from(self.delimiter).unwrap_or(b',')
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.link_columns[0], "Link_11_52");
        assert_eq!(config.delay(), Duration::from_millis(200));
        assert!(!config.overwrite);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_json() {
        let path = std::env::temp_dir().join("latlon_fill_test_config.json");
        std::fs::write(&path, r#"{"overwrite": true, "delay_ms": 0, "link_columns": ["Karta"]}"#)
            .unwrap();

        let config = Config::load(&path).unwrap();
        assert!(config.overwrite);
        assert_eq!(config.delay_ms, 0);
        assert_eq!(config.link_columns, vec!["Karta".to_string()]);
        assert_eq!(config.lat_column, "lat");

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_apply_overrides() {
        let env: HashMap<&str, &str> = [
            ("LATLON_DELAY_MS", "750"),
            ("LATLON_TIMEOUT_SECS", "not-a-number"),
            ("LATLON_OVERWRITE", "yes"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.delay_ms, 750);
        assert_eq!(config.timeout_secs, 30);
        assert!(config.overwrite);
        assert_eq!(config.kml_endpoint, DEFAULT_KML_ENDPOINT);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.delimiter = 'é';
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.kml_endpoint = "not a url".into();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.link_columns.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_delimiter_byte() {
        let mut config = Config::default();
        config.delimiter = ';';
        assert_eq!(config.delimiter_byte(), b';');
    }
}
