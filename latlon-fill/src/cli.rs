//! Définition et implémentation des commandes CLI
//!
//! - `centers`: table → dataset JSON/GeoJSON des centres
//! - `fill`: table → même table avec lat/lon renseignées (réécrite si changement)

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Subcommand, ValueEnum};
use tracing::info;

use crate::config::Config;
use crate::export;
use crate::fetch::{HttpKmlFetcher, KmlFetcher, Pacer, TokioPacer};
use crate::pipeline::{self, Resolver, TargetColumns};
use crate::report::RunReport;
use crate::table::{Columns, Table};

/// Format du dataset produit par `centers`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Une entrée par ligne: champs d'origine + center ou error
    Json,
    /// FeatureCollection de Points pour les lignes résolues
    Geojson,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve a center for every record and write a new dataset
    Centers {
        /// Input table (CSV with header row)
        #[arg(short, long, default_value = "export.csv")]
        input: PathBuf,

        /// Output file
        #[arg(short, long, default_value = "data/centers.json")]
        output: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Keep only the first record of each map layer (records without layer id are dropped)
        #[arg(long)]
        unique_layers: bool,
    },

    /// Fill the lat/lon columns of the input table (rewritten only on change)
    Fill {
        /// Input table (CSV with header row)
        #[arg(short, long, default_value = "export.csv")]
        input: PathBuf,

        /// Write the result here instead of updating the input in place
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite non-empty lat/lon values
        #[arg(long)]
        overwrite: bool,
    },
}

/// Lit la table et découvre ses colonnes (erreurs fatales)
fn load_table(config: &Config, input: &Path) -> Result<(Table, Columns)> {
    let file = input.display().to_string();
    let table = Table::read(input, config.delimiter_byte())
        .context(format!("Failed to load table: {}", file))?;
    let columns = Columns::discover(&table, config, &file)?;

    info!(
        rows = table.rows.len(),
        link_column = %table.headers[columns.link],
        "Table loaded"
    );
    Ok((table, columns))
}

fn http_resolver(config: &Config) -> Result<Resolver<HttpKmlFetcher, TokioPacer>> {
    let fetcher = HttpKmlFetcher::new(&config.kml_endpoint, config.timeout())?;
    Ok(Resolver::new(fetcher, TokioPacer::new(config.delay())))
}

fn finish_report(mut report: RunReport, started_at: Instant, report_path: Option<&Path>) -> Result<()> {
    report.set_duration(started_at.elapsed());
    report.finalize();
    info!("{}", report.summary());
    report.display();
    if let Some(path) = report_path {
        report
            .save_to_file(path)
            .context(format!("Failed to save report: {}", path.display()))?;
    }
    Ok(())
}

/// Exécute la commande centers
pub async fn cmd_centers(
    config: &Config,
    input: &Path,
    output: &Path,
    format: OutputFormat,
    unique_layers: bool,
    report_path: Option<&Path>,
) -> Result<()> {
    let resolver = http_resolver(config)?;
    run_centers(resolver, config, input, output, format, unique_layers, report_path).await
}

/// Variante injectable de `cmd_centers` (fetcher et pause fournis)
pub async fn run_centers<F: KmlFetcher, P: Pacer>(
    mut resolver: Resolver<F, P>,
    config: &Config,
    input: &Path,
    output: &Path,
    format: OutputFormat,
    unique_layers: bool,
    report_path: Option<&Path>,
) -> Result<()> {
    let started_at = Instant::now();
    let (table, columns) = load_table(config, input)?;

    let mut report = RunReport::new("centers");
    let mut records = resolver.enrich(&table, &columns, &mut report).await;
    if unique_layers {
        records = pipeline::unique_layers(records);
    }

    let written = match format {
        OutputFormat::Json => {
            export::write_records_json(&records, output)?;
            records.len()
        }
        OutputFormat::Geojson => export::write_centers_geojson(&records, output)?,
    };
    println!("Wrote {} centers to {}", written, output.display());

    finish_report(report, started_at, report_path)
}

/// Exécute la commande fill
pub async fn cmd_fill(
    config: &Config,
    input: &Path,
    output: Option<&Path>,
    overwrite: bool,
    report_path: Option<&Path>,
) -> Result<()> {
    let resolver = http_resolver(config)?;
    run_fill(resolver, config, input, output, overwrite, report_path).await
}

/// Variante injectable de `cmd_fill`
pub async fn run_fill<F: KmlFetcher, P: Pacer>(
    mut resolver: Resolver<F, P>,
    config: &Config,
    input: &Path,
    output: Option<&Path>,
    overwrite: bool,
    report_path: Option<&Path>,
) -> Result<()> {
    let started_at = Instant::now();
    let (mut table, columns) = load_table(config, input)?;

    let targets = TargetColumns {
        lat: table.ensure_column(&config.lat_column),
        lon: table.ensure_column(&config.lon_column),
    };

    let mut report = RunReport::new("fill");
    let changed = resolver
        .fill(&mut table, &columns, targets, overwrite, &mut report)
        .await;

    let target = output.unwrap_or(input);
    if changed > 0 {
        table
            .write(target, config.delimiter_byte())
            .context(format!("Failed to write table: {}", target.display()))?;
        println!("{} updated ({} rows changed).", target.display(), changed);
    } else {
        println!("No changes.");
    }

    finish_report(report, started_at, report_path)
}
