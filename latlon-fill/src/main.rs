//! Point d'entrée CLI pour latlon-fill

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

use latlon_fill::cli::{self, Commands};
use latlon_fill::Config;

// Charger .env au démarrage
fn load_env() {
    // Chercher .env dans le répertoire courant ou parent
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

/// Résoudre les centres des cartes liées dans un tableur
#[derive(Parser)]
#[command(name = "latlon-fill")]
#[command(author, version)]
#[command(about = "Résoudre lat/lon depuis les liens de carte d'un tableur (liens directs ou calques KML)")]
#[command(long_about = "Résout un centre par ligne à partir du lien de carte: coordonnées encodées dans l'URL, sinon KML du calque (vue enregistrée, caméra, puis centre d'emprise).\n\n'centers' écrit un nouveau dataset, 'fill' met à jour les colonnes lat/lon du tableur.")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    /// JSON config file (defaults apply to missing fields)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Pause between two KML downloads, in milliseconds (défaut : env LATLON_DELAY_MS / 200)
    #[arg(long, global = true)]
    delay_ms: Option<u64>,

    /// Timeout of a KML download, in seconds (défaut : env LATLON_TIMEOUT_SECS / 30)
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Field delimiter of the table
    #[arg(long, global = true)]
    delimiter: Option<char>,

    /// Save the run report as JSON
    #[arg(long, global = true)]
    report: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Charger .env avant tout
    load_env();

    let cli = Cli::parse();

    // Configurer le logging
    init_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;
    let report = cli.report.as_deref();

    match cli.command {
        Commands::Centers {
            input,
            output,
            format,
            unique_layers,
        } => {
            info!(input = %input.display(), output = %output.display(), format = ?format, "Extract centers");
            cli::cmd_centers(&config, &input, &output, format, unique_layers, report).await?;
        }
        Commands::Fill {
            input,
            output,
            overwrite,
        } => {
            info!(input = %input.display(), overwrite = overwrite || config.overwrite, "Fill lat/lon");
            cli::cmd_fill(
                &config,
                &input,
                output.as_deref(),
                overwrite || config.overwrite,
                report,
            )
            .await?;
        }
    }

    Ok(())
}

/// Fichier de config, puis variables d'environnement, puis options CLI
fn build_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    config.apply_env();

    if let Some(ms) = cli.delay_ms {
        config.delay_ms = ms;
    }
    if let Some(secs) = cli.timeout_secs {
        config.timeout_secs = secs;
    }
    if let Some(delimiter) = cli.delimiter {
        config.delimiter = delimiter;
    }

    config.validate()?;
    Ok(config)
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
