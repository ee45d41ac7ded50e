//! Panel Info Tool
//!
//! CLI for looking up display panel geometry by device-tree compatible strings.

mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use panel_info::{Catalog, Compatibles, DisplayPanel};
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use config::{Config, FallbackConfig};

/// Exit code when the database can't be loaded.
const EXIT_LOAD_FAILED: u8 = 2;
/// Exit code when no compatible string matches.
const EXIT_NO_MATCH: u8 = 3;

#[derive(Parser)]
#[command(name = "panelinfo")]
#[command(about = "Look up display panel geometry by device-tree compatible strings")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Database to use: "builtin", a database file or a panel directory
    #[arg(long)]
    database: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the display panel of a device
    Query {
        /// Compatible strings, most specific first (omit to read the device tree)
        compatibles: Vec<String>,

        /// Print JSON
        #[arg(long)]
        json: bool,

        /// Also print name, physical size and cutouts
        #[arg(long)]
        details: bool,
    },
    /// List all known devices
    List,
    /// Check the database for compatible strings claimed by several devices
    Check,
    /// Print the database as JSON
    Dump,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };

    let source = match &cli.database {
        Some(database) => config::source_from_str(database),
        None => config.database.to_source(),
    };
    debug!("Using database source: {}", source);
    let catalog = Catalog::new(source);

    match cli.command {
        Commands::Query {
            compatibles,
            json,
            details,
        } => handle_query(
            &catalog,
            &compatibles,
            json || config.output.json,
            details,
            config.fallback.as_ref(),
        ),
        Commands::List => handle_list(&catalog),
        Commands::Check => handle_check(&catalog),
        Commands::Dump => handle_dump(&catalog),
    }
}

/// Maps library error kinds to distinct exit codes.
fn exit_code(err: &anyhow::Error) -> u8 {
    match err
        .chain()
        .find_map(|e| e.downcast_ref::<panel_info::Error>())
    {
        Some(e) if e.is_load() => EXIT_LOAD_FAILED,
        Some(e) if e.is_no_match() => EXIT_NO_MATCH,
        _ => 1,
    }
}

fn handle_query(
    catalog: &Catalog,
    compatibles: &[String],
    json: bool,
    details: bool,
    fallback: Option<&FallbackConfig>,
) -> Result<()> {
    let candidates = if compatibles.is_empty() {
        Compatibles::from_device_tree().context("Failed to read compatibles from device tree")?
    } else {
        Compatibles::new(compatibles)?
    };

    let (label, panel, is_fallback) = match catalog.resolve(&candidates) {
        Ok(device) => (
            device.matched_compatible().to_string(),
            device.panel()?.clone(),
            false,
        ),
        Err(e) if e.is_no_match() => {
            let Some(fallback) = fallback else {
                return Err(e.into());
            };
            warn!("{}, using fallback panel", e);
            (
                candidates.primary().to_string(),
                fallback.to_panel()?,
                true,
            )
        }
        Err(e) => return Err(e.into()),
    };

    if json {
        let value = panel_json(&label, &panel, is_fallback);
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{}", describe(&label, &panel));
        if details {
            print_details(&panel);
        }
    }

    Ok(())
}

fn handle_list(catalog: &Catalog) -> Result<()> {
    let db = catalog.database()?;
    println!("Known devices ({}):", db.len());
    for record in db.all_records() {
        let panel = record.panel();
        println!(
            "  {} - {} {}x{}",
            record.compatibles().join(", "),
            panel.name().unwrap_or("(unnamed)"),
            panel.width(),
            panel.height()
        );
    }
    Ok(())
}

fn handle_check(catalog: &Catalog) -> Result<()> {
    let db = catalog.database()?;
    let violations = db.integrity_violations();
    if violations.is_empty() {
        println!("Database OK: {} devices", db.len());
        return Ok(());
    }
    for violation in &violations {
        println!("  {}", violation);
    }
    anyhow::bail!(
        "Database has {} ambiguous compatible strings",
        violations.len()
    )
}

fn handle_dump(catalog: &Catalog) -> Result<()> {
    let db = catalog.database()?;
    println!("{}", db.to_json());
    Ok(())
}

/// One-line summary, e.g. `oneplus,fajita: 1080x2340, corner radii: [68, 68, 68, 68]`.
fn describe(label: &str, panel: &DisplayPanel) -> String {
    format!(
        "{}: {}x{}, corner radii: {:?}",
        label,
        panel.width(),
        panel.height(),
        panel.corner_radii()
    )
}

fn print_details(panel: &DisplayPanel) {
    println!("  Name: {}", panel.name().unwrap_or("(unnamed)"));
    match panel.physical_size_mm() {
        Some((w, h)) => println!("  Physical size: {}x{} mm", w, h),
        None => println!("  Physical size: unknown"),
    }
    if panel.cutouts().is_empty() {
        println!("  Cutouts: none");
    } else {
        println!("  Cutouts:");
        for cutout in panel.cutouts() {
            let b = cutout.bounds();
            println!(
                "    {} at {},{} size {}x{}",
                cutout.name().unwrap_or("(unnamed)"),
                b.x,
                b.y,
                b.width,
                b.height
            );
        }
    }
}

fn panel_json(label: &str, panel: &DisplayPanel, is_fallback: bool) -> serde_json::Value {
    let cutouts: Vec<_> = panel
        .cutouts()
        .iter()
        .map(|c| {
            let b = c.bounds();
            json!({
                "name": c.name(),
                "path": c.path(),
                "bounds": { "x": b.x, "y": b.y, "width": b.width, "height": b.height },
            })
        })
        .collect();

    json!({
        "compatible": label,
        "fallback": is_fallback,
        "name": panel.name(),
        "width": panel.width(),
        "height": panel.height(),
        "corner-radii": panel.corner_radii(),
        "physical-width-mm": panel.width_mm(),
        "physical-height-mm": panel.height_mm(),
        "cutouts": cutouts,
    })
}
