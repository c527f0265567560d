use anyhow::{bail, Context, Result};
use clap::Parser;
use diesel::prelude::*;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use uuid::Uuid;

use realty_site_backend::config::AppConfig;
use realty_site_backend::db::establish_connection;
use realty_site_backend::media::{restore_all, restore_property, RestoreOptions};
use realty_site_backend::models::Property;

/// Reconcile property image references with the files on disk.
#[derive(Parser, Debug)]
#[command(name = "restore_images", about)]
struct Cli {
    /// Property id to restore.
    property_id: Option<Uuid>,

    /// Restore every property.
    #[arg(long, conflicts_with = "property_id")]
    all: bool,

    /// Report what would change without copying files or writing the database.
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    if cli.property_id.is_none() && !cli.all {
        bail!("pass a property id or --all");
    }

    let config = AppConfig::load()
        .map_err(|e| anyhow::anyhow!("{}", e))
        .context("failed to load configuration")?;
    let mut conn = establish_connection().context("failed to connect to database")?;
    let opts = RestoreOptions { dry_run: cli.dry_run };

    let reports = match cli.property_id {
        Some(property_id) => {
            use realty_site_backend::schema::properties::dsl::*;
            let property: Property = properties
                .filter(id.eq(property_id))
                .first(&mut conn)
                .optional()
                .context("failed to load property")?
                .with_context(|| format!("property {} not found", property_id))?;
            vec![restore_property(
                &mut conn,
                &config.uploads_dir,
                &config.assets_dir,
                &property,
                opts,
            )]
        }
        None => restore_all(&mut conn, &config.uploads_dir, &config.assets_dir, opts)
            .context("failed to restore properties")?,
    };

    let restored: usize = reports.iter().map(|r| r.restored_images.len()).sum();
    let copied: usize = reports.iter().map(|r| r.copied_from_assets.len()).sum();
    let missing: usize = reports.iter().map(|r| r.missing_files.len()).sum();
    let errors: usize = reports.iter().map(|r| r.errors.len()).sum();

    println!("{}", serde_json::to_string_pretty(&reports)?);
    info!(
        "{}: {} properties, {} images kept, {} copied from assets, {} missing, {} errors",
        if cli.dry_run { "dry run" } else { "restore" },
        reports.len(),
        restored,
        copied,
        missing,
        errors
    );

    Ok(())
}
