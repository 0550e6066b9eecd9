use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use cart_project::{
    CancelPicker, DocumentError, DocumentStore, FixedPathPicker, FsFileHandle, LoadReport,
    SaveOutcome, StoreConfig,
};
use cart_schema::{validate_json, CartSchema, MetadataSchema, SchemaError, SchemaValidator};
use cart_types::{scan_model_ids, Cart, Metadata};
use colored::Colorize;
use serde_json::json;
use tracing::debug;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => StoreConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => StoreConfig::default(),
    };
    debug!(?config, "store config");

    match cli.command {
        Command::Info(args) => cmd_info(args, config, cli.format).await,
        Command::Ids(args) => cmd_ids(args, config, cli.format),
        Command::Validate(args) => cmd_validate(args, config, cli.format).await,
        Command::Pack(args) => cmd_pack(args, config).await,
        Command::Unpack(args) => cmd_unpack(args, cli.format),
    }
}

async fn open_project(
    path: &Path,
    config: StoreConfig,
) -> Result<(DocumentStore, LoadReport), DocumentError> {
    let mut store = DocumentStore::new(Arc::new(CancelPicker)).with_config(config);
    let report = store
        .load_project_from_handle(Arc::new(FsFileHandle::new(path)))
        .await?;
    Ok((store, report))
}

async fn cmd_info(args: InfoArgs, config: StoreConfig, format: OutputFormat) -> anyhow::Result<()> {
    let (store, report) = open_project(&args.project, config)
        .await
        .with_context(|| format!("opening {}", args.project.display()))?;
    let meta = store.metadata();

    if format == OutputFormat::Json {
        let value = json!({
            "file": report.file_name,
            "projectName": meta.project_name,
            "schemaVersion": meta.schema_version,
            "createdAt": meta.created_at,
            "lastModifiedAt": meta.last_modified_at,
            "guidelines": meta.guidelines.len(),
            "modelIds": store.model_ids(),
            "loaded": report.loaded,
            "missing": report.missing_assets,
            "skipped": report.skipped_entries,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{} {}", "Project".bold(), meta.project_name.cyan().bold());
    println!("  File: {}", report.file_name);
    println!("  Schema version: {}", meta.schema_version);
    println!("  Created: {}", format_time(meta.created_at));
    println!("  Modified: {}", format_time(meta.last_modified_at));
    println!("  Guidelines: {}", meta.guidelines.len());
    if let Some(entity) = store.cart().and_then(|c| c.entity_type.as_deref()) {
        println!("  Entity: {}", entity.yellow());
    }
    println!("  Models referenced: {}", join_ids(store.model_ids()));
    for id in &report.loaded {
        let asset = store.asset(*id);
        let size = asset.map_or(0, |a| a.len());
        println!("    {} models/{id}.glb ({size} bytes)", "✓".green());
    }
    for id in &report.missing_assets {
        println!("    {} model {id} missing", "✗".red());
    }
    for name in &report.skipped_entries {
        println!("    {} skipped {}", "-".dimmed(), name.dimmed());
    }
    Ok(())
}

fn cmd_ids(args: IdsArgs, config: StoreConfig, format: OutputFormat) -> anyhow::Result<()> {
    let bytes = std::fs::read(&args.cart)
        .with_context(|| format!("reading {}", args.cart.display()))?;
    let value = validate_json(&CartSchema, &bytes).map_err(|e| schema_failure(e, &CartSchema))?;
    let cart: Cart = serde_json::from_value(value)?;
    let scan = scan_model_ids(Some(&cart), config.max_tree_depth);

    if format == OutputFormat::Json {
        let value = json!({ "ids": scan.ids, "truncated": scan.truncated });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    for id in &scan.ids {
        println!("{id}");
    }
    for path in &scan.truncated {
        eprintln!("{} subtree deeper than {} skipped: {path}", "warning:".yellow(), config.max_tree_depth);
    }
    Ok(())
}

async fn cmd_validate(
    args: ValidateArgs,
    config: StoreConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let result = open_project(&args.project, config).await;

    if format == OutputFormat::Json {
        let value = match &result {
            Ok((_, report)) => json!({ "valid": true, "missing": report.missing_assets }),
            Err(e) => json!({
                "valid": false,
                "error": e.to_string(),
                "issues": e.issues().iter()
                    .map(|i| json!({ "path": i.path, "message": i.message }))
                    .collect::<Vec<_>>(),
            }),
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        match &result {
            Ok((_, report)) => {
                println!("{} {} is valid", "✓".green().bold(), args.project.display());
                if !report.missing_assets.is_empty() {
                    println!(
                        "  {} models without assets: {}",
                        "warning:".yellow(),
                        join_ids(&report.missing_assets)
                    );
                }
            }
            Err(e) => {
                println!("{} {}: {e}", "✗".red().bold(), args.project.display());
                for issue in e.issues() {
                    println!("  {} {}", issue.path.yellow(), issue.message);
                }
            }
        }
    }

    match result {
        Ok(_) => Ok(()),
        Err(_) => bail!("{} failed validation", args.project.display()),
    }
}

async fn cmd_pack(args: PackArgs, config: StoreConfig) -> anyhow::Result<()> {
    let metadata: Metadata = read_payload(&args.metadata, &MetadataSchema::new())?;
    let cart: Cart = read_payload(&args.cart, &CartSchema)?;

    let picker = Arc::new(FixedPathPicker::new(&args.output));
    let mut store = DocumentStore::new(picker).with_config(config);
    store.update_metadata(|m| *m = metadata);
    store.set_cart(cart);
    for (id, path) in &args.models {
        let bytes = std::fs::read(path).with_context(|| format!("reading model {}", path.display()))?;
        store.set_asset(*id, bytes)?;
    }

    let SaveOutcome::Saved(report) = store.save_project(true).await? else {
        bail!("save was cancelled");
    };
    println!(
        "{} Wrote {} ({} bytes, {} models)",
        "✓".green().bold(),
        args.output.display().to_string().bold(),
        report.bytes_written,
        report.models.len()
    );
    for id in &report.missing_assets {
        println!("  {} model {id} is referenced but was not supplied", "warning:".yellow());
    }
    let unused: Vec<_> = args
        .models
        .iter()
        .map(|(id, _)| *id)
        .filter(|id| !report.models.contains(id))
        .collect();
    if !unused.is_empty() {
        println!("  {} models not referenced by the cart: {}", "note:".dimmed(), join_ids(&unused));
    }
    Ok(())
}

fn cmd_unpack(args: UnpackArgs, format: OutputFormat) -> anyhow::Result<()> {
    let entries = cart_container::open(&args.project)
        .with_context(|| format!("opening {}", args.project.display()))?;
    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;

    let mut written = Vec::new();
    for (name, data) in entries.iter() {
        let Some(relative) = safe_entry_path(name) else {
            eprintln!("{} refusing unsafe entry name {name:?}", "warning:".yellow());
            continue;
        };
        let target = args.output.join(relative);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, data).with_context(|| format!("writing {}", target.display()))?;
        written.push((name.to_string(), data.len()));
    }

    if format == OutputFormat::Json {
        let files: Vec<_> = written
            .iter()
            .map(|(name, len)| json!({ "name": name, "bytes": len }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&json!({ "entries": files }))?);
    } else {
        for (name, len) in &written {
            println!("  {} {name} ({len} bytes)", "→".cyan());
        }
        println!(
            "{} Unpacked {} entries into {}",
            "✓".green().bold(),
            written.len(),
            args.output.display()
        );
    }
    Ok(())
}

fn read_payload<T: serde::de::DeserializeOwned>(
    path: &Path,
    validator: &dyn SchemaValidator,
) -> anyhow::Result<T> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let value = validate_json(validator, &bytes).map_err(|e| schema_failure(e, validator))?;
    serde_json::from_value(value).with_context(|| format!("decoding {}", path.display()))
}

fn schema_failure(err: SchemaError, validator: &dyn SchemaValidator) -> anyhow::Error {
    let report = err.into_report(validator.name());
    for issue in &report.issues {
        eprintln!("  {} {}", issue.path.yellow(), issue.message);
    }
    anyhow::anyhow!("{} payload failed validation", validator.name())
}

/// Relative path for an archive entry, or `None` if it would escape the
/// output directory.
fn safe_entry_path(name: &str) -> Option<PathBuf> {
    let path = Path::new(name);
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if out.as_os_str().is_empty() {
        None
    } else {
        Some(out)
    }
}

fn format_time(time: Option<chrono::DateTime<chrono::Utc>>) -> String {
    time.map_or_else(|| "never".to_string(), |t| t.to_rfc3339())
}

fn join_ids(ids: &[cart_types::ModelAssetId]) -> String {
    if ids.is_empty() {
        return "none".into();
    }
    ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}
