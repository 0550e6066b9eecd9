use std::path::PathBuf;

use cart_types::ModelAssetId;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "cartctl",
    about = "Inspect, validate, pack and unpack cart project files",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Store settings (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show what a project file contains
    Info(InfoArgs),
    /// List the model ids a cart.json references
    Ids(IdsArgs),
    /// Check a project file against the payload schemas
    Validate(ValidateArgs),
    /// Build a project file from JSON payloads and model files
    Pack(PackArgs),
    /// Extract every entry of a project file into a directory
    Unpack(UnpackArgs),
}

#[derive(Args)]
pub struct InfoArgs {
    pub project: PathBuf,
}

#[derive(Args)]
pub struct IdsArgs {
    pub cart: PathBuf,
}

#[derive(Args)]
pub struct ValidateArgs {
    pub project: PathBuf,
}

#[derive(Args)]
pub struct PackArgs {
    #[arg(long)]
    pub metadata: PathBuf,
    #[arg(long)]
    pub cart: PathBuf,
    /// Model file for an id, as ID=PATH; repeatable
    #[arg(long = "model", value_parser = parse_model_arg)]
    pub models: Vec<(ModelAssetId, PathBuf)>,
    #[arg(short, long)]
    pub output: PathBuf,
}

#[derive(Args)]
pub struct UnpackArgs {
    pub project: PathBuf,
    #[arg(short, long)]
    pub output: PathBuf,
}

fn parse_model_arg(s: &str) -> Result<(ModelAssetId, PathBuf), String> {
    let (id, path) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ID=PATH, got {s:?}"))?;
    let id = id.parse::<ModelAssetId>().map_err(|e| e.to_string())?;
    if path.is_empty() {
        return Err(format!("missing path for model {id}"));
    }
    Ok((id, PathBuf::from(path)))
}
