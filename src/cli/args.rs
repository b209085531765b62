use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use geosr::PreprocessMode;

#[derive(Parser)]
#[command(name = "geosr", version, about = "GEOSR CLI: tiled super-resolution of georeferenced rasters")]
pub struct CliArgs {
    /// Enable logging (DEBUG unless RUST_LOG says otherwise)
    #[arg(long, global = true, default_value_t = false)]
    pub log: bool,

    /// JSON file overriding the default processing settings
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Super-resolve a local raster with a local ONNX model
    Run(RunArgs),
    /// Serve a JSON request against a directory-backed object store
    Request(RequestArgs),
}

#[derive(Args)]
pub struct RunArgs {
    /// Input raster (any GDAL-readable format)
    #[arg(short, long)]
    pub input: PathBuf,

    /// ONNX super-resolution model
    #[arg(short, long)]
    pub model: PathBuf,

    /// Output GeoTIFF
    #[arg(short, long)]
    pub output: PathBuf,

    /// Comma-separated 0-based band indices forming R,G,B
    #[arg(long, value_delimiter = ',', default_value = "0,1,2")]
    pub bands: Vec<usize>,

    /// Low-resolution tile size (overrides config)
    #[arg(long)]
    pub tile_size: Option<usize>,

    /// Reflect padding per tile side (overrides config)
    #[arg(long)]
    pub pad: Option<usize>,

    /// Model input convention (overrides config)
    #[arg(long, value_enum)]
    pub mode: Option<PreprocessMode>,

    /// Also write .tfw/.prj sidecars next to the output
    #[arg(long, default_value_t = false)]
    pub world_file: bool,
}

#[derive(Args)]
pub struct RequestArgs {
    /// Root directory; object bucket/key lives at <root>/<bucket>/<key>
    #[arg(long)]
    pub store_root: PathBuf,

    /// Request JSON file
    #[arg(long)]
    pub request: PathBuf,
}
